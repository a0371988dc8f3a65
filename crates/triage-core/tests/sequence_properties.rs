//! Randomized conversation properties: monotonic tiers, escalation at most
//! once per target, and isolation between conversations.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use triage_core::{
    ConversationId, ConversationRiskState, EscalationTarget, Lexicon, RiskTier, TriageEngine,
    TriageResult, UserRef,
};

const FILLER: &[&str] = &["", "hi", "ok", "exam tomorrow", "thanks", "see you later"];

fn lexicon_phrases() -> Vec<String> {
    let lexicon = Lexicon::builtin();
    RiskTier::DESCENDING
        .into_iter()
        .flat_map(|tier| lexicon.entries(tier).to_vec())
        .map(|entry| entry.phrase)
        .collect()
}

/// Filler text, optionally with one lexicon phrase appended.
fn message() -> impl Strategy<Value = String> {
    (
        prop::sample::select(FILLER),
        prop::sample::select(lexicon_phrases()),
        any::<bool>(),
    )
        .prop_map(|(filler, phrase, with_phrase)| {
            if with_phrase {
                format!("{filler} {phrase}")
            } else {
                filler.to_string()
            }
        })
}

fn run(engine: &TriageEngine, id: &str, messages: &[String]) -> Vec<TriageResult> {
    let conversation_id = ConversationId::from(id);
    let user = UserRef::from("anon-1");
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let mut state = ConversationRiskState::new(conversation_id.clone());
    let mut out = Vec::new();
    for (i, text) in messages.iter().enumerate() {
        let now = start + Duration::minutes(i as i64);
        let result = engine
            .process(&conversation_id, state, text, &user, now)
            .unwrap();
        state = result.updated_state.clone();
        out.push(result);
    }
    out
}

proptest! {
    #[test]
    fn tier_and_flags_never_shrink(messages in prop::collection::vec(message(), 1..20)) {
        let results = run(&TriageEngine::default(), "conv-prop", &messages);
        for pair in results.windows(2) {
            let (before, after) = (&pair[0].updated_state, &pair[1].updated_state);
            prop_assert!(before.current_tier <= after.current_tier);
            prop_assert!(before.accumulated_flags.is_subset(&after.accumulated_flags));
        }
        for r in &results {
            prop_assert!(r.updated_state.current_tier >= r.score_result.tier);
        }
    }

    #[test]
    fn each_target_escalates_at_most_once(messages in prop::collection::vec(message(), 1..20)) {
        let results = run(&TriageEngine::default(), "conv-prop", &messages);
        let events: Vec<_> = results
            .iter()
            .filter_map(|r| r.escalation_event.as_ref())
            .collect();
        let count = |target: EscalationTarget| {
            events.iter().filter(|e| e.target == target).count()
        };
        let counselor = count(EscalationTarget::Counselor);
        let hotline = count(EscalationTarget::Hotline);
        prop_assert!(counselor <= 1);
        prop_assert!(hotline <= 1);

        let last = &results[results.len() - 1].updated_state;
        prop_assert_eq!(hotline == 1, last.current_tier == RiskTier::Critical);
        if last.current_tier >= RiskTier::High {
            prop_assert!(last.escalated);
        }
    }

    #[test]
    fn interleaving_matches_isolated_runs(
        a in prop::collection::vec(message(), 1..12),
        b in prop::collection::vec(message(), 1..12),
        order in prop::collection::vec(any::<bool>(), 24),
    ) {
        let engine = TriageEngine::default();
        let isolated_a = run(&engine, "conv-a", &a);
        let isolated_b = run(&engine, "conv-b", &b);

        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let user = UserRef::from("anon-1");
        let (id_a, id_b) = (ConversationId::from("conv-a"), ConversationId::from("conv-b"));
        let mut state_a = ConversationRiskState::new(id_a.clone());
        let mut state_b = ConversationRiskState::new(id_b.clone());
        let (mut ia, mut ib) = (0, 0);

        for take_a in order.into_iter().chain(std::iter::repeat(true).take(a.len())) {
            if take_a && ia < a.len() {
                // Timestamps follow each conversation's own message index.
                let now = start + Duration::minutes(ia as i64);
                let r = engine.process(&id_a, state_a, &a[ia], &user, now).unwrap();
                prop_assert_eq!(&r, &isolated_a[ia]);
                state_a = r.updated_state;
                ia += 1;
            } else if ib < b.len() {
                let now = start + Duration::minutes(ib as i64);
                let r = engine.process(&id_b, state_b, &b[ib], &user, now).unwrap();
                prop_assert_eq!(&r, &isolated_b[ib]);
                state_b = r.updated_state;
                ib += 1;
            }
        }
        prop_assert_eq!(ia, a.len());
        prop_assert_eq!(ib, b.len());
    }
}
