//! Triage entry point: score, fold, decide, assemble.
//!
//! The engine performs no I/O. It hands back the state to persist and the
//! event to forward; the surrounding service does both.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::decider;
use crate::domain::{
    ConversationId, ConversationRiskState, EscalationEvent, InvalidStateError, Result,
    ScoreResult, TriageResult, UserRef,
};
use crate::lexicon::Lexicon;
use crate::metrics::METRICS;
use crate::obs::{
    emit_escalated, emit_lexicon_loaded, emit_message_scored, emit_state_rejected,
    ConversationSpan,
};
use crate::scorer;
use crate::tracker;

/// Stateless triage engine over a shared, read-only lexicon.
///
/// Cheap to clone and safe to share across threads. It holds no
/// per-conversation state, so calls for different conversations are fully
/// independent. Callers must not run two `process` calls on the same
/// conversation concurrently: both would start from the same stored state
/// and the later save would silently drop the other's tier rise.
#[derive(Debug, Clone)]
pub struct TriageEngine {
    lexicon: Arc<Lexicon>,
}

impl TriageEngine {
    pub fn new(lexicon: Lexicon) -> Self {
        Self::with_shared(Arc::new(lexicon))
    }

    pub fn with_shared(lexicon: Arc<Lexicon>) -> Self {
        emit_lexicon_loaded(lexicon.version(), lexicon.len(), &lexicon.fingerprint());
        Self { lexicon }
    }

    /// Build an engine from a lexicon file. Any load failure is fatal.
    pub fn from_lexicon_path(path: &Path) -> Result<Self> {
        Ok(Self::new(Lexicon::from_path(path)?))
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Score a message with no conversation context.
    pub fn score(&self, text: &str) -> ScoreResult {
        scorer::score(&self.lexicon, text)
    }

    /// Triage one message for one conversation.
    ///
    /// `conversation_id` is the caller's notion of which conversation this
    /// message belongs to; `state` must be that conversation's state.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::InvalidState` if the ids differ or the state
    /// breaks its escalation invariants. Both are caller bugs.
    pub fn process(
        &self,
        conversation_id: &ConversationId,
        state: ConversationRiskState,
        message_text: &str,
        user_ref: &UserRef,
        now: DateTime<Utc>,
    ) -> Result<TriageResult> {
        let _span = ConversationSpan::enter(conversation_id.as_str());

        if state.conversation_id != *conversation_id {
            let err = InvalidStateError::ConversationMismatch {
                expected: conversation_id.to_string(),
                actual: state.conversation_id.to_string(),
            };
            emit_state_rejected(conversation_id.as_str(), &err);
            return Err(err.into());
        }
        if let Err(err) = state.validate() {
            emit_state_rejected(conversation_id.as_str(), &err);
            return Err(err.into());
        }

        let score_result = self.score(message_text);
        METRICS.inc_messages_scored();
        emit_message_scored(
            conversation_id.as_str(),
            score_result.tier,
            score_result.numeric_score,
            score_result.flags.len(),
        );

        let previous_tier = state.current_tier;
        let mut updated_state = tracker::fold(state, &score_result);

        let escalation_event = decider::decide(previous_tier, &updated_state).map(|escalation| {
            decider::apply(&mut updated_state, &escalation, now);
            METRICS.inc_escalations(escalation.target);
            emit_escalated(
                conversation_id.as_str(),
                escalation.from_tier,
                escalation.to_tier,
                escalation.target,
            );
            EscalationEvent {
                conversation_id: conversation_id.clone(),
                user_ref: user_ref.clone(),
                from_tier: escalation.from_tier,
                to_tier: escalation.to_tier,
                target: escalation.target,
                timestamp: now,
                flags: score_result.labels().map(str::to_string).collect(),
            }
        });

        Ok(TriageResult {
            score_result,
            updated_state,
            escalation_event,
        })
    }
}

impl Default for TriageEngine {
    fn default() -> Self {
        Self::new(Lexicon::builtin())
    }
}
