//! Message risk scoring.
//!
//! Scoring is a pure function of the lexicon and the message text: no
//! conversation context, no escalation decision, no side effects.

use crate::domain::{MatchFlag, RiskTier, ScoreResult};
use crate::lexicon::Lexicon;

/// Score one message against the lexicon.
///
/// Every matching phrase produces a flag, not just the first one. The
/// result tier is the most severe tier with a match; the numeric score sums
/// the tier weight of every match, so a message hitting one critical and one
/// medium phrase scores 12 at tier critical.
///
/// Empty or whitespace-only text scores as [`ScoreResult::empty`].
pub fn score(lexicon: &Lexicon, text: &str) -> ScoreResult {
    if text.trim().is_empty() {
        return ScoreResult::empty();
    }

    let lowered = text.to_lowercase();
    let mut result = ScoreResult::empty();

    for tier in [RiskTier::Critical, RiskTier::High, RiskTier::Medium] {
        for entry in lexicon.entries(tier) {
            if lowered.contains(entry.phrase.as_str()) {
                result.flags.push(MatchFlag::new(tier, entry.label.clone()));
                result.numeric_score += tier.weight();
                result.tier = result.tier.max(tier);
            }
        }
    }

    result
}
