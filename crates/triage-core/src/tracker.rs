//! Folds message scores into the running conversation state.

use crate::domain::{ConversationRiskState, ScoreResult};

/// Fold one message's score into the conversation state.
///
/// The tier becomes `max(current, result.tier)` and every flag label joins
/// the accumulated set. Escalation fields are left untouched.
pub fn fold(mut state: ConversationRiskState, result: &ScoreResult) -> ConversationRiskState {
    state.current_tier = state.current_tier.max(result.tier);
    state
        .accumulated_flags
        .extend(result.flags.iter().map(|f| f.label.clone()));
    state
}
