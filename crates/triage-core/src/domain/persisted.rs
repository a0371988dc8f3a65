//! Storage-facing record of a conversation's risk state.
//!
//! The JSON shape is fixed so that storage adapters written elsewhere can
//! round-trip it:
//!
//! ```json
//! {
//!   "conversationId": "conv-1",
//!   "currentTier": 2,
//!   "accumulatedFlags": ["high:hopeless"],
//!   "escalated": true,
//!   "escalatedAt": "2024-05-01T12:00:00Z",
//!   "escalationTarget": "counselor"
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::InvalidStateError;
use super::ids::ConversationId;
use super::state::{ConversationRiskState, EscalationTarget};
use super::tier::RiskTier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRiskState {
    pub conversation_id: String,
    pub current_tier: u8,
    pub accumulated_flags: Vec<String>,
    pub escalated: bool,
    pub escalated_at: Option<DateTime<Utc>>,
    pub escalation_target: Option<EscalationTarget>,
}

impl From<&ConversationRiskState> for PersistedRiskState {
    fn from(state: &ConversationRiskState) -> Self {
        Self {
            conversation_id: state.conversation_id.to_string(),
            current_tier: state.current_tier.rank(),
            accumulated_flags: state.accumulated_flags.iter().cloned().collect(),
            escalated: state.escalated,
            escalated_at: state.escalated_at,
            escalation_target: state.escalation_target,
        }
    }
}

impl TryFrom<PersistedRiskState> for ConversationRiskState {
    type Error = InvalidStateError;

    fn try_from(record: PersistedRiskState) -> std::result::Result<Self, Self::Error> {
        let state = ConversationRiskState {
            conversation_id: ConversationId(record.conversation_id),
            current_tier: RiskTier::try_from(record.current_tier)?,
            accumulated_flags: record.accumulated_flags.into_iter().collect(),
            escalated: record.escalated,
            escalated_at: record.escalated_at,
            escalation_target: record.escalation_target,
        };
        state.validate()?;
        Ok(state)
    }
}
