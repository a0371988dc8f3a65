//! Per-conversation risk state.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::InvalidStateError;
use super::ids::ConversationId;
use super::tier::RiskTier;

/// Who an escalated conversation is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationTarget {
    /// Human counselor follow-up.
    Counselor,
    /// Highest-urgency crisis hotline.
    Hotline,
}

impl std::fmt::Display for EscalationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Counselor => write!(f, "counselor"),
            Self::Hotline => write!(f, "hotline"),
        }
    }
}

/// Running risk state of one conversation.
///
/// Owned by exactly one caller while a message is processed. `current_tier`
/// only ever rises during message processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRiskState {
    pub conversation_id: ConversationId,
    pub current_tier: RiskTier,
    /// Union of every flag label seen in this conversation.
    pub accumulated_flags: BTreeSet<String>,
    pub escalated: bool,
    pub escalated_at: Option<DateTime<Utc>>,
    pub escalation_target: Option<EscalationTarget>,
}

impl ConversationRiskState {
    /// Fresh state for a conversation that just started.
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            current_tier: RiskTier::None,
            accumulated_flags: BTreeSet::new(),
            escalated: false,
            escalated_at: None,
            escalation_target: None,
        }
    }

    /// Check the escalation invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as an [`InvalidStateError`].
    pub fn validate(&self) -> std::result::Result<(), InvalidStateError> {
        let conversation_id = self.conversation_id.to_string();
        if self.escalated {
            if self.escalated_at.is_none() {
                return Err(InvalidStateError::MissingEscalatedAt { conversation_id });
            }
            if self.escalation_target.is_none() {
                return Err(InvalidStateError::MissingTarget { conversation_id });
            }
            if !self.current_tier.is_escalation_worthy() {
                return Err(InvalidStateError::EscalatedBelowHigh {
                    conversation_id,
                    tier: self.current_tier.to_string(),
                });
            }
        } else if self.escalated_at.is_some() || self.escalation_target.is_some() {
            return Err(InvalidStateError::DanglingEscalation { conversation_id });
        }
        Ok(())
    }
}
