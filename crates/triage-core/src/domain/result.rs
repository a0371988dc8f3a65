//! Per-message outputs: score results, triage results, escalation events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ConversationId, UserRef};
use super::state::{ConversationRiskState, EscalationTarget};
use super::tier::RiskTier;

/// One matched lexicon phrase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchFlag {
    pub tier: RiskTier,
    /// e.g. `crisis:kill myself`
    pub label: String,
}

impl MatchFlag {
    pub fn new(tier: RiskTier, label: impl Into<String>) -> Self {
        Self {
            tier,
            label: label.into(),
        }
    }
}

/// Scorer output for a single message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Highest tier among `flags`, `None` when nothing matched.
    pub tier: RiskTier,
    /// Sum of tier weights over every matched phrase.
    pub numeric_score: u32,
    /// One flag per matched phrase, most severe tier first.
    pub flags: Vec<MatchFlag>,
}

impl ScoreResult {
    /// The result for a message that matched nothing.
    pub fn empty() -> Self {
        Self {
            tier: RiskTier::None,
            numeric_score: 0,
            flags: Vec::new(),
        }
    }

    /// Number of flags at the given tier.
    pub fn count_at(&self, tier: RiskTier) -> usize {
        self.flags.iter().filter(|f| f.tier == tier).count()
    }

    /// Flag labels in result order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(|f| f.label.as_str())
    }
}

/// Notification that a conversation moved into an escalated phase.
///
/// Produced once per qualifying transition. Delivering it is the caller's
/// job; the engine never retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationEvent {
    pub conversation_id: ConversationId,
    pub user_ref: UserRef,
    pub from_tier: RiskTier,
    pub to_tier: RiskTier,
    pub target: EscalationTarget,
    pub timestamp: DateTime<Utc>,
    /// Flag labels of the message that triggered the transition.
    pub flags: Vec<String>,
}

/// Everything the caller needs after one message: the score, the state to
/// persist, and the event to forward (if any).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageResult {
    pub score_result: ScoreResult,
    pub updated_state: ConversationRiskState,
    pub escalation_event: Option<EscalationEvent>,
}

impl TriageResult {
    pub fn escalated(&self) -> bool {
        self.escalation_event.is_some()
    }
}
