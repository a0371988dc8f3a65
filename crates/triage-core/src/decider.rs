//! Escalation state machine.
//!
//! ```text
//! Calm (none/medium) ──high──▶ EscalatedCounselor ──critical──▶ EscalatedHotline
//!   │                                                               ▲
//!   └───────────────────────────critical────────────────────────────┘
//! ```
//!
//! The machine only moves along the tier axis, and the tier never falls, so
//! once a conversation reaches `EscalatedHotline` every later message is a
//! no-op. `Watching` (high but not escalated) is only reachable through a
//! state that was stored that way; ordinary processing escalates on the
//! first high message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ConversationRiskState, EscalationTarget, RiskTier};

/// Escalation phase derived from a conversation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationPhase {
    Calm,
    Watching,
    EscalatedCounselor,
    EscalatedHotline,
}

impl EscalationPhase {
    pub fn of(state: &ConversationRiskState) -> Self {
        match (state.escalated, state.escalation_target) {
            (true, Some(EscalationTarget::Hotline)) => Self::EscalatedHotline,
            (true, _) => Self::EscalatedCounselor,
            (false, _) if state.current_tier.is_escalation_worthy() => Self::Watching,
            (false, _) => Self::Calm,
        }
    }

    pub fn is_escalated(self) -> bool {
        matches!(self, Self::EscalatedCounselor | Self::EscalatedHotline)
    }
}

/// A transition the decider wants applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Escalation {
    /// Tier before the triggering message was folded in.
    pub from_tier: RiskTier,
    /// Tier after the fold.
    pub to_tier: RiskTier,
    pub target: EscalationTarget,
}

/// Decide whether the freshly folded state must escalate.
///
/// `previous_tier` is the tier before the fold; `state` is the post-fold
/// state. Returns `None` when nothing changes, which makes repeated messages
/// at the same tier idempotent.
pub fn decide(previous_tier: RiskTier, state: &ConversationRiskState) -> Option<Escalation> {
    let tier = state.current_tier;

    if tier == RiskTier::Critical && state.escalation_target != Some(EscalationTarget::Hotline) {
        return Some(Escalation {
            from_tier: previous_tier,
            to_tier: tier,
            target: EscalationTarget::Hotline,
        });
    }

    if tier == RiskTier::High && previous_tier < RiskTier::High && !state.escalated {
        return Some(Escalation {
            from_tier: previous_tier,
            to_tier: tier,
            target: EscalationTarget::Counselor,
        });
    }

    None
}

/// Apply a decided transition to the state.
pub fn apply(state: &mut ConversationRiskState, escalation: &Escalation, now: DateTime<Utc>) {
    state.escalated = true;
    state.escalated_at = Some(now);
    state.escalation_target = Some(escalation.target);
}
