//! Structured observability hooks for triage lifecycle events.
//!
//! This module provides:
//! - Conversation-scoped tracing spans via the `ConversationSpan` RAII guard
//! - Emission functions for key events: lexicon load, message scored,
//!   escalation, rejected state, sink failure
//!
//! Message text is never logged; only tiers, scores and flag labels.

use tracing::{info, warn};

use crate::domain::{EscalationTarget, RiskTier};

/// RAII guard that enters a conversation-scoped span while a message is triaged.
///
/// # Example
///
/// ```ignore
/// let _span = ConversationSpan::enter("conv-123");
/// // every event emitted here carries conversation_id = "conv-123"
/// ```
pub struct ConversationSpan {
    _span: tracing::span::EnteredSpan,
}

impl ConversationSpan {
    pub fn enter(conversation_id: &str) -> Self {
        let span = tracing::info_span!("triage.conversation", conversation_id = %conversation_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a lexicon was installed into an engine.
pub fn emit_lexicon_loaded(version: &str, phrases: usize, fingerprint: &str) {
    info!(
        event = "triage.lexicon_loaded",
        version = %version,
        phrases = phrases,
        fingerprint = %fingerprint,
    );
}

/// Emit event: one message scored.
pub fn emit_message_scored(conversation_id: &str, tier: RiskTier, score: u32, flags: usize) {
    info!(
        event = "triage.message_scored",
        conversation_id = %conversation_id,
        tier = %tier,
        score = score,
        flags = flags,
    );
}

/// Emit event: conversation escalated (warn level, so it survives quiet log filters).
pub fn emit_escalated(
    conversation_id: &str,
    from_tier: RiskTier,
    to_tier: RiskTier,
    target: EscalationTarget,
) {
    warn!(
        event = "triage.escalated",
        conversation_id = %conversation_id,
        from_tier = %from_tier,
        to_tier = %to_tier,
        target = %target,
    );
}

/// Emit event: a caller handed the engine a state it refused.
pub fn emit_state_rejected(conversation_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "triage.state_rejected", conversation_id = %conversation_id, error = %error);
}

/// Emit event: an escalation event could not be delivered to its sink.
pub fn emit_sink_failed(
    conversation_id: &str,
    target: EscalationTarget,
    error: &dyn std::fmt::Display,
) {
    warn!(
        event = "triage.sink_failed",
        conversation_id = %conversation_id,
        target = %target,
        error = %error,
    );
}
