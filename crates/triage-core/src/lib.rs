//! Conversational risk-triage engine.
//!
//! Scores free-text chat messages for self-harm and crisis language, folds
//! the scores into a per-conversation risk state that never downgrades, and
//! decides when a conversation must be escalated to a counselor or to the
//! crisis hotline.
//!
//! Pipeline, leaves first:
//!
//! - [`lexicon`]: versioned, disjoint phrase sets per tier
//! - [`scorer`]: text -> [`ScoreResult`]
//! - [`tracker`]: monotonic fold into [`ConversationRiskState`]
//! - [`decider`]: escalation state machine
//! - [`orchestrator`]: [`TriageEngine::process`], returning a [`TriageResult`]
//!
//! The engine performs no I/O. Persisting the updated state and delivering
//! the [`EscalationEvent`] belong to the caller.

pub mod contacts;
pub mod decider;
pub mod domain;
pub mod lexicon;
pub mod metrics;
pub mod obs;
pub mod orchestrator;
pub mod scorer;
pub mod telemetry;
pub mod tracker;

pub use contacts::EscalationContacts;
pub use decider::{Escalation, EscalationPhase};
pub use domain::{
    ConversationId, ConversationRiskState, EscalationEvent, EscalationTarget, InvalidStateError,
    LexiconLoadError, MatchFlag, PersistedRiskState, Result, RiskTier, ScoreResult, TriageError,
    TriageResult, UserRef,
};
pub use lexicon::{Lexicon, LexiconDocument, LexiconEntry};
pub use metrics::METRICS;
pub use obs::ConversationSpan;
pub use orchestrator::TriageEngine;
pub use telemetry::init_tracing;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
