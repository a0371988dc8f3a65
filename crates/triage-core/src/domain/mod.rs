//! Domain models for the triage engine.
//!
//! Canonical definitions for the core entities:
//! - `RiskTier`: ordered severity shared by messages and conversations
//! - `ScoreResult` / `MatchFlag`: what one message matched
//! - `ConversationRiskState`: the running state of one conversation
//! - `TriageResult` / `EscalationEvent`: what the caller persists and forwards

pub mod error;
pub mod ids;
pub mod persisted;
pub mod result;
pub mod state;
pub mod tier;

pub use error::{InvalidStateError, LexiconLoadError, Result, TriageError};
pub use ids::{ConversationId, UserRef};
pub use persisted::PersistedRiskState;
pub use result::{EscalationEvent, MatchFlag, ScoreResult, TriageResult};
pub use state::{ConversationRiskState, EscalationTarget};
pub use tier::RiskTier;
