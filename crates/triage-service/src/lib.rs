//! Service layer around the triage engine.
//!
//! - [`ConversationStore`]: record store keyed by conversation id, with
//!   [`MemoryConversationStore`] and [`FsConversationStore`]
//! - [`EscalationSink`]: where escalation events go, with [`BroadcastSink`]
//!   (fan-out to admin observers) and [`MemorySink`]
//! - [`TriageService`]: per-conversation serialized load, triage, save, publish

pub mod error;
pub mod fs_store;
pub mod service;
pub mod sink;
pub mod store;

pub use error::{ServiceError, ServiceResult, SinkError, StoreError, StoreResult};
pub use fs_store::FsConversationStore;
pub use service::TriageService;
pub use sink::{BroadcastSink, EscalationSink, MemorySink};
pub use store::{ConversationStore, MemoryConversationStore};
