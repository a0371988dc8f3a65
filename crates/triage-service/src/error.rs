//! Error types for the triage service layer.

use thiserror::Error;

/// Errors from a conversation store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored record decoded but breaks the state invariants.
    #[error("corrupt record for conversation {conversation_id}: {source}")]
    Corrupt {
        conversation_id: String,
        #[source]
        source: triage_core::InvalidStateError,
    },

    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors from an escalation sink. Logged by the service, never propagated.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink closed")]
    Closed,

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Errors surfaced by [`crate::TriageService`].
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("triage error: {0}")]
    Triage(#[from] triage_core::TriageError),
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
