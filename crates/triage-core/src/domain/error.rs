//! Error taxonomy for the triage engine.
//!
//! Every variant here is a contract violation or a fatal initialisation
//! failure. Nothing is retried and nothing degrades silently: an engine that
//! under-detects crisis language is worse than one that refuses to start.

/// Errors produced while building a lexicon.
#[derive(Debug, thiserror::Error)]
pub enum LexiconLoadError {
    #[error("failed to read lexicon file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed lexicon document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("lexicon version must not be empty")]
    EmptyVersion,

    #[error("empty phrase in {tier} tier at position {index}")]
    EmptyPhrase { tier: String, index: usize },

    #[error("lexicon has no critical phrases")]
    NoCriticalPhrases,
}

/// Errors raised when a conversation risk state cannot be trusted.
#[derive(Debug, thiserror::Error)]
pub enum InvalidStateError {
    #[error("conversation id mismatch: expected {expected}, got {actual}")]
    ConversationMismatch { expected: String, actual: String },

    #[error("conversation {conversation_id} is escalated without an escalation timestamp")]
    MissingEscalatedAt { conversation_id: String },

    #[error("conversation {conversation_id} is escalated without a target")]
    MissingTarget { conversation_id: String },

    #[error("conversation {conversation_id} is escalated at tier {tier}, below high")]
    EscalatedBelowHigh { conversation_id: String, tier: String },

    #[error("conversation {conversation_id} carries escalation details but is not escalated")]
    DanglingEscalation { conversation_id: String },

    #[error("unknown risk tier rank: {0}")]
    UnknownTierRank(u8),
}

/// Top-level engine error.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("invalid state: {0}")]
    InvalidState(#[from] InvalidStateError),

    #[error("lexicon load failed: {0}")]
    LexiconLoad(#[from] LexiconLoadError),
}

/// Result type for triage engine operations.
pub type Result<T> = std::result::Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_display() {
        let err = TriageError::from(InvalidStateError::ConversationMismatch {
            expected: "conv-a".to_string(),
            actual: "conv-b".to_string(),
        });
        let msg = err.to_string();
        assert!(msg.contains("invalid state"));
        assert!(msg.contains("conv-a"));
        assert!(msg.contains("conv-b"));
    }

    #[test]
    fn test_lexicon_error_display() {
        let err = TriageError::from(LexiconLoadError::EmptyPhrase {
            tier: "high".to_string(),
            index: 3,
        });
        assert!(err.to_string().contains("lexicon load failed"));
        assert!(err.to_string().contains("high tier at position 3"));
    }

    #[test]
    fn test_malformed_json_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = LexiconLoadError::from(json_err);
        assert!(matches!(err, LexiconLoadError::Malformed(_)));
    }
}
