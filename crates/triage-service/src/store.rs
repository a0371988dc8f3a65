//! Conversation risk-state persistence.
//!
//! The engine consumes storage as a record store keyed by conversation id.
//! `ConversationStore` is that boundary; [`MemoryConversationStore`] is the
//! in-memory implementation for tests and single-process deployments, and
//! [`crate::FsConversationStore`] keeps one JSON file per conversation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use triage_core::{ConversationId, ConversationRiskState};

use crate::error::{StoreError, StoreResult};

/// Record store for conversation risk states.
///
/// Guarantees:
/// - `load(id)` returns the state last passed to `save` for that id.
/// - `save` overwrites; there is no history.
/// - Records are never deleted through this trait.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Load a conversation's state. `None` if it was never saved.
    async fn load(&self, id: &ConversationId) -> StoreResult<Option<ConversationRiskState>>;

    /// Persist a conversation's state.
    async fn save(&self, state: &ConversationRiskState) -> StoreResult<()>;

    /// Conversations escalated at or after `since`, most recent first.
    async fn list_escalated_since(
        &self,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<ConversationRiskState>>;
}

/// Sort and filter helper shared by store implementations.
pub(crate) fn escalated_since(
    states: impl IntoIterator<Item = ConversationRiskState>,
    since: DateTime<Utc>,
) -> Vec<ConversationRiskState> {
    let mut out: Vec<_> = states
        .into_iter()
        .filter(|s| s.escalated && s.escalated_at.is_some_and(|at| at >= since))
        .collect();
    out.sort_by(|a, b| b.escalated_at.cmp(&a.escalated_at));
    out
}

/// In-memory store backed by a `HashMap<ConversationId, state>`.
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    states: Mutex<HashMap<ConversationId, ConversationRiskState>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> StoreResult<std::sync::MutexGuard<'_, HashMap<ConversationId, ConversationRiskState>>>
    {
        self.states
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn load(&self, id: &ConversationId) -> StoreResult<Option<ConversationRiskState>> {
        Ok(self.lock()?.get(id).cloned())
    }

    async fn save(&self, state: &ConversationRiskState) -> StoreResult<()> {
        self.lock()?
            .insert(state.conversation_id.clone(), state.clone());
        Ok(())
    }

    async fn list_escalated_since(
        &self,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<ConversationRiskState>> {
        let states: Vec<_> = self.lock()?.values().cloned().collect();
        Ok(escalated_since(states, since))
    }
}
