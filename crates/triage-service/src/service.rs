//! The caller side of the engine contract.
//!
//! [`TriageService`] owns what the engine deliberately leaves out:
//! loading and saving state, serializing messages per conversation, and
//! handing escalation events to a sink.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::instrument;

use triage_core::obs::emit_sink_failed;
use triage_core::{
    ConversationId, ConversationRiskState, TriageEngine, TriageResult, UserRef, METRICS,
};

use crate::error::ServiceResult;
use crate::sink::EscalationSink;
use crate::store::ConversationStore;

type ConversationLock = Arc<tokio::sync::Mutex<()>>;

/// A checked-out per-conversation lock. Dropping it removes the map entry
/// once nobody else holds or waits on the lock, including when the owning
/// future is cancelled mid-wait.
struct LockEntry<'a> {
    locks: &'a Mutex<HashMap<ConversationId, ConversationLock>>,
    id: ConversationId,
    lock: ConversationLock,
}

impl Drop for LockEntry<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // One reference in the map, one here.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.id);
        }
    }
}

/// Runs the engine against a store and a sink.
///
/// Messages on the same conversation are processed strictly one at a time
/// (load, process, save and publish all happen under one per-conversation
/// lock), so a stale copy of the state can never overwrite a higher tier.
/// Different conversations run in parallel.
pub struct TriageService<S: ?Sized, K: ?Sized> {
    engine: TriageEngine,
    store: Arc<S>,
    sink: Arc<K>,
    locks: Mutex<HashMap<ConversationId, ConversationLock>>,
}

impl<S, K> TriageService<S, K>
where
    S: ConversationStore + ?Sized,
    K: EscalationSink + ?Sized,
{
    pub fn new(engine: TriageEngine, store: Arc<S>, sink: Arc<K>) -> Self {
        Self {
            engine,
            store,
            sink,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &TriageEngine {
        &self.engine
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn conversation_lock(&self, id: &ConversationId) -> LockEntry<'_> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let lock = locks.entry(id.clone()).or_default().clone();
        LockEntry {
            locks: &self.locks,
            id: id.clone(),
            lock,
        }
    }

    /// Triage one incoming message.
    ///
    /// Creates a fresh state when the store has none for this conversation.
    /// A sink failure is logged and counted but does not fail the call: the
    /// updated state is already saved and the event is in the result.
    ///
    /// # Errors
    ///
    /// Store failures and engine contract violations propagate.
    #[instrument(skip_all, fields(conversation_id = %conversation_id))]
    pub async fn handle_message(
        &self,
        conversation_id: &ConversationId,
        user_ref: &UserRef,
        message_text: &str,
    ) -> ServiceResult<TriageResult> {
        let entry = self.conversation_lock(conversation_id);
        let _guard = entry.lock.lock().await;
        self.process_locked(conversation_id, user_ref, message_text)
            .await
    }

    async fn process_locked(
        &self,
        conversation_id: &ConversationId,
        user_ref: &UserRef,
        message_text: &str,
    ) -> ServiceResult<TriageResult> {
        let state = self
            .store
            .load(conversation_id)
            .await?
            .unwrap_or_else(|| ConversationRiskState::new(conversation_id.clone()));

        let result =
            self.engine
                .process(conversation_id, state, message_text, user_ref, Utc::now())?;

        self.store.save(&result.updated_state).await?;

        if let Some(event) = &result.escalation_event {
            if let Err(err) = self.sink.publish(event).await {
                METRICS.inc_sink_failures();
                emit_sink_failed(conversation_id.as_str(), event.target, &err);
            }
        }

        Ok(result)
    }

    /// Conversations escalated at or after `since`, most recent first.
    pub async fn escalated_since(
        &self,
        since: DateTime<Utc>,
    ) -> ServiceResult<Vec<ConversationRiskState>> {
        Ok(self.store.list_escalated_since(since).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::store::MemoryConversationStore;
    use triage_core::{EscalationTarget, RiskTier};

    fn service() -> TriageService<MemoryConversationStore, MemorySink> {
        TriageService::new(
            TriageEngine::default(),
            Arc::new(MemoryConversationStore::new()),
            Arc::new(MemorySink::new()),
        )
    }

    #[tokio::test]
    async fn test_first_message_creates_state() {
        let svc = service();
        let id = ConversationId::from("conv-1");
        let r = svc
            .handle_message(&id, &UserRef::anonymous(), "hi")
            .await
            .unwrap();
        assert_eq!(r.updated_state.current_tier, RiskTier::None);
        let stored = svc.store().load(&id).await.unwrap().unwrap();
        assert_eq!(stored, r.updated_state);
    }

    #[tokio::test]
    async fn test_state_carries_across_messages() {
        let svc = service();
        let id = ConversationId::from("conv-2");
        let user = UserRef::from("anon-2");
        svc.handle_message(&id, &user, "I feel hopeless").await.unwrap();
        let r = svc.handle_message(&id, &user, "ok").await.unwrap();
        assert_eq!(r.updated_state.current_tier, RiskTier::High);
        assert_eq!(
            r.updated_state.escalation_target,
            Some(EscalationTarget::Counselor)
        );
        assert!(r.escalation_event.is_none());
    }

    #[tokio::test]
    async fn test_lock_entries_are_released() {
        let svc = service();
        let id = ConversationId::from("conv-3");
        svc.handle_message(&id, &UserRef::anonymous(), "hello")
            .await
            .unwrap();
        assert!(svc.locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_waiter_releases_lock_entry() {
        let svc = service();
        let id = ConversationId::from("conv-4");

        let held = svc.conversation_lock(&id);
        let guard = held.lock.lock().await;

        // Waits behind `guard` and is dropped before it ever gets the lock.
        let user = UserRef::anonymous();
        let waiter = svc.handle_message(&id, &user, "hello");
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(20), waiter).await;
        assert!(timed_out.is_err());
        assert_eq!(svc.locks.lock().unwrap().len(), 1);

        drop(guard);
        drop(held);
        assert!(svc.locks.lock().unwrap().is_empty());
    }
}
