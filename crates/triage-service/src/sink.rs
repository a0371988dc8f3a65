//! Destinations for escalation events.
//!
//! The engine returns events as values; the service hands each one to an
//! [`EscalationSink`] exactly once. Sinks own their delivery guarantees.
//! The service never retries.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use triage_core::EscalationEvent;

use crate::error::SinkError;

/// Receives escalation events from the service.
#[async_trait]
pub trait EscalationSink: Send + Sync {
    async fn publish(&self, event: &EscalationEvent) -> Result<(), SinkError>;
}

/// Fan-out to every subscribed admin observer.
///
/// Backed by a tokio broadcast channel. Publishing with nobody subscribed
/// succeeds: the event was offered, and having no observers is an
/// operational condition, not a triage failure.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<EscalationEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Register a new observer.
    pub fn subscribe(&self) -> broadcast::Receiver<EscalationEvent> {
        self.tx.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl EscalationSink for BroadcastSink {
    async fn publish(&self, event: &EscalationEvent) -> Result<(), SinkError> {
        match self.tx.send(event.clone()) {
            Ok(observers) => {
                debug!(conversation_id = %event.conversation_id, observers, "escalation broadcast");
            }
            Err(_) => {
                debug!(
                    conversation_id = %event.conversation_id,
                    "escalation broadcast with no observers"
                );
            }
        }
        Ok(())
    }
}

/// Records events in memory. Can be switched to fail every publish.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<EscalationEvent>>,
    fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every publish fails with `SinkError::Delivery`.
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Events delivered so far, in order.
    pub fn events(&self) -> Vec<EscalationEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EscalationSink for MemorySink {
    async fn publish(&self, event: &EscalationEvent) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Delivery("memory sink set to fail".into()));
        }
        self.events
            .lock()
            .map_err(|_| SinkError::Closed)?
            .push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use triage_core::{ConversationId, EscalationTarget, RiskTier, UserRef};

    fn event(id: &str) -> EscalationEvent {
        EscalationEvent {
            conversation_id: ConversationId::from(id),
            user_ref: UserRef::from("anon-1"),
            from_tier: RiskTier::None,
            to_tier: RiskTier::Critical,
            target: EscalationTarget::Hotline,
            timestamp: Utc::now(),
            flags: vec!["crisis:suicide".into()],
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_observer() {
        let sink = BroadcastSink::new(16);
        let mut admin_a = sink.subscribe();
        let mut admin_b = sink.subscribe();
        assert_eq!(sink.observer_count(), 2);

        sink.publish(&event("conv-1")).await.unwrap();

        assert_eq!(admin_a.recv().await.unwrap().conversation_id.as_str(), "conv-1");
        assert_eq!(admin_b.recv().await.unwrap().conversation_id.as_str(), "conv-1");
    }

    #[tokio::test]
    async fn test_broadcast_without_observers_is_ok() {
        let sink = BroadcastSink::new(4);
        assert!(sink.publish(&event("conv-1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_memory_sink_records() {
        let sink = MemorySink::new();
        sink.publish(&event("a")).await.unwrap();
        sink.publish(&event("b")).await.unwrap();
        let ids: Vec<_> = sink
            .events()
            .into_iter()
            .map(|e| e.conversation_id.0)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_failing_sink() {
        let sink = MemorySink::failing();
        assert!(matches!(
            sink.publish(&event("a")).await,
            Err(SinkError::Delivery(_))
        ));
        assert!(sink.events().is_empty());
    }
}
