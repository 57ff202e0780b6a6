//! Push dispatch seam.
//!
//! The engine emits events; getting them onto a device is someone else's job.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Kinds of notification the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PushEventKind {
    PingCreated,
    PingDelivered,
    HandshakeReceived,
    CheckInAlerted,
}

impl PushEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushEventKind::PingCreated => "ping_created",
            PushEventKind::PingDelivered => "ping_delivered",
            PushEventKind::HandshakeReceived => "handshake_received",
            PushEventKind::CheckInAlerted => "check_in_alerted",
        }
    }
}

/// A notification addressed to one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushEvent {
    /// Recipient of the notification.
    pub user_id: String,
    pub kind: PushEventKind,
    pub payload: serde_json::Value,
}

impl PushEvent {
    pub fn new(user_id: impl Into<String>, kind: PushEventKind, payload: serde_json::Value) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            payload,
        }
    }
}

/// Push dispatch failure.
#[derive(Debug, Error)]
#[error("push dispatch failed: {0}")]
pub struct PushError(pub String);

/// Destination for push events (FCM, a queue, tests, ...).
#[async_trait]
pub trait PushSink: Send + Sync {
    async fn dispatch(&self, event: PushEvent) -> Result<(), PushError>;
}

/// Deliver an event without letting a sink failure reach the caller.
pub(crate) async fn fire_and_forget(sink: &dyn PushSink, event: PushEvent) {
    let user_id = event.user_id.clone();
    let kind = event.kind;
    if let Err(err) = sink.dispatch(event).await {
        tracing::warn!(user_id = %user_id, kind = kind.as_str(), error = %err, "Push dispatch failed");
    }
}

/// A sink that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoOpSink;

#[async_trait]
impl PushSink for NoOpSink {
    async fn dispatch(&self, _event: PushEvent) -> Result<(), PushError> {
        Ok(())
    }
}

/// A sink that logs every event.
#[derive(Debug, Clone, Default)]
pub struct LoggingSink;

#[async_trait]
impl PushSink for LoggingSink {
    async fn dispatch(&self, event: PushEvent) -> Result<(), PushError> {
        tracing::info!(
            user_id = %event.user_id,
            kind = event.kind.as_str(),
            payload = %event.payload,
            "Push event"
        );
        Ok(())
    }
}

/// A sink that keeps events in memory for inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PushEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything dispatched so far.
    pub fn events(&self) -> Vec<PushEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Events of one kind.
    pub fn of_kind(&self, kind: PushEventKind) -> Vec<PushEvent> {
        self.events().into_iter().filter(|e| e.kind == kind).collect()
    }
}

#[async_trait]
impl PushSink for RecordingSink {
    async fn dispatch(&self, event: PushEvent) -> Result<(), PushError> {
        self.events
            .lock()
            .map_err(|_| PushError("recording sink poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    #[async_trait]
    impl PushSink for FailingSink {
        async fn dispatch(&self, _event: PushEvent) -> Result<(), PushError> {
            Err(PushError("device unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let event = PushEvent::new("bob", PushEventKind::PingCreated, serde_json::json!({}));
        fire_and_forget(&FailingSink, event).await;
    }

    #[tokio::test]
    async fn test_recording_sink_filters_by_kind() {
        let sink = RecordingSink::new();
        fire_and_forget(
            &sink,
            PushEvent::new("bob", PushEventKind::PingCreated, serde_json::json!({"id": 1})),
        )
        .await;
        fire_and_forget(
            &sink,
            PushEvent::new("alice", PushEventKind::PingDelivered, serde_json::json!({"id": 1})),
        )
        .await;

        assert_eq!(sink.events().len(), 2);
        let delivered = sink.of_kind(PushEventKind::PingDelivered);
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].user_id, "alice");
    }
}
