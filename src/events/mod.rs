use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::types::WordStatus;

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum VocabEvent {
    #[serde(rename = "STATUS_CHANGED")]
    StatusChanged(StatusChangedPayload),

    #[serde(rename = "ENTRY_REMOVED")]
    EntryRemoved(EntryRemovedPayload),

    #[serde(rename = "IMPORTANT_MARKED")]
    ImportantMarked(ImportantMarkedPayload),

    #[serde(rename = "MERGE_PROPOSED")]
    MergeProposed(MergeProposedPayload),

    #[serde(rename = "SNAPSHOT_REPLACED")]
    SnapshotReplaced(SnapshotReplacedPayload),

    #[serde(rename = "SYNC_FAILED")]
    SyncFailed(SyncFailedPayload),

    #[serde(rename = "NOTICE")]
    Notice(NoticePayload),
}

impl VocabEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            VocabEvent::StatusChanged(_) => "STATUS_CHANGED",
            VocabEvent::EntryRemoved(_) => "ENTRY_REMOVED",
            VocabEvent::ImportantMarked(_) => "IMPORTANT_MARKED",
            VocabEvent::MergeProposed(_) => "MERGE_PROPOSED",
            VocabEvent::SnapshotReplaced(_) => "SNAPSHOT_REPLACED",
            VocabEvent::SyncFailed(_) => "SYNC_FAILED",
            VocabEvent::Notice(_) => "NOTICE",
        }
    }

    /// Vocabulary key the event concerns, when it concerns a single key.
    pub fn key(&self) -> Option<&str> {
        match self {
            VocabEvent::StatusChanged(p) => Some(&p.key),
            VocabEvent::EntryRemoved(p) => Some(&p.key),
            VocabEvent::ImportantMarked(p) => Some(&p.key),
            VocabEvent::SyncFailed(p) => Some(&p.key),
            VocabEvent::MergeProposed(_)
            | VocabEvent::SnapshotReplaced(_)
            | VocabEvent::Notice(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedPayload {
    pub key: String,
    pub status: WordStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRemovedPayload {
    pub key: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportantMarkedPayload {
    pub key: String,
    pub important: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeProposedPayload {
    pub first: String,
    pub second: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotReplacedPayload {
    pub entry_count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncFailedPayload {
    pub key: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticePayload {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub id: String,
    pub event: VocabEvent,
    pub created_at: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(event: VocabEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event,
            created_at: Utc::now(),
        }
    }

    /// JSON wire form for host bridges (webview postMessage, SSE).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "event": self.event,
            "createdAt": self.created_at.to_rfc3339(),
        })
    }
}

type SubscriberId = String;

struct Subscriber {
    event_types: Option<Vec<String>>,
    sender: broadcast::Sender<EventEnvelope>,
}

impl Subscriber {
    fn matches(&self, envelope: &EventEnvelope) -> bool {
        match &self.event_types {
            Some(event_types) => {
                event_types.iter().any(|t| t == envelope.event.event_type())
            }
            None => true,
        }
    }
}

/// In-process vocabulary event bus.
///
/// Mutating surfaces publish; list views, quiz views and the host shell
/// subscribe. Publishing never blocks: a subscriber that lags past the
/// channel capacity drops oldest events.
pub struct EventBus {
    global_sender: broadcast::Sender<EventEnvelope>,
    subscribers: RwLock<HashMap<SubscriberId, Subscriber>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (global_sender, _) = broadcast::channel(capacity.max(1));
        Self {
            global_sender,
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to every event.
    pub fn subscribe_all(&self) -> broadcast::Receiver<EventEnvelope> {
        self.global_sender.subscribe()
    }

    /// Subscribe to a fixed set of event types. Returns the subscriber id
    /// (for [`EventBus::unsubscribe`]) and the receiving end.
    pub fn subscribe(
        &self,
        event_types: Vec<String>,
    ) -> (SubscriberId, broadcast::Receiver<EventEnvelope>) {
        let (sender, receiver) = broadcast::channel(CHANNEL_CAPACITY);
        let id = uuid::Uuid::new_v4().to_string();
        self.subscribers.write().insert(
            id.clone(),
            Subscriber {
                event_types: Some(event_types),
                sender,
            },
        );
        (id, receiver)
    }

    pub fn unsubscribe(&self, id: &str) {
        self.subscribers.write().remove(id);
    }

    pub fn publish(&self, event: VocabEvent) {
        let envelope = EventEnvelope::new(event);
        debug!(
            event_type = envelope.event.event_type(),
            event_id = %envelope.id,
            "publishing vocabulary event"
        );

        // Receiver-less channels are fine: the send just reports zero
        // listeners.
        let _ = self.global_sender.send(envelope.clone());

        let subscribers = self.subscribers.read();
        for subscriber in subscribers.values() {
            if subscriber.matches(&envelope) {
                let _ = subscriber.sender.send(envelope.clone());
            }
        }
    }
}
