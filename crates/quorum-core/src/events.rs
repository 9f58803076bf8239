use quorum_models::poll::Poll;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollEventKind {
    PollCreate,
    PollVote,
    PollClose,
    PollDelete,
}

impl PollEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PollEventKind::PollCreate => "POLL_CREATE",
            PollEventKind::PollVote => "POLL_VOTE",
            PollEventKind::PollClose => "POLL_CLOSE",
            PollEventKind::PollDelete => "POLL_DELETE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollEvent {
    pub kind: PollEventKind,
    pub poll_id: String,
    pub channel_id: String,
    pub payload: serde_json::Value,
}

/// Broadcast-based bus the messaging layer subscribes to for poll activity.
///
/// The server itself only attaches an event log; a chat connector posting
/// updates into channels registers here with [`EventBus::subscribe`] and
/// drops its registration with [`EventBus::unsubscribe`].
#[derive(Clone)]
pub struct EventBus {
    capacity: usize,
    subscribers: Arc<RwLock<HashMap<String, Subscription>>>,
}

#[derive(Clone)]
struct Subscription {
    /// `None` receives events from every channel.
    channel_ids: Option<HashSet<String>>,
    sender: broadcast::Sender<PollEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            subscribers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Subscribe to events from the listed channels only.
    pub fn subscribe(
        &self,
        subscriber_id: impl Into<String>,
        channel_ids: &[String],
    ) -> broadcast::Receiver<PollEvent> {
        self.register(
            subscriber_id.into(),
            Some(channel_ids.iter().cloned().collect()),
        )
    }

    /// Subscribe to events from every channel.
    pub fn subscribe_all(&self, subscriber_id: impl Into<String>) -> broadcast::Receiver<PollEvent> {
        self.register(subscriber_id.into(), None)
    }

    fn register(
        &self,
        subscriber_id: String,
        channel_ids: Option<HashSet<String>>,
    ) -> broadcast::Receiver<PollEvent> {
        let (sender, receiver) = broadcast::channel(self.capacity.max(16));
        let mut subscribers = match self.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subscribers.insert(
            subscriber_id,
            Subscription {
                channel_ids,
                sender,
            },
        );
        receiver
    }

    pub fn unsubscribe(&self, subscriber_id: &str) {
        let mut subscribers = match self.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subscribers.remove(subscriber_id);
    }

    pub fn subscriber_count(&self) -> usize {
        match self.subscribers.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    fn subscription_matches(subscription: &Subscription, event: &PollEvent) -> bool {
        match subscription.channel_ids.as_ref() {
            Some(channels) => channels.contains(&event.channel_id),
            None => true,
        }
    }

    pub fn publish(&self, event: PollEvent) {
        let senders: Vec<broadcast::Sender<PollEvent>> = {
            let subscribers = match self.subscribers.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };

            subscribers
                .values()
                .filter(|subscription| Self::subscription_matches(subscription, &event))
                .map(|subscription| subscription.sender.clone())
                .collect()
        };

        for sender in senders {
            // No live receiver is fine; delivery is best effort.
            let _ = sender.send(event.clone());
        }
    }

    /// Helper: publish `kind` for `poll` with the poll itself as payload.
    pub fn dispatch(&self, kind: PollEventKind, poll: &Poll) {
        let payload = serde_json::to_value(poll).unwrap_or(serde_json::Value::Null);
        self.publish(PollEvent {
            kind,
            poll_id: poll.id.clone(),
            channel_id: poll.channel_id.clone(),
            payload,
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
