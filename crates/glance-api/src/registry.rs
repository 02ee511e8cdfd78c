// Topic registry / broadcaster
//
// Maps a website id to the set of live subscriber connections and fans a
// frame out to all of them. This is the only shared mutable state on the
// ingestion path, so it is encapsulated behind subscribe/unsubscribe/publish
// and nothing else may reach its map.
//
// Each subscriber is an unbounded sender feeding that connection's writer
// task, so publishing never blocks on a slow subscriber's socket: the lock
// covers only the map, and the sends are channel pushes, not network I/O.
// A registry is process-local; it starts empty on every boot and is rebuilt
// by subscribers reconnecting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;
use uuid::Uuid;

use glance_core::LiveMessage;

/// Handle identifying one subscription, needed to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberKey {
    website_id: Uuid,
    id: u64,
}

#[derive(Default)]
struct Topic {
    subscribers: HashMap<u64, UnboundedSender<String>>,
}

/// Registry of live subscriber connections, keyed by website id
#[derive(Default)]
pub struct TopicRegistry {
    topics: RwLock<HashMap<Uuid, Topic>>,
    next_id: AtomicU64,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under a topic, creating the topic if absent.
    /// The acknowledgment frame is queued before anything can be published,
    /// so it is always the first frame the subscriber sees.
    pub async fn subscribe(&self, website_id: Uuid) -> (SubscriberKey, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(LiveMessage::Connected { website_id }.to_frame());

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.topics
            .write()
            .await
            .entry(website_id)
            .or_default()
            .subscribers
            .insert(id, tx);

        tracing::debug!(%website_id, subscriber = id, "subscriber registered");
        (SubscriberKey { website_id, id }, rx)
    }

    /// Remove a connection; a topic with no subscribers left is deleted
    pub async fn unsubscribe(&self, key: SubscriberKey) {
        let mut topics = self.topics.write().await;
        if let Some(topic) = topics.get_mut(&key.website_id) {
            topic.subscribers.remove(&key.id);
            if topic.subscribers.is_empty() {
                topics.remove(&key.website_id);
            }
        }
        tracing::debug!(website_id = %key.website_id, subscriber = key.id, "subscriber removed");
    }

    /// Fan a message out to every current subscriber of the topic. Returns
    /// how many subscribers accepted the frame. A closed receiver is skipped;
    /// its connection task unsubscribes itself on close.
    pub async fn publish(&self, website_id: Uuid, message: &LiveMessage) -> usize {
        let frame = message.to_frame();
        let senders: Vec<UnboundedSender<String>> = {
            let topics = self.topics.read().await;
            match topics.get(&website_id) {
                Some(topic) => topic.subscribers.values().cloned().collect(),
                None => return 0,
            }
        };

        senders
            .iter()
            .filter(|tx| tx.send(frame.clone()).is_ok())
            .count()
    }

    /// Number of topics currently held
    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }

    /// Number of subscribers on one topic
    pub async fn subscriber_count(&self, website_id: Uuid) -> usize {
        self.topics
            .read()
            .await
            .get(&website_id)
            .map(|t| t.subscribers.len())
            .unwrap_or(0)
    }
}
