//! In-process publish/subscribe for live locations, one topic per SOS.

use futures::stream::{self, Stream};
use setu_core::domain::LiveLocation;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

pub const TOPIC_CAPACITY: usize = 16;

type Topics = Mutex<HashMap<String, broadcast::Sender<LiveLocation>>>;

#[derive(Default)]
pub struct LocationHub {
    topics: Arc<Topics>,
}

impl LocationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many live subscribers received the update.
    pub fn publish(&self, topic: &str, payload: LiveLocation) -> usize {
        let mut topics = lock(&self.topics);
        let delivered = topics
            .get(topic)
            .and_then(|sender| sender.send(payload).ok())
            .unwrap_or(0);
        if delivered == 0 {
            topics.remove(topic);
        }
        delivered
    }

    /// Updates published after this call. A subscriber that falls more than
    /// `TOPIC_CAPACITY` updates behind skips ahead to the newest ones. The
    /// topic goes away with its last subscriber.
    pub fn subscribe(&self, topic: &str) -> impl Stream<Item = LiveLocation> + Send + 'static {
        let receiver = lock(&self.topics)
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe();
        let subscription = Subscription {
            topic: topic.to_string(),
            receiver,
            topics: Arc::clone(&self.topics),
        };

        stream::unfold(subscription, |mut subscription| async move {
            loop {
                match subscription.receiver.recv().await {
                    Ok(location) => return Some((location, subscription)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(topic = %subscription.topic, skipped, "live-location subscriber lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        lock(&self.topics)
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

struct Subscription {
    topic: String,
    receiver: broadcast::Receiver<LiveLocation>,
    topics: Arc<Topics>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut topics = lock(&self.topics);
        // `self.receiver` is still counted here.
        let last = topics
            .get(&self.topic)
            .is_some_and(|sender| sender.receiver_count() <= 1);
        if last {
            topics.remove(&self.topic);
        }
    }
}

fn lock(topics: &Topics) -> MutexGuard<'_, HashMap<String, broadcast::Sender<LiveLocation>>> {
    topics.lock().unwrap_or_else(PoisonError::into_inner)
}
