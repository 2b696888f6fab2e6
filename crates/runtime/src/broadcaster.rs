use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::events::{DashboardMessage, MessageError};

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

/// Why a subscriber was dropped during a publish. Never surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
enum SubscriberSendFailed {
    #[error("outbound queue is full")]
    QueueFull,
    #[error("subscriber connection is gone")]
    Disconnected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Receiving end of one dashboard subscription.
///
/// Yields serialized frames in publish order. Returns `None` once the
/// broadcaster has dropped this subscriber.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    frames: mpsc::Receiver<Arc<str>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.frames.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Arc<str>> {
        self.frames.try_recv().ok()
    }
}

/// Fan-out of dashboard messages to every live subscriber.
///
/// Each subscriber owns a bounded queue. A publish never waits on a
/// subscriber: a full or closed queue gets that subscriber removed.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    next_id: AtomicU64,
    queue_capacity: usize,
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<Arc<str>>>>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl Broadcaster {
    pub fn new(queue_capacity: usize) -> Self {
        assert!(queue_capacity > 0, "queue_capacity must be positive");

        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(0),
                queue_capacity,
                subscribers: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        // Ids are never reused, so a stale id can only ever miss.
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, frames) = mpsc::channel(self.inner.queue_capacity);
        self.subscribers().insert(id, tx);
        debug!(subscriber = id.0, "subscriber registered");

        Subscription { id, frames }
    }

    /// Removes a subscriber. Returns whether it was still registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers().remove(&id).is_some();
        if removed {
            debug!(subscriber = id.0, "subscriber removed");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    /// Serializes `message` once and queues it for every current subscriber.
    pub fn publish(&self, message: &DashboardMessage) -> Result<PublishReport, MessageError> {
        let frame: Arc<str> = Arc::from(message.to_json()?);
        Ok(self.publish_frame(frame))
    }

    pub fn publish_frame(&self, frame: Arc<str>) -> PublishReport {
        let snapshot: Vec<(SubscriberId, mpsc::Sender<Arc<str>>)> = self
            .subscribers()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut report = PublishReport::default();
        let mut failed = Vec::new();
        for (id, tx) in snapshot {
            match tx.try_send(Arc::clone(&frame)) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => failed.push((id, SubscriberSendFailed::QueueFull)),
                Err(TrySendError::Closed(_)) => {
                    failed.push((id, SubscriberSendFailed::Disconnected))
                }
            }
        }

        if !failed.is_empty() {
            let mut subscribers = self.subscribers();
            for (id, reason) in failed {
                if subscribers.remove(&id).is_some() {
                    report.dropped += 1;
                    warn!(subscriber = id.0, %reason, "dropping dashboard subscriber");
                }
            }
        }

        report
    }

    fn subscribers(&self) -> MutexGuard<'_, HashMap<SubscriberId, mpsc::Sender<Arc<str>>>> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
