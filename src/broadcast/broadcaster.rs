//! Best-effort multicast of analysis reports.
//!
//! Subscribers live in a concurrent map. A broadcast serializes the report
//! once, snapshots the map, and hands each open subscriber its copy on a
//! spawned task. Nothing is buffered, retried or acknowledged, and the caller
//! never waits on a send.

use crate::analysis::AnalysisReport;
use crate::broadcast::types::{
    BroadcastError, BroadcastSummary, ConnectionState, Subscriber, SubscriberId, SubscriberInfo,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, LazyLock, Weak};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

static GLOBAL_BROADCASTER: LazyLock<Arc<Broadcaster>> =
    LazyLock::new(|| Arc::new(Broadcaster::new()));

struct Entry {
    subscriber: Arc<dyn Subscriber>,
    connected_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct Broadcaster {
    subscribers: DashMap<SubscriberId, Entry>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// The broadcaster shared by the whole process
    pub fn global() -> Arc<Broadcaster> {
        Arc::clone(&GLOBAL_BROADCASTER)
    }

    pub fn register(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = Uuid::new_v4();
        self.subscribers.insert(
            id,
            Entry {
                subscriber,
                connected_at: Utc::now(),
            },
        );
        debug!(subscriber = %id, total = self.subscribers.len(), "Subscriber registered");
        id
    }

    /// Remove a subscriber. Returns `false` if it was already gone.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.remove(&id).is_some();
        if removed {
            debug!(subscriber = %id, total = self.subscribers.len(), "Subscriber unregistered");
        }
        removed
    }

    /// Register `subscriber` and unregister it once `closed` resolves.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn attach<C>(self: &Arc<Self>, subscriber: Arc<dyn Subscriber>, closed: C) -> SubscriberId
    where
        C: Future<Output = ()> + Send + 'static,
    {
        let id = self.register(subscriber);
        let broadcaster: Weak<Broadcaster> = Arc::downgrade(self);

        tokio::spawn(async move {
            closed.await;
            if let Some(broadcaster) = broadcaster.upgrade() {
                broadcaster.unregister(id);
            }
        });

        id
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn subscribers(&self) -> Vec<SubscriberInfo> {
        self.subscribers
            .iter()
            .map(|entry| SubscriberInfo {
                id: *entry.key(),
                state: entry.subscriber.state(),
                connected_at: entry.connected_at,
            })
            .collect()
    }

    /// Send `report` to every open subscriber without waiting for delivery.
    pub fn broadcast(&self, report: &AnalysisReport) -> BroadcastSummary {
        let message = match report.to_json() {
            Ok(message) => message,
            Err(e) => {
                error!("{}", BroadcastError::Serialization(e.to_string()));
                return BroadcastSummary::default();
            }
        };
        self.broadcast_message(message)
    }

    /// Send an already serialized message to every open subscriber.
    pub fn broadcast_message(&self, message: String) -> BroadcastSummary {
        // Clone the handles out so no map shard stays locked during dispatch
        let snapshot: Vec<(SubscriberId, Arc<dyn Subscriber>)> = self
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(&entry.subscriber)))
            .collect();

        let mut summary = BroadcastSummary::default();
        if snapshot.is_empty() {
            return summary;
        }

        let Ok(runtime) = Handle::try_current() else {
            warn!(
                "No async runtime available, dropping broadcast to {} subscribers",
                snapshot.len()
            );
            summary.skipped = snapshot.len();
            return summary;
        };

        for (id, subscriber) in snapshot {
            let state = subscriber.state();
            if state != ConnectionState::Open {
                debug!(subscriber = %id, ?state, "Skipping subscriber that is not ready");
                summary.skipped += 1;
                continue;
            }

            let message = message.clone();
            runtime.spawn(async move {
                if let Err(e) = subscriber.send(message).await {
                    debug!(subscriber = %id, "Broadcast delivery failed: {}", e);
                }
            });
            summary.dispatched += 1;
        }

        if summary.dispatched > 0 {
            info!(
                dispatched = summary.dispatched,
                skipped = summary.skipped,
                "Broadcast error analysis"
            );
        }
        summary
    }
}

impl fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
