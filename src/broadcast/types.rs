use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SubscriberId = Uuid;

/// Readiness of a subscriber connection, mirroring the WebSocket ready states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    pub fn is_ready(self) -> bool {
        self == ConnectionState::Open
    }
}

/// A live connection that can receive serialized reports
pub trait Subscriber: Send + Sync {
    fn state(&self) -> ConnectionState;

    /// Deliver one serialized report. Only called while the state is `Open`.
    fn send(&self, message: String) -> BoxFuture<'_, Result<(), BroadcastError>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberInfo {
    pub id: SubscriberId,
    pub state: ConnectionState,
    pub connected_at: DateTime<Utc>,
}

/// Outcome of one broadcast; delivery itself is not awaited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastSummary {
    pub dispatched: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum BroadcastError {
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error("Failed to serialize report: {0}")]
    Serialization(String),
}
