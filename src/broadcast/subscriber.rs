use crate::broadcast::types::{BroadcastError, ConnectionState, Subscriber};
use futures::future::BoxFuture;
use std::future::Future;
use tokio::sync::mpsc;

/// In-process subscriber backed by an unbounded channel.
///
/// The connection counts as open until the receiver is dropped.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSubscriber {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Resolves once the receiving side has been dropped.
    pub fn closed(&self) -> impl Future<Output = ()> + Send + 'static {
        let tx = self.tx.clone();
        async move { tx.closed().await }
    }
}

impl Subscriber for ChannelSubscriber {
    fn state(&self) -> ConnectionState {
        if self.tx.is_closed() {
            ConnectionState::Closed
        } else {
            ConnectionState::Open
        }
    }

    fn send(&self, message: String) -> BoxFuture<'_, Result<(), BroadcastError>> {
        let result = self
            .tx
            .send(message)
            .map_err(|_| BroadcastError::ConnectionClosed);
        Box::pin(async move { result })
    }
}
