//! Progress events streamed to clients while a pipeline runs.
//!
//! Pipelines push [`StatusEvent`]s into an [`EventSink`]; the transport
//! layer drains the receiving half and frames each event for the wire.
//! A fatal orchestration error is pushed as an `Err` item and ends the run.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Default channel capacity for a single run.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// `{status, message}` payload of a single progress event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent<S> {
    pub status: S,
    pub message: String,
}

impl<S> StatusEvent<S> {
    pub fn new(status: S, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Item carried by the event channel.
pub type EventItem<S, E> = Result<StatusEvent<S>, E>;

/// Sending half of a pipeline's event channel.
#[derive(Debug)]
pub struct EventSink<S, E> {
    tx: mpsc::Sender<EventItem<S, E>>,
}

impl<S, E> Clone for EventSink<S, E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S, E> EventSink<S, E>
where
    S: Send + 'static,
    E: Send + 'static,
{
    /// Creates a sink together with the receiver the transport drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EventItem<S, E>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Pushes a status event. Returns `false` once the receiver is gone.
    pub async fn emit(&self, status: S, message: impl Into<String>) -> bool {
        let delivered = self
            .tx
            .send(Ok(StatusEvent::new(status, message)))
            .await
            .is_ok();
        if !delivered {
            debug!(target: "services::events", "event dropped: receiver closed");
        }
        delivered
    }

    /// Pushes a fatal error; the transport terminates the stream on it.
    pub async fn fail(&self, err: E) -> bool {
        self.tx.send(Err(err)).await.is_ok()
    }

    /// True when the client side has hung up.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
