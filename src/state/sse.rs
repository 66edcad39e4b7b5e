use tokio::sync::broadcast;
use tracing::debug;

use crate::dto::sse::ServerEvent;

/// Fan-out of session events to every connected SSE client.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Hub buffering up to `capacity` events per lagging subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receiver for every event broadcast from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Number of connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Deliver `event` to the current subscribers and return how many got it.
    pub fn broadcast(&self, event: ServerEvent) -> usize {
        match self.sender.send(event) {
            Ok(delivered) => delivered,
            Err(broadcast::error::SendError(event)) => {
                debug!(event = ?event.event, "no SSE subscriber; event dropped");
                0
            }
        }
    }
}
