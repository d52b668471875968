//! In-process log event bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use coolhub_domain::error::ListenerError;
use coolhub_domain::log_event::LogEvent;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped).
pub struct InProcessEventBus {
    sender: broadcast::Sender<LogEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: LogEvent) -> impl Future<Output = Result<(), ListenerError>> + Send {
        // send only fails without receivers, which is fine
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}
