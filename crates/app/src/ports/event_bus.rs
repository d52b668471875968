//! Event bus port — publish log events to interested subscribers.

use std::future::Future;

use coolhub_domain::error::ListenerError;
use coolhub_domain::log_event::LogEvent;

/// Publishes [`LogEvent`]s to all current subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: LogEvent) -> impl Future<Output = Result<(), ListenerError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: LogEvent) -> impl Future<Output = Result<(), ListenerError>> + Send {
        (**self).publish(event)
    }
}
