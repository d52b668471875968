//! Listener subsystem — lifecycle-managed observers of device capabilities.
//!
//! - [`TemperatureListener`] holds zero-or-one subscription to one capability.
//! - [`OutdoorTemperatureListener`] owns the single outdoor sensor reading.
//! - [`CoolingListener`] tracks one device's thermostat mode and, while it
//!   cools, its setpoint.
//!
//! Listeners never reach into each other: a cooling listener sees the
//! outdoor sensor only through the [`OutdoorTemperature`] trait, and all
//! cross-listener bookkeeping (registry, outdoor activation invariant) is
//! done by the [`Coordinator`](crate::coordinator::Coordinator).

mod cooling;
mod outdoor;
mod temperature;

use std::future::Future;

pub use cooling::{CapabilityRole, CoolingListener, CoolingState, ModeTransition};
pub use outdoor::OutdoorTemperatureListener;
pub use temperature::TemperatureListener;

use coolhub_domain::error::ListenerError;
use coolhub_domain::log_event::LogEvent;

use crate::ports::{EventPublisher, EventSink};

/// Collaborators every listener operation needs.
pub struct Context<'a, G, P> {
    pub gateway: &'a G,
    pub publisher: &'a P,
    pub sink: &'a EventSink,
}

impl<G, P> Clone for Context<'_, G, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G, P> Copy for Context<'_, G, P> {}

impl<'a, G, P> Context<'a, G, P> {
    pub fn new(gateway: &'a G, publisher: &'a P, sink: &'a EventSink) -> Self {
        Self {
            gateway,
            publisher,
            sink,
        }
    }
}

impl<G, P: EventPublisher> Context<'_, G, P> {
    /// Emit a log event; a failing publisher never interrupts the caller.
    pub async fn notify(self, event: LogEvent) {
        tracing::debug!(
            kind = ?event.kind,
            device_id = ?event.device_id,
            data = %event.data,
            "log event"
        );
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(error = %err, "failed to publish log event");
        }
    }
}

/// The outdoor sensor as seen by cooling listeners.
pub trait OutdoorTemperature {
    /// Last known outdoor reading, `None` if never read.
    fn value(&self) -> Option<f64>;

    /// Whether the sensor subscription is live.
    fn is_active(&self) -> bool;

    /// Make sure the sensor is subscribed.
    ///
    /// Idempotent: when already subscribed only the cached value is refreshed.
    fn activate<G, P>(
        &mut self,
        ctx: Context<'_, G, P>,
    ) -> impl Future<Output = Result<(), ListenerError>> + Send
    where
        G: crate::ports::DeviceGateway,
        P: EventPublisher + Sync;

    /// Release the sensor subscription, keeping the last reading.
    fn deactivate<G, P>(&mut self, ctx: Context<'_, G, P>) -> impl Future<Output = ()> + Send
    where
        G: crate::ports::DeviceGateway,
        P: EventPublisher + Sync;
}
