//! Shared application state for axum handlers.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use coolhub_app::coordinator::Coordinator;
use coolhub_app::event_bus::InProcessEventBus;
use coolhub_app::services::LogHistory;

/// Application state shared across all axum handlers.
///
/// Generic over the gateway, setting store and publisher the coordinator
/// runs with. `Clone` is implemented manually so the underlying types do
/// not need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<G, S, P> {
    /// The coordinator, shared with the event runner.
    pub coordinator: Arc<Mutex<Coordinator<G, S, P>>>,
    /// Persisted log history.
    pub history: Arc<LogHistory<S>>,
    /// Bus the log stream subscribes to.
    pub event_bus: Arc<InProcessEventBus>,
    /// Cancelled when the daemon stops; open log streams end with it.
    pub shutdown: CancellationToken,
}

impl<G, S, P> Clone for AppState<G, S, P> {
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
            history: Arc::clone(&self.history),
            event_bus: Arc::clone(&self.event_bus),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<G, S, P> AppState<G, S, P> {
    /// Create the state from components already shared with background tasks.
    pub fn new(
        coordinator: Arc<Mutex<Coordinator<G, S, P>>>,
        history: Arc<LogHistory<S>>,
        event_bus: Arc<InProcessEventBus>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            coordinator,
            history,
            event_bus,
            shutdown,
        }
    }
}
