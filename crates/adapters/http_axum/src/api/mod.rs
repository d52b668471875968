//! JSON REST API handlers.

pub mod logs;
pub mod sensors;
pub mod settings;
pub mod sse;
pub mod status;
pub mod thresholds;

use axum::Router;
use axum::routing::get;

use coolhub_app::ports::{DeviceGateway, EventPublisher, SettingStore};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<G, S, P>() -> Router<AppState<G, S, P>>
where
    G: DeviceGateway + 'static,
    S: SettingStore + Clone + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/settings",
            get(settings::get::<G, S, P>).put(settings::update::<G, S, P>),
        )
        .route("/sensors", get(sensors::list::<G, S, P>))
        .route("/thresholds", get(thresholds::list::<G, S, P>))
        .route("/status", get(status::get::<G, S, P>))
        .route("/logs", get(logs::list::<G, S, P>))
        .route("/logs/stream", get(sse::stream::<G, S, P>))
}
