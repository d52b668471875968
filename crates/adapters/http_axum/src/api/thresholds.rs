//! Saved per-device thresholds.

use axum::Json;
use axum::extract::State;

use coolhub_app::ports::{DeviceGateway, EventPublisher, SettingStore};
use coolhub_domain::setpoint::Thresholds;

use crate::state::AppState;

/// `GET /api/thresholds` — device id to minimum setpoint.
pub async fn list<G, S, P>(State(state): State<AppState<G, S, P>>) -> Json<Thresholds>
where
    G: DeviceGateway + 'static,
    S: SettingStore + Clone + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let coordinator = state.coordinator.lock().await;
    Json(coordinator.thresholds().clone())
}
