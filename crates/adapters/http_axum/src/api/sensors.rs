//! Temperature sensors a configuration can point at.

use axum::Json;
use axum::extract::State;

use coolhub_app::ports::{DeviceGateway, EventPublisher, SettingStore};
use coolhub_domain::device::TemperatureSensor;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/sensors` — every temperature reading, sorted by name.
pub async fn list<G, S, P>(
    State(state): State<AppState<G, S, P>>,
) -> Result<Json<Vec<TemperatureSensor>>, ApiError>
where
    G: DeviceGateway + 'static,
    S: SettingStore + Clone + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let coordinator = state.coordinator.lock().await;
    let sensors = coordinator.temperature_sensors().await?;
    Ok(Json(sensors))
}
