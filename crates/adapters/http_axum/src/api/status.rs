//! Live view of the listener subsystem.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use coolhub_app::listeners::CoolingState;
use coolhub_app::ports::{DeviceGateway, EventPublisher, SettingStore};
use coolhub_domain::id::DeviceId;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub configured: bool,
    pub outdoor_active: bool,
    pub outdoor_temperature: Option<f64>,
    pub cooling: Vec<DeviceId>,
    pub listeners: BTreeMap<DeviceId, CoolingState>,
}

/// `GET /api/status` — outdoor subscription and per-device listener state.
pub async fn get<G, S, P>(State(state): State<AppState<G, S, P>>) -> Json<StatusResponse>
where
    G: DeviceGateway + 'static,
    S: SettingStore + Clone + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let coordinator = state.coordinator.lock().await;
    Json(StatusResponse {
        configured: coordinator.configuration().is_some(),
        outdoor_active: coordinator.is_outdoor_active(),
        outdoor_temperature: coordinator.outdoor_temperature(),
        cooling: coordinator.cooling_devices(),
        listeners: coordinator.listener_states(),
    })
}
