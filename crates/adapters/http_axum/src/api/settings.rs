//! Configuration handlers: read the applied configuration, reconfigure.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use coolhub_app::ports::{DeviceGateway, EventPublisher, SettingStore};
use coolhub_domain::configuration::Configuration;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the update endpoint.
pub enum UpdateResponse {
    Ok(Json<Configuration>),
}

impl IntoResponse for UpdateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/settings` — the applied configuration, `null` when none.
pub async fn get<G, S, P>(
    State(state): State<AppState<G, S, P>>,
) -> Json<Option<Configuration>>
where
    G: DeviceGateway + 'static,
    S: SettingStore + Clone + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let coordinator = state.coordinator.lock().await;
    Json(coordinator.configuration().cloned())
}

/// `PUT /api/settings` — validate and apply a new configuration.
///
/// An invalid configuration is rejected without touching the running
/// listeners or the saved settings.
pub async fn update<G, S, P>(
    State(state): State<AppState<G, S, P>>,
    Json(config): Json<Configuration>,
) -> Result<UpdateResponse, ApiError>
where
    G: DeviceGateway + 'static,
    S: SettingStore + Clone + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let mut coordinator = state.coordinator.lock().await;
    coordinator.reconfigure(config.clone()).await?;
    Ok(UpdateResponse::Ok(Json(config)))
}
