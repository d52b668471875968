//! Log history handlers.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use coolhub_app::ports::{DeviceGateway, EventPublisher, SettingStore};
use coolhub_app::services::log_history::MAX_LOG_HISTORY;
use coolhub_domain::log_event::LogEvent;

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// `GET /api/logs?limit=` — recent log events, newest first.
pub async fn list<G, S, P>(
    State(state): State<AppState<G, S, P>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<LogEvent>>
where
    G: DeviceGateway + 'static,
    S: SettingStore + Clone + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let limit = query.limit.unwrap_or(MAX_LOG_HISTORY).min(MAX_LOG_HISTORY);
    Json(state.history.recent(limit).await)
}
