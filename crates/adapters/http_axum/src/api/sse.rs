//! Server-Sent Events (SSE) stream of log events.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use coolhub_app::ports::{DeviceGateway, EventPublisher, SettingStore};

use crate::state::AppState;

/// `GET /api/logs/stream` — SSE stream of log events as they are published.
///
/// Each event is sent as a JSON `data:` frame. The stream continues until
/// the client disconnects, the bus closes or the daemon shuts down.
pub async fn stream<G, S, P>(
    State(state): State<AppState<G, S, P>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    G: DeviceGateway + 'static,
    S: SettingStore + Clone + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let receiver = state.event_bus.subscribe();
    let events = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default().data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize log event for SSE stream");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE subscriber lagged, some log events were dropped");
            None
        }
    });

    let events = futures::StreamExt::take_until(events, state.shutdown.cancelled_owned());

    Sse::new(events).keep_alive(KeepAlive::default())
}
