//! Event loop feeding gateway events to the coordinator.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::coordinator::Coordinator;
use crate::ports::{DeviceGateway, EventPublisher, GatewayEvent, SettingStore};

/// Handle events one at a time until `shutdown` resolves or every sender
/// is gone, then destroy all listeners.
pub async fn run<G, S, P>(
    coordinator: Arc<Mutex<Coordinator<G, S, P>>>,
    mut events: mpsc::UnboundedReceiver<GatewayEvent>,
    shutdown: impl Future<Output = ()>,
) where
    G: DeviceGateway,
    S: SettingStore + Clone,
    P: EventPublisher + Sync,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::info!("event channel closed");
                    break;
                };
                coordinator.lock().await.handle_event(event).await;
            }
        }
    }
    coordinator.lock().await.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        FakeGateway, InMemorySettingStore, SpyPublisher, air_conditioner, weather_station,
    };
    use coolhub_domain::capability::MEASURE_TEMPERATURE;
    use coolhub_domain::configuration::Configuration;
    use coolhub_domain::log_event::LogKind;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn should_process_events_then_tear_down_on_shutdown() {
        let gateway = FakeGateway::with_devices(vec![
            weather_station("ws", 30.0),
            air_conditioner("ac-1", "cool", 20.0),
        ]);
        let publisher = SpyPublisher::default();
        let (sink, events) = mpsc::unbounded_channel();
        let mut coordinator = Coordinator::new(
            gateway.clone(),
            InMemorySettingStore::default(),
            publisher.clone(),
            sink,
        )
        .await
        .unwrap();
        coordinator
            .reconfigure(Configuration::new("ws:measure_temperature", true))
            .await
            .unwrap();
        let coordinator = Arc::new(Mutex::new(coordinator));
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(run(coordinator.clone(), events, async {
            let _ = stop_rx.await;
        }));

        gateway.push_value("ws", MEASURE_TEMPERATURE, 34.0.into());
        while gateway.writes_to("ac-1").len() < 2 {
            tokio::task::yield_now().await;
        }
        stop_tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(gateway.writes_to("ac-1"), vec![22.0, 26.0, 20.0]);
        assert_eq!(gateway.total_subscriptions(), 0);
        assert_eq!(publisher.kinds().last(), Some(&LogKind::Cleaned));
    }

    #[tokio::test]
    async fn should_stop_when_event_channel_closes() {
        let gateway = FakeGateway::default();
        let (sink, events) = mpsc::unbounded_channel();
        let coordinator = Coordinator::new(
            gateway,
            InMemorySettingStore::default(),
            SpyPublisher::default(),
            sink,
        )
        .await
        .unwrap();
        let coordinator = Arc::new(Mutex::new(coordinator));
        // the coordinator keeps a sender alive, so close the receiver side
        let mut events = events;
        events.close();

        run(coordinator.clone(), events, std::future::pending()).await;

        assert!(coordinator.lock().await.configuration().is_none());
    }
}
