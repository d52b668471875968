//! # coolhub-adapter-virtual
//!
//! Virtual device gateway providing simulated devices for testing and
//! demonstration purposes.
//!
//! ## Provided devices
//!
//! | Device | Device ID | Capabilities |
//! |--------|-----------|--------------|
//! | Outdoor weather station | `outdoor` | `measure_temperature` |
//! | Air-conditioner (one per configured name) | slug of the name | `thermostat_mode`, `target_temperature`, `measure_temperature` |
//!
//! Writes and simulation hooks push changes to live subscriptions, like a
//! real host would; a write of the current value is not echoed.
//!
//! ## Dependency rule
//!
//! Depends on `coolhub-app` (port traits) and `coolhub-domain` only.

mod devices;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use tokio::sync::Mutex;

use coolhub_app::ports::{CapabilityUpdate, DeviceGateway, EventSink, GatewayEvent};
use coolhub_domain::capability::{CapabilityValue, MEASURE_TEMPERATURE};
use coolhub_domain::device::Device;
use coolhub_domain::error::{GatewayError, ListenerError, NotFoundError, ValidationError};
use coolhub_domain::id::{CapabilityId, DeviceId, SubscriptionId};

pub use devices::{VirtualAirConditioner, VirtualWeatherStation, WEATHER_STATION_ID};

struct Watch {
    device_id: DeviceId,
    capability_id: CapabilityId,
    sink: EventSink,
}

#[derive(Default)]
struct State {
    devices: BTreeMap<DeviceId, Device>,
    subscriptions: HashMap<SubscriptionId, Watch>,
    unreachable: HashSet<DeviceId>,
    roster: Vec<EventSink>,
}

impl State {
    fn lookup(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
    ) -> Result<&CapabilityValue, ListenerError> {
        let device = self
            .devices
            .get(device_id)
            .ok_or_else(|| NotFoundError::device(device_id))?;
        device
            .capability(capability_id)
            .ok_or_else(|| NotFoundError::capability(capability_id).into())
    }

    /// Store a value, notifying subscribers when it changed.
    fn apply(
        &mut self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
        value: CapabilityValue,
    ) -> Result<(), ListenerError> {
        if self.lookup(device_id, capability_id)? == &value {
            return Ok(());
        }
        if let Some(device) = self.devices.get_mut(device_id) {
            device
                .capabilities
                .insert(capability_id.clone(), value.clone());
        }
        self.subscriptions.retain(|id, watch| {
            if &watch.device_id != device_id || &watch.capability_id != capability_id {
                return true;
            }
            let update = GatewayEvent::Capability(CapabilityUpdate {
                subscription_id: *id,
                device_id: device_id.clone(),
                capability_id: capability_id.clone(),
                value: value.clone(),
            });
            // a closed receiver means nobody will ever release this id
            watch.sink.send(update).is_ok()
        });
        Ok(())
    }

    fn roster_changed(&mut self) {
        self.roster
            .retain(|sink| sink.send(GatewayEvent::RosterChanged).is_ok());
    }
}

/// In-memory [`DeviceGateway`] over simulated devices.
#[derive(Default)]
pub struct VirtualGateway {
    state: Mutex<State>,
}

impl VirtualGateway {
    /// One outdoor weather station plus one air-conditioner per name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when a name is empty.
    pub fn new(outdoor_temperature: f64, thermostats: &[String]) -> Result<Self, ValidationError> {
        let mut devices = vec![VirtualWeatherStation::new(outdoor_temperature).discover()?];
        for name in thermostats {
            devices.push(VirtualAirConditioner::new(name.as_str()).discover()?);
        }
        Ok(Self::with_devices(devices))
    }

    #[must_use]
    pub fn with_devices(devices: Vec<Device>) -> Self {
        let devices = devices
            .into_iter()
            .map(|device| (device.id.clone(), device))
            .collect();
        Self {
            state: Mutex::new(State {
                devices,
                ..State::default()
            }),
        }
    }

    /// Change a capability as a user or sensor would.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::NotFound`] when the device or capability is unknown.
    pub async fn set_capability(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
        value: CapabilityValue,
    ) -> Result<(), ListenerError> {
        tracing::debug!(%device_id, capability = %capability_id, %value, "simulated change");
        self.state
            .lock()
            .await
            .apply(device_id, capability_id, value)
    }

    /// Add or replace a device and announce the roster change.
    pub async fn add_device(&self, device: Device) {
        let mut state = self.state.lock().await;
        state.devices.insert(device.id.clone(), device);
        state.roster_changed();
    }

    /// Remove a device and announce the roster change.
    pub async fn remove_device(&self, device_id: &DeviceId) -> Option<Device> {
        let mut state = self.state.lock().await;
        let removed = state.devices.remove(device_id);
        if removed.is_some() {
            state.roster_changed();
        }
        removed
    }

    /// Drop a capability without any notification.
    pub async fn remove_capability(&self, device_id: &DeviceId, capability_id: &CapabilityId) {
        let mut state = self.state.lock().await;
        if let Some(device) = state.devices.get_mut(device_id) {
            device.capabilities.remove(capability_id);
        }
    }

    /// Make writes to a device fail, or succeed again.
    pub async fn set_unreachable(&self, device_id: &DeviceId, unreachable: bool) {
        let mut state = self.state.lock().await;
        if unreachable {
            state.unreachable.insert(device_id.clone());
        } else {
            state.unreachable.remove(device_id);
        }
    }

    /// Number of live subscriptions, across all devices.
    pub async fn subscription_count(&self) -> usize {
        self.state.lock().await.subscriptions.len()
    }

    /// Swing the outdoor reading between `low` and `high`, one degree per
    /// `period`. Runs until the weather station disappears.
    pub async fn simulate_weather(&self, period: Duration, low: f64, high: f64) {
        let device_id = DeviceId::from(WEATHER_STATION_ID);
        let capability_id = CapabilityId::from(MEASURE_TEMPERATURE);
        let mut step = 1.0;
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let mut state = self.state.lock().await;
            let Ok(current) = state.lookup(&device_id, &capability_id) else {
                tracing::info!("weather station removed, stopping simulation");
                return;
            };
            let current = current.as_f64().unwrap_or(low);
            if current + step > high || current + step < low {
                step = -step;
            }
            let next = (current + step).clamp(low, high);
            if let Err(err) = state.apply(&device_id, &capability_id, next.into()) {
                tracing::warn!(error = %err, "failed to update simulated weather");
            }
        }
    }
}

impl DeviceGateway for VirtualGateway {
    async fn list_devices(&self) -> Result<Vec<Device>, ListenerError> {
        Ok(self.state.lock().await.devices.values().cloned().collect())
    }

    async fn get_device(&self, device_id: &DeviceId) -> Result<Device, ListenerError> {
        self.state
            .lock()
            .await
            .devices
            .get(device_id)
            .cloned()
            .ok_or_else(|| NotFoundError::device(device_id).into())
    }

    async fn read_capability(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
    ) -> Result<CapabilityValue, ListenerError> {
        let state = self.state.lock().await;
        state.lookup(device_id, capability_id).cloned()
    }

    async fn write_capability(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
        value: CapabilityValue,
    ) -> Result<(), ListenerError> {
        tracing::debug!(%device_id, capability = %capability_id, %value, "write");
        let mut state = self.state.lock().await;
        if state.unreachable.contains(device_id) {
            return Err(GatewayError::Unreachable {
                device_id: device_id.clone(),
            }
            .into());
        }
        state.apply(device_id, capability_id, value)
    }

    async fn subscribe(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
        sink: EventSink,
    ) -> Result<SubscriptionId, ListenerError> {
        let mut state = self.state.lock().await;
        state.lookup(device_id, capability_id)?;
        let id = SubscriptionId::new();
        state.subscriptions.insert(
            id,
            Watch {
                device_id: device_id.clone(),
                capability_id: capability_id.clone(),
                sink,
            },
        );
        Ok(id)
    }

    async fn unsubscribe(&self, subscription_id: SubscriptionId) -> Result<(), ListenerError> {
        self.state
            .lock()
            .await
            .subscriptions
            .remove(&subscription_id);
        Ok(())
    }

    async fn watch_roster(&self, sink: EventSink) -> Result<(), ListenerError> {
        self.state.lock().await.roster.push(sink);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coolhub_domain::capability::{TARGET_TEMPERATURE, THERMOSTAT_MODE};
    use coolhub_domain::error::Missing;
    use coolhub_domain::thermostat::ThermostatMode;
    use tokio::sync::mpsc;

    fn gateway() -> VirtualGateway {
        VirtualGateway::new(30.0, &["Living Room".to_string(), "Bedroom".to_string()]).unwrap()
    }

    #[tokio::test]
    async fn should_list_weather_station_and_air_conditioners() {
        let devices = gateway().list_devices().await.unwrap();
        let ids: Vec<_> = devices.iter().map(|d| d.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["bedroom", "living-room", "outdoor"]);
    }

    #[tokio::test]
    async fn should_report_missing_device() {
        let err = gateway().get_device(&"nope".into()).await.unwrap_err();
        match err {
            ListenerError::NotFound(err) => assert_eq!(err.missing, Missing::Device),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_report_missing_capability() {
        let err = gateway()
            .read_capability(&"outdoor".into(), &"humidity".into())
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "capability_not_found");
    }

    #[tokio::test]
    async fn should_push_changes_to_subscribers() {
        let gateway = gateway();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = gateway
            .subscribe(&"outdoor".into(), &MEASURE_TEMPERATURE.into(), tx)
            .await
            .unwrap();

        gateway
            .set_capability(&"outdoor".into(), &MEASURE_TEMPERATURE.into(), 33.0.into())
            .await
            .unwrap();

        match rx.try_recv().unwrap() {
            GatewayEvent::Capability(update) => {
                assert_eq!(update.subscription_id, id);
                assert_eq!(update.value, 33.0.into());
            }
            GatewayEvent::RosterChanged => panic!("unexpected roster event"),
        }
    }

    #[tokio::test]
    async fn should_not_echo_unchanged_write() {
        let gateway = gateway();
        let (tx, mut rx) = mpsc::unbounded_channel();
        gateway
            .subscribe(&"bedroom".into(), &TARGET_TEMPERATURE.into(), tx)
            .await
            .unwrap();

        gateway
            .write_capability(&"bedroom".into(), &TARGET_TEMPERATURE.into(), 24.0.into())
            .await
            .unwrap();

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_stop_pushing_after_unsubscribe() {
        let gateway = gateway();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = gateway
            .subscribe(&"bedroom".into(), &THERMOSTAT_MODE.into(), tx)
            .await
            .unwrap();

        gateway.unsubscribe(id).await.unwrap();
        gateway.unsubscribe(id).await.unwrap();
        gateway
            .set_capability(&"bedroom".into(), &THERMOSTAT_MODE.into(), "cool".into())
            .await
            .unwrap();

        assert!(rx.try_recv().is_err());
        assert_eq!(gateway.subscription_count().await, 0);
    }

    #[tokio::test]
    async fn should_fail_writes_to_unreachable_device() {
        let gateway = gateway();
        gateway.set_unreachable(&"bedroom".into(), true).await;

        let err = gateway
            .write_capability(&"bedroom".into(), &TARGET_TEMPERATURE.into(), 20.0.into())
            .await
            .unwrap_err();

        assert_eq!(err.reason(), "device_unreachable");
    }

    #[tokio::test]
    async fn should_announce_roster_changes() {
        let gateway = gateway();
        let (tx, mut rx) = mpsc::unbounded_channel();
        gateway.watch_roster(tx).await.unwrap();

        let office = VirtualAirConditioner::new("Office")
            .with_mode(ThermostatMode::Cool)
            .with_setpoint(21.0)
            .discover()
            .unwrap();
        gateway.add_device(office).await;
        gateway.remove_device(&"bedroom".into()).await;

        assert_eq!(rx.try_recv().unwrap(), GatewayEvent::RosterChanged);
        assert_eq!(rx.try_recv().unwrap(), GatewayEvent::RosterChanged);
        let office = gateway.get_device(&"office".into()).await.unwrap();
        assert_eq!(office.capability(&THERMOSTAT_MODE.into()), Some(&"cool".into()));
    }

    #[tokio::test]
    async fn should_drop_capability_silently() {
        let gateway = gateway();
        let (tx, mut rx) = mpsc::unbounded_channel();
        gateway.watch_roster(tx).await.unwrap();

        gateway
            .remove_capability(&"bedroom".into(), &TARGET_TEMPERATURE.into())
            .await;

        assert!(rx.try_recv().is_err());
        let bedroom = gateway.get_device(&"bedroom".into()).await.unwrap();
        assert!(!bedroom.is_cooling_capable());
    }

    #[tokio::test]
    async fn should_swing_outdoor_temperature_within_bounds() {
        let gateway = std::sync::Arc::new(gateway());
        let simulation = {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                gateway
                    .simulate_weather(Duration::from_millis(1), 29.0, 31.0)
                    .await;
            })
        };

        for _ in 0..5 {
            tokio::time::sleep(Duration::from_millis(2)).await;
            let value = gateway
                .read_capability(&"outdoor".into(), &MEASURE_TEMPERATURE.into())
                .await
                .unwrap()
                .as_f64()
                .unwrap();
            assert!((29.0..=31.0).contains(&value));
        }

        gateway.remove_device(&WEATHER_STATION_ID.into()).await;
        simulation.await.unwrap();
    }
}
