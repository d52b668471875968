//! In-memory port fakes shared by unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use coolhub_domain::capability::{
    CapabilityValue, MEASURE_TEMPERATURE, TARGET_TEMPERATURE, THERMOSTAT_MODE,
};
use coolhub_domain::device::Device;
use coolhub_domain::error::{GatewayError, ListenerError, NotFoundError};
use coolhub_domain::id::{CapabilityId, DeviceId, SubscriptionId};
use coolhub_domain::log_event::{LogEvent, LogKind};

use crate::ports::{
    CapabilityUpdate, DeviceGateway, EventPublisher, EventSink, GatewayEvent, SettingStore,
};

pub fn sink() -> (EventSink, mpsc::UnboundedReceiver<GatewayEvent>) {
    mpsc::unbounded_channel()
}

pub fn air_conditioner(id: &str, mode: &str, setpoint: f64) -> Device {
    Device::builder()
        .id(id)
        .name(format!("AC {id}"))
        .capability(THERMOSTAT_MODE, mode)
        .capability(TARGET_TEMPERATURE, setpoint)
        .capability(MEASURE_TEMPERATURE, 26.0)
        .build()
        .unwrap()
}

pub fn weather_station(id: &str, temperature: f64) -> Device {
    Device::builder()
        .id(id)
        .name("Weather station")
        .capability(MEASURE_TEMPERATURE, temperature)
        .capability("measure_temperature.feels_like", temperature)
        .build()
        .unwrap()
}

struct Watch {
    device_id: DeviceId,
    capability_id: CapabilityId,
    sink: EventSink,
}

#[derive(Default)]
struct GatewayState {
    devices: BTreeMap<DeviceId, Device>,
    subscriptions: HashMap<SubscriptionId, Watch>,
    subscribe_calls: Vec<(DeviceId, CapabilityId)>,
    unsubscribe_calls: usize,
    writes: Vec<(DeviceId, CapabilityId, CapabilityValue)>,
    unreachable: HashSet<DeviceId>,
    roster: Vec<EventSink>,
    journal: Vec<String>,
}

impl GatewayState {
    fn notify(&self, device_id: &DeviceId, capability_id: &CapabilityId, value: &CapabilityValue) {
        for (id, watch) in &self.subscriptions {
            if &watch.device_id == device_id && &watch.capability_id == capability_id {
                let _ = watch.sink.send(GatewayEvent::Capability(CapabilityUpdate {
                    subscription_id: *id,
                    device_id: device_id.clone(),
                    capability_id: capability_id.clone(),
                    value: value.clone(),
                }));
            }
        }
    }

    fn roster_changed(&self) {
        for sink in &self.roster {
            let _ = sink.send(GatewayEvent::RosterChanged);
        }
    }
}

/// Gateway over a device map, recording every call.
///
/// Writes echo to subscribers only when the value changes, like a real host.
#[derive(Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl FakeGateway {
    pub fn with_devices(devices: Vec<Device>) -> Self {
        let gateway = Self::default();
        {
            let mut state = gateway.state.lock().unwrap();
            for device in devices {
                state.devices.insert(device.id.clone(), device);
            }
        }
        gateway
    }

    /// Change a value without notifying subscribers.
    pub fn set_value(&self, device_id: &str, capability_id: &str, value: CapabilityValue) {
        let mut state = self.state.lock().unwrap();
        let device = state.devices.get_mut(&DeviceId::from(device_id)).unwrap();
        device.capabilities.insert(capability_id.into(), value);
    }

    /// Change a value the way a user or sensor would, notifying subscribers.
    pub fn push_value(&self, device_id: &str, capability_id: &str, value: CapabilityValue) {
        self.set_value(device_id, capability_id, value.clone());
        let state = self.state.lock().unwrap();
        state.notify(&device_id.into(), &capability_id.into(), &value);
    }

    pub fn value(&self, device_id: &str, capability_id: &str) -> Option<CapabilityValue> {
        let state = self.state.lock().unwrap();
        state
            .devices
            .get(&DeviceId::from(device_id))
            .and_then(|device| device.capability(&capability_id.into()).cloned())
    }

    pub fn set_unreachable(&self, device_id: &str, unreachable: bool) {
        let mut state = self.state.lock().unwrap();
        if unreachable {
            state.unreachable.insert(device_id.into());
        } else {
            state.unreachable.remove(&DeviceId::from(device_id));
        }
    }

    pub fn add_device(&self, device: Device) {
        let mut state = self.state.lock().unwrap();
        state.devices.insert(device.id.clone(), device);
        state.roster_changed();
    }

    pub fn remove_device(&self, device_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.devices.remove(&DeviceId::from(device_id));
        state.roster_changed();
    }

    /// Drop a capability silently; no roster event is sent.
    pub fn remove_capability(&self, device_id: &str, capability_id: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(device) = state.devices.get_mut(&DeviceId::from(device_id)) {
            device.capabilities.remove(&CapabilityId::from(capability_id));
        }
    }

    pub fn subscribe_calls(&self, device_id: &str, capability_id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .subscribe_calls
            .iter()
            .filter(|(d, c)| d.as_str() == device_id && c.as_str() == capability_id)
            .count()
    }

    pub fn subscription_ids(&self, device_id: &str, capability_id: &str) -> Vec<SubscriptionId> {
        let state = self.state.lock().unwrap();
        state
            .subscriptions
            .iter()
            .filter(|(_, w)| {
                w.device_id.as_str() == device_id && w.capability_id.as_str() == capability_id
            })
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn live_subscriptions(&self, device_id: &str, capability_id: &str) -> usize {
        self.subscription_ids(device_id, capability_id).len()
    }

    pub fn total_subscriptions(&self) -> usize {
        self.state.lock().unwrap().subscriptions.len()
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.state.lock().unwrap().unsubscribe_calls
    }

    /// Subscribe and unsubscribe calls in order, as `"subscribe ws:measure_temperature"`.
    pub fn journal(&self) -> Vec<String> {
        self.state.lock().unwrap().journal.clone()
    }

    pub fn roster_watchers(&self) -> usize {
        self.state.lock().unwrap().roster.len()
    }

    /// Numeric setpoints successfully written to a device, in order.
    pub fn writes_to(&self, device_id: &str) -> Vec<f64> {
        let state = self.state.lock().unwrap();
        state
            .writes
            .iter()
            .filter(|(d, c, _)| d.as_str() == device_id && c.as_str() == TARGET_TEMPERATURE)
            .filter_map(|(_, _, v)| v.as_f64())
            .collect()
    }
}

fn lookup<'a>(
    state: &'a GatewayState,
    device_id: &DeviceId,
    capability_id: &CapabilityId,
) -> Result<&'a CapabilityValue, ListenerError> {
    let device = state
        .devices
        .get(device_id)
        .ok_or_else(|| NotFoundError::device(device_id))?;
    device
        .capability(capability_id)
        .ok_or_else(|| NotFoundError::capability(capability_id).into())
}

impl DeviceGateway for FakeGateway {
    async fn list_devices(&self) -> Result<Vec<Device>, ListenerError> {
        Ok(self.state.lock().unwrap().devices.values().cloned().collect())
    }

    async fn get_device(&self, device_id: &DeviceId) -> Result<Device, ListenerError> {
        let state = self.state.lock().unwrap();
        state
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
        let state = self.state.lock().unwrap();
        lookup(&state, device_id, capability_id).cloned()
    }

    async fn write_capability(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
        value: CapabilityValue,
    ) -> Result<(), ListenerError> {
        let mut state = self.state.lock().unwrap();
        if state.unreachable.contains(device_id) {
            return Err(GatewayError::Unreachable {
                device_id: device_id.clone(),
            }
            .into());
        }
        let changed = lookup(&state, device_id, capability_id)? != &value;
        state
            .writes
            .push((device_id.clone(), capability_id.clone(), value.clone()));
        if changed {
            if let Some(device) = state.devices.get_mut(device_id) {
                device
                    .capabilities
                    .insert(capability_id.clone(), value.clone());
            }
            state.notify(device_id, capability_id, &value);
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
        sink: EventSink,
    ) -> Result<SubscriptionId, ListenerError> {
        let mut state = self.state.lock().unwrap();
        lookup(&state, device_id, capability_id)?;
        let id = SubscriptionId::new();
        state
            .subscribe_calls
            .push((device_id.clone(), capability_id.clone()));
        state
            .journal
            .push(format!("subscribe {device_id}:{capability_id}"));
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
        let mut state = self.state.lock().unwrap();
        state.unsubscribe_calls += 1;
        if let Some(watch) = state.subscriptions.remove(&subscription_id) {
            state.journal.push(format!(
                "unsubscribe {}:{}",
                watch.device_id, watch.capability_id
            ));
        }
        Ok(())
    }

    async fn watch_roster(&self, sink: EventSink) -> Result<(), ListenerError> {
        self.state.lock().unwrap().roster.push(sink);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SettingState {
    values: HashMap<String, serde_json::Value>,
    writes: usize,
    failing: bool,
}

/// Setting store over a shared map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySettingStore {
    state: Arc<Mutex<SettingState>>,
}

impl InMemorySettingStore {
    pub fn raw(&self, key: &str) -> Option<serde_json::Value> {
        self.state.lock().unwrap().values.get(key).cloned()
    }

    pub fn put(&self, key: &str, value: serde_json::Value) {
        self.state
            .lock()
            .unwrap()
            .values
            .insert(key.to_string(), value);
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }
}

impl SettingStore for InMemorySettingStore {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, ListenerError>> + Send {
        let value = self.raw(key);
        async move { Ok(value) }
    }

    fn set(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<(), ListenerError>> + Send {
        let result = {
            let mut state = self.state.lock().unwrap();
            if state.failing {
                Err(ListenerError::Storage("store unavailable".into()))
            } else {
                state.writes += 1;
                state.values.insert(key.to_string(), value);
                Ok(())
            }
        };
        async move { result }
    }
}

/// Publisher recording every event.
#[derive(Clone, Default)]
pub struct SpyPublisher {
    events: Arc<Mutex<Vec<LogEvent>>>,
}

impl SpyPublisher {
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<LogKind> {
        self.events().iter().map(|event| event.kind).collect()
    }

    pub fn count(&self, kind: LogKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventPublisher for SpyPublisher {
    fn publish(&self, event: LogEvent) -> impl Future<Output = Result<(), ListenerError>> + Send {
        self.events.lock().unwrap().push(event);
        async { Ok(()) }
    }
}
