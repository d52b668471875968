//! Port stubs and state builders shared by handler tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use coolhub_app::coordinator::Coordinator;
use coolhub_app::event_bus::InProcessEventBus;
use coolhub_app::ports::{DeviceGateway, EventSink, SettingStore};
use coolhub_app::services::LogHistory;
use coolhub_domain::capability::{
    CapabilityValue, MEASURE_TEMPERATURE, TARGET_TEMPERATURE, THERMOSTAT_MODE,
};
use coolhub_domain::device::Device;
use coolhub_domain::error::{ListenerError, NotFoundError};
use coolhub_domain::id::{CapabilityId, DeviceId, SubscriptionId};

use crate::state::AppState;

/// Gateway over a fixed device list. Writes are applied, never echoed.
#[derive(Default)]
pub struct StubGateway {
    devices: Mutex<Vec<Device>>,
}

impl StubGateway {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices: Mutex::new(devices),
        }
    }

    fn find(&self, device_id: &DeviceId) -> Result<Device, ListenerError> {
        self.devices
            .lock()
            .unwrap()
            .iter()
            .find(|device| &device.id == device_id)
            .cloned()
            .ok_or_else(|| NotFoundError::device(device_id).into())
    }
}

impl DeviceGateway for StubGateway {
    async fn list_devices(&self) -> Result<Vec<Device>, ListenerError> {
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn get_device(&self, device_id: &DeviceId) -> Result<Device, ListenerError> {
        self.find(device_id)
    }

    async fn read_capability(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
    ) -> Result<CapabilityValue, ListenerError> {
        self.find(device_id)?
            .capability(capability_id)
            .cloned()
            .ok_or_else(|| NotFoundError::capability(capability_id).into())
    }

    async fn write_capability(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
        value: CapabilityValue,
    ) -> Result<(), ListenerError> {
        let mut devices = self.devices.lock().unwrap();
        let device = devices
            .iter_mut()
            .find(|device| &device.id == device_id)
            .ok_or_else(|| NotFoundError::device(device_id))?;
        device.capabilities.insert(capability_id.clone(), value);
        Ok(())
    }

    async fn subscribe(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
        _sink: EventSink,
    ) -> Result<SubscriptionId, ListenerError> {
        self.read_capability(device_id, capability_id).await?;
        Ok(SubscriptionId::new())
    }

    async fn unsubscribe(&self, _subscription_id: SubscriptionId) -> Result<(), ListenerError> {
        Ok(())
    }

    async fn watch_roster(&self, _sink: EventSink) -> Result<(), ListenerError> {
        Ok(())
    }
}

/// Setting store over a shared map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, serde_json::Value>>>,
}

impl MemoryStore {
    pub fn raw(&self, key: &str) -> Option<serde_json::Value> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

impl SettingStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, ListenerError> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), ListenerError> {
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

pub type TestState = AppState<StubGateway, MemoryStore, Arc<InProcessEventBus>>;

pub fn weather_station() -> Device {
    Device::builder()
        .id("ws")
        .name("Weather station")
        .capability(MEASURE_TEMPERATURE, 30.0)
        .build()
        .unwrap()
}

pub fn air_conditioner(mode: &str) -> Device {
    Device::builder()
        .id("ac-1")
        .name("Living room")
        .capability(THERMOSTAT_MODE, mode)
        .capability(TARGET_TEMPERATURE, 20.0)
        .capability(MEASURE_TEMPERATURE, 26.0)
        .build()
        .unwrap()
}

pub async fn test_state(devices: Vec<Device>) -> (TestState, MemoryStore) {
    let store = MemoryStore::default();
    let event_bus = Arc::new(InProcessEventBus::new(16));
    let (sink, _events) = mpsc::unbounded_channel();
    let coordinator = Coordinator::new(
        StubGateway::new(devices),
        store.clone(),
        Arc::clone(&event_bus),
        sink,
    )
    .await
    .unwrap();
    let history = LogHistory::load(store.clone()).await.unwrap();
    let state = AppState::new(
        Arc::new(tokio::sync::Mutex::new(coordinator)),
        Arc::new(history),
        event_bus,
        CancellationToken::new(),
    );
    (state, store)
}
