//! Device gateway port — the host's device/capability API.
//!
//! The gateway resolves devices, reads and writes capability values, and
//! pushes capability changes for live subscriptions into an [`EventSink`].
//! Value changes are delivered as [`GatewayEvent`]s so the application can
//! process them one at a time, in arrival order.

use std::future::Future;

use tokio::sync::mpsc;

use coolhub_domain::capability::CapabilityValue;
use coolhub_domain::device::Device;
use coolhub_domain::error::ListenerError;
use coolhub_domain::id::{CapabilityId, DeviceId, SubscriptionId};

/// Channel the gateway pushes events into.
pub type EventSink = mpsc::UnboundedSender<GatewayEvent>;

/// Something the host reports asynchronously.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// A subscribed capability delivered a new value.
    Capability(CapabilityUpdate),
    /// Devices were added to or removed from the roster.
    RosterChanged,
}

/// A new value for a subscribed capability.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityUpdate {
    pub subscription_id: SubscriptionId,
    pub device_id: DeviceId,
    pub capability_id: CapabilityId,
    pub value: CapabilityValue,
}

/// Per-device, per-capability access to the host.
pub trait DeviceGateway: Send + Sync {
    /// Snapshot of every known device.
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, ListenerError>> + Send;

    /// Resolve one device.
    ///
    /// Fails with a device [`NotFound`](ListenerError::NotFound) error when
    /// the id does not resolve.
    fn get_device(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Device, ListenerError>> + Send;

    /// Read the current value of a capability.
    fn read_capability(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
    ) -> impl Future<Output = Result<CapabilityValue, ListenerError>> + Send;

    /// Write a capability value. May fail when the device is unreachable.
    fn write_capability(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
        value: CapabilityValue,
    ) -> impl Future<Output = Result<(), ListenerError>> + Send;

    /// Start pushing changes of a capability into `sink`.
    ///
    /// Every call yields a fresh [`SubscriptionId`]; updates carry it.
    fn subscribe(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
        sink: EventSink,
    ) -> impl Future<Output = Result<SubscriptionId, ListenerError>> + Send;

    /// Release a subscription. Releasing an unknown id is a no-op.
    fn unsubscribe(
        &self,
        subscription_id: SubscriptionId,
    ) -> impl Future<Output = Result<(), ListenerError>> + Send;

    /// Push a [`GatewayEvent::RosterChanged`] into `sink` whenever devices
    /// are added or removed.
    fn watch_roster(&self, sink: EventSink)
    -> impl Future<Output = Result<(), ListenerError>> + Send;
}

impl<T: DeviceGateway> DeviceGateway for std::sync::Arc<T> {
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, ListenerError>> + Send {
        (**self).list_devices()
    }

    fn get_device(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Device, ListenerError>> + Send {
        (**self).get_device(device_id)
    }

    fn read_capability(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
    ) -> impl Future<Output = Result<CapabilityValue, ListenerError>> + Send {
        (**self).read_capability(device_id, capability_id)
    }

    fn write_capability(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
        value: CapabilityValue,
    ) -> impl Future<Output = Result<(), ListenerError>> + Send {
        (**self).write_capability(device_id, capability_id, value)
    }

    fn subscribe(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
        sink: EventSink,
    ) -> impl Future<Output = Result<SubscriptionId, ListenerError>> + Send {
        (**self).subscribe(device_id, capability_id, sink)
    }

    fn unsubscribe(
        &self,
        subscription_id: SubscriptionId,
    ) -> impl Future<Output = Result<(), ListenerError>> + Send {
        (**self).unsubscribe(subscription_id)
    }

    fn watch_roster(
        &self,
        sink: EventSink,
    ) -> impl Future<Output = Result<(), ListenerError>> + Send {
        (**self).watch_roster(sink)
    }
}
