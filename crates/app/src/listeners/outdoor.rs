//! The single outdoor temperature sensor.

use coolhub_domain::capability::{CapabilityPath, CapabilityValue};
use coolhub_domain::error::{GatewayError, ListenerError, NotFoundError};
use coolhub_domain::id::SubscriptionId;
use coolhub_domain::log_event::{LogEvent, LogKind};

use super::{Context, OutdoorTemperature, TemperatureListener};
use crate::ports::{DeviceGateway, EventPublisher};

/// Listener bound to the configured outdoor capability path.
///
/// Exactly one exists per configured session; the coordinator owns it and
/// lends it to cooling listeners through [`OutdoorTemperature`].
#[derive(Debug)]
pub struct OutdoorTemperatureListener {
    path: CapabilityPath,
    sensor: TemperatureListener,
    value: Option<f64>,
}

impl OutdoorTemperatureListener {
    /// Validate `path` against the host and build an inactive listener.
    ///
    /// Nothing is subscribed yet.
    ///
    /// # Errors
    ///
    /// - [`ListenerError::Validation`] when `path` is not `deviceId:capabilityId`.
    /// - [`ListenerError::NotFound`] naming the device when it does not
    ///   resolve, or the capability when the device lacks it.
    #[tracing::instrument(skip(gateway))]
    pub async fn create<G: DeviceGateway>(path: &str, gateway: &G) -> Result<Self, ListenerError> {
        let path: CapabilityPath = path.parse()?;
        let device = gateway.get_device(&path.device_id).await?;
        if !device.has_capability(&path.capability_id) {
            return Err(NotFoundError::capability(&path.capability_id).into());
        }
        let sensor = TemperatureListener::new(path.device_id.clone(), path.capability_id.clone());
        Ok(Self {
            path,
            sensor,
            value: None,
        })
    }

    #[must_use]
    pub fn path(&self) -> &CapabilityPath {
        &self.path
    }

    /// Whether `id` is the live sensor subscription.
    #[must_use]
    pub fn owns(&self, id: SubscriptionId) -> bool {
        self.sensor.owns(id)
    }

    /// Accept a pushed reading.
    ///
    /// Returns the new outdoor temperature, or `None` when the value was
    /// not numeric and was therefore ignored.
    pub async fn on_update<G, P>(
        &mut self,
        value: &CapabilityValue,
        ctx: Context<'_, G, P>,
    ) -> Option<f64>
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
    {
        let Some(reading) = value.as_f64() else {
            tracing::warn!(path = %self.path, %value, "ignoring non numeric outdoor reading");
            ctx.notify(LogEvent::for_device(
                LogKind::Error,
                &self.path.device_id,
                serde_json::json!({
                    "message": "unexpected outdoor value",
                    "value": value,
                }),
            ))
            .await;
            return None;
        };
        self.sensor.record(value.clone());
        self.store(reading, ctx).await;
        Some(reading)
    }

    async fn refresh<G, P>(&mut self, ctx: Context<'_, G, P>) -> Result<f64, ListenerError>
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
    {
        let value = self.sensor.read_capability(ctx.gateway).await?;
        let reading = value
            .as_f64()
            .ok_or_else(|| GatewayError::UnexpectedValue {
                device_id: self.path.device_id.clone(),
                capability_id: self.path.capability_id.clone(),
            })?;
        self.sensor.record(value);
        self.store(reading, ctx).await;
        Ok(reading)
    }

    async fn store<G, P>(&mut self, reading: f64, ctx: Context<'_, G, P>)
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
    {
        self.value = Some(reading);
        tracing::debug!(path = %self.path, reading, "outdoor temperature");
        ctx.notify(LogEvent::for_device(
            LogKind::Listened,
            &self.path.device_id,
            serde_json::json!({
                "capability": self.path.capability_id,
                "outdoorTemperature": reading,
            }),
        ))
        .await;
    }

    /// Release the sensor subscription, reporting `cleaned`.
    pub async fn destroy<G, P>(&mut self, ctx: Context<'_, G, P>)
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
    {
        self.sensor.destroy(ctx).await;
    }
}

impl OutdoorTemperature for OutdoorTemperatureListener {
    fn value(&self) -> Option<f64> {
        self.value
    }

    fn is_active(&self) -> bool {
        self.sensor.is_subscribed()
    }

    async fn activate<G, P>(&mut self, ctx: Context<'_, G, P>) -> Result<(), ListenerError>
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
    {
        self.refresh(ctx).await?;
        if self.sensor.is_subscribed() {
            return Ok(());
        }
        let current = self.sensor.value().cloned();
        let current = current.or_else(|| self.value.map(CapabilityValue::Number));
        self.sensor.subscribe(ctx, current).await?;
        Ok(())
    }

    async fn deactivate<G, P>(&mut self, ctx: Context<'_, G, P>)
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
    {
        if self.sensor.is_subscribed() {
            self.destroy(ctx).await;
        }
    }
}
