//! Base capability-lifecycle holder.

use coolhub_domain::capability::{CapabilityValue, Subscription};
use coolhub_domain::error::ListenerError;
use coolhub_domain::id::{CapabilityId, DeviceId, SubscriptionId};
use coolhub_domain::log_event::{LogEvent, LogKind};

use super::Context;
use crate::ports::{DeviceGateway, EventPublisher};

/// Holds zero or one live subscription to a device capability.
///
/// Subclass-like listeners decide *when* to subscribe; this type makes sure
/// a subscription is never taken twice and is released exactly once.
#[derive(Debug)]
pub struct TemperatureListener {
    device_id: DeviceId,
    capability_id: CapabilityId,
    subscription: Option<Subscription>,
}

impl TemperatureListener {
    #[must_use]
    pub fn new(device_id: DeviceId, capability_id: CapabilityId) -> Self {
        Self {
            device_id,
            capability_id,
            subscription: None,
        }
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    #[must_use]
    pub fn capability_id(&self) -> &CapabilityId {
        &self.capability_id
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Whether `id` is the live subscription held by this listener.
    #[must_use]
    pub fn owns(&self, id: SubscriptionId) -> bool {
        self.subscription.as_ref().is_some_and(|sub| sub.id == id)
    }

    /// Last value seen through the live subscription.
    #[must_use]
    pub fn value(&self) -> Option<&CapabilityValue> {
        self.subscription.as_ref().and_then(|sub| sub.value.as_ref())
    }

    /// Remember a delivered value. Ignored when not subscribed.
    pub fn record(&mut self, value: CapabilityValue) {
        if let Some(sub) = self.subscription.as_mut() {
            sub.value = Some(value);
        }
    }

    /// Single read through the gateway; failures propagate untouched.
    ///
    /// # Errors
    ///
    /// Whatever the gateway reports.
    pub async fn read_capability<G: DeviceGateway>(
        &self,
        gateway: &G,
    ) -> Result<CapabilityValue, ListenerError> {
        gateway
            .read_capability(&self.device_id, &self.capability_id)
            .await
    }

    /// Write through the gateway and remember the value on success.
    ///
    /// # Errors
    ///
    /// Whatever the gateway reports (typically an unreachable device).
    pub async fn write<G: DeviceGateway>(
        &mut self,
        gateway: &G,
        value: CapabilityValue,
    ) -> Result<(), ListenerError> {
        gateway
            .write_capability(&self.device_id, &self.capability_id, value.clone())
            .await?;
        self.record(value);
        Ok(())
    }

    /// Subscribe unless a subscription is already live.
    ///
    /// Returns `false` when nothing was done.
    ///
    /// # Errors
    ///
    /// Whatever the gateway reports when subscribing.
    pub async fn subscribe<G, P>(
        &mut self,
        ctx: Context<'_, G, P>,
        current: Option<CapabilityValue>,
    ) -> Result<bool, ListenerError>
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
    {
        if self.subscription.is_some() {
            return Ok(false);
        }
        let id = ctx
            .gateway
            .subscribe(&self.device_id, &self.capability_id, ctx.sink.clone())
            .await?;
        tracing::debug!(
            device_id = %self.device_id,
            capability = %self.capability_id,
            subscription = %id,
            "subscribed"
        );
        self.subscription = Some(Subscription {
            id,
            device_id: self.device_id.clone(),
            capability_id: self.capability_id.clone(),
            value: current,
        });
        ctx.notify(LogEvent::for_device(
            LogKind::Created,
            &self.device_id,
            serde_json::json!({ "capability": self.capability_id }),
        ))
        .await;
        Ok(true)
    }

    /// Release the live subscription without notifying.
    ///
    /// The handle is cleared before the gateway is called, so updates still
    /// in flight for it are recognised as stale. Returns `false` when there
    /// was nothing to release.
    pub async fn release<G: DeviceGateway>(&mut self, gateway: &G) -> bool {
        let Some(subscription) = self.subscription.take() else {
            return false;
        };
        if let Err(err) = gateway.unsubscribe(subscription.id).await {
            tracing::warn!(
                device_id = %self.device_id,
                capability = %self.capability_id,
                error = %err,
                "failed to release subscription"
            );
        }
        true
    }

    /// Release the subscription if any, then always report `cleaned`.
    pub async fn destroy<G, P>(&mut self, ctx: Context<'_, G, P>)
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
    {
        let released = self.release(ctx.gateway).await;
        ctx.notify(LogEvent::for_device(
            LogKind::Cleaned,
            &self.device_id,
            serde_json::json!({
                "capability": self.capability_id,
                "released": released,
            }),
        ))
        .await;
    }
}
