//! Per-device cooling listener.
//!
//! States and transitions:
//!
//! ```text
//! Idle --listen_to_thermostat_mode--> WatchingMode
//! WatchingMode --mode becomes cool--> Cooling        (activates outdoor, seeds threshold)
//! Cooling --mode leaves cool--> WatchingMode         (releases setpoint, reverts)
//! any --destroy--> Idle                              (releases both, reverts if cooling)
//! ```
//!
//! Every transition checks the current state first, so repeated or late
//! events are no-ops rather than double subscriptions.

use std::collections::VecDeque;

use serde::Serialize;

use coolhub_domain::capability::{CapabilityValue, TARGET_TEMPERATURE, THERMOSTAT_MODE};
use coolhub_domain::device::Device;
use coolhub_domain::error::{GatewayError, ListenerError};
use coolhub_domain::id::{DeviceId, SubscriptionId};
use coolhub_domain::log_event::{LogEvent, LogKind};
use coolhub_domain::setpoint::{compute_setpoint, same_setpoint};
use coolhub_domain::thermostat::ThermostatMode;

use super::{Context, OutdoorTemperature, TemperatureListener};
use crate::ports::{DeviceGateway, EventPublisher, SettingStore};
use crate::services::ThresholdStore;

/// Setpoints written by the listener whose echo is still expected.
const PENDING_WRITES: usize = 8;

/// Where a cooling listener is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoolingState {
    /// Nothing subscribed.
    Idle,
    /// Thermostat mode subscribed, device not cooling.
    WatchingMode,
    /// Thermostat mode and setpoint subscribed.
    Cooling,
}

/// Outcome of a thermostat mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    Started,
    Stopped,
    Unchanged,
}

/// Which capability a subscription update belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityRole {
    Mode,
    Setpoint,
}

#[derive(Debug)]
pub struct CoolingListener {
    device: Device,
    mode: TemperatureListener,
    setpoint: TemperatureListener,
    own_writes: VecDeque<f64>,
}

impl CoolingListener {
    #[must_use]
    pub fn new(device: Device) -> Self {
        let mode = TemperatureListener::new(device.id.clone(), THERMOSTAT_MODE.into());
        let setpoint = TemperatureListener::new(device.id.clone(), TARGET_TEMPERATURE.into());
        Self {
            device,
            mode,
            setpoint,
            own_writes: VecDeque::with_capacity(PENDING_WRITES),
        }
    }

    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device.id
    }

    #[must_use]
    pub fn state(&self) -> CoolingState {
        match (self.mode.is_subscribed(), self.setpoint.is_subscribed()) {
            (_, true) => CoolingState::Cooling,
            (true, false) => CoolingState::WatchingMode,
            (false, false) => CoolingState::Idle,
        }
    }

    #[must_use]
    pub fn is_cooling(&self) -> bool {
        self.state() == CoolingState::Cooling
    }

    /// Last setpoint seen while cooling.
    #[must_use]
    pub fn setpoint(&self) -> Option<f64> {
        self.setpoint.value().and_then(CapabilityValue::as_f64)
    }

    /// Match a subscription id against the live subscriptions.
    #[must_use]
    pub fn route(&self, id: SubscriptionId) -> Option<CapabilityRole> {
        if self.mode.owns(id) {
            Some(CapabilityRole::Mode)
        } else if self.setpoint.owns(id) {
            Some(CapabilityRole::Setpoint)
        } else {
            None
        }
    }

    /// Read the thermostat mode, subscribe to it, and start tracking right
    /// away when the device already cools.
    ///
    /// # Errors
    ///
    /// Gateway failures while reading or subscribing, and failures to
    /// activate the outdoor sensor.
    #[tracing::instrument(skip_all, fields(device_id = %self.device.id))]
    pub async fn listen_to_thermostat_mode<G, P, O, S>(
        &mut self,
        ctx: Context<'_, G, P>,
        outdoor: &mut O,
        thresholds: &mut ThresholdStore<S>,
    ) -> Result<ModeTransition, ListenerError>
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
        O: OutdoorTemperature + Send,
        S: SettingStore,
    {
        if self.state() != CoolingState::Idle {
            return Ok(ModeTransition::Unchanged);
        }
        let current = self.mode.read_capability(ctx.gateway).await?;
        self.mode.subscribe(ctx, Some(current.clone())).await?;
        self.apply_mode(ThermostatMode::from(&current), ctx, outdoor, thresholds)
            .await
    }

    /// React to a pushed thermostat mode.
    ///
    /// # Errors
    ///
    /// Same as [`listen_to_thermostat_mode`](Self::listen_to_thermostat_mode)
    /// when the new mode starts tracking.
    pub async fn on_mode<G, P, O, S>(
        &mut self,
        value: CapabilityValue,
        ctx: Context<'_, G, P>,
        outdoor: &mut O,
        thresholds: &mut ThresholdStore<S>,
    ) -> Result<ModeTransition, ListenerError>
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
        O: OutdoorTemperature + Send,
        S: SettingStore,
    {
        if !self.mode.is_subscribed() {
            return Ok(ModeTransition::Unchanged);
        }
        let mode = ThermostatMode::from(&value);
        self.mode.record(value);
        ctx.notify(LogEvent::for_device(
            LogKind::Listened,
            &self.device.id,
            serde_json::json!({ "capability": THERMOSTAT_MODE, "mode": mode }),
        ))
        .await;
        self.apply_mode(mode, ctx, outdoor, thresholds).await
    }

    async fn apply_mode<G, P, O, S>(
        &mut self,
        mode: ThermostatMode,
        ctx: Context<'_, G, P>,
        outdoor: &mut O,
        thresholds: &mut ThresholdStore<S>,
    ) -> Result<ModeTransition, ListenerError>
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
        O: OutdoorTemperature + Send,
        S: SettingStore,
    {
        tracing::debug!(device_id = %self.device.id, %mode, state = ?self.state(), "thermostat mode");
        if mode.is_cool() {
            if self.start_tracking(ctx, outdoor, thresholds).await? {
                return Ok(ModeTransition::Started);
            }
        } else if self.stop_tracking(ctx, thresholds).await {
            return Ok(ModeTransition::Stopped);
        }
        Ok(ModeTransition::Unchanged)
    }

    async fn start_tracking<G, P, O, S>(
        &mut self,
        ctx: Context<'_, G, P>,
        outdoor: &mut O,
        thresholds: &mut ThresholdStore<S>,
    ) -> Result<bool, ListenerError>
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
        O: OutdoorTemperature + Send,
        S: SettingStore,
    {
        if self.state() != CoolingState::WatchingMode {
            return Ok(false);
        }
        outdoor.activate(ctx).await?;
        let current = self.setpoint.read_capability(ctx.gateway).await?;
        let reading = current
            .as_f64()
            .ok_or_else(|| GatewayError::UnexpectedValue {
                device_id: self.device.id.clone(),
                capability_id: TARGET_TEMPERATURE.into(),
            })?;
        self.save_threshold(reading, ctx, thresholds).await;
        self.setpoint.subscribe(ctx, Some(current)).await?;
        tracing::info!(device_id = %self.device.id, threshold = reading, "cooling started");
        self.recompute(ctx, outdoor.value(), thresholds).await;
        Ok(true)
    }

    async fn stop_tracking<G, P, S>(
        &mut self,
        ctx: Context<'_, G, P>,
        thresholds: &ThresholdStore<S>,
    ) -> bool
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
        S: SettingStore,
    {
        if self.state() != CoolingState::Cooling {
            return false;
        }
        self.setpoint.destroy(ctx).await;
        self.own_writes.clear();
        tracing::info!(device_id = %self.device.id, "cooling stopped");
        self.revert(ctx, thresholds).await;
        true
    }

    /// React to a pushed setpoint.
    ///
    /// Echoes of our own writes and values matching the computed setpoint
    /// are ignored. Anything else is a manual override: it becomes the new
    /// threshold and the setpoint is recomputed.
    ///
    /// # Errors
    ///
    /// [`GatewayError::UnexpectedValue`] when the value is not numeric.
    pub async fn on_setpoint<G, P, S>(
        &mut self,
        value: CapabilityValue,
        ctx: Context<'_, G, P>,
        outdoor: Option<f64>,
        thresholds: &mut ThresholdStore<S>,
    ) -> Result<(), ListenerError>
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
        S: SettingStore,
    {
        if !self.setpoint.is_subscribed() {
            return Ok(());
        }
        let reading = value
            .as_f64()
            .ok_or_else(|| GatewayError::UnexpectedValue {
                device_id: self.device.id.clone(),
                capability_id: TARGET_TEMPERATURE.into(),
            })?;
        self.setpoint.record(value);
        if let Some(position) = self
            .own_writes
            .iter()
            .position(|written| same_setpoint(*written, reading))
        {
            self.own_writes.drain(..=position);
            return Ok(());
        }
        let expected = compute_setpoint(outdoor, thresholds.get(&self.device.id));
        if same_setpoint(expected, reading) {
            return Ok(());
        }
        tracing::info!(device_id = %self.device.id, setpoint = reading, expected, "manual override");
        ctx.notify(LogEvent::for_device(
            LogKind::Listened,
            &self.device.id,
            serde_json::json!({ "capability": TARGET_TEMPERATURE, "setpoint": reading }),
        ))
        .await;
        self.save_threshold(reading, ctx, thresholds).await;
        self.recompute(ctx, outdoor, thresholds).await;
        Ok(())
    }

    /// Compute and push the setpoint for the given outdoor reading.
    ///
    /// Does nothing unless cooling, or when the device already holds the
    /// computed value. Write failures are reported, never returned.
    pub async fn recompute<G, P, S>(
        &mut self,
        ctx: Context<'_, G, P>,
        outdoor: Option<f64>,
        thresholds: &ThresholdStore<S>,
    ) where
        G: DeviceGateway,
        P: EventPublisher + Sync,
        S: SettingStore,
    {
        if !self.setpoint.is_subscribed() {
            return;
        }
        let threshold = thresholds.get(&self.device.id);
        let target = compute_setpoint(outdoor, threshold);
        if self
            .setpoint()
            .is_some_and(|current| same_setpoint(current, target))
        {
            return;
        }
        match self.setpoint.write(ctx.gateway, target.into()).await {
            Ok(()) => {
                if self.own_writes.len() == PENDING_WRITES {
                    self.own_writes.pop_front();
                }
                self.own_writes.push_back(target);
                ctx.notify(LogEvent::for_device(
                    LogKind::Calculated,
                    &self.device.id,
                    serde_json::json!({
                        "outdoorTemperature": outdoor,
                        "threshold": threshold,
                        "setpoint": target,
                    }),
                ))
                .await;
            }
            Err(err) => {
                tracing::warn!(device_id = %self.device.id, error = %err, "failed to write setpoint");
                ctx.notify(LogEvent::for_device(
                    LogKind::Error,
                    &self.device.id,
                    serde_json::json!({
                        "message": "failed to write setpoint",
                        "reason": err.reason(),
                        "setpoint": target,
                    }),
                ))
                .await;
            }
        }
    }

    async fn save_threshold<G, P, S>(
        &self,
        value: f64,
        ctx: Context<'_, G, P>,
        thresholds: &mut ThresholdStore<S>,
    ) where
        G: DeviceGateway,
        P: EventPublisher + Sync,
        S: SettingStore,
    {
        match thresholds.save(&self.device.id, value).await {
            Ok(true) => {
                ctx.notify(LogEvent::for_device(
                    LogKind::Saved,
                    &self.device.id,
                    serde_json::json!({ "threshold": value }),
                ))
                .await;
            }
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(device_id = %self.device.id, error = %err, "failed to save threshold");
                ctx.notify(LogEvent::for_device(
                    LogKind::Error,
                    &self.device.id,
                    serde_json::json!({
                        "message": "failed to save threshold",
                        "reason": err.reason(),
                    }),
                ))
                .await;
            }
        }
    }

    async fn revert<G, P, S>(&self, ctx: Context<'_, G, P>, thresholds: &ThresholdStore<S>)
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
        S: SettingStore,
    {
        let threshold = thresholds.get(&self.device.id);
        let result = ctx
            .gateway
            .write_capability(&self.device.id, &TARGET_TEMPERATURE.into(), threshold.into())
            .await;
        match result {
            Ok(()) => {
                ctx.notify(LogEvent::for_device(
                    LogKind::Reverted,
                    &self.device.id,
                    serde_json::json!({ "setpoint": threshold }),
                ))
                .await;
            }
            Err(err) => {
                tracing::warn!(device_id = %self.device.id, error = %err, "failed to revert setpoint");
                ctx.notify(LogEvent::for_device(
                    LogKind::Error,
                    &self.device.id,
                    serde_json::json!({
                        "message": "device not found",
                        "reason": err.reason(),
                    }),
                ))
                .await;
            }
        }
    }

    /// Release both subscriptions, reverting the setpoint if cooling.
    pub async fn destroy<G, P, S>(&mut self, ctx: Context<'_, G, P>, thresholds: &ThresholdStore<S>)
    where
        G: DeviceGateway,
        P: EventPublisher + Sync,
        S: SettingStore,
    {
        let was_cooling = self.is_cooling();
        self.mode.destroy(ctx).await;
        self.setpoint.destroy(ctx).await;
        self.own_writes.clear();
        if was_cooling {
            self.revert(ctx, thresholds).await;
        }
    }
}
