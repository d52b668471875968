//! Coordinator — the context object owning every listener.
//!
//! The coordinator holds the outdoor listener and the device → cooling
//! listener registry for the current configuration, and enforces that the
//! outdoor sensor is subscribed if and only if at least one device cools.
//! Events are handled one at a time through [`Coordinator::handle_event`].

use std::collections::BTreeMap;

use coolhub_domain::capability::{TARGET_TEMPERATURE, THERMOSTAT_MODE};
use coolhub_domain::configuration::Configuration;
use coolhub_domain::device::{Device, TemperatureSensor};
use coolhub_domain::error::{ListenerError, NotFoundError};
use coolhub_domain::id::{CapabilityId, DeviceId};
use coolhub_domain::log_event::{LogEvent, LogKind};
use coolhub_domain::setpoint::Thresholds;

use crate::listeners::{
    CapabilityRole, Context, CoolingListener, CoolingState, OutdoorTemperature,
    OutdoorTemperatureListener,
};
use crate::ports::{
    CapabilityUpdate, DeviceGateway, EventPublisher, EventSink, GatewayEvent, SettingStore,
};
use crate::services::{SettingsService, ThresholdStore};

/// Listeners built for one applied configuration.
struct Session {
    configuration: Configuration,
    outdoor: OutdoorTemperatureListener,
    cooling: BTreeMap<DeviceId, CoolingListener>,
}

pub struct Coordinator<G, S, P> {
    gateway: G,
    publisher: P,
    sink: EventSink,
    settings: SettingsService<S>,
    thresholds: ThresholdStore<S>,
    session: Option<Session>,
    watching_roster: bool,
}

impl<G, S, P> Coordinator<G, S, P>
where
    G: DeviceGateway,
    S: SettingStore + Clone,
    P: EventPublisher + Sync,
{
    /// Build an unconfigured coordinator, loading saved thresholds.
    ///
    /// Subscription updates are pushed by the gateway into `sink`; the
    /// receiving half must be drained into [`handle_event`](Self::handle_event).
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Storage`] when the saved thresholds cannot be read.
    pub async fn new(
        gateway: G,
        store: S,
        publisher: P,
        sink: EventSink,
    ) -> Result<Self, ListenerError> {
        let thresholds = ThresholdStore::load(store.clone()).await?;
        Ok(Self {
            gateway,
            publisher,
            sink,
            settings: SettingsService::new(store),
            thresholds,
            session: None,
            watching_roster: false,
        })
    }

    /// Watch the device roster and apply the saved configuration, if any.
    ///
    /// A saved configuration that no longer resolves is reported and leaves
    /// the coordinator unconfigured. The roster is watched once, however many
    /// times this is called.
    ///
    /// # Errors
    ///
    /// Fails when the roster cannot be watched or the settings cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn start(&mut self) -> Result<(), ListenerError> {
        if !self.watching_roster {
            self.gateway.watch_roster(self.sink.clone()).await?;
            self.watching_roster = true;
        }
        let Some(config) = self.settings.load_configuration().await? else {
            tracing::info!("no saved configuration");
            return Ok(());
        };
        if let Err(err) = self.reconfigure(config).await {
            tracing::error!(error = %err, reason = err.reason(), "failed to restore configuration");
            let ctx = Context::new(&self.gateway, &self.publisher, &self.sink);
            report(ctx, None, "failed to restore configuration", &err).await;
        }
        Ok(())
    }

    /// Replace the current configuration.
    ///
    /// The new path is validated first: an invalid configuration leaves the
    /// running listeners and the saved settings untouched. Otherwise every
    /// listener is destroyed, the configuration is saved and, when enabled,
    /// one cooling listener per cooling-capable device is built.
    ///
    /// # Errors
    ///
    /// - [`ListenerError::Validation`] for a malformed capability path.
    /// - [`ListenerError::NotFound`] when the device or capability does not resolve.
    /// - [`ListenerError::Storage`] when saving fails.
    #[tracing::instrument(skip(self), fields(path = %config.capability_path, enabled = config.is_enabled))]
    pub async fn reconfigure(&mut self, config: Configuration) -> Result<(), ListenerError> {
        let outdoor =
            OutdoorTemperatureListener::create(&config.capability_path, &self.gateway).await?;
        self.teardown().await;
        self.settings.save_configuration(&config).await?;
        let mut session = Session {
            configuration: config,
            outdoor,
            cooling: BTreeMap::new(),
        };
        if session.configuration.is_enabled {
            self.build_cooling_listeners(&mut session).await;
        }
        tracing::info!(devices = session.cooling.len(), "configuration applied");
        self.session = Some(session);
        Ok(())
    }

    /// Process one gateway event.
    pub async fn handle_event(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::Capability(update) => self.on_capability(update).await,
            GatewayEvent::RosterChanged => self.on_roster_changed().await,
        }
    }

    /// Destroy every listener, reverting cooling devices to their threshold.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&mut self) {
        self.teardown().await;
    }

    #[must_use]
    pub fn configuration(&self) -> Option<&Configuration> {
        self.session.as_ref().map(|session| &session.configuration)
    }

    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        self.thresholds.snapshot()
    }

    #[must_use]
    pub fn is_outdoor_active(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.outdoor.is_active())
    }

    /// Last outdoor reading of the current configuration.
    #[must_use]
    pub fn outdoor_temperature(&self) -> Option<f64> {
        self.session
            .as_ref()
            .and_then(|session| session.outdoor.value())
    }

    /// Devices currently in cooling mode.
    #[must_use]
    pub fn cooling_devices(&self) -> Vec<DeviceId> {
        self.session
            .iter()
            .flat_map(|session| session.cooling.values())
            .filter(|listener| listener.is_cooling())
            .map(|listener| listener.device_id().clone())
            .collect()
    }

    /// Registered devices and their listener state.
    #[must_use]
    pub fn listener_states(&self) -> BTreeMap<DeviceId, CoolingState> {
        self.session
            .iter()
            .flat_map(|session| session.cooling.iter())
            .map(|(id, listener)| (id.clone(), listener.state()))
            .collect()
    }

    /// Every temperature reading the host exposes, sorted by name.
    ///
    /// # Errors
    ///
    /// Whatever the gateway reports when listing devices.
    pub async fn temperature_sensors(&self) -> Result<Vec<TemperatureSensor>, ListenerError> {
        let devices = self.gateway.list_devices().await?;
        let mut sensors: Vec<_> = devices
            .iter()
            .flat_map(Device::temperature_sensors)
            .collect();
        sensors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sensors)
    }

    async fn build_cooling_listeners(&mut self, session: &mut Session) {
        let ctx = Context::new(&self.gateway, &self.publisher, &self.sink);
        let devices = match self.gateway.list_devices().await {
            Ok(devices) => devices,
            Err(err) => {
                report(ctx, None, "failed to list devices", &err).await;
                return;
            }
        };
        for device in devices.into_iter().filter(Device::is_cooling_capable) {
            let mut listener = CoolingListener::new(device);
            match listener
                .listen_to_thermostat_mode(ctx, &mut session.outdoor, &mut self.thresholds)
                .await
            {
                Ok(_) => {
                    session
                        .cooling
                        .insert(listener.device_id().clone(), listener);
                }
                Err(err) => {
                    let device_id = listener.device_id().clone();
                    report(ctx, Some(&device_id), "failed to listen to device", &err).await;
                    listener.destroy(ctx, &self.thresholds).await;
                }
            }
        }
        reconcile_outdoor(ctx, session).await;
    }

    async fn on_capability(&mut self, update: CapabilityUpdate) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!(subscription = %update.subscription_id, "dropping update, not configured");
            return;
        };
        let ctx = Context::new(&self.gateway, &self.publisher, &self.sink);

        if session.outdoor.owns(update.subscription_id) {
            let Some(reading) = session.outdoor.on_update(&update.value, ctx).await else {
                return;
            };
            let thresholds = &self.thresholds;
            let recomputations: Vec<_> = session
                .cooling
                .values_mut()
                .map(|listener| listener.recompute(ctx, Some(reading), thresholds))
                .collect();
            futures::future::join_all(recomputations).await;
            return;
        }

        let Some((device_id, role)) = session.cooling.iter().find_map(|(id, listener)| {
            listener
                .route(update.subscription_id)
                .map(|role| (id.clone(), role))
        }) else {
            tracing::debug!(
                subscription = %update.subscription_id,
                device_id = %update.device_id,
                capability = %update.capability_id,
                "dropping stale update"
            );
            return;
        };

        if let Some(missing) = vanished(&self.gateway, &device_id).await {
            if let Some(mut listener) = session.cooling.remove(&device_id) {
                listener.destroy(ctx, &self.thresholds).await;
            }
            tracing::info!(%device_id, "device no longer cooling capable, listener removed");
            report(ctx, Some(&device_id), "device no longer available", &missing.into()).await;
            reconcile_outdoor(ctx, session).await;
            return;
        }

        let Some(listener) = session.cooling.get_mut(&device_id) else {
            return;
        };
        match role {
            CapabilityRole::Mode => {
                let result = listener
                    .on_mode(update.value, ctx, &mut session.outdoor, &mut self.thresholds)
                    .await;
                if let Err(err) = result {
                    report(ctx, Some(&device_id), "failed to follow thermostat mode", &err).await;
                }
                reconcile_outdoor(ctx, session).await;
            }
            CapabilityRole::Setpoint => {
                let outdoor = session.outdoor.value();
                let result = listener
                    .on_setpoint(update.value, ctx, outdoor, &mut self.thresholds)
                    .await;
                if let Err(err) = result {
                    report(ctx, Some(&device_id), "failed to follow setpoint", &err).await;
                }
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn on_roster_changed(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let ctx = Context::new(&self.gateway, &self.publisher, &self.sink);
        if session.configuration.is_enabled {
            for (_, mut listener) in std::mem::take(&mut session.cooling) {
                listener.destroy(ctx, &self.thresholds).await;
            }
            // rebuilt listeners re-activate it when a device cools
            session.outdoor.deactivate(ctx).await;
        }
        let path = session.configuration.capability_path.clone();
        if let Err(err) = OutdoorTemperatureListener::create(&path, &self.gateway).await {
            tracing::error!(%path, error = %err, "outdoor sensor no longer available");
            report(ctx, None, "outdoor sensor no longer available", &err).await;
            for (_, mut listener) in std::mem::take(&mut session.cooling) {
                listener.destroy(ctx, &self.thresholds).await;
            }
            session.outdoor.destroy(ctx).await;
            return;
        }
        if session.configuration.is_enabled {
            self.build_cooling_listeners(&mut session).await;
        }
        tracing::info!(devices = session.cooling.len(), "listeners rebuilt after roster change");
        self.session = Some(session);
    }

    async fn teardown(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let ctx = Context::new(&self.gateway, &self.publisher, &self.sink);
        for (_, mut listener) in std::mem::take(&mut session.cooling) {
            listener.destroy(ctx, &self.thresholds).await;
        }
        session.outdoor.destroy(ctx).await;
        tracing::info!("listeners destroyed");
    }
}

/// Re-resolve a device; `Some` when it is gone or lost a cooling capability.
async fn vanished<G: DeviceGateway>(gateway: &G, device_id: &DeviceId) -> Option<NotFoundError> {
    match gateway.get_device(device_id).await {
        Ok(device) if device.is_cooling_capable() => None,
        Ok(device) => {
            let capability = [THERMOSTAT_MODE, TARGET_TEMPERATURE]
                .into_iter()
                .map(CapabilityId::from)
                .find(|id| !device.has_capability(id))?;
            Some(NotFoundError::capability(&capability))
        }
        Err(ListenerError::NotFound(err)) => Some(err),
        Err(err) => {
            tracing::warn!(%device_id, error = %err, "failed to resolve device, keeping listener");
            None
        }
    }
}

/// Release the outdoor sensor once no device cools anymore.
async fn reconcile_outdoor<G, P>(ctx: Context<'_, G, P>, session: &mut Session)
where
    G: DeviceGateway,
    P: EventPublisher + Sync,
{
    let any_cooling = session.cooling.values().any(CoolingListener::is_cooling);
    if !any_cooling && session.outdoor.is_active() {
        tracing::debug!("no device cooling, releasing outdoor sensor");
        session.outdoor.deactivate(ctx).await;
    }
}

async fn report<G, P>(
    ctx: Context<'_, G, P>,
    device_id: Option<&DeviceId>,
    message: &str,
    err: &ListenerError,
) where
    G: DeviceGateway,
    P: EventPublisher + Sync,
{
    tracing::warn!(device_id = ?device_id, error = %err, reason = err.reason(), "{message}");
    ctx.notify(LogEvent::new(
        LogKind::Error,
        device_id.cloned(),
        serde_json::json!({
            "message": message,
            "reason": err.reason(),
            "id": err.subject(),
        }),
    ))
    .await;
}
