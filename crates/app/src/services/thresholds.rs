//! Threshold store — persisted per-device minimum setpoints.

use coolhub_domain::configuration::THRESHOLDS_KEY;
use coolhub_domain::error::ListenerError;
use coolhub_domain::id::DeviceId;
use coolhub_domain::setpoint::Thresholds;

use super::{decode, encode};
use crate::ports::SettingStore;

/// In-memory [`Thresholds`] written through to a [`SettingStore`].
#[derive(Debug)]
pub struct ThresholdStore<S> {
    store: S,
    thresholds: Thresholds,
}

impl<S: SettingStore> ThresholdStore<S> {
    /// Load the saved map, empty when never written.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Storage`] when the store fails or the saved
    /// value is not a device → number map.
    pub async fn load(store: S) -> Result<Self, ListenerError> {
        let thresholds = match store.get(THRESHOLDS_KEY).await? {
            Some(value) => decode(THRESHOLDS_KEY, value)?,
            None => Thresholds::new(),
        };
        tracing::debug!(count = thresholds.len(), "thresholds loaded");
        Ok(Self { store, thresholds })
    }

    /// Saved threshold for a device, `0` when absent.
    #[must_use]
    pub fn get(&self, device_id: &DeviceId) -> f64 {
        self.thresholds.get(device_id)
    }

    #[must_use]
    pub fn snapshot(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Set a device threshold, persisting the whole map when it changed.
    ///
    /// Returns `true` when the value changed. The in-memory value is kept
    /// even if persisting fails.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Storage`] when the store rejects the write.
    #[tracing::instrument(skip(self))]
    pub async fn save(&mut self, device_id: &DeviceId, value: f64) -> Result<bool, ListenerError> {
        if !self.thresholds.set(device_id.clone(), value) {
            return Ok(false);
        }
        let encoded = encode(&self.thresholds)?;
        self.store.set(THRESHOLDS_KEY, encoded).await?;
        Ok(true)
    }
}
