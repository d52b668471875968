//! Settings service — the persisted outdoor sensor configuration.

use coolhub_domain::configuration::{CAPABILITY_PATH_KEY, Configuration, IS_ENABLED_KEY};
use coolhub_domain::error::ListenerError;

use super::decode;
use crate::ports::SettingStore;

/// Reads and writes [`Configuration`] through a [`SettingStore`].
#[derive(Debug, Clone)]
pub struct SettingsService<S> {
    store: S,
}

impl<S: SettingStore> SettingsService<S> {
    /// Create a new service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the saved configuration.
    ///
    /// `None` when no capability path was ever saved. A missing `isEnabled`
    /// flag reads as disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Storage`] when the store fails or holds a
    /// malformed value.
    pub async fn load_configuration(&self) -> Result<Option<Configuration>, ListenerError> {
        let Some(path) = self.store.get(CAPABILITY_PATH_KEY).await? else {
            return Ok(None);
        };
        let capability_path: String = decode(CAPABILITY_PATH_KEY, path)?;
        let is_enabled = match self.store.get(IS_ENABLED_KEY).await? {
            Some(value) => decode(IS_ENABLED_KEY, value)?,
            None => false,
        };
        Ok(Some(Configuration::new(capability_path, is_enabled)))
    }

    /// Persist both configuration keys.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Storage`] when the store fails.
    #[tracing::instrument(skip(self))]
    pub async fn save_configuration(&self, config: &Configuration) -> Result<(), ListenerError> {
        self.store
            .set(
                CAPABILITY_PATH_KEY,
                serde_json::Value::String(config.capability_path.clone()),
            )
            .await?;
        self.store
            .set(IS_ENABLED_KEY, serde_json::Value::Bool(config.is_enabled))
            .await
    }
}
