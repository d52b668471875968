//! Application services — persistence-backed use-cases.
//!
//! Each service accepts a [`SettingStore`](crate::ports::SettingStore)
//! implementation via a generic parameter (constructor injection), keeping
//! this layer decoupled from concrete adapters.

pub mod log_history;
pub mod settings_service;
pub mod thresholds;

pub use log_history::LogHistory;
pub use settings_service::SettingsService;
pub use thresholds::ThresholdStore;

use coolhub_domain::error::ListenerError;

pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    key: &str,
    value: serde_json::Value,
) -> Result<T, ListenerError> {
    serde_json::from_value(value).map_err(|err| {
        tracing::warn!(key, error = %err, "malformed setting");
        ListenerError::Storage(Box::new(err))
    })
}

pub(crate) fn encode<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, ListenerError> {
    serde_json::to_value(value).map_err(|err| ListenerError::Storage(Box::new(err)))
}
