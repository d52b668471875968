//! Setting store port — small durable key/value settings.

use std::future::Future;

use coolhub_domain::error::ListenerError;

/// Durable key → JSON value store.
pub trait SettingStore: Send + Sync {
    /// Read a setting; `None` when it was never written.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, ListenerError>> + Send;

    /// Write (create or replace) a setting.
    fn set(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<(), ListenerError>> + Send;
}

impl<T: SettingStore> SettingStore for std::sync::Arc<T> {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, ListenerError>> + Send {
        (**self).get(key)
    }

    fn set(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<(), ListenerError>> + Send {
        (**self).set(key, value)
    }
}
