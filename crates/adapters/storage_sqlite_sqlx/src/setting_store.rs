//! `SQLite` implementation of [`SettingStore`].

use std::future::Future;

use sqlx::SqlitePool;

use coolhub_app::ports::SettingStore;
use coolhub_domain::error::ListenerError;

use crate::error::StorageError;

const SELECT_BY_KEY: &str = "SELECT value FROM settings WHERE key = ?";
const UPSERT: &str = "INSERT INTO settings (key, value) VALUES (?, ?) \
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// `SQLite`-backed key/value settings, values stored as JSON text.
#[derive(Clone)]
pub struct SqliteSettingStore {
    pool: SqlitePool,
}

impl SqliteSettingStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SettingStore for SqliteSettingStore {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, ListenerError>> + Send {
        let pool = self.pool.clone();
        let key = key.to_string();
        async move {
            let row: Option<(String,)> = sqlx::query_as(SELECT_BY_KEY)
                .bind(&key)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            let Some((raw,)) = row else {
                return Ok(None);
            };
            let value = serde_json::from_str(&raw).map_err(StorageError::from)?;
            Ok(Some(value))
        }
    }

    fn set(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<(), ListenerError>> + Send {
        let pool = self.pool.clone();
        let key = key.to_string();
        async move {
            let raw = serde_json::to_string(&value).map_err(StorageError::from)?;
            sqlx::query(UPSERT)
                .bind(&key)
                .bind(raw)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;
            tracing::trace!(%key, "setting saved");
            Ok(())
        }
    }
}
