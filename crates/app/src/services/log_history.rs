//! Log history — the most recent log events, newest first.

use tokio::sync::{Mutex, broadcast};

use coolhub_domain::configuration::LOG_HISTORY_KEY;
use coolhub_domain::error::ListenerError;
use coolhub_domain::log_event::LogEvent;

use super::{decode, encode};
use crate::ports::SettingStore;

/// Number of events kept.
pub const MAX_LOG_HISTORY: usize = 100;

/// Bounded, persisted history of [`LogEvent`]s.
pub struct LogHistory<S> {
    store: S,
    entries: Mutex<Vec<LogEvent>>,
}

impl<S: SettingStore> LogHistory<S> {
    /// Load the saved history, empty when never written or malformed.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Storage`] when the store itself fails.
    pub async fn load(store: S) -> Result<Self, ListenerError> {
        let entries = match store.get(LOG_HISTORY_KEY).await? {
            Some(value) => decode(LOG_HISTORY_KEY, value).unwrap_or_default(),
            None => Vec::new(),
        };
        Ok(Self {
            store,
            entries: Mutex::new(entries),
        })
    }

    /// Prepend an event, dropping the oldest beyond [`MAX_LOG_HISTORY`].
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Storage`] when persisting fails. The event
    /// stays in memory.
    pub async fn record(&self, event: LogEvent) -> Result<(), ListenerError> {
        let encoded = {
            let mut entries = self.entries.lock().await;
            entries.insert(0, event);
            entries.truncate(MAX_LOG_HISTORY);
            encode(&*entries)?
        };
        self.store.set(LOG_HISTORY_KEY, encoded).await
    }

    /// Up to `limit` events, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<LogEvent> {
        let entries = self.entries.lock().await;
        entries.iter().take(limit).cloned().collect()
    }

    /// Record every event received until the channel closes.
    pub async fn run(&self, mut events: broadcast::Receiver<LogEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(err) = self.record(event).await {
                        tracing::warn!(error = %err, "failed to persist log history");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "log history lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
