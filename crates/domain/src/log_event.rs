//! Log event — an immutable record of a listener transition.
//!
//! Every transition (created, cleaned, listened, calculated, reverted, saved,
//! error) produces one event. Events are an observability side-channel: they
//! are broadcast, kept in a bounded history and streamed to clients, but no
//! control flow depends on them.

use serde::{Deserialize, Serialize};

use crate::id::{DeviceId, LogEventId};
use crate::time::{Timestamp, now};

/// Kind of transition a [`LogEvent`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// A listener subscribed to a capability.
    Created,
    /// A listener released its subscription (or had nothing to release).
    Cleaned,
    /// A new capability value was observed.
    Listened,
    /// A setpoint was computed and pushed.
    Calculated,
    /// A setpoint was restored to its saved threshold.
    Reverted,
    /// A threshold was persisted.
    Saved,
    /// A runtime failure was swallowed.
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub id: LogEventId,
    pub kind: LogKind,
    pub device_id: Option<DeviceId>,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl LogEvent {
    #[must_use]
    pub fn new(kind: LogKind, device_id: Option<DeviceId>, data: serde_json::Value) -> Self {
        Self {
            id: LogEventId::new(),
            kind,
            device_id,
            data,
            timestamp: now(),
        }
    }

    /// Shorthand for an event about one device.
    #[must_use]
    pub fn for_device(kind: LogKind, device_id: &DeviceId, data: serde_json::Value) -> Self {
        Self::new(kind, Some(device_id.clone()), data)
    }
}
