//! Capabilities — named, independently observable/settable device attributes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{CapabilityId, DeviceId, SubscriptionId};

/// Thermostat operating mode of a climate device.
pub const THERMOSTAT_MODE: &str = "thermostat_mode";
/// Setpoint written to a climate device.
pub const TARGET_TEMPERATURE: &str = "target_temperature";
/// Temperature reading; sub-capabilities use a `measure_temperature.` prefix.
pub const MEASURE_TEMPERATURE: &str = "measure_temperature";

/// Whether a capability id names a temperature reading.
#[must_use]
pub fn is_temperature_measurement(id: &CapabilityId) -> bool {
    let id = id.as_str();
    id == MEASURE_TEMPERATURE
        || id
            .strip_prefix(MEASURE_TEMPERATURE)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// A single typed capability value as reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CapabilityValue {
    /// Numeric view, for temperature-like capabilities.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Textual view, for enumerated capabilities such as thermostat mode.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<f64> for CapabilityValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CapabilityValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl fmt::Display for CapabilityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => value.fmt(f),
            Self::Number(value) => value.fmt(f),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Reference to one capability of one device, written `<deviceId>:<capabilityId>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CapabilityPath {
    pub device_id: DeviceId,
    pub capability_id: CapabilityId,
}

impl CapabilityPath {
    #[must_use]
    pub fn new(device_id: DeviceId, capability_id: CapabilityId) -> Self {
        Self {
            device_id,
            capability_id,
        }
    }
}

impl FromStr for CapabilityPath {
    type Err = ValidationError;

    /// Split into exactly two non-empty segments.
    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidCapabilityPath {
            path: path.to_string(),
        };
        let mut segments = path.split(':');
        let (Some(device_id), Some(capability_id), None) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(invalid());
        };
        if device_id.is_empty() || capability_id.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(device_id.into(), capability_id.into()))
    }
}

impl fmt::Display for CapabilityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device_id, self.capability_id)
    }
}

impl Serialize for CapabilityPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CapabilityPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One live subscription to a device capability.
///
/// Created on subscribe and dropped on release; the `id` is the release
/// handle and the token used to recognise the updates it produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub device_id: DeviceId,
    pub capability_id: CapabilityId,
    pub value: Option<CapabilityValue>,
}
