//! Device — a host-owned thing exposing one or more capabilities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capability::{
    CapabilityPath, CapabilityValue, TARGET_TEMPERATURE, THERMOSTAT_MODE,
    is_temperature_measurement,
};
use crate::error::ValidationError;
use crate::id::{CapabilityId, DeviceId};

/// A snapshot of a device as known to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub capabilities: BTreeMap<CapabilityId, CapabilityValue>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when `name` is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }

    #[must_use]
    pub fn has_capability(&self, id: &CapabilityId) -> bool {
        self.capabilities.contains_key(id)
    }

    /// Current value of a capability, if the device exposes it.
    #[must_use]
    pub fn capability(&self, id: &CapabilityId) -> Option<&CapabilityValue> {
        self.capabilities.get(id)
    }

    /// A device exposing both a thermostat mode and a target temperature.
    #[must_use]
    pub fn is_cooling_capable(&self) -> bool {
        self.has_capability(&THERMOSTAT_MODE.into())
            && self.has_capability(&TARGET_TEMPERATURE.into())
    }

    /// Temperature readings exposed by this device, as capability paths.
    pub fn temperature_paths(&self) -> impl Iterator<Item = CapabilityPath> + '_ {
        self.capabilities
            .keys()
            .filter(|id| is_temperature_measurement(id))
            .map(|id| CapabilityPath::new(self.id.clone(), id.clone()))
    }

    /// Temperature readings exposed by this device, labelled for display.
    pub fn temperature_sensors(&self) -> impl Iterator<Item = TemperatureSensor> + '_ {
        self.temperature_paths().map(|capability_path| TemperatureSensor {
            name: format!("{} - {}", self.name, capability_path.capability_id),
            capability_path,
        })
    }
}

/// A selectable outdoor temperature source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureSensor {
    pub capability_path: CapabilityPath,
    pub name: String,
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    capabilities: BTreeMap<CapabilityId, CapabilityValue>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<DeviceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn capability(
        mut self,
        id: impl Into<CapabilityId>,
        value: impl Into<CapabilityValue>,
    ) -> Self {
        self.capabilities.insert(id.into(), value.into());
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// The id defaults to a slug of the name when not provided.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] if `name` is missing or empty.
    pub fn build(self) -> Result<Device, ValidationError> {
        let name = self.name.unwrap_or_default();
        let id = self
            .id
            .unwrap_or_else(|| DeviceId::from(name.to_lowercase().replace(' ', "-")));
        let device = Device {
            id,
            name,
            capabilities: self.capabilities,
        };
        device.validate()?;
        Ok(device)
    }
}
