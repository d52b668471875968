//! Virtual air-conditioner — thermostat mode plus setpoint.

use coolhub_domain::capability::{MEASURE_TEMPERATURE, TARGET_TEMPERATURE, THERMOSTAT_MODE};
use coolhub_domain::device::Device;
use coolhub_domain::error::ValidationError;
use coolhub_domain::thermostat::ThermostatMode;

/// Setpoint a freshly created air-conditioner starts with, in °C.
pub const DEFAULT_SETPOINT: f64 = 24.0;

/// Indoor reading a freshly created air-conditioner reports, in °C.
const INDOOR_TEMPERATURE: f64 = 26.0;

/// A simulated climate device, off by default.
pub struct VirtualAirConditioner {
    name: String,
    mode: ThermostatMode,
    setpoint: f64,
}

impl VirtualAirConditioner {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: ThermostatMode::Off,
            setpoint: DEFAULT_SETPOINT,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ThermostatMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_setpoint(mut self, setpoint: f64) -> Self {
        self.setpoint = setpoint;
        self
    }

    /// Produce the [`Device`] descriptor; the id is derived from the name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when the name is empty.
    pub fn discover(&self) -> Result<Device, ValidationError> {
        Device::builder()
            .name(self.name.as_str())
            .capability(THERMOSTAT_MODE, self.mode.to_string().as_str())
            .capability(TARGET_TEMPERATURE, self.setpoint)
            .capability(MEASURE_TEMPERATURE, INDOOR_TEMPERATURE)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_derive_id_from_name() {
        let device = VirtualAirConditioner::new("Living Room")
            .discover()
            .unwrap();
        assert_eq!(device.id.as_str(), "living-room");
        assert!(device.is_cooling_capable());
    }

    #[test]
    fn should_start_off_with_default_setpoint() {
        let device = VirtualAirConditioner::new("Bedroom").discover().unwrap();
        assert_eq!(
            device.capability(&THERMOSTAT_MODE.into()),
            Some(&"off".into())
        );
        assert_eq!(
            device.capability(&TARGET_TEMPERATURE.into()),
            Some(&DEFAULT_SETPOINT.into())
        );
    }

    #[test]
    fn should_reject_empty_name() {
        let result = VirtualAirConditioner::new("").discover();
        assert_eq!(result.unwrap_err(), ValidationError::EmptyName);
    }
}
