//! Virtual weather station — a single outdoor temperature reading.

use coolhub_domain::capability::MEASURE_TEMPERATURE;
use coolhub_domain::device::Device;
use coolhub_domain::error::ValidationError;

/// Device id of the simulated outdoor sensor.
pub const WEATHER_STATION_ID: &str = "outdoor";

/// A simulated outdoor sensor.
pub struct VirtualWeatherStation {
    temperature: f64,
}

impl VirtualWeatherStation {
    #[must_use]
    pub fn new(temperature: f64) -> Self {
        Self { temperature }
    }

    /// Produce the [`Device`] descriptor.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the builder fails.
    pub fn discover(&self) -> Result<Device, ValidationError> {
        Device::builder()
            .id(WEATHER_STATION_ID)
            .name("Outdoor")
            .capability(MEASURE_TEMPERATURE, self.temperature)
            .build()
    }
}
