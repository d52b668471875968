//! Thermostat mode — the operating mode reported by a climate device.

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermostatMode {
    Cool,
    Heat,
    Auto,
    Off,
    /// Any vendor-specific mode (dry, fan, …).
    #[serde(untagged)]
    Other(String),
}

impl ThermostatMode {
    #[must_use]
    pub fn is_cool(&self) -> bool {
        matches!(self, Self::Cool)
    }
}

impl From<&str> for ThermostatMode {
    fn from(value: &str) -> Self {
        match value {
            "cool" => Self::Cool,
            "heat" => Self::Heat,
            "auto" => Self::Auto,
            "off" => Self::Off,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<&CapabilityValue> for ThermostatMode {
    /// Non-textual values never mean "cool".
    fn from(value: &CapabilityValue) -> Self {
        match value {
            CapabilityValue::Text(text) => Self::from(text.as_str()),
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ThermostatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cool => f.write_str("cool"),
            Self::Heat => f.write_str("heat"),
            Self::Auto => f.write_str("auto"),
            Self::Off => f.write_str("off"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_cool_mode() {
        assert!(ThermostatMode::from("cool").is_cool());
    }

    #[test]
    fn should_not_treat_other_modes_as_cool() {
        assert!(!ThermostatMode::from("heat").is_cool());
        assert!(!ThermostatMode::from("dry").is_cool());
        assert!(!ThermostatMode::from(&CapabilityValue::Bool(true)).is_cool());
    }

    #[test]
    fn should_keep_vendor_mode_text() {
        let mode = ThermostatMode::from("fan");
        assert_eq!(mode, ThermostatMode::Other("fan".to_string()));
        assert_eq!(mode.to_string(), "fan");
    }

    #[test]
    fn should_read_mode_from_capability_value() {
        let mode = ThermostatMode::from(&CapabilityValue::from("cool"));
        assert_eq!(mode, ThermostatMode::Cool);
    }
}
