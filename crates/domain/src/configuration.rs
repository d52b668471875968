//! Configuration — which outdoor sensor feeds the system and whether
//! automatic adjustment is active.

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityPath;
use crate::error::ValidationError;

/// Setting-store key holding the outdoor capability path.
pub const CAPABILITY_PATH_KEY: &str = "capabilityPath";
/// Setting-store key holding the enable flag.
pub const IS_ENABLED_KEY: &str = "isEnabled";
/// Setting-store key holding the per-device threshold map.
pub const THRESHOLDS_KEY: &str = "thresholds";
/// Setting-store key holding the persisted log history.
pub const LOG_HISTORY_KEY: &str = "lastLogs";

/// The declarative description of the outdoor-driven cooling setup.
///
/// Keeps the raw path text so an unvalidated request can be carried to the
/// reconfigure entry point, which is where it is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub capability_path: String,
    pub is_enabled: bool,
}

impl Configuration {
    #[must_use]
    pub fn new(capability_path: impl Into<String>, is_enabled: bool) -> Self {
        Self {
            capability_path: capability_path.into(),
            is_enabled,
        }
    }

    /// Parse the outdoor capability path.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCapabilityPath`] when the path is
    /// not `<deviceId>:<capabilityId>` with both segments non-empty.
    pub fn path(&self) -> Result<CapabilityPath, ValidationError> {
        self.capability_path.parse()
    }
}
