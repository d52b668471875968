//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`ListenerError`] via `#[from]` (or `From` impls in adapter crates).

use std::fmt;

use crate::id::{CapabilityId, DeviceId};

/// Top-level error raised by listeners, the coordinator and port adapters.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("gateway error")]
    Gateway(#[from] GatewayError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ListenerError {
    /// Machine-readable reason, stable across releases.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::InvalidCapabilityPath { .. }) => {
                "invalid_capability_path"
            }
            Self::Validation(ValidationError::EmptyName) => "empty_name",
            Self::NotFound(NotFoundError {
                missing: Missing::Device,
                ..
            }) => "device_not_found",
            Self::NotFound(NotFoundError {
                missing: Missing::Capability,
                ..
            }) => "capability_not_found",
            Self::Gateway(GatewayError::Unreachable { .. }) => "device_unreachable",
            Self::Gateway(GatewayError::UnexpectedValue { .. }) => "unexpected_value",
            Self::Storage(_) => "storage_failure",
        }
    }

    /// The identifier the error is about, when there is one.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::Validation(ValidationError::InvalidCapabilityPath { path }) => {
                Some(path.as_str())
            }
            Self::Validation(ValidationError::EmptyName) | Self::Storage(_) => None,
            Self::NotFound(err) => Some(err.id.as_str()),
            Self::Gateway(
                GatewayError::Unreachable { device_id }
                | GatewayError::UnexpectedValue { device_id, .. },
            ) => Some(device_id.as_str()),
        }
    }

    /// Whether the error reports a device or capability that does not resolve.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Malformed input rejected before touching any collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The path is not exactly `<deviceId>:<capabilityId>` with both parts set.
    #[error("invalid capability path {path:?}, expected \"<deviceId>:<capabilityId>\"")]
    InvalidCapabilityPath { path: String },

    #[error("name must not be empty")]
    EmptyName,
}

/// Which half of a device/capability reference failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Device,
    Capability,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => f.write_str("device"),
            Self::Capability => f.write_str("capability"),
        }
    }
}

/// A device id or capability id does not resolve against the current roster.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{missing} {id:?} not found")]
pub struct NotFoundError {
    pub missing: Missing,
    pub id: String,
}

impl NotFoundError {
    #[must_use]
    pub fn device(id: &DeviceId) -> Self {
        Self {
            missing: Missing::Device,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn capability(id: &CapabilityId) -> Self {
        Self {
            missing: Missing::Capability,
            id: id.to_string(),
        }
    }
}

/// Runtime failures reported by the device gateway.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// The device exists but did not accept the request.
    #[error("device {device_id} is unreachable")]
    Unreachable { device_id: DeviceId },

    /// A capability delivered a value of the wrong kind.
    #[error("device {device_id} reported an unexpected value for {capability_id}")]
    UnexpectedValue {
        device_id: DeviceId,
        capability_id: CapabilityId,
    },
}
