//! # coolhub-domain
//!
//! Pure domain model for the coolhub outdoor-driven cooling controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** and their **Capabilities** (observable/settable attributes)
//! - Define **Capability paths** (`<deviceId>:<capabilityId>`) and their validation
//! - Define the **thermostat mode** vocabulary
//! - Own the **setpoint algorithm** and the per-device **threshold** map
//! - Define the persisted **configuration** and the **log events** emitted on
//!   every listener transition
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod capability;
pub mod configuration;
pub mod device;
pub mod log_event;
pub mod setpoint;
pub mod thermostat;
