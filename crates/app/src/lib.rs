//! # coolhub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DeviceGateway` — resolve devices, read/write/subscribe capabilities
//!   - `SettingStore` — small persisted key/value settings
//!   - `EventPublisher` — the log-event side-channel
//! - Implement the **listener subsystem**:
//!   - `TemperatureListener` — one capability subscription lifecycle
//!   - `OutdoorTemperatureListener` — the single outdoor sensor
//!   - `CoolingListener` — per-device thermostat-mode driven setpoint tracking
//! - Provide the **`Coordinator`** context object owning every listener and
//!   enforcing "outdoor subscribed iff at least one device is cooling"
//! - Provide the **runner** that feeds gateway events to the coordinator one
//!   at a time, and **in-process infrastructure** (log event bus)
//!
//! ## Dependency rule
//! Depends on `coolhub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod coordinator;
pub mod event_bus;
pub mod listeners;
pub mod ports;
pub mod runner;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
