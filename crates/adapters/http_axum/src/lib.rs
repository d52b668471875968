//! # coolhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Expose the reconfigure operation and the current configuration
//!   (`/api/settings`)
//! - List temperature sensors a configuration can point at (`/api/sensors`)
//! - Report saved thresholds, listener status and log history
//! - Stream log events as Server-Sent Events (`/api/logs/stream`)
//!
//! ## Dependency rule
//! Depends on `coolhub-app` (for the coordinator and services) and
//! `coolhub-domain` (for request/response types). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
