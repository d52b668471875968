//! # coolhub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `SettingStore` port defined in `coolhub-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between JSON setting values and database rows
//!
//! ## Dependency rule
//! Depends on `coolhub-app` (for port traits) and `coolhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod setting_store;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use setting_store::SqliteSettingStore;
