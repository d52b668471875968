//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp attached to log events.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
