//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for measurement times, last-seen dates, event times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Convert a vendor epoch-seconds value into a [`Timestamp`].
///
/// Returns `None` when the value is outside the representable range.
#[must_use]
pub fn from_epoch_secs(secs: i64) -> Option<Timestamp> {
    DateTime::from_timestamp(secs, 0)
}
