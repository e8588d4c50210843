//! Expiration encoding
//!
//! Durations and instants are sent to the store in milliseconds.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Milliseconds for a TTL. A non-zero duration never rounds down to zero.
pub(crate) fn duration_millis(ttl: Duration) -> u64 {
    if ttl.is_zero() {
        return 0;
    }
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Unix timestamp in milliseconds for an absolute expiration
pub(crate) fn instant_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}
