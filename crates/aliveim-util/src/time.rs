//! Time utilities for aliveim
//!
//! Devices request their timeout as a signed 32-bit millisecond count.
//! A zero or negative request is not rejected: it is clamped to a zero
//! duration, so the timer fires on the next scheduler pass.

use chrono::{DateTime, Local};
use std::time::Duration;

/// Convert a requested timeout in milliseconds into a duration.
///
/// Non-positive values map to `Duration::ZERO` ("fire immediately").
pub fn timeout_from_millis(timeout_ms: i32) -> Duration {
    if timeout_ms <= 0 {
        Duration::ZERO
    } else {
        Duration::from_millis(timeout_ms as u64)
    }
}

/// Returns true if the requested timeout will be treated as "fire immediately"
pub fn is_immediate(timeout_ms: i32) -> bool {
    timeout_ms <= 0
}

/// Milliseconds in a duration, saturating at `u64::MAX`
pub fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Current wall-clock time, used for display and logging only.
///
/// Deadlines are always tracked in monotonic time.
pub fn now() -> DateTime<Local> {
    Local::now()
}
