use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch, as the scheduler's clock.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as i64)
}
