use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Current wall-clock timestamp in milliseconds, stamped onto snapshots.
pub fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}
