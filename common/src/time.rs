use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Time since the Unix epoch. Used for netcode tokens and round deadlines.
pub fn now() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time is before unix epoch") // If this happens, enable automatic time synchronization (NTP), e.g. `timedatectl set-ntp true`.
}
