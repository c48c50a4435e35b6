use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Seconds between the UNIX epoch and the network epoch (2000-01-01T00:00:00Z).
pub const NETWORK_EPOCH_OFFSET: u64 = 946_684_800;

/// Network time: whole seconds since 2000-01-01T00:00:00Z.
///
/// Ledger close times and object expirations are expressed in this unit.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetTime(u32);

impl NetTime {
    pub const fn new(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Convert from UNIX seconds. Times before the network epoch clamp to zero.
    pub fn from_unix_secs(unix: u64) -> Self {
        let secs = unix.saturating_sub(NETWORK_EPOCH_OFFSET);
        Self(u32::try_from(secs).unwrap_or(u32::MAX))
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self::from_unix_secs(unix)
    }

    pub const fn as_secs(self) -> u32 {
        self.0
    }

    pub fn to_unix_secs(self) -> u64 {
        u64::from(self.0) + NETWORK_EPOCH_OFFSET
    }

    /// Whether an expiration has passed as of `self`, the parent ledger's
    /// close time. An expiration equal to the close time has passed.
    pub fn has_passed(self, expiration: NetTime) -> bool {
        expiration <= self
    }
}

impl fmt::Debug for NetTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetTime({})", self.0)
    }
}

impl fmt::Display for NetTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NetTime {
    fn from(secs: u32) -> Self {
        Self(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_conversion() {
        assert_eq!(NetTime::from_unix_secs(NETWORK_EPOCH_OFFSET), NetTime::new(0));
        assert_eq!(NetTime::from_unix_secs(NETWORK_EPOCH_OFFSET + 60).as_secs(), 60);
        assert_eq!(NetTime::from_unix_secs(0), NetTime::new(0));
        assert_eq!(NetTime::new(60).to_unix_secs(), NETWORK_EPOCH_OFFSET + 60);
    }

    #[test]
    fn expiration_at_close_time_has_passed() {
        let close = NetTime::new(1_000);
        assert!(close.has_passed(NetTime::new(999)));
        assert!(close.has_passed(NetTime::new(1_000)));
        assert!(!close.has_passed(NetTime::new(1_001)));
    }

    #[test]
    fn now_is_after_2020() {
        // 2020-01-01 in network time.
        assert!(NetTime::now() > NetTime::new(631_152_000));
    }
}
