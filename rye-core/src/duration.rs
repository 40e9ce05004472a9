//! A stable wire-format duration, independent of serde's `std::time::Duration`
//! representation (which is not guaranteed across serde versions).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Milliseconds since some reference instant, serialized as a plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationMs(pub u64);

impl DurationMs {
    /// The zero duration.
    pub const ZERO: DurationMs = DurationMs(0);

    /// Construct from a millisecond count.
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Construct from a whole-second count.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    /// Milliseconds as a raw integer.
    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Convert to a standard library `Duration`.
    pub fn to_std(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl From<Duration> for DurationMs {
    fn from(d: Duration) -> Self {
        Self(d.as_millis() as u64)
    }
}

impl From<DurationMs> for Duration {
    fn from(d: DurationMs) -> Self {
        d.to_std()
    }
}
