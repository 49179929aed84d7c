use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Wall-clock instant an expectation was created at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Timestamp(SystemTime);

impl Timestamp {
    pub fn now() -> Self {
        Self(SystemTime::now())
    }

    pub fn into_inner(self) -> SystemTime {
        self.0
    }

    /// `None` when the sum does not fit in a `SystemTime`.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        self.0.checked_add(duration).map(Self)
    }

    pub fn checked_sub(&self, duration: Duration) -> Option<Self> {
        self.0.checked_sub(duration).map(Self)
    }

    /// Whether `window` has fully elapsed since this timestamp.
    ///
    /// A window that overflows the clock never elapses.
    pub fn has_elapsed(&self, window: Duration) -> bool {
        match self.checked_add(window) {
            Some(deadline) => SystemTime::now() > deadline.0,
            None => false,
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Self(time)
    }
}

impl From<Timestamp> for SystemTime {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(since_epoch) => write!(f, "{}", since_epoch.as_secs()),
            Err(before_epoch) => write!(f, "-{}", before_epoch.duration().as_secs()),
        }
    }
}

impl std::ops::Deref for Timestamp {
    type Target = SystemTime;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
