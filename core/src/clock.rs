//! Injectable time source.
//!
//! The lookup cache and the tracker read "now" through [`Clock`] so cache
//! expiry and snapshot ages can be tested deterministically.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

/// Clock abstraction for an injectable time source.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Current time as unix seconds.
    fn unix_now(&self) -> i64 {
        self.now().timestamp()
    }
}

/// System clock implementation (production use).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock clock for tests.
///
/// Clones share the same current time, so a test can keep one handle and
/// advance the clock that a client or tracker already owns.
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a new mock clock at the specified time.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(time)),
        }
    }

    /// Create a mock clock at a unix timestamp. Out-of-range values fall
    /// back to the epoch.
    pub fn at_unix(secs: i64) -> Self {
        Self::new(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }

    /// Advance the clock by the specified duration.
    pub fn advance(&self, duration: Duration) {
        let mut now = self
            .current_time
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *now += duration;
    }

    /// Jump to an absolute time.
    pub fn set(&self, time: DateTime<Utc>) {
        let mut now = self
            .current_time
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *now = time;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self
            .current_time
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
