//! Time source abstraction

use chrono::{DateTime, Utc};

/// Source of the current time
///
/// Injected so influence windows and sent-time defaults can be tested
/// without sleeping.
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Current time as epoch milliseconds
    fn current_time_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
