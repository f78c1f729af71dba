use chrono::{Local, NaiveDateTime, SubsecRound};

/// Clock abstracts access to the current local time so timestamps stay deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current local wall-clock time truncated to whole seconds.
    fn now(&self) -> NaiveDateTime;
}

/// Real-time clock backed by the system local time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local().trunc_subsecs(0)
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
