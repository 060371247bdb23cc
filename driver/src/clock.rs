use std::sync::{Arc, Mutex, PoisonError};

use time::{Duration, OffsetDateTime};

use kernel::interface::clock::Clock;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<OffsetDateTime>>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, time: OffsetDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = time;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod test {
    use kernel::interface::clock::Clock;
    use time::macros::datetime;
    use time::Duration;

    use crate::clock::ManualClock;

    #[test]
    fn clones_share_time() {
        let clock = ManualClock::new(datetime!(2024-01-01 0:00 UTC));
        let other = clock.clone();
        clock.advance(Duration::hours(36));
        assert_eq!(other.now(), datetime!(2024-01-02 12:00 UTC));
        other.set(datetime!(2023-12-31 0:00 UTC));
        assert_eq!(clock.now(), datetime!(2023-12-31 0:00 UTC));
    }
}
