use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Source of the current time
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

pub type SharedClock = Arc<dyn Clock>;

/// Wall clock backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn shared() -> SharedClock {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// Parse an RFC 3339 timestamp such as `2022-04-30T23:59:59Z`
    pub fn parse(timespec: &str) -> Result<Self, chrono::ParseError> {
        let instant = DateTime::parse_from_rfc3339(timespec)?.with_timezone(&Utc);
        Ok(Self { instant })
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    instant: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            instant: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: ChronoDuration) {
        let mut instant = self.instant.lock();
        *instant += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.instant.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_parses_rfc3339() {
        let clock = FixedClock::parse("2022-04-30T23:59:59Z").unwrap();
        assert_eq!(clock.now().timestamp(), 1_651_363_199);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_fixed_clock_rejects_garbage() {
        assert!(FixedClock::parse("yesterday").is_err());
    }

    #[test]
    fn test_manual_clock_advances() {
        let start = FixedClock::parse("2022-04-30T23:59:58Z").unwrap().now();
        let clock = ManualClock::new(start);

        clock.advance(ChronoDuration::seconds(1));
        assert_eq!(clock.now().timestamp(), 1_651_363_199);

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock::shared();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
