use crate::lifecycle::LifecycleState;
use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::time::Duration;

/// Health derived from lifecycle state and process uptime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthReport {
    /// Not ready yet, or already shutting down
    Unavailable,
    Uptime(Duration),
}

impl HealthReport {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Uptime(_))
    }

    pub fn uptime(&self) -> Option<Duration> {
        match self {
            Self::Uptime(uptime) => Some(*uptime),
            Self::Unavailable => None,
        }
    }
}

/// Compute health for the given lifecycle state.
///
/// Only a Running process is healthy. Clock skew that puts `now` before
/// `started_at` reports zero uptime.
pub fn report(state: LifecycleState, started_at: DateTime<Utc>, now: DateTime<Utc>) -> HealthReport {
    if state != LifecycleState::Running {
        return HealthReport::Unavailable;
    }

    let uptime = (now - started_at).to_std().unwrap_or(Duration::ZERO);
    HealthReport::Uptime(uptime)
}

/// Render a duration compactly, e.g. `59m1s`, `3h39m59s`, `1.5s`, `250ms`
pub fn format_uptime(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}µs", with_fraction(nanos, 1_000));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", with_fraction(nanos, 1_000_000));
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = u128::from(total_secs % 60) * 1_000_000_000 + u128::from(duration.subsec_nanos());

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{}h", hours);
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{}m", minutes);
    }
    let _ = write!(out, "{}s", with_fraction(secs, 1_000_000_000));
    out
}

fn with_fraction(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let fraction = value % unit;
    if fraction == 0 {
        return whole.to_string();
    }

    let width = unit.to_string().len() - 1;
    let digits = format!("{:0width$}", fraction, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};
    use chrono::Duration as ChronoDuration;

    fn t0() -> DateTime<Utc> {
        FixedClock::parse("2022-04-30T23:00:58Z").unwrap().now()
    }

    #[test]
    fn test_starting_is_unavailable() {
        assert_eq!(report(LifecycleState::Starting, t0(), t0()), HealthReport::Unavailable);
    }

    #[test]
    fn test_stopping_is_unavailable() {
        let later = t0() + ChronoDuration::hours(12);
        assert_eq!(report(LifecycleState::Stopping, t0(), later), HealthReport::Unavailable);
        assert_eq!(report(LifecycleState::Stopping, t0(), t0()), HealthReport::Unavailable);
    }

    #[test]
    fn test_running_reports_uptime() {
        let now = FixedClock::parse("2022-04-30T23:59:59Z").unwrap().now();
        let health = report(LifecycleState::Running, t0(), now);

        assert!(health.is_available());
        assert_eq!(health.uptime(), Some(Duration::from_secs(59 * 60 + 1)));
        assert_eq!(format_uptime(health.uptime().unwrap()), "59m1s");
    }

    #[test]
    fn test_clock_skew_clamps_to_zero() {
        let earlier = t0() - ChronoDuration::seconds(3);
        assert_eq!(
            report(LifecycleState::Running, t0(), earlier),
            HealthReport::Uptime(Duration::ZERO)
        );
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::ZERO), "0s");
        assert_eq!(format_uptime(Duration::from_secs(13_199)), "3h39m59s");
        assert_eq!(format_uptime(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_uptime(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_uptime(Duration::from_millis(250)), "250ms");
        assert_eq!(format_uptime(Duration::from_micros(1500)), "1.5ms");
        assert_eq!(format_uptime(Duration::from_nanos(1500)), "1.5µs");
        assert_eq!(format_uptime(Duration::from_nanos(7)), "7ns");
    }
}
