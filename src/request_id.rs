use crate::clock::SharedClock;
use std::fmt;

/// Header carrying the request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Produces correlation ids for requests that arrive without one
pub trait IdGenerator: Send + Sync + fmt::Debug {
    fn next_id(&self) -> String;
}

/// Generates ids from the clock's nanosecond timestamp rendered in base 36.
///
/// Two requests in the same nanosecond share an id; the ids exist for log
/// correlation, not identity.
#[derive(Debug, Clone)]
pub struct ClockIdGenerator {
    clock: SharedClock,
}

impl ClockIdGenerator {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }
}

impl IdGenerator for ClockIdGenerator {
    fn next_id(&self) -> String {
        let nanos = self.clock.now().timestamp_nanos_opt().unwrap_or_default();
        to_base36(nanos)
    }
}

/// Correlation id attached to a request once tracing has run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keep a caller supplied id, otherwise mint a new one
pub fn ensure_trace_id(incoming: Option<&str>, generator: &dyn IdGenerator) -> String {
    match incoming {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => generator.next_id(),
    }
}

/// Lowercase base-36 rendering of a signed integer
pub fn to_base36(value: i64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut magnitude = value.unsigned_abs();
    let mut buf = Vec::with_capacity(14);
    while magnitude > 0 {
        buf.push(DIGITS[(magnitude % 36) as usize]);
        magnitude /= 36;
    }
    if value < 0 {
        buf.push(b'-');
    }
    buf.reverse();

    String::from_utf8(buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock, ManualClock};
    use chrono::Duration as ChronoDuration;
    use std::sync::Arc;

    fn generator_at(timespec: &str) -> ClockIdGenerator {
        ClockIdGenerator::new(Arc::new(FixedClock::parse(timespec).unwrap()))
    }

    #[test]
    fn test_passthrough_keeps_caller_id() {
        let generator = generator_at("2022-04-30T23:59:58Z");
        assert_eq!(ensure_trace_id(Some("TEST-ID"), &generator), "TEST-ID");

        let other = generator_at("2022-04-30T23:59:59Z");
        assert_eq!(ensure_trace_id(Some("TEST-ID"), &other), "TEST-ID");
    }

    #[test]
    fn test_generates_when_absent_or_empty() {
        let generator = generator_at("2022-04-30T23:59:58Z");
        assert_eq!(ensure_trace_id(None, &generator), "cjnzec7mxi4g");
        assert_eq!(ensure_trace_id(Some(""), &generator), "cjnzec7mxi4g");

        let generator = generator_at("2022-04-30T23:59:59Z");
        assert_eq!(ensure_trace_id(None, &generator), "cjnzeco6az28");
    }

    #[test]
    fn test_increasing_clock_yields_distinct_ids() {
        let start = FixedClock::parse("2022-04-30T23:59:58Z").unwrap();
        let clock = Arc::new(ManualClock::new(start.now()));
        let generator = ClockIdGenerator::new(clock.clone());

        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(generator.next_id()));
            clock.advance(ChronoDuration::nanoseconds(1));
        }
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(-71), "-1z");
        assert_eq!(to_base36(i64::MIN), "-1y2p0ij32e8e8");
    }
}
