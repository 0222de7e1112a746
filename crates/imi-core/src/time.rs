//! Time-of-day helpers.
//!
//! The feed expresses time as microseconds since midnight (exchange local
//! time); nothing here touches the wall clock. These helpers exist for log
//! readability and for bucketing events into seconds.

use crate::types::Micros;

/// Microseconds per second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// The second-of-day an event timestamp falls into.
#[inline]
pub fn second_of_day(us: Micros) -> u32 {
    (us / MICROS_PER_SEC) as u32
}

/// Format a microsecond-of-day timestamp as `HH:MM:SS.ffffff`.
pub fn fmt_micros_of_day(us: Micros) -> String {
    let secs = us / MICROS_PER_SEC;
    let frac = us % MICROS_PER_SEC;
    format!(
        "{:02}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        frac
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_midnight() {
        assert_eq!(fmt_micros_of_day(0), "00:00:00.000000");
    }

    #[test]
    fn formats_afternoon() {
        // 16:30:05.123456
        let us = (16 * 3600 + 30 * 60 + 5) * MICROS_PER_SEC + 123_456;
        assert_eq!(fmt_micros_of_day(us), "16:30:05.123456");
        assert_eq!(second_of_day(us), 16 * 3600 + 30 * 60 + 5);
    }
}
