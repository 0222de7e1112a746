//! The feed clock — microsecond-of-day time derived from the message stream.
//!
//! `T` messages carry whole seconds; every other message carries a
//! millisecond offset relative to the last `T`. The clock never reads the
//! wall clock, so replays are deterministic.

use imi_core::time::MICROS_PER_SEC;
use imi_core::types::Micros;

/// Current time of the feed, owned by the day driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedClock {
    micros: Micros,
}

impl FeedClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a `T` seconds message.
    pub fn set_seconds(&mut self, seconds: u32) {
        self.micros = seconds as Micros * MICROS_PER_SEC;
    }

    /// Microseconds since midnight at the last `T` message.
    pub fn micros(&self) -> Micros {
        self.micros
    }

    /// Event timestamp for a message with millisecond offset `ms`.
    pub fn event_time(&self, ms: u32) -> Micros {
        self.micros + ms as Micros * 1_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_midnight() {
        let clock = FeedClock::new();
        assert_eq!(clock.micros(), 0);
        assert_eq!(clock.event_time(250), 250_000);
    }

    #[test]
    fn seconds_plus_millis() {
        let mut clock = FeedClock::new();
        clock.set_seconds(30_000);
        assert_eq!(clock.micros(), 30_000_000_000);
        assert_eq!(clock.event_time(100), 30_000_100_000);
    }
}
