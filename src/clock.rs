//! Module: clock
//!
//! Purpose: Microsecond clock adapter with wraparound-safe durations.
//!
//! The hardware counter is a free-running `u32` of microseconds that wraps
//! roughly every 71 minutes. A race is bounded by the timeout ceiling, far
//! below the wrap period, so at most one wrap can fall inside a race.

/// Absolute clock reading in microseconds.
pub type Tick = u32;

/// Largest representable tick before the counter wraps.
pub const MAX_TICK: Tick = u32::MAX;

/// Microseconds per second.
pub const TICKS_PER_SECOND: f64 = 1_000_000.0;

/// Source of the current absolute tick.
pub trait Clock {
    /// Current absolute tick since boot (wraps at [`MAX_TICK`]).
    fn now(&self) -> Tick;
}

/// Duration from `begin` to `end`, tolerating one counter wrap.
///
/// Matches the timer firmware arithmetic: after a wrap the result is
/// `(MAX_TICK - begin) + end`.
#[inline]
pub fn elapsed(begin: Tick, end: Tick) -> Tick {
    if end >= begin {
        end - begin
    } else {
        (MAX_TICK - begin) + end
    }
}

/// Convert a tick duration to seconds.
#[inline]
pub fn to_seconds(duration: Tick) -> f64 {
    duration as f64 / TICKS_PER_SECOND
}

/// Convert seconds to a tick duration, rounded to the nearest microsecond.
///
/// Non-positive (and NaN) input yields 0; oversized input saturates.
pub fn seconds_to_ticks(seconds: f64) -> Tick {
    if !(seconds > 0.0) {
        return 0;
    }
    let ticks = seconds * TICKS_PER_SECOND + 0.5;
    if ticks >= MAX_TICK as f64 {
        MAX_TICK
    } else {
        ticks as Tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_without_wrap() {
        assert_eq!(elapsed(1_000, 1_500), 500);
        assert_eq!(elapsed(42, 42), 0);
    }

    #[test]
    fn test_elapsed_across_wrap() {
        assert_eq!(elapsed(MAX_TICK - 10, 5), 15);
        assert_eq!(elapsed(MAX_TICK, 0), 0);
    }

    #[test]
    fn test_to_seconds() {
        assert_eq!(to_seconds(2_500_000), 2.5);
        assert_eq!(to_seconds(0), 0.0);
    }

    #[test]
    fn test_seconds_to_ticks_rounds() {
        assert_eq!(seconds_to_ticks(9.9999), 9_999_900);
        assert_eq!(seconds_to_ticks(9.999), 9_999_000);
        assert_eq!(seconds_to_ticks(0.0000004), 0);
        assert_eq!(seconds_to_ticks(0.0000006), 1);
    }

    #[test]
    fn test_seconds_to_ticks_bounds() {
        assert_eq!(seconds_to_ticks(-1.0), 0);
        assert_eq!(seconds_to_ticks(f64::NAN), 0);
        assert_eq!(seconds_to_ticks(1.0e12), MAX_TICK);
    }
}
