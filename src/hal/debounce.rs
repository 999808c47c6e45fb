//! Stable-interval debouncer.
//!
//! A level change is accepted once the raw pin has held the new level for
//! the whole interval. Glitches shorter than the interval are discarded.

use super::{DebouncedInput, RawPin};
use crate::clock::{elapsed, Tick};

/// Debounced view of a [`RawPin`].
pub struct Debouncer<P: RawPin> {
    pin: P,
    /// Required stable time in microseconds
    interval: Tick,
    debounced: bool,
    /// Last raw level seen
    unstable: bool,
    /// Tick of the last raw or accepted change
    last_change: Tick,
    changed: bool,
}

impl<P: RawPin> Debouncer<P> {
    /// Attach to `pin`, adopting its current level as the stable state.
    pub fn new(mut pin: P, interval_ms: u16, now: Tick) -> Self {
        let level = pin.is_high();
        Self {
            pin,
            interval: interval_ms as Tick * 1000,
            debounced: level,
            unstable: level,
            last_change: now,
            changed: false,
        }
    }

    /// Access the underlying pin.
    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }
}

impl<P: RawPin> DebouncedInput for Debouncer<P> {
    fn update(&mut self, now: Tick) {
        self.changed = false;
        let level = self.pin.is_high();

        if level != self.unstable {
            self.unstable = level;
            self.last_change = now;
        } else if level != self.debounced && elapsed(self.last_change, now) >= self.interval {
            self.debounced = level;
            self.last_change = now;
            self.changed = true;
        }
    }

    #[inline]
    fn read(&self) -> bool {
        self.debounced
    }

    #[inline]
    fn changed(&self) -> bool {
        self.changed
    }
}
