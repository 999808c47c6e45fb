//! Hardware Abstraction Layer for DerbyTimer.
//!
//! Capability traits the timing core is written against.
//! Business logic stays in core modules, HAL is just I/O.

pub mod debounce;
pub mod sim;

#[cfg(target_os = "espidf")]
pub mod esp;

pub use debounce::Debouncer;

use crate::clock::Tick;

/// Analog lane sensor source.
pub trait LaneSensor {
    /// Raw intensity reading for the lane wired to `channel`.
    ///
    /// Polled, never cached. Lower values mean the beam is blocked.
    fn read(&mut self, channel: u8) -> u16;
}

/// Debounced digital input (start gate, buttons).
///
/// `update` must be called once per tick before any query.
pub trait DebouncedInput {
    /// Refresh the debounced state.
    fn update(&mut self, now: Tick);

    /// Stable level, `true` = high.
    fn read(&self) -> bool;

    /// Level changed during the last `update`.
    fn changed(&self) -> bool;

    /// Level went high -> low during the last `update`.
    fn fell(&self) -> bool {
        self.changed() && !self.read()
    }

    /// Level went low -> high during the last `update`.
    fn rose(&self) -> bool {
        self.changed() && self.read()
    }
}

/// Local text display.
pub trait TextDisplay {
    /// Replace the screen contents with `text`. Fire and forget.
    fn render(&mut self, text: &str);
}

/// Serial byte transport to the race management software.
pub trait SerialLink {
    /// Next inbound byte, if one is buffered.
    fn read_byte(&mut self) -> Option<u8>;

    /// Queue outbound text as-is.
    fn write_str(&mut self, s: &str);

    /// Write `line` followed by CRLF.
    fn write_line(&mut self, line: &str) {
        self.write_str(line);
        self.write_str("\r\n");
    }
}

/// Status indicator LED.
pub trait Indicator {
    fn set(&mut self, on: bool);
}

/// Raw (bouncing) digital pin level.
pub trait RawPin {
    fn is_high(&mut self) -> bool;
}

/// Adapts a closure to [`LaneSensor`].
pub struct SensorFn<F>(pub F);

impl<F: FnMut(u8) -> u16> LaneSensor for SensorFn<F> {
    fn read(&mut self, channel: u8) -> u16 {
        (self.0)(channel)
    }
}
