//! ESP-IDF implementations of the capability traits.

use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_svc::hal::uart::UartDriver;
use esp_idf_svc::sys::EspError;

use super::{Indicator, RawPin, SerialLink, TextDisplay};
use crate::clock::{Clock, Tick};
use crate::screen::{screen_text, ScreenText};

/// Microsecond clock from `esp_timer`, truncated to the wrapping tick.
pub struct EspClock;

impl Clock for EspClock {
    #[inline]
    fn now(&self) -> Tick {
        // SAFETY: esp_timer_get_time has no preconditions once IDF is up
        unsafe { esp_idf_svc::sys::esp_timer_get_time() as Tick }
    }
}

/// Digital input with the internal pull-up enabled.
pub struct GpioInput<'d> {
    pin: PinDriver<'d, AnyIOPin, Input>,
}

impl<'d> GpioInput<'d> {
    pub fn pull_up(pin: AnyIOPin) -> Result<Self, EspError> {
        let mut pin = PinDriver::input(pin)?;
        pin.set_pull(Pull::Up)?;
        Ok(Self { pin })
    }
}

impl RawPin for GpioInput<'_> {
    #[inline]
    fn is_high(&mut self) -> bool {
        self.pin.is_high()
    }
}

/// Status LED, active high.
pub struct LedIndicator<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> LedIndicator<'d> {
    pub fn new(pin: AnyOutputPin) -> Result<Self, EspError> {
        Ok(Self {
            pin: PinDriver::output(pin)?,
        })
    }
}

impl Indicator for LedIndicator<'_> {
    fn set(&mut self, on: bool) {
        let _ = if on { self.pin.set_high() } else { self.pin.set_low() };
    }
}

/// Protocol link over a full-duplex UART.
pub struct UartLink<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UartLink<'d> {
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart }
    }
}

impl SerialLink for UartLink<'_> {
    fn read_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        // Timeout 0: return immediately when nothing is buffered
        match self.uart.read(&mut buf, 0) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }

    fn write_str(&mut self, s: &str) {
        let _ = self.uart.write(s.as_bytes());
    }
}

/// Display that keeps the latest screen for mirroring elsewhere.
///
/// Rendering only stores text; the firmware loop copies dirty screens to
/// the log UART between races.
pub struct MirrorDisplay {
    text: ScreenText,
    dirty: bool,
}

impl MirrorDisplay {
    pub const fn new() -> Self {
        Self {
            text: ScreenText::new(),
            dirty: false,
        }
    }

    /// Screen text if it changed since the last call.
    pub fn take_dirty(&mut self) -> Option<&str> {
        if self.dirty {
            self.dirty = false;
            Some(self.text.as_str())
        } else {
            None
        }
    }
}

impl Default for MirrorDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDisplay for MirrorDisplay {
    fn render(&mut self, text: &str) {
        self.text = screen_text(text);
        self.dirty = true;
    }
}
