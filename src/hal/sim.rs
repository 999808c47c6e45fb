//! Simulation doubles for the capability traits.
//!
//! Scripted clock, sensors and inputs plus capturing serial and display.
//! Lets the whole tick loop run on host without hardware.

use core::cell::Cell;

use heapless::{Deque, String, Vec};

use super::{DebouncedInput, Indicator, LaneSensor, RawPin, SerialLink, TextDisplay};
use crate::clock::{Clock, Tick};
use crate::lane::MAX_LANES;
use crate::timer::Board;

/// Clock driven by the test.
pub struct ManualClock {
    now: Cell<Tick>,
}

impl ManualClock {
    pub const fn new(start: Tick) -> Self {
        Self { now: Cell::new(start) }
    }

    pub fn set(&self, now: Tick) {
        self.now.set(now);
    }

    /// Advance by `delta`, wrapping like the hardware counter.
    pub fn advance(&self, delta: Tick) {
        self.now.set(self.now.get().wrapping_add(delta));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Tick {
        self.now.get()
    }
}

/// Sensor bank with per-channel readings set by the test.
pub struct ScriptedSensors {
    readings: Vec<(u8, u16), MAX_LANES>,
    /// Reading for channels never set
    default: u16,
    reads: u32,
}

impl ScriptedSensors {
    /// All channels read `default` until set.
    pub const fn new(default: u16) -> Self {
        Self {
            readings: Vec::new(),
            default,
            reads: 0,
        }
    }

    /// Channels `channels[i]` read `values[i]`.
    pub fn with_readings(channels: &[u8], values: &[u16], default: u16) -> Self {
        let mut sensors = Self::new(default);
        for (&channel, &value) in channels.iter().zip(values) {
            sensors.set(channel, value);
        }
        sensors
    }

    pub fn set(&mut self, channel: u8, value: u16) {
        if let Some(slot) = self.readings.iter_mut().find(|(c, _)| *c == channel) {
            slot.1 = value;
        } else if self.readings.push((channel, value)).is_err() {
            self.default = value;
        }
    }

    /// Number of reads served so far.
    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl LaneSensor for ScriptedSensors {
    fn read(&mut self, channel: u8) -> u16 {
        self.reads += 1;
        self.readings
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|&(_, value)| value)
            .unwrap_or(self.default)
    }
}

/// Raw pin whose level is set by the test.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedPin {
    pub level: bool,
}

impl RawPin for ScriptedPin {
    fn is_high(&mut self) -> bool {
        self.level
    }
}

/// Already-debounced input: level changes take effect on the next `update`.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedInput {
    pending: bool,
    level: bool,
    changed: bool,
}

impl ScriptedInput {
    pub const fn new(level: bool) -> Self {
        Self {
            pending: level,
            level,
            changed: false,
        }
    }

    pub fn set_level(&mut self, level: bool) {
        self.pending = level;
    }
}

impl DebouncedInput for ScriptedInput {
    fn update(&mut self, _now: Tick) {
        self.changed = self.pending != self.level;
        self.level = self.pending;
    }

    fn read(&self) -> bool {
        self.level
    }

    fn changed(&self) -> bool {
        self.changed
    }
}

/// Serial link with a scripted inbound queue and captured output.
pub struct CaptureSerial<const N: usize = 2048> {
    inbound: Deque<u8, 64>,
    output: String<N>,
}

impl<const N: usize> CaptureSerial<N> {
    pub const fn new() -> Self {
        Self {
            inbound: Deque::new(),
            output: String::new(),
        }
    }

    /// Queue bytes as if sent by race software. Excess bytes are dropped.
    pub fn send(&mut self, bytes: &[u8]) {
        for &b in bytes {
            let _ = self.inbound.push_back(b);
        }
    }

    /// Inbound bytes not yet consumed.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Everything written so far.
    pub fn output(&self) -> &str {
        self.output.as_str()
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
    }
}

impl<const N: usize> Default for CaptureSerial<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SerialLink for CaptureSerial<N> {
    fn read_byte(&mut self) -> Option<u8> {
        self.inbound.pop_front()
    }

    fn write_str(&mut self, s: &str) {
        // Overflow truncates the capture, as a full TX buffer would
        let _ = self.output.push_str(s);
    }
}

/// Display keeping the last rendered screen.
pub struct CaptureDisplay {
    screen: String<256>,
    renders: u32,
}

impl CaptureDisplay {
    pub const fn new() -> Self {
        Self {
            screen: String::new(),
            renders: 0,
        }
    }

    /// Text of the last render.
    pub fn screen(&self) -> &str {
        self.screen.as_str()
    }

    /// Number of renders so far.
    pub fn renders(&self) -> u32 {
        self.renders
    }
}

impl Default for CaptureDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDisplay for CaptureDisplay {
    fn render(&mut self, text: &str) {
        self.screen.clear();
        for c in text.chars() {
            if self.screen.push(c).is_err() {
                break;
            }
        }
        self.renders += 1;
    }
}

/// Indicator remembering its state.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagIndicator {
    pub on: bool,
}

impl Indicator for FlagIndicator {
    fn set(&mut self, on: bool) {
        self.on = on;
    }
}

/// Every double the timer needs, wired up as a [`Board`].
pub struct SimBench {
    pub clock: ManualClock,
    pub sensors: ScriptedSensors,
    /// Starts low (gate closed)
    pub trigger: ScriptedInput,
    /// Buttons idle high
    pub mode_button: ScriptedInput,
    pub detect_button: ScriptedInput,
    pub display: CaptureDisplay,
    pub serial: CaptureSerial,
    pub indicator: FlagIndicator,
}

impl SimBench {
    /// Gate closed with every sensor reading `beam_level`.
    pub fn new(beam_level: u16) -> Self {
        Self {
            clock: ManualClock::new(0),
            sensors: ScriptedSensors::new(beam_level),
            trigger: ScriptedInput::new(false),
            mode_button: ScriptedInput::new(true),
            detect_button: ScriptedInput::new(true),
            display: CaptureDisplay::new(),
            serial: CaptureSerial::new(),
            indicator: FlagIndicator::default(),
        }
    }

    pub fn board(&mut self) -> Board<'_> {
        Board {
            clock: &self.clock,
            sensors: &mut self.sensors,
            trigger: &mut self.trigger,
            mode_button: &mut self.mode_button,
            detect_button: &mut self.detect_button,
            display: &mut self.display,
            serial: &mut self.serial,
            indicator: &mut self.indicator,
        }
    }
}
