//! Display screens.
//!
//! Presentation only: nothing here affects race timing.

use core::fmt::Write;

use heapless::String;

use crate::command::Response;
use crate::hal::LaneSensor;
use crate::lane::LaneRegistry;
use crate::race::TriggerState;
use crate::results::lane_order;

/// Screen text capacity.
pub const SCREEN_TEXT_LEN: usize = 192;

pub type ScreenText = String<SCREEN_TEXT_LEN>;

/// What the display shows, cycled by the mode button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenMode {
    /// Results of the last race.
    LaneTimes,
    /// Live raw sensor readings.
    SensorOutput,
    /// Last lane detection report.
    LaneSummary,
    /// Gate status while waiting for a heat.
    AwaitingRace,
}

impl ScreenMode {
    /// Next mode in button order.
    pub const fn next(self) -> Self {
        match self {
            ScreenMode::LaneTimes => ScreenMode::SensorOutput,
            ScreenMode::SensorOutput => ScreenMode::LaneSummary,
            ScreenMode::LaneSummary => ScreenMode::AwaitingRace,
            ScreenMode::AwaitingRace => ScreenMode::LaneTimes,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScreenMode::LaneTimes => "lane-times",
            ScreenMode::SensorOutput => "sensor-output",
            ScreenMode::LaneSummary => "lane-summary",
            ScreenMode::AwaitingRace => "awaiting-race",
        }
    }
}

/// Copy `text` into screen storage, truncating on overflow.
pub fn screen_text(text: &str) -> ScreenText {
    let mut out = ScreenText::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// One `<lane> <raw reading>` line per lane, in lane order.
pub fn sensor_readout(registry: &LaneRegistry, sensor: &mut dyn LaneSensor) -> ScreenText {
    let mut text = ScreenText::new();
    for lane in lane_order(registry).iter() {
        let _ = writeln!(text, "{} {}", lane.number(), sensor.read(lane.channel()));
    }
    text
}

/// Gate status banner.
pub fn awaiting_race(trigger: TriggerState) -> &'static str {
    match trigger {
        TriggerState::ReadyToRelease => Response::Ready.as_str(),
        TriggerState::Released => Response::GateOpen.as_str(),
    }
}
