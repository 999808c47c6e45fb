//! Module: config
//!
//! Purpose: Timer configuration constants and validation.
//!
//! The default matches the reference four-lane ESP32 build. Configuration
//! is fixed for the life of the process; nothing here is persisted.

use crate::clock::{seconds_to_ticks, Tick, MAX_TICK};
use crate::lane::MAX_LANES;
use crate::poller::FinishPolicy;

/// Longest allowed timeout ceiling
///
/// Keeps a race well inside one wrap of the microsecond counter.
pub const RACE_SECONDS_LIMIT: f64 = 600.0;

/// Configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// E01: No lane channels configured
    NoLanes,
    /// E02: More lanes than the registry can hold
    TooManyLanes,
    /// E03: Finish threshold of zero never trips
    ZeroThreshold,
    /// E04: Timeout ceiling not a positive number
    InvalidRaceDuration,
    /// E05: Timeout ceiling too close to the counter wrap
    RaceDurationTooLong,
    /// E06: Debounce or refresh interval of zero
    ZeroInterval,
}

impl ConfigError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoLanes => "E01",
            Self::TooManyLanes => "E02",
            Self::ZeroThreshold => "E03",
            Self::InvalidRaceDuration => "E04",
            Self::RaceDurationTooLong => "E05",
            Self::ZeroInterval => "E06",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoLanes => "no lanes configured",
            Self::TooManyLanes => "too many lanes",
            Self::ZeroThreshold => "finish threshold is zero",
            Self::InvalidRaceDuration => "invalid race duration",
            Self::RaceDurationTooLong => "race duration too long",
            Self::ZeroInterval => "interval is zero",
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Timer configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimerConfig {
    /// Sensor channel (ADC GPIO) per lane, lane 1 first
    lane_channels: [u8; MAX_LANES],
    lane_count: u8,
    /// Readings below this mean the beam is broken
    pub finish_threshold: u16,
    /// Unfinished lanes are forced to this time
    pub max_race_seconds: f64,
    pub trigger_debounce_ms: u16,
    pub button_debounce_ms: u16,
    /// Redraw period of the live sensor screen
    pub sensor_refresh_ms: u16,
    /// Protocol link to race software
    pub serial_baud: u32,
    /// Diagnostic log output
    pub log_baud: u32,
}

impl TimerConfig {
    /// Four lanes on ADC1 GPIO 33, 32, 39, 36.
    pub const DEFAULT: Self = Self {
        lane_channels: [33, 32, 39, 36, 0, 0, 0, 0],
        lane_count: 4,
        finish_threshold: 4000,
        max_race_seconds: 9.999,
        trigger_debounce_ms: 25,
        button_debounce_ms: 10,
        sensor_refresh_ms: 250,
        serial_baud: 9600,
        log_baud: 115_200,
    };

    /// Replace the lane wiring.
    pub fn with_lanes(mut self, channels: &[u8]) -> Result<Self, ConfigError> {
        if channels.is_empty() {
            return Err(ConfigError::NoLanes);
        }
        if channels.len() > MAX_LANES {
            return Err(ConfigError::TooManyLanes);
        }
        self.lane_channels = [0; MAX_LANES];
        self.lane_channels[..channels.len()].copy_from_slice(channels);
        self.lane_count = channels.len() as u8;
        Ok(self)
    }

    /// Sensor channels in lane order.
    pub fn lane_channels(&self) -> &[u8] {
        &self.lane_channels[..(self.lane_count as usize).min(MAX_LANES)]
    }

    pub fn lane_count(&self) -> usize {
        self.lane_channels().len()
    }

    /// Timeout ceiling in ticks.
    pub fn max_race_ticks(&self) -> Tick {
        seconds_to_ticks(self.max_race_seconds)
    }

    pub fn finish_policy(&self) -> FinishPolicy {
        FinishPolicy {
            threshold: self.finish_threshold,
            max_race_seconds: self.max_race_seconds,
        }
    }

    /// Sensor screen redraw period in ticks.
    pub fn sensor_refresh_ticks(&self) -> Tick {
        self.sensor_refresh_ms as Tick * 1000
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lane_count == 0 {
            return Err(ConfigError::NoLanes);
        }
        if self.lane_count as usize > MAX_LANES {
            return Err(ConfigError::TooManyLanes);
        }
        if self.finish_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if !(self.max_race_seconds > 0.0) {
            return Err(ConfigError::InvalidRaceDuration);
        }
        if self.max_race_seconds > RACE_SECONDS_LIMIT || self.max_race_ticks() == MAX_TICK {
            return Err(ConfigError::RaceDurationTooLong);
        }
        if self.trigger_debounce_ms == 0 || self.button_debounce_ms == 0 || self.sensor_refresh_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
