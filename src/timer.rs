//! Module: timer
//!
//! Purpose: The cooperative tick loop tying race logic to I/O.
//!
//! One [`RaceTimer::tick`] runs, in order:
//! 1. debounced input refresh
//! 2. start gate edge handling
//! 3. UI buttons (ignored while racing)
//! 4. indicator refresh
//! 5. race transition (skipped if step 2 already transitioned)
//! 6. at most one inbound command byte
//!
//! Nothing in a tick sleeps. The display is not redrawn while a race is
//! running, apart from the start banner, so sensor sampling is never
//! held up by a slow screen.

use core::fmt::Write;

use crate::clock::{elapsed, to_seconds, Clock, Tick};
use crate::command::{dispatch, Reply, Response};
use crate::config::TimerConfig;
use crate::hal::{DebouncedInput, Indicator, LaneSensor, SerialLink, TextDisplay};
use crate::lane::DetectionReport;
use crate::logging::LogStream;
use crate::poller::{FinishPolicy, PollOutcome};
use crate::race::{Effect, RaceContext, RaceStatus, Transition, TriggerState};
use crate::results::{race_results, ResultsText};
use crate::screen::{awaiting_race, sensor_readout, ScreenMode, ScreenText};
use crate::{timer_debug, timer_info, timer_warn};

/// Capabilities the timer drives during a tick.
pub struct Board<'a> {
    pub clock: &'a dyn Clock,
    pub sensors: &'a mut dyn LaneSensor,
    /// Start gate, high = released
    pub trigger: &'a mut dyn DebouncedInput,
    /// Active-low screen mode button
    pub mode_button: &'a mut dyn DebouncedInput,
    /// Active-low lane detection button
    pub detect_button: &'a mut dyn DebouncedInput,
    pub display: &'a mut dyn TextDisplay,
    pub serial: &'a mut dyn SerialLink,
    pub indicator: &'a mut dyn Indicator,
}

/// Race timer: owns all timing state, borrows hardware per tick.
pub struct RaceTimer {
    config: TimerConfig,
    policy: FinishPolicy,
    race: RaceContext,
    trigger: TriggerState,
    screen: ScreenMode,
    last_results: ResultsText,
    last_report: ScreenText,
    last_sensor_refresh: Tick,
    log: LogStream,
}

impl RaceTimer {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            policy: config.finish_policy(),
            config,
            race: RaceContext::new(),
            trigger: TriggerState::ReadyToRelease,
            screen: ScreenMode::AwaitingRace,
            last_results: ResultsText::new(),
            last_report: ScreenText::new(),
            last_sensor_refresh: 0,
            log: LogStream::new(),
        }
    }

    /// Read the initial gate state and detect lanes.
    pub fn boot(&mut self, board: &mut Board<'_>) {
        let now = board.clock.now();
        board.trigger.update(now);
        self.trigger = TriggerState::from_level(board.trigger.read());
        timer_info!(self.log, now, "boot, gate {:?}", self.trigger);
        self.detect_lanes(board);
    }

    /// Run one iteration of the control loop.
    ///
    /// Returns the race transition evaluated this tick, if it changed
    /// anything.
    pub fn tick(&mut self, board: &mut Board<'_>) -> Option<Transition> {
        let now = board.clock.now();

        // 1. Debounced inputs
        board.trigger.update(now);
        board.mode_button.update(now);
        board.detect_button.update(now);

        // 2. Start gate
        let mut transition = None;
        if board.trigger.changed() {
            self.trigger = TriggerState::from_level(board.trigger.read());
            if let Some(t) = self.race.on_trigger(self.trigger, board.clock.now()) {
                self.apply(&t, board);
                transition = Some(t);
            } else if self.is_idle_screen(ScreenMode::AwaitingRace) {
                self.redraw(board, now);
            }
        }

        // 3. Buttons
        if self.race.status() != RaceStatus::RaceInProgress {
            self.poll_buttons(board, now);
        }

        // 4. Indicator: lit unless a heat is running
        board.indicator.set(self.race.status() != RaceStatus::RaceInProgress);

        // 5. Race transition
        if transition.is_none() {
            let t = self.race.advance(board.clock, board.sensors, &self.policy);
            if t.is_change() {
                self.apply(&t, board);
                transition = Some(t);
            }
        }

        // 6. One command byte
        self.handle_command(board, now);

        transition
    }

    /// Rebuild the lane registry from current sensor readings.
    ///
    /// Ignored while a race is running.
    pub fn detect_lanes(&mut self, board: &mut Board<'_>) -> Option<DetectionReport> {
        let now = board.clock.now();
        let Some(report) = self.race.detect_lanes(
            self.config.lane_channels(),
            board.sensors,
            self.config.finish_threshold,
        ) else {
            timer_debug!(self.log, now, "lane detection ignored during race");
            return None;
        };

        self.last_report.clear();
        let _ = write!(self.last_report, "{}", report);
        board.serial.write_line(&self.last_report);

        self.screen = ScreenMode::LaneSummary;
        board.display.render(&self.last_report);

        timer_info!(self.log, now, "detected {} of {} lanes", report.active_count(), report.len());
        Some(report)
    }

    #[inline]
    pub fn status(&self) -> RaceStatus {
        self.race.status()
    }

    pub fn race(&self) -> &RaceContext {
        &self.race
    }

    #[inline]
    pub fn trigger_state(&self) -> TriggerState {
        self.trigger
    }

    #[inline]
    pub fn screen_mode(&self) -> ScreenMode {
        self.screen
    }

    /// Result block of the last finished race (empty after a reset).
    pub fn last_results(&self) -> &str {
        &self.last_results
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn log(&self) -> &LogStream {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut LogStream {
        &mut self.log
    }

    // --- Private methods ---

    fn is_idle_screen(&self, mode: ScreenMode) -> bool {
        self.screen == mode && self.race.status() != RaceStatus::RaceInProgress
    }

    fn apply(&mut self, t: &Transition, board: &mut Board<'_>) {
        let now = board.clock.now();

        if t.to == RaceStatus::RaceInProgress && t.from != RaceStatus::RaceInProgress {
            timer_info!(self.log, now, "race started at {}", self.race.race_begin());
            board.display.render(Response::Racing.as_str());
        }

        match t.outcome {
            Some(PollOutcome::AllFinished) => {
                timer_info!(
                    self.log,
                    now,
                    "race complete in {:.4}s",
                    to_seconds(self.race.last_race_length())
                );
            }
            Some(PollOutcome::TimedOut { forced }) => {
                timer_warn!(self.log, now, "race timeout, {} lane(s) too slow", forced);
            }
            Some(PollOutcome::Racing) | None => {}
        }

        for effect in t.effects.iter() {
            match *effect {
                Effect::Emit(response) => board.serial.write_line(response.as_str()),
                Effect::PublishResults => self.publish_results(board),
            }
        }
    }

    fn publish_results(&mut self, board: &mut Board<'_>) {
        self.last_results = race_results(self.race.lanes());
        board.serial.write_str(&self.last_results);
        self.screen = ScreenMode::LaneTimes;
        board.display.render(&self.last_results);
    }

    fn poll_buttons(&mut self, board: &mut Board<'_>, now: Tick) {
        if board.mode_button.fell() {
            self.screen = self.screen.next();
            timer_debug!(self.log, now, "screen {}", self.screen.name());
            self.redraw(board, now);
        }

        if board.detect_button.fell() {
            self.detect_lanes(board);
        }

        if self.screen == ScreenMode::SensorOutput
            && elapsed(self.last_sensor_refresh, now) >= self.config.sensor_refresh_ticks()
        {
            self.redraw(board, now);
        }
    }

    fn redraw(&mut self, board: &mut Board<'_>, now: Tick) {
        match self.screen {
            ScreenMode::LaneTimes => board.display.render(&self.last_results),
            ScreenMode::SensorOutput => {
                let text = sensor_readout(self.race.lanes(), board.sensors);
                board.display.render(&text);
                self.last_sensor_refresh = now;
            }
            ScreenMode::LaneSummary => board.display.render(&self.last_report),
            ScreenMode::AwaitingRace => board.display.render(awaiting_race(self.trigger)),
        }
    }

    fn handle_command(&mut self, board: &mut Board<'_>, now: Tick) {
        let Some(byte) = board.serial.read_byte() else {
            return;
        };

        match dispatch(byte, &mut self.race, self.trigger) {
            Some(Reply::Line(response)) => board.serial.write_line(response.as_str()),
            Some(Reply::Reset(response)) => {
                board.serial.write_line(response.as_str());
                self.last_results.clear();
                timer_info!(self.log, now, "timer reset");
                if self.race.status() != RaceStatus::RaceInProgress {
                    self.redraw(board, now);
                }
            }
            Some(Reply::Results(text)) => {
                board.serial.write_str(&text);
                if self.race.status() != RaceStatus::RaceInProgress {
                    board.display.render(&text);
                }
            }
            None => timer_debug!(self.log, now, "ignored byte 0x{:02X}", byte),
        }
    }
}
