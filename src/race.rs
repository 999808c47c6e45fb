//! Race state machine.
//!
//! Pure logic, no hardware dependencies. Owns the race lifecycle and lane
//! registry; every transition reports the I/O it wants as [`Effect`]s so
//! the caller drives serial and display.
//!
//! ```text
//!            trigger released              all finished / timeout
//!   Idle ───────────────────────▶ RaceInProgress ──────────────────▶ RaceDone
//!    ▲                                                                  │
//!    └──────────────────────────── next tick ──────────────────────────┘
//! ```

use heapless::Vec;

use crate::clock::{elapsed, Clock, Tick};
use crate::command::Response;
use crate::hal::LaneSensor;
use crate::lane::{DetectionReport, LaneRegistry};
use crate::poller::{poll_lanes, FinishPolicy, PollOutcome};

/// Global race lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaceStatus {
    Idle,
    RaceInProgress,
    RaceDone,
}

/// Start gate state derived from the debounced trigger level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerState {
    /// Gate closed, input reads low.
    ReadyToRelease,
    /// Gate open, race can start.
    Released,
}

impl TriggerState {
    #[inline]
    pub fn from_level(high: bool) -> Self {
        if high {
            TriggerState::Released
        } else {
            TriggerState::ReadyToRelease
        }
    }
}

/// I/O requested by a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Send a protocol line.
    Emit(Response),
    /// Render the race results on serial and display.
    PublishResults,
}

/// Effects of a single transition.
pub type Effects = Vec<Effect, 2>;

/// One evaluated state transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: RaceStatus,
    pub to: RaceStatus,
    pub effects: Effects,
    /// Poll result when the transition came from polling lanes.
    pub outcome: Option<PollOutcome>,
}

impl Transition {
    fn stay(status: RaceStatus) -> Self {
        Self {
            from: status,
            to: status,
            effects: Vec::new(),
            outcome: None,
        }
    }

    fn with_effect(from: RaceStatus, to: RaceStatus, effect: Effect) -> Self {
        let mut effects = Vec::new();
        let _ = effects.push(effect);
        Self {
            from,
            to,
            effects,
            outcome: None,
        }
    }

    /// Status changed or I/O requested.
    pub fn is_change(&self) -> bool {
        self.from != self.to || !self.effects.is_empty()
    }
}

/// Race status, timestamps and lanes in one owned aggregate.
#[derive(Clone, Debug)]
pub struct RaceContext {
    pub(crate) status: RaceStatus,
    pub(crate) lanes: LaneRegistry,
    pub(crate) race_begin: Tick,
    pub(crate) race_end: Tick,
}

impl Default for RaceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RaceContext {
    pub const fn new() -> Self {
        Self {
            status: RaceStatus::Idle,
            lanes: LaneRegistry::new(),
            race_begin: 0,
            race_end: 0,
        }
    }

    #[inline]
    pub fn status(&self) -> RaceStatus {
        self.status
    }

    pub fn lanes(&self) -> &LaneRegistry {
        &self.lanes
    }

    /// Mutable lanes for detection and remote reset.
    pub(crate) fn lanes_mut(&mut self) -> &mut LaneRegistry {
        &mut self.lanes
    }

    /// Rebuild the lane registry from sensor readings.
    ///
    /// Refused while a race is running.
    pub fn detect_lanes(
        &mut self,
        channels: &[u8],
        sensor: &mut dyn LaneSensor,
        threshold: u16,
    ) -> Option<DetectionReport> {
        if self.status == RaceStatus::RaceInProgress {
            return None;
        }
        Some(self.lanes.detect_lanes(channels, sensor, threshold))
    }

    /// Tick at which the current or last race began.
    #[inline]
    pub fn race_begin(&self) -> Tick {
        self.race_begin
    }

    /// Tick at which the last race ended.
    #[inline]
    pub fn race_end(&self) -> Tick {
        self.race_end
    }

    /// Length of the last completed race.
    pub fn last_race_length(&self) -> Tick {
        elapsed(self.race_begin, self.race_end)
    }

    /// Handle a trigger edge.
    ///
    /// Starts a race when the gate is released and no race is running.
    /// Returns `None` when the edge causes no transition.
    pub fn on_trigger(&mut self, trigger: TriggerState, now: Tick) -> Option<Transition> {
        if trigger == TriggerState::Released && self.status != RaceStatus::RaceInProgress {
            Some(self.start_race(now))
        } else {
            None
        }
    }

    /// Evaluate the per-tick transition for the current state.
    pub fn advance(
        &mut self,
        clock: &dyn Clock,
        sensor: &mut dyn LaneSensor,
        policy: &FinishPolicy,
    ) -> Transition {
        match self.status {
            RaceStatus::Idle => Transition::stay(RaceStatus::Idle),
            RaceStatus::RaceInProgress => self.tick_racing(clock, sensor, policy),
            RaceStatus::RaceDone => self.tick_done(),
        }
    }

    // --- Private methods ---

    fn start_race(&mut self, now: Tick) -> Transition {
        let from = self.status;
        // Begin stamp and lane reset happen together, before any poll
        self.race_begin = now;
        self.lanes.reset_for_racing();
        self.status = RaceStatus::RaceInProgress;
        Transition::with_effect(from, self.status, Effect::Emit(Response::Racing))
    }

    fn tick_racing(
        &mut self,
        clock: &dyn Clock,
        sensor: &mut dyn LaneSensor,
        policy: &FinishPolicy,
    ) -> Transition {
        let outcome = poll_lanes(self, clock, sensor, policy);
        self.status = outcome.status();

        let mut transition = if self.status == RaceStatus::RaceDone {
            Transition::with_effect(RaceStatus::RaceInProgress, self.status, Effect::PublishResults)
        } else {
            Transition::stay(RaceStatus::RaceInProgress)
        };
        transition.outcome = Some(outcome);
        transition
    }

    fn tick_done(&mut self) -> Transition {
        self.status = RaceStatus::Idle;
        Transition {
            from: RaceStatus::RaceDone,
            to: RaceStatus::Idle,
            effects: Vec::new(),
            outcome: None,
        }
    }
}
