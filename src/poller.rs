//! Lane poller.
//!
//! Samples every racing lane once per tick, records finishes, and applies
//! the race timeout. Never sleeps: a delay here would directly skew lane
//! times.

use crate::clock::{elapsed, seconds_to_ticks, to_seconds, Clock, Tick};
use crate::hal::LaneSensor;
use crate::lane::LaneStatus;
use crate::race::{RaceContext, RaceStatus};

/// Finish detection and timeout parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FinishPolicy {
    /// Readings strictly below this mean the car has passed.
    pub threshold: u16,
    /// Timeout ceiling in seconds.
    pub max_race_seconds: f64,
}

impl FinishPolicy {
    /// Duration assigned to lanes forced to [`LaneStatus::TooSlow`].
    #[inline]
    pub fn max_race_ticks(&self) -> Tick {
        seconds_to_ticks(self.max_race_seconds)
    }
}

/// Result of one poll pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// At least one lane still racing, timeout not reached.
    Racing,
    /// Every lane has a time.
    AllFinished,
    /// Timeout fired; `forced` lanes were marked too slow.
    TimedOut { forced: u8 },
}

impl PollOutcome {
    /// Race status implied by this outcome.
    #[inline]
    pub fn status(self) -> RaceStatus {
        match self {
            PollOutcome::Racing => RaceStatus::RaceInProgress,
            PollOutcome::AllFinished | PollOutcome::TimedOut { .. } => RaceStatus::RaceDone,
        }
    }
}

/// Poll all racing lanes and evaluate completion and timeout.
///
/// Sets `race_end` when the outcome ends the race. Does not touch the
/// race status; the state machine owns that.
pub fn poll_lanes(
    race: &mut RaceContext,
    clock: &dyn Clock,
    sensor: &mut dyn LaneSensor,
    policy: &FinishPolicy,
) -> PollOutcome {
    let begin = race.race_begin;
    let mut last_finish = None;

    for lane in race.lanes.lanes_mut() {
        if lane.status != LaneStatus::Racing {
            continue;
        }
        if sensor.read(lane.channel()) < policy.threshold {
            let now = clock.now();
            lane.finish_time = now;
            lane.race_duration = elapsed(begin, now);
            lane.status = LaneStatus::Finished;
            last_finish = Some(now);
        }
    }

    if race.lanes.resolved_count() >= race.lanes.in_use_count() {
        race.race_end = last_finish.unwrap_or_else(|| clock.now());
        return PollOutcome::AllFinished;
    }

    check_timeout(race, clock.now(), policy)
}

/// Force unresolved lanes to [`LaneStatus::TooSlow`] once the race runs
/// longer than the ceiling.
fn check_timeout(race: &mut RaceContext, now: Tick, policy: &FinishPolicy) -> PollOutcome {
    if to_seconds(elapsed(race.race_begin, now)) <= policy.max_race_seconds {
        return PollOutcome::Racing;
    }

    let pinned = policy.max_race_ticks();
    let mut forced = 0u8;
    for lane in race.lanes.lanes_mut() {
        if lane.status == LaneStatus::Racing {
            lane.status = LaneStatus::TooSlow;
            lane.race_duration = pinned;
            // 0 marks "did not truly finish"
            lane.finish_time = 0;
            forced += 1;
        }
    }

    race.race_end = now;
    PollOutcome::TimedOut { forced }
}
