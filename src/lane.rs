//! Module: lane
//!
//! Purpose: Per-lane timing state and the lane registry.
//!
//! The registry is rebuilt only by lane detection. Between detections the
//! lane count and channel mapping are fixed; races only change status and
//! times.

use core::fmt;

use heapless::Vec;

use crate::clock::Tick;
use crate::hal::LaneSensor;

/// Maximum number of lanes a registry can hold.
pub const MAX_LANES: usize = 8;

/// Glyph shown in detection reports for a lane that is not in use.
pub const UNAVAILABLE_GLYPH: char = 'X';

/// Lane state within a race.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaneStatus {
    /// Waiting for the car to break the beam.
    Racing,
    /// Finish detected (or idle and available between races).
    Finished,
    /// Forced finish after the race timeout.
    TooSlow,
    /// Sensor blocked at detection, lane excluded.
    NotInUse,
}

impl LaneStatus {
    /// Lane has a final time for the current race.
    #[inline]
    pub fn is_resolved(self) -> bool {
        matches!(self, LaneStatus::Finished | LaneStatus::TooSlow)
    }
}

/// One timing lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lane {
    channel: u8,
    number: u8,
    pub status: LaneStatus,
    /// Absolute tick of the finish; 0 when the lane never truly finished.
    pub finish_time: Tick,
    /// Microseconds from race start to finish.
    pub race_duration: Tick,
}

impl Lane {
    pub const fn new(channel: u8, number: u8, status: LaneStatus) -> Self {
        Self {
            channel,
            number,
            status,
            finish_time: 0,
            race_duration: 0,
        }
    }

    /// Sensor channel this lane is wired to.
    #[inline]
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// 1-based lane label.
    #[inline]
    pub fn number(&self) -> u8 {
        self.number
    }

    /// Lanes excluded at detection stay excluded until the next detection.
    fn reset(&mut self, status: LaneStatus) {
        if self.status != LaneStatus::NotInUse {
            self.status = status;
        }
        self.finish_time = 0;
        self.race_duration = 0;
    }
}

/// Owned copy of every lane, safe to sort or hold across ticks.
pub type LaneSnapshot = Vec<Lane, MAX_LANES>;

/// Outcome of a lane detection pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectionReport {
    /// `(lane number, available)` in registry order
    lanes: Vec<(u8, bool), MAX_LANES>,
}

impl DetectionReport {
    /// Number of lanes available for racing.
    pub fn active_count(&self) -> usize {
        self.lanes.iter().filter(|(_, available)| *available).count()
    }

    /// Total lanes sampled.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Whether lane `number` was found usable.
    pub fn is_available(&self, number: u8) -> bool {
        self.lanes.iter().any(|&(n, available)| n == number && available)
    }
}

impl fmt::Display for DetectionReport {
    /// `Detected\n<N> Lanes\n<numbers>\n<numbers or X>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Detected\n{} Lanes\n", self.active_count())?;

        for (i, (number, _)) in self.lanes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", number)?;
        }
        f.write_str("\n")?;

        for (i, (number, available)) in self.lanes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if *available {
                write!(f, "{}", number)?;
            } else {
                write!(f, "{}", UNAVAILABLE_GLYPH)?;
            }
        }
        Ok(())
    }
}

/// The set of lanes known to the timer.
#[derive(Clone, Debug, Default)]
pub struct LaneRegistry {
    lanes: Vec<Lane, MAX_LANES>,
}

impl LaneRegistry {
    /// Empty registry (no lanes detected yet).
    pub const fn new() -> Self {
        Self { lanes: Vec::new() }
    }

    /// Probe every channel and rebuild the registry.
    ///
    /// Lane `i` is wired to `channels[i]` and labelled `i + 1`. A reading
    /// below `threshold` means the beam is blocked with no car present, so
    /// the lane is marked [`LaneStatus::NotInUse`]. Channels beyond
    /// [`MAX_LANES`] are ignored.
    pub fn detect_lanes(
        &mut self,
        channels: &[u8],
        sensor: &mut dyn LaneSensor,
        threshold: u16,
    ) -> DetectionReport {
        self.lanes.clear();
        let mut report = DetectionReport { lanes: Vec::new() };

        for (i, &channel) in channels.iter().take(MAX_LANES).enumerate() {
            let number = (i + 1) as u8;
            let available = sensor.read(channel) >= threshold;
            let status = if available {
                LaneStatus::Finished
            } else {
                LaneStatus::NotInUse
            };

            // Capacity is MAX_LANES on both, guarded by take()
            let _ = self.lanes.push(Lane::new(channel, number, status));
            let _ = report.lanes.push((number, available));
        }

        report
    }

    /// Put every in-use lane in [`LaneStatus::Racing`] with cleared times.
    pub fn reset_for_racing(&mut self) {
        for lane in self.lanes.iter_mut() {
            lane.reset(LaneStatus::Racing);
        }
    }

    /// Put every in-use lane in idle [`LaneStatus::Finished`] with cleared
    /// times.
    ///
    /// Used by the remote reset; does not start a race.
    pub fn reset_for_idle(&mut self) {
        for lane in self.lanes.iter_mut() {
            lane.reset(LaneStatus::Finished);
        }
    }

    /// Copy of all lanes.
    pub fn snapshot(&self) -> LaneSnapshot {
        self.lanes.clone()
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub(crate) fn lanes_mut(&mut self) -> &mut [Lane] {
        &mut self.lanes
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Lanes holding a final time.
    pub fn resolved_count(&self) -> usize {
        self.lanes.iter().filter(|l| l.status.is_resolved()).count()
    }

    /// Lanes taking part in races (not [`LaneStatus::NotInUse`]).
    pub fn in_use_count(&self) -> usize {
        self.lanes.iter().filter(|l| l.status != LaneStatus::NotInUse).count()
    }

    /// Lane by 1-based number.
    pub fn lane(&self, number: u8) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.number == number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::sim::ScriptedSensors;

    const CHANNELS: [u8; 4] = [33, 32, 39, 36];

    #[test]
    fn test_detect_partitions_lanes() {
        let mut sensors = ScriptedSensors::with_readings(&CHANNELS, &[5000, 2000, 5000, 100], 0);
        let mut registry = LaneRegistry::new();

        let report = registry.detect_lanes(&CHANNELS, &mut sensors, 3500);

        let statuses: std::vec::Vec<_> = registry.lanes().iter().map(|l| l.status).collect();
        assert_eq!(
            statuses,
            [LaneStatus::Finished, LaneStatus::NotInUse, LaneStatus::Finished, LaneStatus::NotInUse]
        );
        assert_eq!(report.active_count(), 2);
        assert_eq!(registry.lanes()[2].channel(), 39);
        assert_eq!(registry.lanes()[2].number(), 3);
    }

    #[test]
    fn test_threshold_is_exclusive_lower_bound() {
        let mut sensors = ScriptedSensors::with_readings(&CHANNELS[..2], &[3500, 3499], 0);
        let mut registry = LaneRegistry::new();

        let report = registry.detect_lanes(&CHANNELS[..2], &mut sensors, 3500);

        assert!(report.is_available(1));
        assert!(!report.is_available(2));
    }

    #[test]
    fn test_detect_replaces_previous_registry() {
        let mut sensors = ScriptedSensors::new(4095);
        let mut registry = LaneRegistry::new();

        registry.detect_lanes(&CHANNELS, &mut sensors, 3500);
        assert_eq!(registry.len(), 4);

        registry.detect_lanes(&CHANNELS[..2], &mut sensors, 3500);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_report_format() {
        let mut sensors = ScriptedSensors::with_readings(&CHANNELS, &[5000, 2000, 5000, 100], 0);
        let mut registry = LaneRegistry::new();

        let report = registry.detect_lanes(&CHANNELS, &mut sensors, 3500);
        let text = std::format!("{}", report);

        assert_eq!(text, "Detected\n2 Lanes\n1 2 3 4\n1 X 3 X");
    }

    #[test]
    fn test_resets_keep_excluded_lanes() {
        let mut sensors = ScriptedSensors::with_readings(&CHANNELS, &[5000, 2000, 5000, 100], 0);
        let mut registry = LaneRegistry::new();
        registry.detect_lanes(&CHANNELS, &mut sensors, 3500);

        registry.reset_for_racing();
        assert_eq!(registry.lanes()[1].status, LaneStatus::NotInUse);
        assert_eq!(registry.lanes()[0].status, LaneStatus::Racing);
        assert_eq!(registry.in_use_count(), 2);

        registry.reset_for_idle();
        assert_eq!(registry.lanes()[3].status, LaneStatus::NotInUse);
        assert_eq!(registry.lanes()[2].status, LaneStatus::Finished);
    }

    #[test]
    fn test_reset_for_racing_clears_times() {
        let mut sensors = ScriptedSensors::new(4095);
        let mut registry = LaneRegistry::new();
        registry.detect_lanes(&CHANNELS, &mut sensors, 3500);
        registry.lanes_mut()[0].race_duration = 1234;
        registry.lanes_mut()[0].finish_time = 99;

        registry.reset_for_racing();

        for lane in registry.lanes() {
            assert_eq!(lane.status, LaneStatus::Racing);
            assert_eq!(lane.finish_time, 0);
            assert_eq!(lane.race_duration, 0);
        }
    }
}
