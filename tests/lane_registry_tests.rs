//! Lane registry and detection tests

use derby_timer::hal::sim::ScriptedSensors;
use derby_timer::hal::SensorFn;
use derby_timer::{LaneRegistry, LaneStatus, MAX_LANES};

const CHANNELS: [u8; 4] = [33, 32, 39, 36];

#[test]
fn test_detection_samples_each_channel_once() {
    let mut seen = Vec::new();
    let mut sensor = SensorFn(|channel: u8| -> u16 {
        seen.push(channel);
        4095
    });
    let mut registry = LaneRegistry::new();

    registry.detect_lanes(&CHANNELS, &mut sensor, 4000);
    drop(sensor);

    assert_eq!(seen, CHANNELS.to_vec());
}

#[test]
fn test_detection_caps_lane_count() {
    let channels: Vec<u8> = (0..(MAX_LANES as u8 + 3)).collect();
    let mut sensors = ScriptedSensors::new(4095);
    let mut registry = LaneRegistry::new();

    let report = registry.detect_lanes(&channels, &mut sensors, 4000);

    assert_eq!(registry.len(), MAX_LANES);
    assert_eq!(report.len(), MAX_LANES);
}

#[test]
fn test_reset_for_idle_is_idempotent() {
    let mut sensors = ScriptedSensors::with_readings(&CHANNELS, &[5000, 2000, 5000, 100], 0);
    let mut registry = LaneRegistry::new();
    registry.detect_lanes(&CHANNELS, &mut sensors, 3500);
    registry.reset_for_racing();

    registry.reset_for_idle();
    let once = registry.snapshot();
    registry.reset_for_idle();

    assert_eq!(registry.snapshot(), once);
    let statuses: Vec<LaneStatus> = registry.lanes().iter().map(|l| l.status).collect();
    assert_eq!(
        statuses,
        vec![LaneStatus::Finished, LaneStatus::NotInUse, LaneStatus::Finished, LaneStatus::NotInUse]
    );
    for lane in registry.lanes() {
        assert_eq!(lane.finish_time, 0);
        assert_eq!(lane.race_duration, 0);
    }
}

#[test]
fn test_snapshot_is_detached() {
    let mut sensors = ScriptedSensors::new(4095);
    let mut registry = LaneRegistry::new();
    registry.detect_lanes(&CHANNELS, &mut sensors, 4000);

    let before = registry.snapshot();
    registry.reset_for_racing();

    assert_eq!(before[0].status, LaneStatus::Finished);
    assert_eq!(registry.lanes()[0].status, LaneStatus::Racing);
}

#[test]
fn test_lane_lookup_by_number() {
    let mut sensors = ScriptedSensors::new(4095);
    let mut registry = LaneRegistry::new();
    registry.detect_lanes(&CHANNELS, &mut sensors, 4000);

    assert_eq!(registry.lane(4).map(|l| l.channel()), Some(36));
    assert!(registry.lane(5).is_none());
    assert!(registry.lane(0).is_none());
}
