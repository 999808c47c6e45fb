//! Command interpreter tests

use derby_timer::command::{find_command, COMMANDS};
use derby_timer::hal::sim::ScriptedSensors;
use derby_timer::{dispatch, LaneStatus, RaceContext, RaceStatus, Reply, Response, TriggerState};

const CHANNELS: [u8; 4] = [33, 32, 39, 36];

fn detected() -> RaceContext {
    let mut race = RaceContext::new();
    race.detect_lanes(&CHANNELS, &mut ScriptedSensors::new(4095), 4000);
    race
}

#[test]
fn test_command_registry_has_all_commands() {
    let expected = [(b'G', "gate-check"), (b'R', "timer-reset"), (b'F', "force-send")];

    for (byte, name) in expected {
        let cmd = find_command(byte).unwrap();
        assert_eq!(cmd.name, name);
        assert!(!cmd.brief.is_empty());
    }
    assert_eq!(COMMANDS.len(), expected.len());
}

#[test]
fn test_gate_check_is_deterministic() {
    let mut race = detected();

    for _ in 0..3 {
        assert_eq!(
            dispatch(b'G', &mut race, TriggerState::ReadyToRelease),
            Some(Reply::Line(Response::GateClosed))
        );
    }
    assert_eq!(
        dispatch(b'G', &mut race, TriggerState::Released),
        Some(Reply::Line(Response::GateOpen))
    );
}

#[test]
fn test_reset_replies_by_gate_state() {
    let mut race = detected();

    assert_eq!(
        dispatch(b'R', &mut race, TriggerState::ReadyToRelease),
        Some(Reply::Reset(Response::Ready))
    );
    assert_eq!(
        dispatch(b'R', &mut race, TriggerState::Released),
        Some(Reply::Reset(Response::GateOpen))
    );
}

#[test]
fn test_reset_during_race_keeps_status() {
    let mut race = detected();
    race.on_trigger(TriggerState::Released, 500).unwrap();

    dispatch(b'R', &mut race, TriggerState::Released);

    assert_eq!(race.status(), RaceStatus::RaceInProgress);
    assert_eq!(race.race_begin(), 500);
    assert!(race.lanes().lanes().iter().all(|l| l.status == LaneStatus::Finished));
}

#[test]
fn test_force_send_reports_current_times() {
    let mut race = detected();
    race.on_trigger(TriggerState::Released, 0).unwrap();

    let reply = dispatch(b'F', &mut race, TriggerState::Released);

    match reply {
        Some(Reply::Results(text)) => {
            assert_eq!(text.as_str(), "1 0.0000\n2 0.0000\n3 0.0000\n4 0.0000\n")
        }
        other => panic!("unexpected reply {:?}", other),
    }
}

#[test]
fn test_other_bytes_change_nothing() {
    let mut race = detected();
    race.on_trigger(TriggerState::Released, 77).unwrap();
    let lanes = race.lanes().snapshot();

    for byte in [b'g', b'r', b'f', b'X', b'\r', b'\n', 0x00, 0xFF] {
        assert_eq!(dispatch(byte, &mut race, TriggerState::Released), None);
    }

    assert_eq!(race.status(), RaceStatus::RaceInProgress);
    assert_eq!(race.race_begin(), 77);
    assert_eq!(race.lanes().snapshot(), lanes);
}
