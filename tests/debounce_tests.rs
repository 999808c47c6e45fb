//! Debouncer tests

use derby_timer::hal::sim::ScriptedPin;
use derby_timer::hal::{DebouncedInput, Debouncer};

fn debouncer(level: bool) -> Debouncer<ScriptedPin> {
    Debouncer::new(ScriptedPin { level }, 25, 0)
}

#[test]
fn test_adopts_initial_level() {
    let mut input = debouncer(true);
    input.update(1_000);

    assert!(input.read());
    assert!(!input.changed());
}

#[test]
fn test_change_accepted_after_stable_interval() {
    let mut input = debouncer(false);

    input.pin_mut().level = true;
    input.update(1_000);
    assert!(!input.changed());

    input.update(20_000);
    assert!(!input.read());

    input.update(26_000);
    assert!(input.changed());
    assert!(input.rose());
    assert!(input.read());

    // Edge reported for one update only
    input.update(27_000);
    assert!(!input.changed());
    assert!(input.read());
}

#[test]
fn test_glitch_is_rejected() {
    let mut input = debouncer(true);

    input.pin_mut().level = false;
    input.update(10_000);
    input.pin_mut().level = true;
    input.update(12_000);

    for now in [40_000, 80_000, 120_000] {
        input.update(now);
        assert!(!input.changed());
        assert!(input.read());
    }
}

#[test]
fn test_fall_detected() {
    let mut input = debouncer(true);

    input.pin_mut().level = false;
    input.update(5_000);
    input.update(30_000);

    assert!(input.fell());
    assert!(!input.rose());
}

#[test]
fn test_bouncing_press_reports_one_fall() {
    let mut input = debouncer(true);
    let mut falls = 0;

    for step in 1..=40u32 {
        // Contacts chatter for 3 ms, then settle low
        input.pin_mut().level = step == 2;
        input.update(step * 1_000);
        if input.fell() {
            falls += 1;
            assert_eq!(step, 28);
        }
    }

    assert_eq!(falls, 1);
    assert!(!input.read());
}
