use std::time::Duration;

use stepguard_core::mocks::{
    NoRanger, RecordingAlert, RecordingDisplay, ScriptedCommands, ScriptedRanger, SpyStepper, StepperCall,
};
use stepguard_core::{AlertCfg, BuildError, ControllerBuilder, DistanceSample};
use stepguard_traits::ManualClock;

const KEY_0: u32 = 0xFF6897;
const KEY_5: u32 = 0xFF38C7;

#[test]
fn approach_reduce_hold_release() {
    let clock = ManualClock::new();
    let stepper = SpyStepper::default();
    let calls = stepper.calls();
    let alert = RecordingAlert::default();
    let writes = alert.writes();
    let display = RecordingDisplay::default();
    let frames = display.frames();
    let commands = ScriptedCommands::new([KEY_5]);
    let remote = commands.clone();

    let mut c = ControllerBuilder::new()
        .with_ranger(ScriptedRanger::new([Some(100), Some(15), Some(36), Some(41)]))
        .with_stepper(stepper)
        .with_alert_output(alert)
        .with_display(display)
        .with_commands(commands)
        .with_clock(clock.clone())
        .build()
        .unwrap();
    c.begin().unwrap();

    // t=0: clear path, full commanded level
    let s = c.step().unwrap();
    assert_eq!(s.commanded.get(), 5);
    assert_eq!(s.effective.get(), 5);
    assert_eq!(s.rpm, 8.5);

    // t=50: no sample due, actuation still re-issued
    clock.advance_ms(50);
    c.step().unwrap();

    // t=100: 15cm inside the 35cm threshold, round(5*13/33) = 2
    clock.advance_ms(50);
    let s = c.step().unwrap();
    assert_eq!(s.effective.get(), 2);
    assert!(s.reducing);
    assert!(s.alert);

    // t=200: 36cm sits in the hold band
    clock.advance_ms(100);
    let s = c.step().unwrap();
    assert_eq!(s.effective.get(), 2);
    assert!(s.reducing);
    assert!(!s.alert);

    // t=300: 41cm clears threshold + margin
    clock.advance_ms(100);
    let s = c.step().unwrap();
    assert_eq!(s.effective.get(), 5);
    assert!(!s.reducing);

    remote.push(KEY_0);
    let s = c.step().unwrap();
    assert_eq!(s.effective.get(), 0);
    assert_eq!(s.rpm, 0.0);

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            StepperCall::SetSpeed(8.5),
            StepperCall::Step(1),
            StepperCall::Step(1),
            StepperCall::SetSpeed(3.625),
            StepperCall::Step(1),
            StepperCall::Step(1),
            StepperCall::SetSpeed(8.5),
            StepperCall::Step(1),
            StepperCall::Release,
        ]
    );
    assert_eq!(*writes.lock().unwrap(), vec![false, true, false]);

    let frames = frames.lock().unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].0, "C:5 E:5 D:100cm ");
    assert_eq!(frames[0].1, "Mode: normal    ");

    let stats = c.stats();
    assert_eq!(stats.samples, 4);
    assert_eq!(stats.commands_accepted, 2);
    assert_eq!(stats.renders, 1);
}

#[test]
fn no_echo_restores_full_speed_immediately() {
    let clock = ManualClock::new();
    let mut c = ControllerBuilder::new()
        .with_ranger(ScriptedRanger::new([Some(12), None]))
        .with_stepper(SpyStepper::default())
        .with_commands(ScriptedCommands::new([0xFF52AD]))
        .with_clock(clock.clone())
        .build()
        .unwrap();
    c.begin().unwrap();

    let s = c.step().unwrap();
    assert!(s.effective.get() < 9);
    clock.advance_ms(100);
    let s = c.step().unwrap();
    assert_eq!(s.distance, DistanceSample::NoEcho);
    assert_eq!(s.effective.get(), 9);
    assert_eq!(c.stats().no_echo_samples, 1);
}

#[test]
fn obstacle_line_rendered_on_display_cadence() {
    let clock = ManualClock::new();
    let display = RecordingDisplay::default();
    let frames = display.frames();
    let mut c = ControllerBuilder::new()
        .with_ranger(ScriptedRanger::new([Some(200), Some(9)]).repeat_last())
        .with_stepper(SpyStepper::default())
        .with_display(display)
        .with_clock(clock.clone())
        .build()
        .unwrap();
    c.begin().unwrap();

    c.step().unwrap();
    for _ in 0..5 {
        clock.advance_ms(100);
        c.step().unwrap();
    }
    let frames = frames.lock().unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].0, "C:0 E:0 D:200cm ");
    assert_eq!(frames[1].0, "C:0 E:0 D:  9cm ");
    assert_eq!(frames[1].1, "OBSTACLE! SLOW  ");
}

#[test]
fn idle_hint_is_zero_only_while_moving() {
    let clock = ManualClock::new();
    let commands = ScriptedCommands::default();
    let remote = commands.clone();
    let mut c = ControllerBuilder::new()
        .with_ranger(ScriptedRanger::new(std::iter::empty()))
        .with_stepper(SpyStepper::default())
        .with_commands(commands)
        .with_clock(clock.clone())
        .build()
        .unwrap();
    c.begin().unwrap();
    c.step().unwrap();
    let idle = c.idle_hint();
    assert!(idle > Duration::ZERO && idle <= Duration::from_millis(2));

    remote.push(KEY_5);
    c.step().unwrap();
    assert_eq!(c.idle_hint(), Duration::ZERO);
}

#[test]
fn externally_fed_loop_still_paces_while_stopped() {
    let clock = ManualClock::new();
    let mut c = ControllerBuilder::new()
        .with_ranger(NoRanger)
        .with_stepper(SpyStepper::default())
        .with_clock(clock.clone())
        .build()
        .unwrap();
    c.begin().unwrap();
    c.step_with_sample(Some(DistanceSample::Cm(200))).unwrap();
    let idle = c.idle_hint();
    assert!(idle > Duration::ZERO && idle <= Duration::from_millis(2));

    // passes without a fresh sample pace the same way
    clock.advance_ms(1);
    c.step_with_sample(None).unwrap();
    assert!(c.idle_hint() > Duration::ZERO);
}

#[test]
fn ignored_codes_are_counted_and_harmless() {
    let mut c = ControllerBuilder::new()
        .with_ranger(ScriptedRanger::new(std::iter::empty()))
        .with_stepper(SpyStepper::default())
        .with_commands(ScriptedCommands::new([KEY_5, 0x1234, 0xFFFF_FFFF]))
        .with_clock(ManualClock::new())
        .build()
        .unwrap();
    let s = c.step().unwrap();
    assert_eq!(s.commanded.get(), 5);
    assert_eq!(c.stats().commands_accepted, 1);
    assert_eq!(c.stats().commands_ignored, 2);
}

#[test]
fn inverted_alert_band_is_rejected() {
    let err = ControllerBuilder::new()
        .with_ranger(ScriptedRanger::new(std::iter::empty()))
        .with_stepper(SpyStepper::default())
        .with_alert(AlertCfg {
            on_cm: 30,
            off_cm: 25,
        })
        .build()
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}
