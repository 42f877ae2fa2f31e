//! End-to-end tests for the crane control pipeline.
//!
//! These run the full path the firmware uses: controller -> intent channel
//! -> arbiter -> servos, with the channel drained synchronously between
//! ticks so actuation order is deterministic.

use std::sync::mpsc::Receiver;

use rs_cranez::arbiter::{intent_channel, IntentSender, MotionArbiter, MotionIntent};
use rs_cranez::config::{CraneConfig, SequenceConfig};
use rs_cranez::controller::CraneController;
use rs_cranez::events::{Axis, CraneMode, InputEvent, MotionDirection};
use rs_cranez::hal::MockServos;
use rs_cranez::sensor::{SensorSample, StampedSample};

/// Full pipeline under test: controller feeding an arbiter through the
/// bounded channel.
struct Rig {
    controller: CraneController<IntentSender>,
    arbiter: MotionArbiter<MockServos>,
    rx: Receiver<MotionIntent>,
    seq: u64,
    now_ms: u64,
}

impl Rig {
    fn new(config: CraneConfig) -> Self {
        let (tx, rx) = intent_channel(config.control.intent_queue_len);
        Self {
            controller: CraneController::new(tx, config),
            arbiter: MotionArbiter::new(MockServos::new()),
            rx,
            seq: 0,
            now_ms: 0,
        }
    }

    /// One controller tick followed by a full channel drain.
    fn tick(&mut self, height_cm: Option<f32>) {
        let sample = height_cm.map(|h| {
            self.seq += 1;
            StampedSample {
                sample: SensorSample {
                    height_cm: h,
                    height_norm: 0.0,
                },
                seq: self.seq,
            }
        });
        self.controller.update(sample, self.now_ms);
        self.now_ms += 20;
        while let Ok(intent) = self.rx.try_recv() {
            self.arbiter.handle(intent).unwrap();
        }
    }

    fn push(&mut self, event: InputEvent) {
        self.controller.push_event(event);
    }

    fn servo_log(&self, axis: Axis) -> Vec<(MotionDirection, Option<u16>)> {
        self.arbiter.servos().axis_log(axis)
    }
}

fn rig() -> Rig {
    Rig::new(CraneConfig::default())
}

// ============================================================================
// Manual Mode
// ============================================================================

#[test]
fn manual_session_actuates_servos() {
    let mut rig = rig();
    rig.push(InputEvent::VerticalSwitchUp);
    rig.push(InputEvent::VerticalButtonPressed);
    rig.tick(None);

    assert_eq!(
        rig.arbiter.last_direction(Axis::Vertical),
        MotionDirection::Forward
    );

    rig.push(InputEvent::VerticalButtonReleased);
    rig.tick(None);
    assert_eq!(
        rig.arbiter.last_direction(Axis::Vertical),
        MotionDirection::Stop
    );
}

#[test]
fn reversal_reaches_servos_as_stop_then_reverse() {
    let mut rig = rig();
    rig.push(InputEvent::PlatformSwitchRight);
    rig.push(InputEvent::PlatformButtonPressed);
    rig.tick(None);

    rig.push(InputEvent::PlatformSwitchLeft);
    rig.tick(None); // controller submits the intermediate stop
    rig.tick(None); // then the new direction

    assert_eq!(
        rig.servo_log(Axis::Platform),
        vec![
            (MotionDirection::Forward, None),
            (MotionDirection::Stop, None),
            (MotionDirection::Backward, None),
        ]
    );
}

#[test]
fn axes_operate_independently() {
    let mut rig = rig();
    rig.push(InputEvent::VerticalSwitchDown);
    rig.push(InputEvent::VerticalButtonPressed);
    rig.push(InputEvent::PlatformSwitchRight);
    rig.push(InputEvent::PlatformButtonPressed);
    rig.tick(None);

    assert_eq!(
        rig.arbiter.last_direction(Axis::Vertical),
        MotionDirection::Backward
    );
    assert_eq!(
        rig.arbiter.last_direction(Axis::Platform),
        MotionDirection::Forward
    );

    // Releasing one button leaves the other axis moving.
    rig.push(InputEvent::VerticalButtonReleased);
    rig.tick(None);
    assert_eq!(
        rig.arbiter.last_direction(Axis::Vertical),
        MotionDirection::Stop
    );
    assert_eq!(
        rig.arbiter.last_direction(Axis::Platform),
        MotionDirection::Forward
    );
}

#[test]
fn limit_hit_blocks_and_reset_recovers() {
    let mut rig = rig();
    rig.push(InputEvent::VerticalSwitchUp);
    rig.push(InputEvent::VerticalButtonPressed);
    rig.tick(None);

    rig.push(InputEvent::LimitTopHit);
    rig.tick(None);
    assert_eq!(rig.controller.mode(), CraneMode::Blocked);
    assert_eq!(
        rig.arbiter.last_direction(Axis::Vertical),
        MotionDirection::Stop
    );

    // Operator input while blocked is ignored at the servo level too.
    rig.push(InputEvent::VerticalSwitchUp);
    rig.push(InputEvent::VerticalButtonPressed);
    rig.tick(None);
    assert_eq!(
        rig.arbiter.last_direction(Axis::Vertical),
        MotionDirection::Stop
    );

    rig.push(InputEvent::Reset);
    rig.tick(None);
    assert_eq!(rig.controller.mode(), CraneMode::Manual);
}

// ============================================================================
// Auto Mode
// ============================================================================

/// Run the rig as a crude plant: height follows the hoist direction.
fn run_auto(rig: &mut Rig, start_cm: f32) -> f32 {
    rig.controller.set_mode(CraneMode::Auto);
    let mut height = start_cm;
    for _ in 0..20_000 {
        if rig.controller.mode() != CraneMode::Auto {
            break;
        }
        match rig.controller.state().vertical.motion {
            MotionDirection::Forward => height += 0.05,
            MotionDirection::Backward => height -= 0.05,
            MotionDirection::Stop => {}
        }
        rig.tick(Some(height));
    }
    height
}

#[test]
fn auto_sequence_ends_at_release_height() {
    let mut rig = rig();
    let final_height = run_auto(&mut rig, 10.0);

    assert_eq!(rig.controller.mode(), CraneMode::Manual);
    let release = CraneConfig::default().sequence.release_cm;
    assert!(
        (final_height - release).abs() <= 0.6,
        "ended at {final_height}, expected near {release}"
    );
    // Both servos neutral at the end.
    assert_eq!(
        rig.arbiter.last_direction(Axis::Vertical),
        MotionDirection::Stop
    );
    assert_eq!(
        rig.arbiter.last_direction(Axis::Platform),
        MotionDirection::Stop
    );
}

#[test]
fn auto_swings_alternate_on_the_platform() {
    let mut rig = rig();
    run_auto(&mut rig, 6.0);

    // Right, left, left, right, with a neutral between each swing. The
    // extra stops at the ends come from the mode-entry force-stops.
    let swings: Vec<MotionDirection> = rig
        .servo_log(Axis::Platform)
        .into_iter()
        .map(|(d, _)| d)
        .filter(|d| *d != MotionDirection::Stop)
        .collect();
    assert_eq!(
        swings,
        vec![
            MotionDirection::Forward,
            MotionDirection::Backward,
            MotionDirection::Backward,
            MotionDirection::Forward,
        ]
    );
}

#[test]
fn auto_abort_stops_at_servo_level_within_one_tick() {
    let mut rig = rig();
    rig.controller.set_mode(CraneMode::Auto);
    rig.tick(Some(15.0)); // hoist starts moving down toward baseline
    assert_eq!(
        rig.arbiter.last_direction(Axis::Vertical),
        MotionDirection::Backward
    );

    rig.push(InputEvent::VerticalButtonPressed);
    rig.tick(Some(14.9));
    assert_eq!(rig.controller.mode(), CraneMode::Manual);
    assert_eq!(
        rig.arbiter.last_direction(Axis::Vertical),
        MotionDirection::Stop
    );
}

#[test]
fn auto_with_custom_sequence_config() {
    let config = CraneConfig::default().with_sequence(
        SequenceConfig::default()
            .with_baseline_cm(8.0)
            .with_swing_ms(100),
    );
    let mut rig = Rig::new(config);
    run_auto(&mut rig, 8.0);
    assert_eq!(rig.controller.mode(), CraneMode::Manual);
}

// ============================================================================
// Calibration Mode
// ============================================================================

#[test]
fn calibration_applies_test_pulses_at_the_servo() {
    let mut rig = rig();
    rig.controller.set_mode(CraneMode::Calibration);
    let mut height = 8.0f32;
    for _ in 0..20_000 {
        if rig.controller.mode() != CraneMode::Calibration {
            break;
        }
        match rig.controller.state().vertical.motion {
            MotionDirection::Forward => height += 0.05,
            MotionDirection::Backward => height -= 0.05,
            MotionDirection::Stop => {}
        }
        rig.tick(Some(height));
    }
    assert_eq!(rig.controller.mode(), CraneMode::Manual);

    // Each moving actuation carried the checkpoint's test pulse.
    let pulses: Vec<u16> = rig
        .servo_log(Axis::Vertical)
        .into_iter()
        .filter_map(|(_, m)| m)
        .collect();
    assert_eq!(pulses, vec![1590, 1420, 1610, 1400]);

    let report = rig.controller.calibration_report();
    assert_eq!(report.len(), 4);
    assert!(report.iter().all(|leg| leg.in_band));
}

#[test]
fn calibration_abort_keeps_partial_report() {
    let mut rig = rig();
    rig.controller.set_mode(CraneMode::Calibration);
    rig.tick(Some(12.0)); // first checkpoint satisfied instantly

    rig.push(InputEvent::Reset);
    rig.tick(Some(12.0));
    assert_eq!(rig.controller.mode(), CraneMode::Manual);
    assert_eq!(rig.controller.calibration_report().len(), 1);
}
