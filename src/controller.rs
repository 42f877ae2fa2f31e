//! The crane mode state machine.
//!
//! [`CraneController`] is a pure tick-driven core: it owns no threads and
//! never blocks. Each call to [`update`](CraneController::update) drains the
//! pending input events, runs one step of the active mode's logic against
//! the latest sensor sample, and submits motion intents into an
//! [`IntentSink`]. The host (a FreeRTOS-style task loop, a test harness)
//! decides when ticks happen and what "now" is.
//!
//! # Modes
//!
//! - **Manual**: latched switch direction + hold-to-enable button per axis.
//! - **Auto**: the pick-and-place sequence from [`crate::sequence`].
//! - **Calibration**: open-loop speed characterization of the hoist.
//! - **Blocked**: latched safe state after a limit hit; reset to leave.
//!
//! # Reversal contract
//!
//! The arbiter consumes a reversal request by forcing a stop and does not
//! resume the opposite direction. The controller therefore splits every
//! reversal itself: the tick that detects an opposite desired direction
//! submits Stop, and the following tick submits the new direction against a
//! now-neutral axis.

use heapless::Deque;
use heapless::Vec as HVec;

use crate::arbiter::{IntentSink, MotionIntent};
use crate::config::CraneConfig;
use crate::events::{Axis, CraneMode, InputEvent, MotionDirection};
use crate::sensor::StampedSample;
use crate::sequence::{
    auto_sequence, finish_leg, height_direction, AutoStep, CalibrationReport, MAX_AUTO_STEPS,
};

/// Capacity of the controller's input event queue.
pub const EVENT_QUEUE_LEN: usize = 20;

// ============================================================================
// Axis State
// ============================================================================

/// Latched input and commanded motion for one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisState {
    /// Direction latched from the selector switch.
    pub switch_dir: MotionDirection,
    /// Whether the enable button is currently held.
    pub button_held: bool,
    /// Motion most recently submitted for this axis.
    pub motion: MotionDirection,
}

// ============================================================================
// Controller State Snapshot
// ============================================================================

/// Read-only snapshot of the controller, for telemetry and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CraneState {
    /// Active mode.
    pub mode: CraneMode,
    /// Hoist axis state.
    pub vertical: AxisState,
    /// Platform axis state.
    pub platform: AxisState,
    /// Current step index within an Auto or Calibration run.
    pub sequence_step: usize,
    /// Most recent height reading seen by the controller, if any.
    pub last_height_cm: Option<f32>,
    /// Input events dropped because the event queue was full.
    pub dropped_events: u32,
    /// Motion intents dropped because the intent channel was full.
    pub dropped_intents: u32,
}

// ============================================================================
// Crane Controller
// ============================================================================

/// Tick-driven crane FSM, generic over the motion intent sink.
pub struct CraneController<S: IntentSink> {
    sink: S,
    config: CraneConfig,
    mode: CraneMode,
    vertical: AxisState,
    platform: AxisState,
    events: Deque<InputEvent, EVENT_QUEUE_LEN>,
    dropped_events: u32,
    dropped_intents: u32,

    // Sequence bookkeeping, shared by Auto and Calibration.
    steps: HVec<AutoStep, MAX_AUTO_STEPS>,
    sequence_step: usize,
    step_entry_pending: bool,
    step_deadline_ms: u64,

    // Sensor bookkeeping.
    last_sample_seq: u64,
    last_height_cm: Option<f32>,

    // Calibration bookkeeping.
    leg_start_cm: f32,
    leg_start_ms: u64,
    report: CalibrationReport,
}

impl<S: IntentSink> CraneController<S> {
    /// Create a controller in Manual mode with both axes neutral.
    pub fn new(sink: S, config: CraneConfig) -> Self {
        Self {
            sink,
            config,
            mode: CraneMode::Manual,
            vertical: AxisState::default(),
            platform: AxisState::default(),
            events: Deque::new(),
            dropped_events: 0,
            dropped_intents: 0,
            steps: HVec::new(),
            sequence_step: 0,
            step_entry_pending: true,
            step_deadline_ms: 0,
            last_sample_seq: 0,
            last_height_cm: None,
            leg_start_cm: 0.0,
            leg_start_ms: 0,
            report: CalibrationReport::new(),
        }
    }

    // ------------------------------------------------------------------
    // External surface
    // ------------------------------------------------------------------

    /// Queue one input event for the next tick.
    ///
    /// The queue is bounded; overflow drops the event and increments the
    /// drop counter rather than blocking or failing silently.
    pub fn push_event(&mut self, event: InputEvent) {
        if self.events.push_back(event).is_err() {
            self.dropped_events = self.dropped_events.saturating_add(1);
        }
    }

    /// Switch to `mode`, performing a full reset: both axes are force-
    /// stopped, latched input state is cleared, and any running sequence
    /// restarts from step zero.
    pub fn set_mode(&mut self, mode: CraneMode) {
        self.force_stop_all();
        self.vertical = AxisState {
            motion: self.vertical.motion,
            ..AxisState::default()
        };
        self.platform = AxisState {
            motion: self.platform.motion,
            ..AxisState::default()
        };
        self.sequence_step = 0;
        self.step_entry_pending = true;
        self.step_deadline_ms = 0;
        match mode {
            CraneMode::Auto => self.steps = auto_sequence(&self.config.sequence),
            CraneMode::Calibration => self.report.clear(),
            _ => {}
        }
        self.mode = mode;
    }

    /// Run one controller tick.
    ///
    /// `sample` is the latest published sensor reading, if any; its sequence
    /// number tells the controller whether the value is fresh since the last
    /// tick. `now_ms` is monotonic time from the host's clock.
    pub fn update(&mut self, sample: Option<StampedSample>, now_ms: u64) {
        self.drain_events();
        match self.mode {
            CraneMode::Manual => self.tick_manual(),
            CraneMode::Auto => self.tick_auto(sample, now_ms),
            CraneMode::Calibration => self.tick_calibration(sample, now_ms),
            CraneMode::Blocked => self.tick_blocked(),
        }
    }

    /// Current mode.
    pub fn mode(&self) -> CraneMode {
        self.mode
    }

    /// Snapshot for telemetry and tests.
    pub fn state(&self) -> CraneState {
        CraneState {
            mode: self.mode,
            vertical: self.vertical,
            platform: self.platform,
            sequence_step: self.sequence_step,
            last_height_cm: self.last_height_cm,
            dropped_events: self.dropped_events,
            dropped_intents: self.dropped_intents,
        }
    }

    /// Results of the most recent calibration run. Retained after the run
    /// completes and the controller reverts to Manual; cleared when a new
    /// run starts.
    pub fn calibration_report(&self) -> &CalibrationReport {
        &self.report
    }

    /// The controller's configuration.
    pub fn config(&self) -> &CraneConfig {
        &self.config
    }

    /// Access the intent sink (mainly for tests).
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the intent sink (mainly for tests).
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // ------------------------------------------------------------------
    // Event handling
    // ------------------------------------------------------------------

    fn drain_events(&mut self) {
        while let Some(event) = self.events.pop_front() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: InputEvent) {
        match self.mode {
            CraneMode::Manual => self.handle_event_manual(event),
            CraneMode::Auto | CraneMode::Calibration => {
                // Any operator action aborts the sequence; limit events are
                // only meaningful in Manual and are discarded here.
                if event.is_manual_input() {
                    self.set_mode(CraneMode::Manual);
                }
            }
            CraneMode::Blocked => {
                if event == InputEvent::Reset {
                    self.set_mode(CraneMode::Manual);
                }
            }
        }
    }

    fn handle_event_manual(&mut self, event: InputEvent) {
        use InputEvent::*;
        match event {
            VerticalButtonPressed => self.vertical.button_held = true,
            VerticalButtonReleased => self.vertical.button_held = false,
            PlatformButtonPressed => self.platform.button_held = true,
            PlatformButtonReleased => self.platform.button_held = false,
            VerticalSwitchUp => self.vertical.switch_dir = MotionDirection::Forward,
            VerticalSwitchDown => self.vertical.switch_dir = MotionDirection::Backward,
            VerticalSwitchNeutral => self.vertical.switch_dir = MotionDirection::Stop,
            PlatformSwitchRight => self.platform.switch_dir = MotionDirection::Forward,
            PlatformSwitchLeft => self.platform.switch_dir = MotionDirection::Backward,
            PlatformSwitchNeutral => self.platform.switch_dir = MotionDirection::Stop,
            LimitTopHit | LimitBottomHit | LimitLeftHit | LimitRightHit => {
                if let Some(axis) = event.limit_axis() {
                    self.force_stop(axis);
                }
                self.set_mode(CraneMode::Blocked);
            }
            Reset => {
                // Stay in Manual but drop everything latched.
                self.set_mode(CraneMode::Manual);
            }
        }
    }

    // ------------------------------------------------------------------
    // Manual mode
    // ------------------------------------------------------------------

    fn tick_manual(&mut self) {
        for axis in [Axis::Vertical, Axis::Platform] {
            let st = self.axis(axis);
            let desired = if st.button_held {
                st.switch_dir
            } else {
                MotionDirection::Stop
            };
            self.drive(axis, desired, None);
        }
    }

    // ------------------------------------------------------------------
    // Blocked mode
    // ------------------------------------------------------------------

    fn tick_blocked(&mut self) {
        // Entry stops can be dropped on a full channel; keep retrying until
        // both axes are actually neutral.
        self.retry_stop(Axis::Vertical);
        self.retry_stop(Axis::Platform);
    }

    // ------------------------------------------------------------------
    // Auto mode
    // ------------------------------------------------------------------

    fn tick_auto(&mut self, sample: Option<StampedSample>, now_ms: u64) {
        if self.sequence_step >= self.steps.len() {
            self.set_mode(CraneMode::Manual);
            return;
        }
        match self.steps[self.sequence_step] {
            AutoStep::Height { target_cm } => {
                self.retry_stop(Axis::Platform);
                let Some(height) = self.fresh_height(sample) else {
                    return; // no fresh reading, hold course this tick
                };
                let tolerance = self.config.sequence.tolerance_cm;
                self.step_entry_pending = false;
                match height_direction(height, target_cm, tolerance) {
                    MotionDirection::Stop => {
                        self.drive(Axis::Vertical, MotionDirection::Stop, None);
                        self.advance_step(now_ms);
                    }
                    dir => self.drive(Axis::Vertical, dir, None),
                }
            }
            AutoStep::Swing {
                direction,
                duration_ms,
            } => {
                self.retry_stop(Axis::Vertical);
                if self.step_entry_pending {
                    self.step_entry_pending = false;
                    self.step_deadline_ms = now_ms + duration_ms;
                }
                if now_ms >= self.step_deadline_ms {
                    self.drive(Axis::Platform, MotionDirection::Stop, None);
                    self.advance_step(now_ms);
                } else {
                    self.drive(Axis::Platform, direction, None);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Calibration mode
    // ------------------------------------------------------------------

    fn tick_calibration(&mut self, sample: Option<StampedSample>, now_ms: u64) {
        if self.sequence_step >= self.config.calibration.checkpoints.len() {
            self.set_mode(CraneMode::Manual);
            return;
        }
        let checkpoint = self.config.calibration.checkpoints[self.sequence_step];

        // The platform plays no part in calibration; re-stop it in case its
        // mode-entry stop was dropped.
        self.retry_stop(Axis::Platform);

        let Some(height) = self.fresh_height(sample) else {
            return;
        };
        if self.step_entry_pending {
            self.step_entry_pending = false;
            self.leg_start_cm = height;
            self.leg_start_ms = now_ms;
        }

        let tolerance = self.config.calibration.tolerance_cm;
        match height_direction(height, checkpoint.target_cm, tolerance) {
            MotionDirection::Stop => {
                self.drive(Axis::Vertical, MotionDirection::Stop, None);
                let result = finish_leg(
                    &self.config.calibration,
                    checkpoint.target_cm,
                    checkpoint.pulse_us,
                    self.leg_start_cm,
                    now_ms - self.leg_start_ms,
                );
                let _ = self.report.push(result);
                self.advance_step(now_ms);
            }
            dir => self.drive(Axis::Vertical, dir, Some(checkpoint.pulse_us)),
        }
    }

    // ------------------------------------------------------------------
    // Shared helpers
    // ------------------------------------------------------------------

    fn advance_step(&mut self, _now_ms: u64) {
        self.sequence_step += 1;
        self.step_entry_pending = true;
    }

    /// Height from `sample` if it has not been consumed by a previous tick.
    fn fresh_height(&mut self, sample: Option<StampedSample>) -> Option<f32> {
        let stamped = sample?;
        if stamped.seq == self.last_sample_seq {
            return None;
        }
        self.last_sample_seq = stamped.seq;
        self.last_height_cm = Some(stamped.sample.height_cm);
        Some(stamped.sample.height_cm)
    }

    fn axis(&self, axis: Axis) -> AxisState {
        match axis {
            Axis::Vertical => self.vertical,
            Axis::Platform => self.platform,
        }
    }

    fn set_motion(&mut self, axis: Axis, motion: MotionDirection) {
        match axis {
            Axis::Vertical => self.vertical.motion = motion,
            Axis::Platform => self.platform.motion = motion,
        }
    }

    fn submit(&mut self, intent: MotionIntent) -> bool {
        match self.sink.submit(intent) {
            Ok(()) => true,
            Err(_) => {
                // Dropped command: keep our motion bookkeeping unchanged so
                // the same transition is re-submitted next tick.
                self.dropped_intents = self.dropped_intents.saturating_add(1);
                false
            }
        }
    }

    /// Edge-triggered drive with controller-side reversal splitting.
    ///
    /// Submits only on a change of desired direction. A desired direction
    /// opposite to the current motion first submits Stop; once the axis is
    /// neutral, the next tick's identical call submits the new direction.
    fn drive(&mut self, axis: Axis, desired: MotionDirection, magnitude_us: Option<u16>) {
        let current = self.axis(axis).motion;
        if desired == current {
            return;
        }
        let next = if desired.is_reversal_of(current) {
            MotionDirection::Stop
        } else {
            desired
        };
        let intent = MotionIntent {
            axis,
            direction: next,
            magnitude_us: if next == MotionDirection::Stop {
                None
            } else {
                magnitude_us
            },
        };
        if self.submit(intent) {
            self.set_motion(axis, next);
        }
    }

    /// Re-submit Stop for an axis still marked moving.
    ///
    /// Mode-entry stops can be dropped by a full channel. Ticks that do not
    /// drive an axis themselves call this so the stop is retried rather
    /// than stranded behind the drop counter.
    fn retry_stop(&mut self, axis: Axis) {
        if self.axis(axis).motion != MotionDirection::Stop {
            self.force_stop(axis);
        }
    }

    /// Unconditional stop submit for one axis (not edge-triggered).
    fn force_stop(&mut self, axis: Axis) {
        if self.submit(MotionIntent::stop(axis)) {
            self.set_motion(axis, MotionDirection::Stop);
        }
    }

    fn force_stop_all(&mut self) {
        self.force_stop(Axis::Vertical);
        self.force_stop(Axis::Platform);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockIntentSink;
    use crate::sensor::SensorSample;

    fn controller() -> CraneController<MockIntentSink> {
        CraneController::new(MockIntentSink::new(), CraneConfig::default())
    }

    fn stamped(height_cm: f32, seq: u64) -> Option<StampedSample> {
        Some(StampedSample {
            sample: SensorSample {
                height_cm,
                height_norm: 0.0,
            },
            seq,
        })
    }

    // =========================================================================
    // Manual Mode Tests
    // =========================================================================

    #[test]
    fn manual_moves_only_with_button_and_direction() {
        let mut c = controller();

        // Switch alone does nothing.
        c.push_event(InputEvent::VerticalSwitchUp);
        c.update(None, 0);
        assert_eq!(c.state().vertical.motion, MotionDirection::Stop);

        // Button + latched switch starts motion.
        c.push_event(InputEvent::VerticalButtonPressed);
        c.update(None, 20);
        assert_eq!(c.state().vertical.motion, MotionDirection::Forward);

        // Releasing the button stops.
        c.push_event(InputEvent::VerticalButtonReleased);
        c.update(None, 40);
        assert_eq!(c.state().vertical.motion, MotionDirection::Stop);
    }

    #[test]
    fn manual_commands_are_edge_triggered() {
        let mut c = controller();
        c.push_event(InputEvent::VerticalSwitchUp);
        c.push_event(InputEvent::VerticalButtonPressed);
        c.update(None, 0);
        let submitted = c.sink().intents().len();

        // Further ticks with no input change submit nothing new.
        c.update(None, 20);
        c.update(None, 40);
        assert_eq!(c.sink().intents().len(), submitted);
    }

    #[test]
    fn manual_reversal_goes_through_stop() {
        let mut c = controller();
        c.push_event(InputEvent::VerticalSwitchUp);
        c.push_event(InputEvent::VerticalButtonPressed);
        c.update(None, 0);

        c.push_event(InputEvent::VerticalSwitchDown);
        c.update(None, 20);
        // First tick after the flip: only the intermediate stop.
        assert_eq!(c.state().vertical.motion, MotionDirection::Stop);

        c.update(None, 40);
        assert_eq!(c.state().vertical.motion, MotionDirection::Backward);

        let dirs: Vec<MotionDirection> = c
            .sink()
            .intents()
            .iter()
            .map(|i| i.direction)
            .collect();
        assert_eq!(
            dirs,
            vec![
                MotionDirection::Forward,
                MotionDirection::Stop,
                MotionDirection::Backward,
            ]
        );
    }

    #[test]
    fn limit_hit_stops_axis_and_blocks() {
        let mut c = controller();
        c.push_event(InputEvent::PlatformSwitchRight);
        c.push_event(InputEvent::PlatformButtonPressed);
        c.update(None, 0);
        assert_eq!(c.state().platform.motion, MotionDirection::Forward);

        c.push_event(InputEvent::LimitRightHit);
        c.update(None, 20);
        assert_eq!(c.mode(), CraneMode::Blocked);
        assert_eq!(c.state().platform.motion, MotionDirection::Stop);
        assert_eq!(c.state().vertical.motion, MotionDirection::Stop);
    }

    #[test]
    fn blocked_ignores_everything_but_reset() {
        let mut c = controller();
        c.push_event(InputEvent::LimitTopHit);
        c.update(None, 0);
        assert_eq!(c.mode(), CraneMode::Blocked);

        c.push_event(InputEvent::VerticalButtonPressed);
        c.push_event(InputEvent::VerticalSwitchUp);
        c.update(None, 20);
        assert_eq!(c.mode(), CraneMode::Blocked);
        assert_eq!(c.state().vertical.motion, MotionDirection::Stop);

        c.push_event(InputEvent::Reset);
        c.update(None, 40);
        assert_eq!(c.mode(), CraneMode::Manual);
    }

    #[test]
    fn reset_in_manual_clears_latched_state() {
        let mut c = controller();
        c.push_event(InputEvent::VerticalSwitchUp);
        c.push_event(InputEvent::VerticalButtonPressed);
        c.update(None, 0);
        assert_eq!(c.state().vertical.motion, MotionDirection::Forward);

        c.push_event(InputEvent::Reset);
        c.update(None, 20);
        let state = c.state();
        assert_eq!(state.vertical.motion, MotionDirection::Stop);
        assert!(!state.vertical.button_held);
        assert_eq!(state.vertical.switch_dir, MotionDirection::Stop);
    }

    #[test]
    fn event_queue_overflow_is_counted() {
        let mut c = controller();
        for _ in 0..(EVENT_QUEUE_LEN + 5) {
            c.push_event(InputEvent::VerticalButtonPressed);
        }
        assert_eq!(c.state().dropped_events, 5);
    }

    // =========================================================================
    // Mode Transition Tests
    // =========================================================================

    #[test]
    fn entering_a_mode_force_stops_both_axes() {
        let mut c = controller();
        c.push_event(InputEvent::VerticalSwitchUp);
        c.push_event(InputEvent::VerticalButtonPressed);
        c.update(None, 0);

        c.set_mode(CraneMode::Auto);
        let state = c.state();
        assert_eq!(state.vertical.motion, MotionDirection::Stop);
        assert_eq!(state.platform.motion, MotionDirection::Stop);
        assert!(!state.vertical.button_held);
        assert_eq!(state.sequence_step, 0);
    }

    #[test]
    fn manual_input_aborts_auto_within_one_tick() {
        let mut c = controller();
        c.set_mode(CraneMode::Auto);
        c.update(stamped(15.0, 1), 0); // mid-sequence, hoist moving down
        assert_eq!(c.mode(), CraneMode::Auto);

        c.push_event(InputEvent::PlatformButtonPressed);
        c.update(stamped(15.0, 2), 20);
        assert_eq!(c.mode(), CraneMode::Manual);
        assert_eq!(c.state().sequence_step, 0);
        assert_eq!(c.state().vertical.motion, MotionDirection::Stop);
    }

    #[test]
    fn limit_events_are_ignored_outside_manual() {
        let mut c = controller();
        c.set_mode(CraneMode::Auto);
        c.push_event(InputEvent::LimitTopHit);
        c.update(stamped(15.0, 1), 0);
        assert_eq!(c.mode(), CraneMode::Auto);
    }

    // =========================================================================
    // Auto Mode Tests
    // =========================================================================

    /// Run Auto against a crude simulated plant: height tracks the hoist
    /// direction, the platform swings on a timer.
    fn run_auto_to_completion(start_cm: f32) -> CraneController<MockIntentSink> {
        let mut c = controller();
        c.set_mode(CraneMode::Auto);

        let mut height = start_cm;
        let mut seq = 0u64;
        let mut now = 0u64;
        for _ in 0..10_000 {
            if c.mode() != CraneMode::Auto {
                break;
            }
            match c.state().vertical.motion {
                MotionDirection::Forward => height += 0.05,
                MotionDirection::Backward => height -= 0.05,
                MotionDirection::Stop => {}
            }
            seq += 1;
            now += 20;
            c.update(stamped(height, seq), now);
        }
        c
    }

    #[test]
    fn auto_completes_and_reverts_to_manual() {
        let c = run_auto_to_completion(10.0);
        assert_eq!(c.mode(), CraneMode::Manual);
        assert_eq!(c.state().sequence_step, 0);
        assert_eq!(c.state().vertical.motion, MotionDirection::Stop);
        assert_eq!(c.state().platform.motion, MotionDirection::Stop);
    }

    #[test]
    fn auto_completes_from_any_starting_height() {
        for start in [2.0, 6.0, 12.0, 19.5] {
            let c = run_auto_to_completion(start);
            assert_eq!(c.mode(), CraneMode::Manual, "start height {start}");
        }
    }

    #[test]
    fn auto_at_target_advances_without_moving() {
        // Height already at the 6.0cm baseline: step 0 evaluates "within
        // tolerance" immediately and advances to the first swing.
        let mut c = controller();
        c.set_mode(CraneMode::Auto);
        c.update(stamped(6.0, 1), 0);

        assert_eq!(c.state().sequence_step, 1);
        assert_eq!(c.state().vertical.motion, MotionDirection::Stop);

        // Next tick the swing starts.
        c.update(stamped(6.0, 2), 20);
        assert_eq!(c.state().platform.motion, MotionDirection::Forward);
    }

    #[test]
    fn auto_skips_tick_without_fresh_sample() {
        let mut c = controller();
        c.set_mode(CraneMode::Auto);
        c.update(stamped(15.0, 1), 0);
        let motion = c.state().vertical.motion;
        assert_eq!(motion, MotionDirection::Backward);
        let submitted = c.sink().intents().len();

        // Same seq again: stale, nothing happens.
        c.update(stamped(2.0, 1), 20);
        assert_eq!(c.state().vertical.motion, motion);
        assert_eq!(c.sink().intents().len(), submitted);

        // No sample at all: same.
        c.update(None, 40);
        assert_eq!(c.sink().intents().len(), submitted);
    }

    #[test]
    fn swing_step_respects_duration() {
        let mut c = controller();
        c.set_mode(CraneMode::Auto);
        c.update(stamped(6.0, 1), 0); // height step satisfied, advance

        c.update(stamped(6.0, 2), 20); // swing entry: deadline = 20 + 1500
        assert_eq!(c.state().platform.motion, MotionDirection::Forward);

        c.update(stamped(6.0, 3), 1000);
        assert_eq!(c.state().platform.motion, MotionDirection::Forward);
        assert_eq!(c.state().sequence_step, 1);

        c.update(stamped(6.0, 4), 1520);
        assert_eq!(c.state().platform.motion, MotionDirection::Stop);
        assert_eq!(c.state().sequence_step, 2);
    }

    // =========================================================================
    // Calibration Mode Tests
    // =========================================================================

    #[test]
    fn calibration_runs_all_checkpoints_and_reverts() {
        let mut c = controller();
        c.set_mode(CraneMode::Calibration);

        let mut height = 8.0f32;
        let mut seq = 0u64;
        let mut now = 0u64;
        for _ in 0..10_000 {
            if c.mode() != CraneMode::Calibration {
                break;
            }
            match c.state().vertical.motion {
                MotionDirection::Forward => height += 0.05,
                MotionDirection::Backward => height -= 0.05,
                MotionDirection::Stop => {}
            }
            seq += 1;
            now += 20;
            c.update(stamped(height, seq), now);
        }

        assert_eq!(c.mode(), CraneMode::Manual);
        let report = c.calibration_report();
        assert_eq!(report.len(), 4);
        // 0.05cm per 20ms tick = 2.5cm/s, inside the 1..4 band.
        for leg in report.iter() {
            assert!(leg.speed_cm_s.is_some(), "leg to {} not measured", leg.target_cm);
            assert!(leg.in_band, "leg to {} out of band", leg.target_cm);
        }
    }

    #[test]
    fn calibration_uses_checkpoint_test_pulses() {
        let mut c = controller();
        c.set_mode(CraneMode::Calibration);
        // Height 8cm, first checkpoint 12cm: moving up with the test pulse.
        c.update(stamped(8.0, 1), 0);

        let last = *c.sink().intents().last().unwrap();
        assert_eq!(last.axis, Axis::Vertical);
        assert_eq!(last.direction, MotionDirection::Forward);
        assert_eq!(last.magnitude_us, Some(1590));
    }

    #[test]
    fn calibration_guards_instant_arrival() {
        // Start exactly at the first checkpoint: speed is not measurable.
        let mut c = controller();
        c.set_mode(CraneMode::Calibration);
        c.update(stamped(12.0, 1), 0);

        let report = c.calibration_report();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].speed_cm_s, None);
        assert!(!report[0].in_band);
    }

    #[test]
    fn calibration_report_retained_after_completion() {
        let mut c = controller();
        c.set_mode(CraneMode::Calibration);
        c.update(stamped(12.0, 1), 0); // instant first leg

        c.push_event(InputEvent::Reset); // abort the rest
        c.update(stamped(12.0, 2), 20);
        assert_eq!(c.mode(), CraneMode::Manual);
        assert_eq!(c.calibration_report().len(), 1);

        // A new run clears the previous report.
        c.set_mode(CraneMode::Calibration);
        assert!(c.calibration_report().is_empty());
    }

    // =========================================================================
    // Intent Drop Tests
    // =========================================================================

    #[test]
    fn dropped_intent_is_counted_and_retried() {
        let mut sink = MockIntentSink::new();
        sink.set_capacity(0); // every submit fails
        let mut c = CraneController::new(sink, CraneConfig::default());

        c.push_event(InputEvent::VerticalSwitchUp);
        c.push_event(InputEvent::VerticalButtonPressed);
        c.update(None, 0);

        // Submit failed: motion bookkeeping unchanged, drop counted.
        assert_eq!(c.state().vertical.motion, MotionDirection::Stop);
        assert!(c.state().dropped_intents > 0);
    }

    #[test]
    fn blocked_retries_a_dropped_entry_stop() {
        let mut sink = MockIntentSink::new();
        sink.set_capacity(1); // Forward is accepted, then the sink clogs
        let mut c = CraneController::new(sink, CraneConfig::default());

        c.push_event(InputEvent::VerticalSwitchUp);
        c.push_event(InputEvent::VerticalButtonPressed);
        c.update(None, 0);
        assert_eq!(c.state().vertical.motion, MotionDirection::Forward);

        // Limit hit: Blocked is entered but the entry stops are dropped.
        c.push_event(InputEvent::LimitTopHit);
        c.update(None, 20);
        assert_eq!(c.mode(), CraneMode::Blocked);
        assert_eq!(c.state().vertical.motion, MotionDirection::Forward);
        assert!(c.state().dropped_intents > 0);

        // Further Blocked ticks keep retrying until a submit lands.
        c.update(None, 40);
        assert_eq!(c.state().vertical.motion, MotionDirection::Forward);

        c.sink_mut().set_capacity(8);
        c.update(None, 60);
        assert_eq!(c.state().vertical.motion, MotionDirection::Stop);
        assert_eq!(
            c.sink().intents().last().map(|i| i.direction),
            Some(MotionDirection::Stop)
        );
    }

    #[test]
    fn calibration_restops_a_stranded_platform() {
        let mut sink = MockIntentSink::new();
        sink.set_capacity(1);
        let mut c = CraneController::new(sink, CraneConfig::default());

        c.push_event(InputEvent::PlatformSwitchRight);
        c.push_event(InputEvent::PlatformButtonPressed);
        c.update(None, 0);
        assert_eq!(c.state().platform.motion, MotionDirection::Forward);

        // Entry stops dropped on the clogged sink.
        c.set_mode(CraneMode::Calibration);
        assert_eq!(c.state().platform.motion, MotionDirection::Forward);

        // The calibration tick never drives the platform, but it still
        // re-submits the pending stop once the sink has room.
        c.sink_mut().set_capacity(8);
        c.update(stamped(8.0, 1), 20);
        assert_eq!(c.state().platform.motion, MotionDirection::Stop);
        assert_eq!(c.state().vertical.motion, MotionDirection::Forward);
    }
}
