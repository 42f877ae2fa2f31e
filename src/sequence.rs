//! Step tables for the Auto pick-and-place routine and the calibration run.
//!
//! Steps are plain data; the controller interprets them one tick at a time.
//! Keeping the tables separate from the FSM lets the sequence shape and its
//! guard conditions be tested without any hardware or channels.

use heapless::Vec as HVec;

use crate::config::{CalibrationConfig, SequenceConfig, MAX_CAL_CHECKPOINTS};
use crate::events::MotionDirection;

/// Upper bound on auto-sequence length.
pub const MAX_AUTO_STEPS: usize = 16;

// ============================================================================
// Auto Sequence
// ============================================================================

/// One step of the Auto routine.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AutoStep {
    /// Drive the vertical axis toward a target height until within the
    /// configured tolerance band. Direction is chosen per tick from the
    /// latest sample, so an overshoot corrects itself.
    Height {
        /// Target height in centimeters.
        target_cm: f32,
    },
    /// Hold the platform in one direction for a fixed duration, ignoring
    /// sensor feedback.
    Swing {
        /// Platform direction (Forward swings right).
        direction: MotionDirection,
        /// Hold duration in milliseconds.
        duration_ms: u64,
    },
}

/// Build the canonical pick-and-place sequence.
///
/// Height and swing steps alternate: reach the baseline, swing right over
/// the pickup point, lift, swing back to center, lift to the drop height,
/// swing left, come down to the intermediate height, swing back to center,
/// then lower to release. Completion stops both axes and reverts to Manual;
/// that final action is the controller's, not a step.
pub fn auto_sequence(cfg: &SequenceConfig) -> HVec<AutoStep, MAX_AUTO_STEPS> {
    let swing = |direction| AutoStep::Swing {
        direction,
        duration_ms: cfg.swing_ms as u64,
    };
    let height = |target_cm| AutoStep::Height { target_cm };

    let mut steps = HVec::new();
    // Capacity is MAX_AUTO_STEPS; nine pushes cannot fail.
    let _ = steps.push(height(cfg.baseline_cm));
    let _ = steps.push(swing(MotionDirection::Forward));
    let _ = steps.push(height(cfg.pickup_cm));
    let _ = steps.push(swing(MotionDirection::Backward));
    let _ = steps.push(height(cfg.drop_cm));
    let _ = steps.push(swing(MotionDirection::Backward));
    let _ = steps.push(height(cfg.intermediate_cm));
    let _ = steps.push(swing(MotionDirection::Forward));
    let _ = steps.push(height(cfg.release_cm));
    steps
}

/// Direction that moves the hoist from `current_cm` toward `target_cm`.
///
/// Forward raises the hoist (larger height reading). Returns Stop when
/// already within the tolerance band.
pub fn height_direction(current_cm: f32, target_cm: f32, tolerance_cm: f32) -> MotionDirection {
    let error = target_cm - current_cm;
    if error > tolerance_cm {
        MotionDirection::Forward
    } else if error < -tolerance_cm {
        MotionDirection::Backward
    } else {
        MotionDirection::Stop
    }
}

// ============================================================================
// Calibration
// ============================================================================

/// Outcome of one calibration checkpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationResult {
    /// Checkpoint target height.
    pub target_cm: f32,
    /// Test pulse width that was applied.
    pub pulse_us: u16,
    /// Time from entering the checkpoint to reaching it.
    pub elapsed_ms: u64,
    /// Average speed over the leg, or `None` when the target was already
    /// within tolerance at entry (no motion to measure).
    pub speed_cm_s: Option<f32>,
    /// Whether the measured speed fell inside the configured band. Always
    /// false for a non-measurable leg.
    pub in_band: bool,
}

/// Average speed over a calibration leg.
///
/// Returns `None` for a zero elapsed time: the checkpoint was satisfied on
/// entry and there is nothing to divide by.
pub fn leg_speed(distance_cm: f32, elapsed_ms: u64) -> Option<f32> {
    if elapsed_ms == 0 {
        return None;
    }
    Some((distance_cm / elapsed_ms as f32) * 1000.0)
}

/// Build the result record for a completed calibration leg.
pub fn finish_leg(
    cfg: &CalibrationConfig,
    target_cm: f32,
    pulse_us: u16,
    start_cm: f32,
    elapsed_ms: u64,
) -> CalibrationResult {
    let distance = if target_cm >= start_cm {
        target_cm - start_cm
    } else {
        start_cm - target_cm
    };
    let speed_cm_s = leg_speed(distance, elapsed_ms);
    CalibrationResult {
        target_cm,
        pulse_us,
        elapsed_ms,
        speed_cm_s,
        in_band: speed_cm_s.is_some_and(|s| cfg.speed_in_band(s)),
    }
}

/// Fixed-size collection of calibration results for one run.
pub type CalibrationReport = HVec<CalibrationResult, MAX_CAL_CHECKPOINTS>;

// ============================================================================
// Tests
// ============================================================================
