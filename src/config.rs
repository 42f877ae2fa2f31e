//! Crane configuration system for desktop and ESP32.
//!
//! All tunables live here: sensor clamp range and timing, control loop
//! periods, per-axis servo pulse widths, the Auto sequence targets and the
//! Calibration checkpoint table.
//!
//! # Example
//!
//! ```rust
//! use rs_cranez::config::{CraneConfig, SequenceConfig, ServoPulses};
//!
//! // Use defaults (values from the deployed crane)
//! let config = CraneConfig::default();
//!
//! // Or customize
//! let config = CraneConfig::default()
//!     .with_sequence(SequenceConfig::default().with_baseline_cm(8.0))
//!     .with_vertical_servo(ServoPulses::default().with_forward_us(1600));
//! ```

use heapless::Vec as HVec;

/// Maximum number of calibration checkpoints.
pub const MAX_CAL_CHECKPOINTS: usize = 8;

// ============================================================================
// Sensor Config
// ============================================================================

/// Ultrasonic range sensor configuration.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorConfig {
    /// Lower clamp bound for measured height (cm).
    pub min_cm: f32,
    /// Upper clamp bound for measured height (cm).
    pub max_cm: f32,
    /// Width of the trigger pulse in microseconds.
    pub trigger_pulse_us: u16,
    /// Bounded iteration count while polling for echo completion.
    pub poll_budget: u32,
    /// Sampling period in milliseconds (100Hz default).
    pub period_ms: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            min_cm: 1.0,
            max_cm: 20.0,
            trigger_pulse_us: 10,
            poll_budget: 30_000,
            period_ms: 10,
        }
    }
}

impl SensorConfig {
    /// Set the clamp range in centimeters.
    pub fn with_range_cm(mut self, min_cm: f32, max_cm: f32) -> Self {
        self.min_cm = min_cm;
        self.max_cm = max_cm;
        self
    }

    /// Set the echo poll budget.
    pub fn with_poll_budget(mut self, budget: u32) -> Self {
        self.poll_budget = budget;
        self
    }

    /// Set the sampling period.
    pub fn with_period_ms(mut self, ms: u32) -> Self {
        self.period_ms = ms;
        self
    }

    /// Width of the clamp range in centimeters.
    #[inline]
    pub fn span_cm(&self) -> f32 {
        self.max_cm - self.min_cm
    }
}

// ============================================================================
// Control Config
// ============================================================================

/// Controller loop configuration.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlConfig {
    /// Controller tick period in milliseconds (50Hz default).
    pub tick_ms: u32,
    /// Capacity of the motion intent channel.
    pub intent_queue_len: usize,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_ms: 20,
            intent_queue_len: 10,
        }
    }
}

impl ControlConfig {
    /// Set the tick period.
    pub fn with_tick_ms(mut self, ms: u32) -> Self {
        self.tick_ms = ms;
        self
    }

    /// Set the intent channel capacity.
    pub fn with_intent_queue_len(mut self, len: usize) -> Self {
        self.intent_queue_len = len;
        self
    }
}

// ============================================================================
// Servo Config
// ============================================================================

/// Pulse widths for one continuous-rotation servo, in microseconds.
///
/// These are the stable values measured on the deployed crane; 1500µs is
/// the neutral point for the servos in use.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServoPulses {
    /// Pulse width for forward motion.
    pub forward_us: u16,
    /// Pulse width for backward motion.
    pub backward_us: u16,
    /// Neutral pulse width (no motion).
    pub stop_us: u16,
}

impl Default for ServoPulses {
    fn default() -> Self {
        Self {
            forward_us: 1570,
            backward_us: 1440,
            stop_us: 1500,
        }
    }
}

impl ServoPulses {
    /// Set the forward pulse width.
    pub fn with_forward_us(mut self, us: u16) -> Self {
        self.forward_us = us;
        self
    }

    /// Set the backward pulse width.
    pub fn with_backward_us(mut self, us: u16) -> Self {
        self.backward_us = us;
        self
    }

    /// Set the neutral pulse width.
    pub fn with_stop_us(mut self, us: u16) -> Self {
        self.stop_us = us;
        self
    }

    /// Pulse width for a logical direction.
    pub fn for_direction(&self, dir: crate::events::MotionDirection) -> u16 {
        use crate::events::MotionDirection::*;
        match dir {
            Forward => self.forward_us,
            Backward => self.backward_us,
            Stop => self.stop_us,
        }
    }
}

/// Per-axis servo tuning.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServoConfig {
    /// Hoist servo pulses.
    pub vertical: ServoPulses,
    /// Platform servo pulses.
    pub platform: ServoPulses,
}

impl ServoConfig {
    /// Pulses for the given axis.
    pub fn for_axis(&self, axis: crate::events::Axis) -> &ServoPulses {
        match axis {
            crate::events::Axis::Vertical => &self.vertical,
            crate::events::Axis::Platform => &self.platform,
        }
    }
}

// ============================================================================
// Sequence Config
// ============================================================================

/// Target heights and timings for the Auto pick-and-place sequence.
///
/// Height steps drive the hoist until the measured height is within
/// `tolerance_cm` of the target; swing steps rotate the platform for
/// `swing_ms` milliseconds open-loop.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceConfig {
    /// Starting/travel height (cm).
    pub baseline_cm: f32,
    /// Height for picking up the load (cm).
    pub pickup_cm: f32,
    /// Height for carrying to the drop zone (cm).
    pub drop_cm: f32,
    /// Intermediate lowering height on the return path (cm).
    pub intermediate_cm: f32,
    /// Final release height (cm).
    pub release_cm: f32,
    /// Tolerance band around height targets (cm).
    pub tolerance_cm: f32,
    /// Duration of each timed platform swing (ms).
    pub swing_ms: u32,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            baseline_cm: 6.0,
            pickup_cm: 12.0,
            drop_cm: 16.0,
            intermediate_cm: 10.0,
            release_cm: 4.0,
            tolerance_cm: 0.5,
            swing_ms: 1500,
        }
    }
}

impl SequenceConfig {
    /// Set the baseline height.
    pub fn with_baseline_cm(mut self, cm: f32) -> Self {
        self.baseline_cm = cm;
        self
    }

    /// Set the pickup height.
    pub fn with_pickup_cm(mut self, cm: f32) -> Self {
        self.pickup_cm = cm;
        self
    }

    /// Set the drop height.
    pub fn with_drop_cm(mut self, cm: f32) -> Self {
        self.drop_cm = cm;
        self
    }

    /// Set the intermediate height.
    pub fn with_intermediate_cm(mut self, cm: f32) -> Self {
        self.intermediate_cm = cm;
        self
    }

    /// Set the release height.
    pub fn with_release_cm(mut self, cm: f32) -> Self {
        self.release_cm = cm;
        self
    }

    /// Set the height tolerance band.
    pub fn with_tolerance_cm(mut self, cm: f32) -> Self {
        self.tolerance_cm = cm;
        self
    }

    /// Set the timed swing duration.
    pub fn with_swing_ms(mut self, ms: u32) -> Self {
        self.swing_ms = ms;
        self
    }
}

// ============================================================================
// Calibration Config
// ============================================================================

/// One calibration checkpoint: drive the hoist to `target_cm` using the
/// test pulse width `pulse_us` instead of the tuned default.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalCheckpoint {
    /// Height to reach (cm).
    pub target_cm: f32,
    /// Test pulse width for this leg (µs).
    pub pulse_us: u16,
}

/// Open-loop actuator characterization configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationConfig {
    /// Tolerance band around checkpoint targets (cm).
    pub tolerance_cm: f32,
    /// Lower bound of the acceptable speed band (cm/s).
    pub speed_min_cm_s: f32,
    /// Upper bound of the acceptable speed band (cm/s).
    pub speed_max_cm_s: f32,
    /// Checkpoint table, visited in order.
    pub checkpoints: HVec<CalCheckpoint, MAX_CAL_CHECKPOINTS>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        let mut checkpoints = HVec::new();
        // Alternating up/down legs, each with a distinct test pulse.
        let table = [
            CalCheckpoint { target_cm: 12.0, pulse_us: 1590 },
            CalCheckpoint { target_cm: 6.0, pulse_us: 1420 },
            CalCheckpoint { target_cm: 16.0, pulse_us: 1610 },
            CalCheckpoint { target_cm: 4.0, pulse_us: 1400 },
        ];
        for cp in table {
            let _ = checkpoints.push(cp);
        }
        Self {
            tolerance_cm: 0.5,
            speed_min_cm_s: 1.0,
            speed_max_cm_s: 4.0,
            checkpoints,
        }
    }
}

impl CalibrationConfig {
    /// Set the tolerance band.
    pub fn with_tolerance_cm(mut self, cm: f32) -> Self {
        self.tolerance_cm = cm;
        self
    }

    /// Set the acceptable speed band.
    pub fn with_speed_band(mut self, min_cm_s: f32, max_cm_s: f32) -> Self {
        self.speed_min_cm_s = min_cm_s;
        self.speed_max_cm_s = max_cm_s;
        self
    }

    /// Replace the checkpoint table. Checkpoints beyond
    /// [`MAX_CAL_CHECKPOINTS`] are silently dropped.
    pub fn with_checkpoints(mut self, checkpoints: &[CalCheckpoint]) -> Self {
        self.checkpoints.clear();
        for cp in checkpoints.iter().take(MAX_CAL_CHECKPOINTS) {
            let _ = self.checkpoints.push(*cp);
        }
        self
    }

    /// True if `speed` falls inside the acceptable band.
    pub fn speed_in_band(&self, speed_cm_s: f32) -> bool {
        speed_cm_s >= self.speed_min_cm_s && speed_cm_s <= self.speed_max_cm_s
    }
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete crane configuration.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CraneConfig {
    /// Range sensor configuration.
    pub sensor: SensorConfig,
    /// Control loop configuration.
    pub control: ControlConfig,
    /// Per-axis servo tuning.
    pub servo: ServoConfig,
    /// Auto sequence targets.
    pub sequence: SequenceConfig,
    /// Calibration checkpoint table.
    pub calibration: CalibrationConfig,
}

impl CraneConfig {
    /// Set the sensor configuration.
    pub fn with_sensor(mut self, sensor: SensorConfig) -> Self {
        self.sensor = sensor;
        self
    }

    /// Set the control loop configuration.
    pub fn with_control(mut self, control: ControlConfig) -> Self {
        self.control = control;
        self
    }

    /// Set the hoist servo pulses.
    pub fn with_vertical_servo(mut self, pulses: ServoPulses) -> Self {
        self.servo.vertical = pulses;
        self
    }

    /// Set the platform servo pulses.
    pub fn with_platform_servo(mut self, pulses: ServoPulses) -> Self {
        self.servo.platform = pulses;
        self
    }

    /// Set the Auto sequence configuration.
    pub fn with_sequence(mut self, sequence: SequenceConfig) -> Self {
        self.sequence = sequence;
        self
    }

    /// Set the calibration configuration.
    pub fn with_calibration(mut self, calibration: CalibrationConfig) -> Self {
        self.calibration = calibration;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
