//! Hardware abstraction traits for servo actuation and echo timing.
//!
//! These interfaces let the control core run on different platforms
//! (ESP32, desktop mocks).
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`ServoController`] | Pulse-width servo actuation for both axes |
//! | [`EchoTimer`] | Trigger line + free-running capture counter |
//!
//! For testing and desktop development, use the mock implementations from
//! [`crate::hal::mock`]. For ESP32 hardware, use the implementations from
//! `hal::esp32` (requires `esp32` feature).

use crate::events::{Axis, MotionDirection};

/// Servo actuation trait - the physical boundary for both crane axes.
///
/// Implementors map a logical direction to a pulse width per axis (see
/// [`ServoPulses`](crate::config::ServoPulses)). The optional override is
/// used by calibration legs to test non-default magnitudes; `None` means
/// the tuned default for that axis and direction.
///
/// # Implementation Notes
///
/// - `drive` must be safe to call redundantly with the same arguments
/// - The neutral pulse must actually be applied for `Stop`, not a 0% duty,
///   since continuous-rotation servos treat missing pulses as undefined
pub trait ServoController {
    /// Error type for actuation operations.
    type Error;

    /// Apply the pulse for `direction` to `axis`.
    fn drive(
        &mut self,
        axis: Axis,
        direction: MotionDirection,
        pulse_override_us: Option<u16>,
    ) -> Result<(), Self::Error>;

    /// Convenience method to bring both axes to neutral.
    fn stop_all(&mut self) -> Result<(), Self::Error> {
        self.drive(Axis::Vertical, MotionDirection::Stop, None)?;
        self.drive(Axis::Platform, MotionDirection::Stop, None)
    }
}

/// Trigger line and free-running capture counter for the ultrasonic sensor.
///
/// The counter is a 16-bit microsecond tick that wraps; the range sensor
/// handles wraparound explicitly. Edge timestamps themselves arrive
/// asynchronously through the [`CaptureCell`](crate::sensor::CaptureCell)
/// the implementor's interrupt handler writes into.
pub trait EchoTimer {
    /// Error type for timer/pin operations.
    type Error;

    /// Current value of the free-running microsecond counter.
    fn counter_us(&self) -> u16;

    /// Reset the counter to zero ahead of a measurement.
    fn reset_counter(&mut self);

    /// Arm the capture channel for a rising edge (start of echo).
    ///
    /// The implementor's edge handler is expected to flip to falling-edge
    /// capture after the first edge, mirroring the capture cell's phases.
    fn arm_rising(&mut self) -> Result<(), Self::Error>;

    /// Drive the trigger line high or low.
    fn set_trigger(&mut self, high: bool) -> Result<(), Self::Error>;
}
