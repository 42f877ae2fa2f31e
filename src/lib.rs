//! # rs-cranez
//!
//! Control core for a two-axis pick-and-place crane: a hoist and a rotating
//! platform driven by continuous-rotation servos, with an ultrasonic range
//! sensor providing height feedback.
//!
//! ## Features
//!
//! - **Hardware abstraction**: traits for servo actuation and echo timing,
//!   with mock implementations for desktop testing
//! - **Reversal protection**: every motion command flows through a single
//!   arbiter that forces a stop before a direction flip ever reaches the
//!   actuator
//! - **Four modes**: manual button/switch control, an autonomous
//!   pick-and-place sequence, open-loop speed calibration, and a latched
//!   blocked state after a limit hit
//! - **Observable overflow**: bounded event and intent channels count drops
//!   instead of losing commands silently
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `events` - Input tokens, axes, directions, and modes
//! - `sensor` - Pulse-timing range measurement and the latest-sample slot
//! - `arbiter` - Motion intent channel and reversal-protected actuation
//! - `sequence` - Step tables for the Auto routine and calibration
//! - `controller` - The tick-driven mode state machine
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//! - `services` - Std task runners and the shared controller wrapper
//!
//! ## Example
//!
//! ```rust
//! use rs_cranez::{
//!     config::CraneConfig,
//!     controller::CraneController,
//!     events::InputEvent,
//!     hal::MockIntentSink,
//! };
//!
//! // Create a controller with a mock intent sink
//! let mut controller = CraneController::new(MockIntentSink::new(), CraneConfig::default());
//!
//! // Manual mode: latch a direction, hold the button, tick
//! controller.push_event(InputEvent::VerticalSwitchUp);
//! controller.push_event(InputEvent::VerticalButtonPressed);
//! controller.update(None, 0);
//!
//! assert_eq!(controller.sink().intents().len(), 1);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Motion intent channel and the reversal-protecting arbiter.
pub mod arbiter;
/// Crane configuration system for desktop and ESP32.
pub mod config;
/// The tick-driven crane mode state machine.
pub mod controller;
/// Input tokens, axes, directions, and operating modes.
pub mod events;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Ultrasonic range measurement and the latest-sample slot.
pub mod sensor;
/// Step tables for the Auto routine and the calibration run.
pub mod sequence;
/// Core traits for hardware abstraction.
pub mod traits;

/// Std task runners and the shared controller wrapper.
#[cfg(feature = "std")]
pub mod services;

// Re-exports for convenience
pub use arbiter::{IntentSink, MotionArbiter, MotionIntent, SubmitError};
pub use controller::{AxisState, CraneController, CraneState, EVENT_QUEUE_LEN};
pub use events::{Axis, CraneMode, InputEvent, MotionDirection};
pub use sensor::{CaptureCell, CapturePhase, RangeSensor, SensorSample, StampedSample};
pub use sequence::{auto_sequence, AutoStep, CalibrationReport, CalibrationResult};
pub use traits::{EchoTimer, ServoController};

// Config re-exports
pub use config::{
    CalCheckpoint, CalibrationConfig, ControlConfig, CraneConfig, SensorConfig, SequenceConfig,
    ServoConfig, ServoPulses,
};

// Std-side re-exports
#[cfg(feature = "std")]
pub use arbiter::{intent_channel, IntentSender};
#[cfg(feature = "std")]
pub use sensor::SampleSlot;
#[cfg(feature = "std")]
pub use services::SharedCraneState;
