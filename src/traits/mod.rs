//! Trait definitions for hardware abstraction.
//!
//! This module defines the abstractions that allow rs-cranez to run on
//! different hardware (ESP32, desktop mock):
//!
//! - [`ServoController`]: pulse-width servo actuation for both axes
//! - [`EchoTimer`]: ultrasonic trigger line and capture counter

pub mod hardware;

pub use hardware::*;
