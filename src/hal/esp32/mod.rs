//! ESP32-C3 SuperMini hardware abstraction layer for the crane.
//!
//! This module provides hardware implementations for the ESP32-C3 SuperMini
//! board driving the two-axis crane.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini (RISC-V 160MHz, 4MB Flash)
//! - **Actuators**: two continuous-rotation servos (hoist, platform)
//! - **Sensor**: HC-SR04 ultrasonic range finder aimed at the hoist
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments matching the SuperMini layout.

mod echo;
mod servos;

pub use echo::Esp32EchoTimer;
pub use servos::Esp32Servos;

/// Pin assignments for SuperMini ESP32-C3.
pub mod pins {
    // =========================================================================
    // Servos
    // =========================================================================

    /// Hoist servo signal (50Hz PWM)
    pub const SERVO_VERTICAL: i32 = 2;

    /// Platform servo signal (50Hz PWM)
    pub const SERVO_PLATFORM: i32 = 3;

    // =========================================================================
    // Ultrasonic Sensor (HC-SR04)
    // =========================================================================

    /// Trigger output to the sensor
    pub const SONAR_TRIG: i32 = 4;

    /// Echo input from the sensor (edge-interrupt capture)
    pub const SONAR_ECHO: i32 = 5;
}
