//! ESP32-C3 SuperMini crane controller.
//!
//! This is the main entry point for the physical crane. It wires up:
//! - Two continuous-rotation servos (hoist, platform) on LEDC PWM
//! - The HC-SR04 ultrasonic sensor with edge-interrupt echo capture
//! - The motion arbiter consuming the global intent channel
//! - The 50Hz controller tick loop
//!
//! Input events (buttons, switches, limit switches) arrive from the input
//! classifier task, which lives outside this crate; here its feed point is
//! the shared controller state.
//!
//! # Build
//!
//! ```bash
//! cargo build --features esp32 --target riscv32imc-esp-espidf
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esp_idf_hal::peripherals::Peripherals;
use rs_cranez::arbiter::{intent_channel, MotionArbiter};
use rs_cranez::config::CraneConfig;
use rs_cranez::controller::CraneController;
use rs_cranez::hal::esp32::{Esp32EchoTimer, Esp32Servos};
use rs_cranez::sensor::{CaptureCell, RangeSensor, SampleSlot};
use rs_cranez::services::{spawn_arbiter_task, spawn_sensor_task, SharedCraneState};

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();

    println!();
    println!("==============================");
    println!("  rs-cranez SuperMini Crane");
    println!("==============================");
    println!();

    let config = CraneConfig::default();
    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Initialize Servos (GPIO2/3 PWM)
    // =========================================================================
    let servos = Esp32Servos::new(
        peripherals.pins.gpio2,
        peripherals.pins.gpio3,
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        peripherals.ledc.channel1,
        config.servo,
    )?;
    println!("[OK] Servos initialized (GPIO2/3 PWM, both neutral)");

    // =========================================================================
    // Initialize Ultrasonic Sensor (GPIO4 trigger, GPIO5 echo)
    // =========================================================================
    let cell = Arc::new(CaptureCell::new());
    let timer = Esp32EchoTimer::new(
        peripherals.pins.gpio4.into(),
        peripherals.pins.gpio5.into(),
        Arc::clone(&cell),
    )?;
    let sensor = RangeSensor::new(timer, cell, config.sensor);
    println!("[OK] Range sensor initialized (GPIO4/5)");

    // =========================================================================
    // Wire the intent channel: controller -> arbiter -> servos
    // =========================================================================
    let (intents, intent_rx) = intent_channel(config.control.intent_queue_len);
    let arbiter = MotionArbiter::new(servos);

    let state = SharedCraneState::new_shared(CraneController::new(intents, config.clone()));
    let slot = Arc::new(SampleSlot::new());

    let _arbiter_task = spawn_arbiter_task(arbiter, intent_rx);
    let _sensor_task = spawn_sensor_task(sensor, Arc::clone(&slot));

    println!();
    println!("Starting control loop (50Hz)...");
    println!();

    // =========================================================================
    // Main Control Loop (50Hz)
    // =========================================================================
    let tick = Duration::from_millis(config.control.tick_ms as u64);
    let mut last_mode = state.state().mode;
    loop {
        state.tick(slot.latest());

        let snapshot = state.state();
        if snapshot.mode != last_mode {
            println!(
                "[Control] mode -> {} (step {})",
                snapshot.mode.as_str(),
                snapshot.sequence_step
            );
            last_mode = snapshot.mode;
        }

        thread::sleep(tick);
    }
}
