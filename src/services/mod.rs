//! Std-side task plumbing for the crane control core.
//!
//! The core (`controller`, `arbiter`, `sensor`) is host-agnostic; this
//! module supplies the std glue: a thread-safe shared controller and the
//! runners that turn the core into the firmware's task layout (sensor
//! sampler, controller tick loop, arbiter consumer).
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_cranez::sensor::SampleSlot;
//! use rs_cranez::services::{spawn_controller_task, spawn_sensor_task, SharedCraneState};
//!
//! let slot = Arc::new(SampleSlot::new());
//! let state = SharedCraneState::new_shared(controller);
//! spawn_sensor_task(sensor, Arc::clone(&slot));
//! spawn_controller_task(Arc::clone(&state), slot);
//! ```

pub mod runtime;
pub mod shared;

pub use runtime::*;
pub use shared::*;
