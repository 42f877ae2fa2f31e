//! Unified shared state for all crane control tasks.
//!
//! `SharedCraneState` provides thread-safe access to a single
//! `CraneController` shared between the controller tick loop, the input
//! feed, and any external mode-set surface (a command console, telemetry).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_cranez::services::SharedCraneState;
//!
//! let state = Arc::new(SharedCraneState::new(controller));
//!
//! // Input feed pushes classified events
//! state.push_event(event);
//!
//! // Command surface requests a mode
//! state.set_mode_text("auto");
//!
//! // The tick loop runs the FSM
//! state.tick(slot.latest());
//! ```

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::arbiter::IntentSink;
use crate::controller::{CraneController, CraneState};
use crate::events::{CraneMode, InputEvent};
use crate::sensor::StampedSample;
use crate::sequence::CalibrationReport;

// ============================================================================
// Shared Crane State
// ============================================================================

/// Thread-safe wrapper around a single [`CraneController`].
///
/// # Thread Safety
///
/// - Uses `Mutex` (not `RwLock`) for controller access because the 20ms
///   tick loop writes every period, making `RwLock` writer starvation a
///   concern.
/// - All timestamp calculations use the same `start_time`, so mode timing
///   is consistent no matter which task asks.
pub struct SharedCraneState<S: IntentSink> {
    /// The controller - needs mutable access for events, mode sets, ticks
    controller: Mutex<CraneController<S>>,

    /// Time base shared by every task touching this state
    start_time: Instant,
}

impl<S: IntentSink> SharedCraneState<S> {
    /// Create new shared state wrapping a controller.
    ///
    /// The `start_time` is set to `Instant::now()`, which becomes the time
    /// base for all `now_ms()` calls across all tasks sharing this state.
    pub fn new(controller: CraneController<S>) -> Self {
        Self {
            controller: Mutex::new(controller),
            start_time: Instant::now(),
        }
    }

    /// Current timestamp in milliseconds since state creation.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// The start time instant (for external time calculations if needed).
    #[inline]
    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    /// Access the controller with a mutable lock.
    ///
    /// The closure pattern keeps the lock scope tight and prevents holding
    /// it across sleeps.
    pub fn with_controller<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut CraneController<S>) -> R,
    {
        let mut guard = self.controller.lock().unwrap();
        f(&mut *guard)
    }

    /// Queue one input event for the next tick.
    pub fn push_event(&self, event: InputEvent) {
        self.with_controller(|c| c.push_event(event));
    }

    /// Request a mode, performing the controller's full reset.
    ///
    /// Safe against concurrent invocation from a command surface and from
    /// the controller's own auto-revert logic: whichever acquires the lock
    /// last wins, and both paths leave the axes stopped.
    pub fn set_mode(&self, mode: CraneMode) {
        self.with_controller(|c| c.set_mode(mode));
    }

    /// Parse and apply a textual mode request.
    ///
    /// Unknown text is a no-op and returns `false`; the current mode is
    /// retained.
    pub fn set_mode_text(&self, text: &str) -> bool {
        match CraneMode::from_text(text) {
            Some(mode) => {
                self.set_mode(mode);
                true
            }
            None => false,
        }
    }

    /// Run one controller tick against the latest sensor sample.
    pub fn tick(&self, sample: Option<StampedSample>) {
        let now_ms = self.now_ms();
        self.with_controller(|c| c.update(sample, now_ms));
    }

    /// Read-only snapshot of the controller.
    pub fn state(&self) -> CraneState {
        self.with_controller(|c| c.state())
    }

    /// Results of the most recent calibration run.
    pub fn calibration_report(&self) -> CalibrationReport {
        self.with_controller(|c| c.calibration_report().clone())
    }
}

// Arc convenience: tasks clone the Arc, not the state.
impl<S: IntentSink + Send + 'static> SharedCraneState<S> {
    /// Wrap a controller directly in an `Arc`.
    pub fn new_shared(controller: CraneController<S>) -> Arc<Self> {
        Arc::new(Self::new(controller))
    }
}
