//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the hardware traits and the
//! motion intent sink, enabling development and testing on desktop
//! without a physical crane.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockServos`] | [`ServoController`] | Records every actuation |
//! | [`MockEchoTimer`] | [`EchoTimer`] | Scripted echo edges and counter |
//! | [`MockIntentSink`] | [`IntentSink`] | Captures submitted intents |
//!
//! # Example
//!
//! ```rust
//! use rs_cranez::arbiter::{MotionArbiter, MotionIntent};
//! use rs_cranez::events::{Axis, MotionDirection};
//! use rs_cranez::hal::MockServos;
//!
//! let mut arbiter = MotionArbiter::new(MockServos::new());
//! arbiter
//!     .handle(MotionIntent::new(Axis::Vertical, MotionDirection::Forward))
//!     .unwrap();
//!
//! assert_eq!(
//!     arbiter.servos().log,
//!     vec![(Axis::Vertical, MotionDirection::Forward, None)]
//! );
//! ```
//!
//! [`ServoController`]: crate::traits::ServoController
//! [`EchoTimer`]: crate::traits::EchoTimer
//! [`IntentSink`]: crate::arbiter::IntentSink

use core::cell::Cell;
use core::convert::Infallible;

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::arbiter::{IntentSink, MotionIntent, SubmitError};
use crate::events::{Axis, MotionDirection};
use crate::sensor::CaptureCell;
use crate::traits::{EchoTimer, ServoController};

// ============================================================================
// Servo Mock
// ============================================================================

/// Mock servo bank for testing.
///
/// Records every `drive` call in order for verification. Use the public
/// `log` field to inspect actuations after test operations.
#[derive(Debug, Default)]
pub struct MockServos {
    /// Every actuation in call order: `(axis, direction, pulse override)`.
    pub log: Vec<(Axis, MotionDirection, Option<u16>)>,
}

impl MockServos {
    /// Creates a new mock servo bank with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent direction actuated on `axis`, if any.
    pub fn last_direction(&self, axis: Axis) -> Option<MotionDirection> {
        self.log
            .iter()
            .rev()
            .find(|(a, _, _)| *a == axis)
            .map(|(_, d, _)| *d)
    }

    /// Actuations for a single axis, in order.
    pub fn axis_log(&self, axis: Axis) -> Vec<(MotionDirection, Option<u16>)> {
        self.log
            .iter()
            .filter(|(a, _, _)| *a == axis)
            .map(|(_, d, m)| (*d, *m))
            .collect()
    }
}

impl ServoController for MockServos {
    type Error = Infallible;

    fn drive(
        &mut self,
        axis: Axis,
        direction: MotionDirection,
        pulse_override_us: Option<u16>,
    ) -> Result<(), Infallible> {
        self.log.push((axis, direction, pulse_override_us));
        Ok(())
    }
}

// ============================================================================
// Echo Timer Mock
// ============================================================================

/// Mock echo timer for testing the range sensor.
///
/// Simulates the free-running 16-bit counter (advancing one microsecond per
/// read) and the interrupt-driven edge capture. Echoes are scripted with
/// [`queue_echo`](Self::queue_echo): when the trigger line drops, the next
/// queued `(rise, fall)` pair is written into the capture cell, exactly as
/// the real edge interrupt would. An empty queue simulates a sensor that
/// never answers, exercising the poll-budget timeout.
#[derive(Debug, Default)]
pub struct MockEchoTimer {
    cell: Arc<CaptureCell>,
    echoes: VecDeque<(u16, u16)>,
    counter: Cell<u16>,
}

impl MockEchoTimer {
    /// Creates a new mock timer with no echoes queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one echo's edge timestamps for the next measurement.
    pub fn queue_echo(&mut self, rise_us: u16, fall_us: u16) {
        self.echoes.push_back((rise_us, fall_us));
    }

    /// The capture cell this timer's simulated interrupt writes into.
    pub fn cell(&self) -> Arc<CaptureCell> {
        Arc::clone(&self.cell)
    }
}

impl EchoTimer for MockEchoTimer {
    type Error = Infallible;

    fn counter_us(&self) -> u16 {
        let now = self.counter.get();
        self.counter.set(now.wrapping_add(1));
        now
    }

    fn reset_counter(&mut self) {
        self.counter.set(0);
    }

    fn arm_rising(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_trigger(&mut self, high: bool) -> Result<(), Infallible> {
        if !high {
            // Trigger pulse finished: deliver the scripted echo edges.
            if let Some((rise, fall)) = self.echoes.pop_front() {
                self.cell.record_edge(rise);
                self.cell.record_edge(fall);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Intent Sink Mock
// ============================================================================

/// Mock motion intent sink for controller tests.
///
/// Captures every accepted intent in order. An optional capacity simulates
/// a full channel: once `intents` holds that many entries, further submits
/// fail with [`SubmitError::QueueFull`].
#[derive(Debug, Default)]
pub struct MockIntentSink {
    accepted: Vec<MotionIntent>,
    capacity: Option<usize>,
}

impl MockIntentSink {
    /// Creates a new sink with unlimited capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of intents the sink will accept in total.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = Some(capacity);
    }

    /// All accepted intents, in submit order.
    pub fn intents(&self) -> &[MotionIntent] {
        &self.accepted
    }

    /// Clear the captured intents (capacity is kept).
    pub fn clear(&mut self) {
        self.accepted.clear();
    }
}

impl IntentSink for MockIntentSink {
    fn submit(&mut self, intent: MotionIntent) -> Result<(), SubmitError> {
        if let Some(cap) = self.capacity {
            if self.accepted.len() >= cap {
                return Err(SubmitError::QueueFull);
            }
        }
        self.accepted.push(intent);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
