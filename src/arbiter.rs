//! Motion intent arbitration between the controller and the servos.
//!
//! All motion commands for both axes flow through one ordered, bounded
//! channel into a single consumer, the [`MotionArbiter`]. The arbiter is
//! the only component that touches the [`ServoController`], and it enforces
//! the reversal-protection rule: an axis asked to reverse while moving is
//! first brought to neutral, and the opposite direction is *not* resumed
//! automatically.
//!
//! # Controller contract
//!
//! Because a reversal request is consumed by the forced stop, the
//! controller must re-submit the desired direction once the axis is
//! neutral. [`CraneController`](crate::controller::CraneController) does
//! this by splitting every reversal into a Stop tick followed by a
//! direction tick.
//!
//! # Overflow
//!
//! `submit` never blocks. A full channel rejects the intent with
//! [`SubmitError::QueueFull`] and increments a drop counter; callers keep
//! their own motion bookkeeping unchanged so the command is retried on the
//! next tick rather than silently lost.

use core::fmt;

use crate::events::{Axis, MotionDirection};
use crate::traits::ServoController;

// ============================================================================
// Motion Intent
// ============================================================================

/// A single motion command for one axis.
///
/// Ownership transfers to the arbiter on submit. The optional magnitude is
/// a pulse-width override used by calibration legs; `None` applies the
/// axis's tuned pulse for the direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionIntent {
    /// Target axis.
    pub axis: Axis,
    /// Requested direction.
    pub direction: MotionDirection,
    /// Pulse-width override in microseconds, if any.
    pub magnitude_us: Option<u16>,
}

impl MotionIntent {
    /// Intent with the tuned default magnitude.
    pub const fn new(axis: Axis, direction: MotionDirection) -> Self {
        Self {
            axis,
            direction,
            magnitude_us: None,
        }
    }

    /// Stop intent for an axis.
    pub const fn stop(axis: Axis) -> Self {
        Self::new(axis, MotionDirection::Stop)
    }

    /// Attach a pulse-width override.
    pub const fn with_magnitude(mut self, pulse_us: u16) -> Self {
        self.magnitude_us = Some(pulse_us);
        self
    }
}

/// Why a submit was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// The intent channel is at capacity; the command was dropped.
    QueueFull,
    /// The consumer side has gone away.
    Disconnected,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::QueueFull => write!(f, "motion intent channel full"),
            SubmitError::Disconnected => write!(f, "motion arbiter disconnected"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SubmitError {}

/// Anything that accepts motion intents from the controller.
///
/// Implemented by the channel-backed [`IntentSender`] in production and by
/// [`MockIntentSink`](crate::hal::MockIntentSink) in tests.
pub trait IntentSink {
    /// Submit one intent without blocking.
    fn submit(&mut self, intent: MotionIntent) -> Result<(), SubmitError>;
}

// ============================================================================
// Bounded Channel (std)
// ============================================================================

/// Producer half of the bounded motion intent channel.
///
/// Cloneable; all clones share one drop counter so overflow is observable
/// from anywhere.
#[cfg(feature = "std")]
#[derive(Clone)]
pub struct IntentSender {
    tx: std::sync::mpsc::SyncSender<MotionIntent>,
    dropped: std::sync::Arc<core::sync::atomic::AtomicU32>,
}

#[cfg(feature = "std")]
impl IntentSender {
    /// Number of intents rejected because the channel was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(core::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(feature = "std")]
impl IntentSink for IntentSender {
    fn submit(&mut self, intent: MotionIntent) -> Result<(), SubmitError> {
        use std::sync::mpsc::TrySendError;
        self.tx.try_send(intent).map_err(|e| match e {
            TrySendError::Full(_) => {
                self.dropped
                    .fetch_add(1, core::sync::atomic::Ordering::Relaxed);
                SubmitError::QueueFull
            }
            TrySendError::Disconnected(_) => SubmitError::Disconnected,
        })
    }
}

/// Create the bounded intent channel shared by both axes.
///
/// FIFO order is global across axes: there is no priority between them, a
/// backlog on one axis delays the other. This keeps actuator-command
/// ordering trivial to reason about.
#[cfg(feature = "std")]
pub fn intent_channel(
    capacity: usize,
) -> (IntentSender, std::sync::mpsc::Receiver<MotionIntent>) {
    let (tx, rx) = std::sync::mpsc::sync_channel(capacity);
    (
        IntentSender {
            tx,
            dropped: std::sync::Arc::new(core::sync::atomic::AtomicU32::new(0)),
        },
        rx,
    )
}

// ============================================================================
// Motion Arbiter
// ============================================================================

/// Serializes motion intents into safe servo actuations.
///
/// Keeps the last actuated direction per axis (initially Stop) and applies
/// the reversal-protection table:
///
/// | last | requested | actuation | new last |
/// |------|-----------|-----------|----------|
/// | Stop | Fwd/Back  | drive it  | request  |
/// | any  | Stop      | neutral   | Stop     |
/// | Fwd  | Back (or vice versa) | neutral, request discarded | Stop |
/// | d    | d         | none (already moving) | d |
pub struct MotionArbiter<S: ServoController> {
    servos: S,
    last_vertical: MotionDirection,
    last_platform: MotionDirection,
}

impl<S: ServoController> MotionArbiter<S> {
    /// Create an arbiter over a servo bank; both axes assumed neutral.
    pub fn new(servos: S) -> Self {
        Self {
            servos,
            last_vertical: MotionDirection::Stop,
            last_platform: MotionDirection::Stop,
        }
    }

    /// Last direction actually actuated on an axis.
    pub fn last_direction(&self, axis: Axis) -> MotionDirection {
        match axis {
            Axis::Vertical => self.last_vertical,
            Axis::Platform => self.last_platform,
        }
    }

    fn set_last(&mut self, axis: Axis, dir: MotionDirection) {
        match axis {
            Axis::Vertical => self.last_vertical = dir,
            Axis::Platform => self.last_platform = dir,
        }
    }

    /// Process one intent.
    pub fn handle(&mut self, intent: MotionIntent) -> Result<(), S::Error> {
        let last = self.last_direction(intent.axis);

        match intent.direction {
            MotionDirection::Stop => {
                self.servos
                    .drive(intent.axis, MotionDirection::Stop, None)?;
                self.set_last(intent.axis, MotionDirection::Stop);
            }
            dir if last == MotionDirection::Stop => {
                self.servos.drive(intent.axis, dir, intent.magnitude_us)?;
                self.set_last(intent.axis, dir);
            }
            dir if dir.is_reversal_of(last) => {
                // Hard stop; the reversal request is consumed, not resumed.
                self.servos
                    .drive(intent.axis, MotionDirection::Stop, None)?;
                self.set_last(intent.axis, MotionDirection::Stop);
            }
            _ => {} // already moving that way
        }
        Ok(())
    }

    /// Access the servo bank (mainly for tests).
    pub fn servos(&self) -> &S {
        &self.servos
    }

    /// Consumer loop: blocks on the channel until it closes.
    #[cfg(feature = "std")]
    pub fn run(
        &mut self,
        rx: std::sync::mpsc::Receiver<MotionIntent>,
    ) -> Result<(), S::Error> {
        while let Ok(intent) = rx.recv() {
            self.handle(intent)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
