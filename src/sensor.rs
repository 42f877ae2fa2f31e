//! Ultrasonic range sensing via round-trip pulse timing.
//!
//! A measurement works like the hardware does: drive the trigger line high
//! for 10µs against a free-running 16-bit microsecond counter, then wait
//! for the echo pin's rising and falling edges. The edge timestamps arrive
//! from interrupt context through a [`CaptureCell`]; the task-side
//! [`RangeSensor`] polls the cell with a bounded budget and converts the
//! pulse width to a clamped, normalized height.
//!
//! # Timeout policy
//!
//! A measurement that never completes yields `Ok(None)`. The previously
//! published [`SampleSlot`] value is left untouched rather than replaced by
//! a sentinel, so consumers keep working from the last good reading and use
//! the slot's sequence number to tell fresh samples from stale ones.
//!
//! # Example
//!
//! ```rust
//! use rs_cranez::config::SensorConfig;
//! use rs_cranez::hal::MockEchoTimer;
//! use rs_cranez::sensor::RangeSensor;
//!
//! let mut timer = MockEchoTimer::new();
//! timer.queue_echo(1000, 1350); // 350µs round trip ≈ 6cm
//! let cell = timer.cell();
//!
//! let mut sensor = RangeSensor::new(timer, cell, SensorConfig::default());
//! let sample = sensor.sample().unwrap().unwrap();
//! assert!((sample.height_cm - 6.0).abs() < 0.1);
//! ```

use core::sync::atomic::{AtomicU16, AtomicU8, Ordering};

use alloc::sync::Arc;

use crate::config::SensorConfig;
use crate::traits::EchoTimer;

/// Modulus of the 16-bit capture counter.
pub const TIMER_MODULUS: u32 = 1 << 16;

/// Speed of sound expressed as centimeters per microsecond.
pub const SOUND_CM_PER_US: f32 = 0.0343;

/// One range measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorSample {
    /// Measured height, clamped to the configured range (cm).
    pub height_cm: f32,
    /// Height normalized over the clamp range, in `[0, 1]`.
    pub height_norm: f32,
}

// ============================================================================
// Capture Cell
// ============================================================================

/// Progress of one echo capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapturePhase {
    /// Waiting for the echo's rising edge.
    AwaitingRising,
    /// Rising edge recorded; waiting for the falling edge.
    AwaitingFalling,
    /// Both edges recorded; timestamps are valid.
    Complete,
}

const PHASE_RISING: u8 = 0;
const PHASE_FALLING: u8 = 1;
const PHASE_COMPLETE: u8 = 2;

/// Single-producer (interrupt) / single-consumer (task) edge handoff cell.
///
/// The interrupt handler calls [`record_edge`](Self::record_edge) with the
/// captured counter value; the measuring task polls
/// [`completed`](Self::completed). The timestamps are stored *before* the
/// phase flag advances (`Release`), and the reader loads the flag with
/// `Acquire` before touching the timestamps, so a consumer can never
/// observe a half-written pair.
#[derive(Debug, Default)]
pub struct CaptureCell {
    rise_us: AtomicU16,
    fall_us: AtomicU16,
    phase: AtomicU8,
}

impl CaptureCell {
    /// Create a cell awaiting a rising edge.
    pub const fn new() -> Self {
        Self {
            rise_us: AtomicU16::new(0),
            fall_us: AtomicU16::new(0),
            phase: AtomicU8::new(PHASE_RISING),
        }
    }

    /// Re-arm for a new measurement (task context, before triggering).
    pub fn reset(&self) {
        self.phase.store(PHASE_RISING, Ordering::Release);
    }

    /// Record one captured edge timestamp (interrupt context).
    ///
    /// The first call records the rising edge, the second the falling edge;
    /// further edges are ignored until [`reset`](Self::reset).
    pub fn record_edge(&self, counter_us: u16) {
        match self.phase.load(Ordering::Relaxed) {
            PHASE_RISING => {
                self.rise_us.store(counter_us, Ordering::Relaxed);
                // Timestamp must be visible before the phase advances.
                self.phase.store(PHASE_FALLING, Ordering::Release);
            }
            PHASE_FALLING => {
                self.fall_us.store(counter_us, Ordering::Relaxed);
                self.phase.store(PHASE_COMPLETE, Ordering::Release);
            }
            _ => {}
        }
    }

    /// Current capture phase.
    pub fn phase(&self) -> CapturePhase {
        match self.phase.load(Ordering::Acquire) {
            PHASE_RISING => CapturePhase::AwaitingRising,
            PHASE_FALLING => CapturePhase::AwaitingFalling,
            _ => CapturePhase::Complete,
        }
    }

    /// Returns `(rise, fall)` once both edges have been captured.
    pub fn completed(&self) -> Option<(u16, u16)> {
        if self.phase.load(Ordering::Acquire) == PHASE_COMPLETE {
            Some((
                self.rise_us.load(Ordering::Relaxed),
                self.fall_us.load(Ordering::Relaxed),
            ))
        } else {
            None
        }
    }
}

/// Width in counter ticks between two captured edges, correcting for
/// counter wraparound when the falling edge captured after a wrap.
#[inline]
pub fn pulse_ticks(rise_us: u16, fall_us: u16) -> u32 {
    let (rise, fall) = (rise_us as u32, fall_us as u32);
    if fall >= rise {
        fall - rise
    } else {
        TIMER_MODULUS - rise + fall
    }
}

// ============================================================================
// Range Sensor
// ============================================================================

/// Task-side measurement routine for the ultrasonic sensor.
///
/// Generic over the [`EchoTimer`] so the same routine runs against real
/// hardware and against the scripted mock in tests.
pub struct RangeSensor<T: EchoTimer> {
    timer: T,
    cell: Arc<CaptureCell>,
    config: SensorConfig,
}

impl<T: EchoTimer> RangeSensor<T> {
    /// Create a sensor over a timer and the capture cell its interrupt
    /// handler writes into.
    pub fn new(timer: T, cell: Arc<CaptureCell>, config: SensorConfig) -> Self {
        Self {
            timer,
            cell,
            config,
        }
    }

    /// Perform one measurement.
    ///
    /// Returns `Ok(None)` when the echo never completed within the poll
    /// budget (no reflection, disconnected sensor); the caller must treat
    /// that as "no fresh sample this cycle", never as a measured value.
    pub fn sample(&mut self) -> Result<Option<SensorSample>, T::Error> {
        self.cell.reset();
        self.timer.reset_counter();
        self.timer.arm_rising()?;

        // 10µs trigger pulse timed against the free-running counter.
        self.timer.set_trigger(true)?;
        let pulse_start = self.timer.counter_us();
        while self.timer.counter_us().wrapping_sub(pulse_start) < self.config.trigger_pulse_us {}
        self.timer.set_trigger(false)?;

        // Bounded wait for both edges.
        let mut budget = self.config.poll_budget;
        let (rise, fall) = loop {
            if let Some(pair) = self.cell.completed() {
                break pair;
            }
            if budget == 0 {
                return Ok(None);
            }
            budget -= 1;
        };

        let ticks = pulse_ticks(rise, fall);
        let cm = ticks as f32 * SOUND_CM_PER_US / 2.0;
        let clamped = cm.clamp(self.config.min_cm, self.config.max_cm);
        Ok(Some(SensorSample {
            height_cm: clamped,
            height_norm: (clamped - self.config.min_cm) / self.config.span_cm(),
        }))
    }

    /// The sensor's configuration.
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Access the underlying timer (mainly for tests).
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}

// ============================================================================
// Sample Slot
// ============================================================================

/// A sample plus the slot sequence number it was published under.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StampedSample {
    /// The measurement.
    pub sample: SensorSample,
    /// Monotonically increasing publish counter; readers compare against
    /// the last value they acted on to detect freshness.
    pub seq: u64,
}

/// Single-writer / multi-reader latest-value slot.
///
/// Overwrite semantics: no history, no backpressure. The writer is the
/// sensor task; any number of readers (controller, telemetry) may observe
/// the latest value. Sequence numbers only ever increase, so two reads can
/// never appear out of chronological order.
#[cfg(feature = "std")]
#[derive(Debug, Default)]
pub struct SampleSlot {
    inner: std::sync::Mutex<SlotInner>,
}

#[cfg(feature = "std")]
#[derive(Debug, Default)]
struct SlotInner {
    seq: u64,
    latest: Option<SensorSample>,
}

#[cfg(feature = "std")]
impl SampleSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot with a new sample; returns its sequence number.
    pub fn publish(&self, sample: SensorSample) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        inner.seq += 1;
        inner.latest = Some(sample);
        inner.seq
    }

    /// The most recently published sample, if any.
    pub fn latest(&self) -> Option<StampedSample> {
        let inner = self.inner.lock().unwrap();
        inner.latest.map(|sample| StampedSample {
            sample,
            seq: inner.seq,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
