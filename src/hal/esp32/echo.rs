//! Ultrasonic trigger/echo timing for ESP32.
//!
//! The echo pin is captured with a GPIO any-edge interrupt that writes
//! counter timestamps straight into the shared
//! [`CaptureCell`](crate::sensor::CaptureCell). The "counter" is the
//! ESP-IDF microsecond timer relative to a resettable epoch, truncated to
//! 16 bits so the task-side wraparound handling matches the capture
//! hardware it models.

use core::sync::atomic::{AtomicU64, Ordering};

use alloc::boxed::Box;
use alloc::sync::Arc;

use crate::sensor::CaptureCell;
use crate::traits::EchoTimer;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Input, InterruptType, Output, Pin, PinDriver};
use esp_idf_hal::sys::{
    esp, gpio_install_isr_service, gpio_isr_handler_add, EspError, ESP_ERR_INVALID_STATE,
};

struct IsrContext {
    cell: Arc<CaptureCell>,
    epoch_us: Arc<AtomicU64>,
}

/// Edge handler: timestamp against the epoch and hand off to the cell.
///
/// Runs in interrupt context; atomics only. The capture cell's phase
/// machine ignores edges outside an active measurement, so the handler can
/// stay registered permanently.
unsafe extern "C" fn echo_edge_isr(arg: *mut core::ffi::c_void) {
    let ctx = &*(arg as *const IsrContext);
    let now = esp_idf_hal::sys::esp_timer_get_time() as u64;
    let since_epoch = now.wrapping_sub(ctx.epoch_us.load(Ordering::Relaxed));
    ctx.cell.record_edge(since_epoch as u16);
}

/// HC-SR04 trigger/echo interface for ESP32.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use rs_cranez::config::SensorConfig;
/// use rs_cranez::hal::esp32::Esp32EchoTimer;
/// use rs_cranez::sensor::{CaptureCell, RangeSensor};
///
/// let cell = Arc::new(CaptureCell::new());
/// let timer = Esp32EchoTimer::new(
///     peripherals.pins.gpio4.into(),
///     peripherals.pins.gpio5.into(),
///     Arc::clone(&cell),
/// )?;
/// let mut sensor = RangeSensor::new(timer, cell, SensorConfig::default());
/// ```
pub struct Esp32EchoTimer<'d> {
    trigger: PinDriver<'d, AnyOutputPin, Output>,
    _echo: PinDriver<'d, AnyIOPin, Input>,
    epoch_us: Arc<AtomicU64>,
}

impl<'d> Esp32EchoTimer<'d> {
    /// Creates the trigger output and installs the echo edge interrupt.
    ///
    /// The ISR context is leaked intentionally: the handler stays registered
    /// for the life of the firmware.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO setup or ISR registration fails.
    pub fn new(
        trigger_pin: AnyOutputPin,
        echo_pin: AnyIOPin,
        cell: Arc<CaptureCell>,
    ) -> Result<Self, EspError> {
        let mut trigger = PinDriver::output(trigger_pin)?;
        trigger.set_low()?;

        let mut echo = PinDriver::input(echo_pin)?;
        echo.set_interrupt_type(InterruptType::AnyEdge)?;

        let epoch_us = Arc::new(AtomicU64::new(0));
        let ctx = Box::new(IsrContext {
            cell,
            epoch_us: Arc::clone(&epoch_us),
        });
        let ctx_ptr = Box::into_raw(ctx) as *mut core::ffi::c_void;
        unsafe {
            // Already-installed is fine; another driver may have done it.
            let ret = gpio_install_isr_service(0);
            if ret != 0 && ret != ESP_ERR_INVALID_STATE {
                esp!(ret)?;
            }
            esp!(gpio_isr_handler_add(
                echo.pin(),
                Some(echo_edge_isr),
                ctx_ptr,
            ))?;
        }

        Ok(Self {
            trigger,
            _echo: echo,
            epoch_us,
        })
    }
}

impl EchoTimer for Esp32EchoTimer<'_> {
    type Error = EspError;

    fn counter_us(&self) -> u16 {
        let now = unsafe { esp_idf_hal::sys::esp_timer_get_time() } as u64;
        now.wrapping_sub(self.epoch_us.load(Ordering::Relaxed)) as u16
    }

    fn reset_counter(&mut self) {
        let now = unsafe { esp_idf_hal::sys::esp_timer_get_time() } as u64;
        self.epoch_us.store(now, Ordering::Relaxed);
    }

    fn arm_rising(&mut self) -> Result<(), Self::Error> {
        // The any-edge handler is always registered; the cell's reset (done
        // by the caller) is what re-arms a measurement.
        Ok(())
    }

    fn set_trigger(&mut self, high: bool) -> Result<(), Self::Error> {
        if high {
            self.trigger.set_high()
        } else {
            self.trigger.set_low()
        }
    }
}
