//! Continuous-rotation servo driver using ESP32 LEDC PWM.
//!
//! Both crane servos are standard hobby types: a 50Hz PWM signal whose
//! pulse width selects speed and direction. 1500µs is neutral; the exact
//! forward/backward widths are per-axis tunables in
//! [`ServoConfig`](crate::config::ServoConfig).

use crate::config::ServoConfig;
use crate::events::{Axis, MotionDirection};
use crate::traits::ServoController;
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;

/// Two-channel servo bank for ESP32.
///
/// Uses the LEDC peripheral at 50Hz with 14-bit resolution (16384 duty
/// steps, ≈1.2µs of pulse-width granularity).
///
/// # Example
///
/// ```ignore
/// use rs_cranez::config::ServoConfig;
/// use rs_cranez::events::{Axis, MotionDirection};
/// use rs_cranez::hal::esp32::Esp32Servos;
/// use rs_cranez::traits::ServoController;
///
/// let peripherals = Peripherals::take()?;
/// let mut servos = Esp32Servos::new(
///     peripherals.pins.gpio2,
///     peripherals.pins.gpio3,
///     peripherals.ledc.timer0,
///     peripherals.ledc.channel0,
///     peripherals.ledc.channel1,
///     ServoConfig::default(),
/// )?;
///
/// servos.drive(Axis::Vertical, MotionDirection::Forward, None)?;
/// ```
pub struct Esp32Servos<'d> {
    /// Hoist servo channel
    vertical: LedcDriver<'d>,
    /// Platform servo channel
    platform: LedcDriver<'d>,
    /// Per-axis pulse-width tuning
    config: ServoConfig,
    /// Max duty value at the configured resolution
    max_duty: u32,
}

impl<'d> Esp32Servos<'d> {
    /// Servo frame rate in Hz
    const PWM_FREQ_HZ: u32 = 50;

    /// PWM period in microseconds (1s / 50Hz)
    const PERIOD_US: u32 = 20_000;

    /// PWM resolution (14-bit = 16384 steps)
    const PWM_RESOLUTION: Resolution = Resolution::Bits14;

    /// Creates a new servo bank; both axes start at neutral.
    ///
    /// # Errors
    ///
    /// Returns an error if PWM initialization fails.
    pub fn new<T, TI, VC, VCI, PC, PCI, VP, VPI, PP, PPI>(
        vertical_pin: VP,
        platform_pin: PP,
        timer: T,
        vertical_channel: VC,
        platform_channel: PC,
        config: ServoConfig,
    ) -> Result<Self, esp_idf_hal::sys::EspError>
    where
        TI: esp_idf_hal::ledc::LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        VCI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        VC: Peripheral<P = VCI> + 'd,
        PCI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        PC: Peripheral<P = PCI> + 'd,
        VPI: esp_idf_hal::gpio::OutputPin + 'd,
        VP: Peripheral<P = VPI> + 'd,
        PPI: esp_idf_hal::gpio::OutputPin + 'd,
        PP: Peripheral<P = PPI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(Self::PWM_FREQ_HZ.Hz())
            .resolution(Self::PWM_RESOLUTION);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;

        let vertical = LedcDriver::new(vertical_channel, &timer_driver, vertical_pin)?;
        let platform = LedcDriver::new(platform_channel, &timer_driver, platform_pin)?;

        let max_duty = vertical.get_max_duty();
        let mut servos = Self {
            vertical,
            platform,
            config,
            max_duty,
        };

        servos.stop_all()?;
        Ok(servos)
    }

    /// Duty value producing a pulse of `pulse_us` within the 20ms frame.
    fn duty_for_pulse(&self, pulse_us: u16) -> u32 {
        (pulse_us as u64 * self.max_duty as u64 / Self::PERIOD_US as u64) as u32
    }
}

impl ServoController for Esp32Servos<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn drive(
        &mut self,
        axis: Axis,
        direction: MotionDirection,
        pulse_override_us: Option<u16>,
    ) -> Result<(), Self::Error> {
        let pulse = pulse_override_us
            .unwrap_or_else(|| self.config.for_axis(axis).for_direction(direction));
        let duty = self.duty_for_pulse(pulse);
        match axis {
            Axis::Vertical => self.vertical.set_duty(duty),
            Axis::Platform => self.platform.set_duty(duty),
        }
    }
}
