//! ESP-IDF implementations of the hardware ports.
//!
//! Port methods are infallible by contract — the control loop has no
//! sensible recovery from a peripheral write failing mid-cycle — so
//! errors are logged and the loop carries on with its last commanded
//! outputs.

use std::time::Instant;

use embedded_hal::digital::OutputPin;
use esp_idf_hal::delay::NON_BLOCK;
use esp_idf_hal::ledc::LedcDriver;
use esp_idf_hal::uart::UartDriver;
use esp_idf_sys::EspError;
use log::warn;

use crate::hmi::transport::FrameLink;
use crate::ports::{ElementDrive, IsolationRelay, RunTimer};

/// Heating-element SSR drive via an LEDC PWM channel.
pub struct LedcElement<'d> {
    pwm: LedcDriver<'d>,
    period: u8,
}

impl<'d> LedcElement<'d> {
    /// `period` is the comparator's top value; duty values run
    /// 0..=period+1.
    pub fn new(pwm: LedcDriver<'d>, period: u8) -> Self {
        Self { pwm, period }
    }
}

impl ElementDrive for LedcElement<'_> {
    fn start(&mut self) {
        if let Err(e) = self.pwm.enable() {
            warn!("element: enable failed: {e}");
        }
    }

    fn stop(&mut self) {
        if let Err(e) = self.pwm.disable() {
            warn!("element: disable failed: {e}");
        }
    }

    fn set_compare(&mut self, compare: u8) {
        if let Err(e) = self.pwm.set_duty(u32::from(compare)) {
            warn!("element: set_duty failed: {e}");
        }
    }

    fn period(&self) -> u8 {
        self.period
    }
}

/// Mains isolation relay on a plain GPIO, active high.
pub struct RelayPin<P> {
    pin: P,
}

impl<P: OutputPin> RelayPin<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: OutputPin> IsolationRelay for RelayPin<P> {
    fn engage(&mut self) {
        if self.pin.set_high().is_err() {
            warn!("relay: engage drive failed");
        }
    }

    fn disengage(&mut self) {
        if self.pin.set_low().is_err() {
            warn!("relay: disengage drive failed");
        }
    }
}

/// Run timer backed by the monotonic clock.
pub struct RunClock {
    started: Instant,
}

impl RunClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for RunClock {
    fn default() -> Self {
        Self::new()
    }
}

impl RunTimer for RunClock {
    fn elapsed_secs(&self) -> f32 {
        self.started.elapsed().as_secs_f32()
    }

    fn restart(&mut self) {
        self.started = Instant::now();
    }
}

/// Host link over a UART. The host writes each command as one burst and
/// waits for the reply, so a non-blocking read either drains a whole
/// frame or nothing.
pub struct UartLink<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UartLink<'d> {
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart }
    }
}

impl FrameLink for UartLink<'_> {
    type Error = EspError;

    fn poll_frame(&mut self, buf: &mut [u8]) -> Result<Option<usize>, EspError> {
        let n = self.uart.read(buf, NON_BLOCK)?;
        Ok(if n == 0 { None } else { Some(n) })
    }

    fn send_frame(&mut self, data: &[u8]) -> Result<(), EspError> {
        self.uart.write(data)?;
        Ok(())
    }
}
