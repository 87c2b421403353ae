//! Oven controller firmware — main entry point.
//!
//! Binds the portable control logic in the `ovenctl` library to the
//! ESP-IDF peripherals and runs the superloop forever. Only buildable
//! with the `espidf` feature (Xtensa target).

#![deny(unused_must_use)]

use anyhow::{Context, Result};
use esp_idf_hal::delay::{Delay, FreeRtos};
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_hal::units::Hertz;
use log::{error, info};

use ovenctl::adapters::esp::{LedcElement, RelayPin, RunClock, UartLink};
use ovenctl::config::OvenConfig;
use ovenctl::oven::Oven;

/// Superloop pacing. The sensor needs ~100 ms per conversion and the
/// controller gates on one-second cycles, so 10 ms is plenty of
/// resolution while leaving the CPU mostly idle.
const LOOP_PERIOD_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  ovenctl v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let config = OvenConfig::default();

    // One-wire bus to the MAX31850, open-drain with external pull-up.
    let sensor_pin = PinDriver::input_output_od(peripherals.pins.gpio4)
        .context("sensor bus pin init")?;

    // Slow PWM window for the element SSR: 7-bit comparator, duty runs
    // 0..=pwm_scale on a 1 Hz window.
    let ledc_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::new()
            .frequency(Hertz(1))
            .resolution(Resolution::Bits7),
    )
    .context("LEDC timer init")?;
    let pwm = LedcDriver::new(
        peripherals.ledc.channel0,
        &ledc_timer,
        peripherals.pins.gpio5,
    )
    .context("LEDC channel init")?;
    let element = LedcElement::new(pwm, config.pwm_scale - 1);

    let relay = RelayPin::new(PinDriver::output(peripherals.pins.gpio6).context("relay pin init")?);

    // Host link: 115200 8N1 over the USB bridge UART.
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio18,
        Option::<esp_idf_hal::gpio::AnyIOPin>::None,
        Option::<esp_idf_hal::gpio::AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(115_200)),
    )
    .context("UART init")?;
    let link = UartLink::new(uart);

    // ── 3. Assemble and run ───────────────────────────────────
    let mut oven = Oven::new(
        config,
        sensor_pin,
        element,
        relay,
        RunClock::new(),
        link,
        Delay::new_default(),
    );

    info!("entering superloop");
    loop {
        if let Err(e) = oven.tick() {
            // Transient bus/link failures: log and keep looping; the
            // sensor's own fault latch handles persistent ones.
            error!("superloop: {e}");
        }
        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}
