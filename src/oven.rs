//! Superloop composition root.
//!
//! `Oven` wires the three subsystems — sensor, HMI protocol, predictive
//! controller — around the shared [`OvenState`] record and runs them in a
//! fixed order every pass:
//!
//! 1. sensor state machine (non-blocking, updates the smoothed reading),
//! 2. fault mapping (a latched sensor fault aborts a run),
//! 3. time update (run-timer seconds minus the prediction pre-roll),
//! 4. HMI dispatch (at most one host command),
//! 5. controller step (cycle-gated control math, output drive).
//!
//! The loop is single-threaded; `OvenState`'s single-writer-per-field
//! discipline is what makes this ordering safe without locks.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::config::OvenConfig;
use crate::control::PredictiveController;
use crate::error::{Error, LinkError, Result};
use crate::hmi::transport::FrameLink;
use crate::hmi::HmiProtocol;
use crate::ports::{ElementDrive, IsolationRelay, RunTimer};
use crate::sensors::Max31850;
use crate::state::{OvenState, OvenStatus};

/// The assembled firmware. Generic over the hardware ports so the whole
/// loop runs against mocks in host tests.
pub struct Oven<P, E, R, T, L, D> {
    state: OvenState,
    config: OvenConfig,
    sensor: Max31850<P>,
    hmi: HmiProtocol,
    controller: PredictiveController,
    element: E,
    relay: R,
    timer: T,
    link: L,
    delay: D,
}

impl<P, E, R, T, L, D> Oven<P, E, R, T, L, D>
where
    P: InputPin + OutputPin,
    E: ElementDrive,
    R: IsolationRelay,
    T: RunTimer,
    L: FrameLink,
    D: DelayNs,
{
    pub fn new(
        config: OvenConfig,
        sensor_pin: P,
        element: E,
        relay: R,
        timer: T,
        link: L,
        delay: D,
    ) -> Self {
        Self {
            state: OvenState::new(),
            config,
            sensor: Max31850::new(sensor_pin),
            hmi: HmiProtocol::new(),
            controller: PredictiveController::new(),
            element,
            relay,
            timer,
            link,
            delay,
        }
    }

    /// One superloop pass.
    ///
    /// The sensor and controller phases never abort the pass: a bus-pin
    /// I/O failure is recorded against the sensor's fault latch with the
    /// last smoothed reading held, so the fault supervision and the
    /// outputs-off path stay live even when the hardware misbehaves. A
    /// link error is reported, but only after the controller has run.
    pub fn tick(&mut self) -> Result<()> {
        match self.sensor.update(&mut self.delay) {
            Ok(reading) => self.state.current_temperature = reading,
            Err(_) => {
                warn!("oven: sensor bus I/O failed");
                self.sensor.record_bus_failure();
                self.state.current_temperature = self.sensor.smoothed();
            }
        }

        if self.sensor.fault_active() && self.state.status == OvenStatus::Running {
            warn!("oven: sensor fault during run, aborting");
            self.state.status = OvenStatus::Faulted;
        }

        self.state.current_time =
            self.timer.elapsed_secs() - self.config.prediction_horizon_secs();

        let link_result = self
            .hmi
            .poll(&mut self.link, &mut self.state)
            .map_err(|_| Error::Link(LinkError::Io));

        self.controller.step(
            &mut self.state,
            &self.config,
            &mut self.timer,
            &mut self.element,
            &mut self.relay,
            &mut self.delay,
        );

        link_result
    }

    /// Read-only view of the shared state, for diagnostics.
    pub fn state(&self) -> &OvenState {
        &self.state
    }

    /// Cold-junction temperature from the sensor's last scratchpad.
    pub fn board_temperature(&self) -> f32 {
        self.sensor.internal_temperature()
    }
}
