//! Predictive thermal-model controller.
//!
//! Once per control cycle (1 Hz, gated on a derived cycle index so the
//! superloop can spin as fast as it likes) the controller:
//!
//! 1. looks [`LAG_WINDOW`] cycles ahead in the recipe — the prediction
//!    horizon covers the sensor's conversion-plus-smoothing latency;
//! 2. interpolates the desired temperature at the prediction time and at
//!    the current time;
//! 3. combines a thermal-model feedforward (energy to reach the
//!    predicted setpoint, net of energy already in flight, plus
//!    steady-state loss to ambient) with a PID correction on the current
//!    error;
//! 4. clamps the power request to the element's rating and converts it
//!    to a PWM compare value.
//!
//! The lag-compensation ring records the power actually achievable after
//! duty-cycle quantization — with the PID contribution backed out, since
//! closed-loop correction must not pollute the open-loop energy model.

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::config::OvenConfig;
use crate::ports::{ElementDrive, IsolationRelay, RunTimer};
use crate::recipe::Recipe;
use crate::state::{OvenState, OvenStatus};

use super::pid::PidAccumulator;

/// Lag-compensation window in control cycles. Also fixes the prediction
/// horizon: 146 cycles at 1 s/cycle.
pub const LAG_WINDOW: usize = 146;

/// The control-loop body. Owns the PID history, the lag ring, and the
/// recipe cursors; drives the element PWM and the isolation relay.
pub struct PredictiveController {
    /// Rolling record of commanded power (W) per cycle, indexed by
    /// cycle % LAG_WINDOW.
    lag_power_w: [f32; LAG_WINDOW],
    pid: PidAccumulator,
    /// Cycle index of the last evaluation; u32::MAX forces the first
    /// cycle after startup to evaluate.
    last_cycle: u32,
    /// Monotonic cursor: recipe step bracketing the prediction time.
    /// Zero is the completion sentinel.
    prediction_step: usize,
    /// Monotonic cursor: recipe step bracketing the current time.
    current_step: usize,
    element_stopped: bool,
}

impl PredictiveController {
    pub fn new() -> Self {
        Self {
            lag_power_w: [0.0; LAG_WINDOW],
            pid: PidAccumulator::new(),
            last_cycle: u32::MAX,
            prediction_step: 1,
            current_step: 1,
            element_stopped: true,
        }
    }

    /// Run one superloop pass of the controller.
    pub fn step<E, R, T, D>(
        &mut self,
        state: &mut OvenState,
        cfg: &OvenConfig,
        timer: &mut T,
        element: &mut E,
        relay: &mut R,
        delay: &mut D,
    ) where
        E: ElementDrive,
        R: IsolationRelay,
        T: RunTimer,
        D: DelayNs,
    {
        if state.status != OvenStatus::Running {
            self.outputs_off(state, cfg, element, relay, delay);
            return;
        }

        if state.startup {
            self.run_startup(state, cfg, timer, relay, delay);
            return;
        }

        // Control math once per wall-clock cycle, however fast the
        // superloop spins.
        let cycle =
            ((state.current_time + cfg.prediction_horizon_secs()) / cfg.cycle_time_secs) as u32;
        if cycle == self.last_cycle {
            return;
        }
        self.last_cycle = cycle;
        self.evaluate(state, cfg, element, cycle);
    }

    /// One-time startup sequence on entry to Running.
    fn run_startup<T, R, D>(
        &mut self,
        state: &mut OvenState,
        cfg: &OvenConfig,
        timer: &mut T,
        relay: &mut R,
        delay: &mut D,
    ) where
        T: RunTimer,
        R: IsolationRelay,
        D: DelayNs,
    {
        info!("controller: startup — engaging isolation relay");
        state.startup = false;
        self.prediction_step = 1;
        self.current_step = 1;
        self.pid.reset();

        relay.engage();
        // Let the contacts land before the first PWM pulse (arcing).
        delay.delay_ms(cfg.relay_settle_ms);

        timer.restart();
        self.lag_power_w = [0.0; LAG_WINDOW];
        self.last_cycle = u32::MAX;
    }

    /// The per-cycle control math.
    fn evaluate<E: ElementDrive>(
        &mut self,
        state: &mut OvenState,
        cfg: &OvenConfig,
        element: &mut E,
        cycle: u32,
    ) {
        let horizon = cfg.prediction_horizon_secs();
        let prediction_time = state.current_time + horizon;

        // Advance the current-time cursor.
        while self.current_step < state.recipe.len()
            && state
                .recipe
                .get(self.current_step)
                .is_some_and(|s| state.current_time > s.time_secs)
        {
            self.current_step += 1;
        }

        // Advance the prediction cursor; running past the last step means
        // the recipe is complete.
        while let Some(step) = state.recipe.get(self.prediction_step).copied() {
            if prediction_time <= step.time_secs {
                break;
            }
            self.prediction_step += 1;
            if self.prediction_step >= state.recipe.len() {
                self.prediction_step = 0;
                state.status = OvenStatus::Standby;
                info!("controller: recipe complete, entering Standby");
                break;
            }
        }
        if self.prediction_step == 0 {
            // Completed (or an empty recipe slipped through): no output
            // this cycle; the off path runs next pass.
            return;
        }

        let (Some(pred_prev), Some(pred_next)) = (
            state.recipe.get(self.prediction_step - 1),
            state.recipe.get(self.prediction_step),
        ) else {
            return;
        };

        let desired = Recipe::interpolate(pred_prev, pred_next, prediction_time);
        let desired_change = desired - state.current_temperature;

        // PID error against the *current* setpoint; before t = 0 the
        // target is simply the first step's temperature.
        let current_error = if state.current_time > 0.0 {
            let (Some(cur_prev), Some(cur_next)) = (
                state.recipe.get(self.current_step - 1),
                state.recipe.get(self.current_step),
            ) else {
                return;
            };
            Recipe::interpolate(cur_prev, cur_next, state.current_time)
                - state.current_temperature
        } else {
            match state.recipe.get(0) {
                Some(first) => first.temperature_c - state.current_temperature,
                None => return,
            }
        };

        let pid_temp =
            self.pid
                .compute(current_error, state.p_gain, state.i_gain, state.d_gain);

        // Energy commanded over the last window but not yet visible in
        // the measured temperature.
        let laggy_energy: f32 = self.lag_power_w.iter().sum::<f32>() * cfg.cycle_time_secs;

        let capacitance = cfg.thermal_capacitance_j_per_k;
        let resistance = cfg.thermal_resistance_k_per_w;

        let net_energy = desired_change * capacitance - laggy_energy;
        let maintenance_power = (desired - state.ambient_temperature) / resistance;
        let pid_power = pid_temp * capacitance / horizon + pid_temp / resistance;

        let output_power = (net_energy / cfg.cycle_time_secs + maintenance_power + pid_power)
            .clamp(0.0, cfg.max_power_w);

        // Power → PWM duty on the 0..=pwm_scale range, capped by the
        // hardware comparator.
        let mut duty = (output_power * f32::from(cfg.pwm_scale) / cfg.max_power_w) as u8;
        let compare_cap = u16::from(element.period()) + 1;
        if u16::from(duty) > compare_cap {
            duty = compare_cap as u8;
        }

        if duty == 0 {
            element.stop();
            self.element_stopped = true;
        } else {
            if self.element_stopped {
                element.start();
                self.element_stopped = false;
            }
            element.set_compare(duty - 1);
        }
        state.duty_cycle = duty;
        debug!(
            "controller: cycle {} power {:.0} W duty {}",
            cycle, output_power, duty
        );

        // Record what the element will actually deliver after duty
        // quantization; the PID share stays out of the energy model.
        let achievable_power =
            f32::from(duty) * cfg.max_power_w / f32::from(cfg.pwm_scale) - pid_power;
        self.lag_power_w[cycle as usize % LAG_WINDOW] = achievable_power;

        // TODO: flag SSR failure (thermal runaway) when measured slope
        // stays far above the commanded power for several windows.
    }

    /// Safe-output path for every non-Running status.
    fn outputs_off<E, R, D>(
        &mut self,
        state: &mut OvenState,
        cfg: &OvenConfig,
        element: &mut E,
        relay: &mut R,
        delay: &mut D,
    ) where
        E: ElementDrive,
        R: IsolationRelay,
        D: DelayNs,
    {
        element.stop();
        self.element_stopped = true;
        element.set_compare(0);
        if !state.startup {
            // Give the SSR a couple of PWM clocks to clear before
            // breaking the circuit with the mechanical relay.
            delay.delay_ms(cfg.ssr_clear_ms);
        }
        relay.disengage();
        state.duty_cycle = 0;
        state.startup = true;
    }
}

impl Default for PredictiveController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl PredictiveController {
    /// Test hook: total energy-model power currently in the lag ring.
    fn lag_power_sum(&self) -> f32 {
        self.lag_power_w.iter().sum()
    }
}
