//! Discrete PID accumulator.
//!
//! Runs at a fixed control cycle, so the cycle time is folded into the
//! gains rather than multiplied per step: the integral is a plain sum of
//! errors, the derivative a first difference. Output is a temperature
//! correction in °C, fed to the thermal model — clamping happens at the
//! power stage, not here.

/// PID state. The gains live in `OvenState` (host-settable), so compute
/// takes them per call.
pub struct PidAccumulator {
    integral: f32,
    prev_error: f32,
}

impl PidAccumulator {
    pub fn new() -> Self {
        Self {
            integral: 0.0,
            prev_error: 0.0,
        }
    }

    /// Fold in this cycle's error and return the combined correction.
    pub fn compute(&mut self, error: f32, p_gain: f32, i_gain: f32, d_gain: f32) -> f32 {
        self.integral += error;
        let derivative = error - self.prev_error;
        self.prev_error = error;
        p_gain * error + i_gain * self.integral + d_gain * derivative
    }

    /// Reset integrator and derivative history (startup sequence).
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }
}

impl Default for PidAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_only() {
        let mut pid = PidAccumulator::new();
        assert!((pid.compute(10.0, 2.0, 0.0, 0.0) - 20.0).abs() < 1e-6);
        assert!((pid.compute(-5.0, 2.0, 0.0, 0.0) + 10.0).abs() < 1e-6);
    }

    #[test]
    fn integral_accumulates_across_cycles() {
        let mut pid = PidAccumulator::new();
        pid.compute(3.0, 0.0, 1.0, 0.0);
        let out = pid.compute(3.0, 0.0, 1.0, 0.0);
        assert!((out - 6.0).abs() < 1e-6);
    }

    #[test]
    fn derivative_is_first_difference() {
        let mut pid = PidAccumulator::new();
        pid.compute(2.0, 0.0, 0.0, 1.0); // first step: derivative = 2 − 0
        let out = pid.compute(5.0, 0.0, 0.0, 1.0);
        assert!((out - 3.0).abs() < 1e-6);
    }

    #[test]
    fn reset_clears_history() {
        let mut pid = PidAccumulator::new();
        pid.compute(10.0, 1.0, 1.0, 1.0);
        pid.reset();
        let out = pid.compute(1.0, 0.0, 1.0, 1.0);
        // integral = 1, derivative = 1 − 0
        assert!((out - 2.0).abs() < 1e-6);
    }
}
