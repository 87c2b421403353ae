//! System configuration parameters.
//!
//! All tunable physical and timing parameters for the oven. Buffer
//! capacities stay compile-time constants (they size arrays); everything
//! a commissioning engineer might retune lives here.

use serde::{Deserialize, Serialize};

/// Core oven configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OvenConfig {
    // --- Heating element ---
    /// Rated element power at full duty (W).
    pub max_power_w: f32,
    /// Element resistance (ohm) — documented for commissioning; the
    /// control math works in watts.
    pub element_resistance_ohm: f32,
    /// PWM full-scale value: duty is computed on a 0..=pwm_scale range.
    pub pwm_scale: u8,

    // --- Thermal model ---
    /// Oven thermal resistance to ambient (K/W).
    pub thermal_resistance_k_per_w: f32,
    /// Oven thermal capacitance (J/K).
    pub thermal_capacitance_j_per_k: f32,

    // --- Timing ---
    /// Control cycle period (seconds).
    pub cycle_time_secs: f32,
    /// Isolation relay settle time after engaging (ms).
    pub relay_settle_ms: u32,
    /// SSR clear-up time before dropping the isolation relay (ms).
    pub ssr_clear_ms: u32,
}

impl Default for OvenConfig {
    fn default() -> Self {
        Self {
            // Element: 3.5 kW @ 240 V, 17.05 ohm ±0.01
            max_power_w: 3500.0,
            element_resistance_ohm: 17.05,
            pwm_scale: 120,

            // Thermal model (measured on the production chamber)
            thermal_resistance_k_per_w: 0.2,
            thermal_capacitance_j_per_k: 20_000.0,

            // Timing
            cycle_time_secs: 1.0,
            relay_settle_ms: 150,
            ssr_clear_ms: 16,
        }
    }
}

impl OvenConfig {
    /// Look-ahead horizon in seconds: the lag window expressed in wall
    /// time. Covers the sensor's conversion-plus-smoothing latency.
    pub fn prediction_horizon_secs(&self) -> f32 {
        crate::control::predictive::LAG_WINDOW as f32 * self.cycle_time_secs
    }
}
