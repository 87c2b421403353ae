//! Shared oven state threaded through every superloop phase.
//!
//! `OvenState` is the single record the three subsystems communicate
//! through. Discipline: at most one component writes a given field per
//! superloop pass —
//!
//! - the sensor phase writes `current_temperature`,
//! - the time update writes `current_time`,
//! - the HMI protocol writes `status`, `recipe`, gains, `ambient_temperature`
//!   and the `startup` flag,
//! - the controller writes `duty_cycle`, `startup`, and `status`
//!   (recipe-completion and fault transitions only).
//!
//! No field has two writers in the same pass, so no locking is needed in
//! the single-threaded superloop.

use crate::recipe::Recipe;

/// Oven status as reported to the host. The wire representation is the
/// discriminant byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OvenStatus {
    WaitingForRecipe = 0,
    Standby = 1,
    Running = 2,
    Faulted = 3,
    NeedRestart = 4,
}

impl OvenStatus {
    /// Wire byte for this status.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// The process-wide oven state record.
pub struct OvenState {
    /// Current status; starts at `NeedRestart` so the host must poll
    /// status once after power-up before recipes are accepted.
    pub status: OvenStatus,
    /// Elapsed run time (s). Negative during the pre-roll window that
    /// lets the predictor look ahead before t = 0.
    pub current_time: f32,
    /// Latest smoothed thermocouple reading (°C).
    pub current_temperature: f32,
    /// Host-configured ambient reference (°C) for the maintenance term.
    pub ambient_temperature: f32,
    /// Most recent relay drive value, 0..=pwm_scale. Reported to the host.
    pub duty_cycle: u8,
    /// PID proportional gain.
    pub p_gain: f32,
    /// PID integral gain.
    pub i_gain: f32,
    /// PID derivative gain.
    pub d_gain: f32,
    /// Active temperature-vs-time recipe.
    pub recipe: Recipe,
    /// Set when the controller must run its one-time startup sequence on
    /// the next Running cycle. Armed at boot, by Start, and whenever the
    /// controller leaves Running.
    pub startup: bool,
}

impl OvenState {
    pub fn new() -> Self {
        Self {
            status: OvenStatus::NeedRestart,
            current_time: 0.0,
            current_temperature: 0.0,
            // HMI factory default; the host overwrites it via SetAmbient.
            ambient_temperature: -14.0,
            duty_cycle: 0,
            p_gain: 0.0,
            i_gain: 0.0,
            d_gain: 0.0,
            recipe: Recipe::new(),
            startup: true,
        }
    }
}

impl Default for OvenState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_state_needs_restart() {
        let s = OvenState::new();
        assert_eq!(s.status, OvenStatus::NeedRestart);
        assert!(s.startup);
        assert_eq!(s.duty_cycle, 0);
        assert!(s.recipe.is_empty());
    }

    #[test]
    fn status_wire_bytes() {
        assert_eq!(OvenStatus::WaitingForRecipe.as_u8(), 0);
        assert_eq!(OvenStatus::Standby.as_u8(), 1);
        assert_eq!(OvenStatus::Running.as_u8(), 2);
        assert_eq!(OvenStatus::Faulted.as_u8(), 3);
        assert_eq!(OvenStatus::NeedRestart.as_u8(), 4);
    }
}
