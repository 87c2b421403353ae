//! Control subsystem — the PID accumulator and the predictive
//! thermal-model controller that owns the relay outputs.

pub mod pid;
pub mod predictive;

pub use predictive::PredictiveController;
