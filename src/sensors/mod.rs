//! Sensor subsystem — the one-wire bus and the MAX31850 thermocouple
//! digitizer that rides on it.

pub mod max31850;
pub mod onewire;

pub use max31850::Max31850;
pub use onewire::OneWireBus;
