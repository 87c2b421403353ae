//! Hardware adapters binding the port traits to real peripherals.
//!
//! Everything here is target-specific; the `espidf` feature gates the
//! ESP-IDF implementations so host builds carry only the portable logic.

#[cfg(feature = "espidf")]
pub mod esp;
