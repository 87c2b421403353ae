//! Reflow oven controller firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code lives in [`adapters`] and is
//! guarded by the `espidf` cargo feature.

#![deny(unused_must_use)]

pub mod config;
pub mod control;
pub mod hmi;
pub mod oven;
pub mod ports;
pub mod recipe;
pub mod sensors;
pub mod state;

mod error;

pub mod adapters;

pub use error::{Error, LinkError, Result, SensorError};
