#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

//! Async driver for the Bosch BME680 gas sensor.
//!
//! [`bme680::Bme680`] performs one-shot forced-mode conversions and turns the
//! raw register frame into a [`PhysicalReading`]. [`sampler::Sampler`] wraps a
//! driver in a lock and runs a cancellable background polling session that
//! publishes a [`ChangeResult`] for every new reading.

// must come first so the logging macros are visible to every module
mod fmt;

pub mod bme680;
#[cfg(test)]
mod debug_utils;
pub mod sampler;
mod transport;

pub use bme680::{
    Bme680, ChangeResult, Config, Filter, HeaterProfile, HeaterSlot, Oversampling,
    PhysicalReading, PollPolicy,
};
pub use sampler::{Notification, Sampler};
pub use transport::{Address, Error, I2cTransport, RegisterTransport, SpiTransport};
