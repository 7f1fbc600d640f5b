//! Hardware driver implementations
//!
//! This crate provides the drivers for the Metron measurement subsystem:
//!
//! - I/O buffer voltage monitoring (dual ADC081C021 on a shared I2C bus
//!   with a shared active-low alert line)
//!
//! Drivers are generic over the traits in `metron-hal`; they keep no state
//! of their own between calls and can be exercised on the host against
//! mock buses.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod monitor;
