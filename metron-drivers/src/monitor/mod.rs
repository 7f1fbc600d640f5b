//! I/O buffer voltage monitoring
//!
//! Two ADC081C021 converters share one I2C bus and one active-low alert
//! line, each watching the rail of one I/O buffer:
//!
//! - [`codec`] - raw conversion code / millivolt arithmetic
//! - [`alert`] - alert bands, latched flags, and the pin arm/disarm
//!   life-cycle
//! - [`adc081`] - the register-level driver itself

pub mod adc081;
pub mod alert;
pub mod codec;

pub use adc081::{Adc081Monitor, Error, BUFFER_A, BUFFER_B};
pub use alert::{AlertRange, AlertStatus, LatchState, SampleRate};
pub use codec::MAX_VOLTAGE_MV;
