//! Alert bands, latched flags, and the pin arm/disarm life-cycle
//!
//! Each converter latches an out-of-band excursion in its status register
//! and pulls the shared active-low alert line while its pin output is
//! enabled. Because two devices share one line, a latched device must be
//! able to stop pulling the line without losing its latch, so the others
//! can still be heard. That protocol lives in [`LatchState`].

use super::adc081::reg;
use super::codec::MAX_VOLTAGE_MV;

/// Conversion interval field of the configuration register (bits 7:5)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SampleRate {
    /// Automatic conversions at roughly one kilo-sample per second
    Ksps1 = 0b110,
}

impl SampleRate {
    /// Field value shifted into register position
    pub fn bits(self) -> u8 {
        (self as u8) << 5
    }
}

/// Latched alert flags read from the status register
///
/// Flags stay set until acknowledged by writing them back; reading alone
/// never clears them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlertStatus {
    /// Voltage fell below the low limit
    pub under_range: bool,
    /// Voltage rose above the high limit
    pub over_range: bool,
}

impl AlertStatus {
    /// Both flags set - the write-back pattern that acknowledges everything
    pub const fn all() -> Self {
        Self {
            under_range: true,
            over_range: true,
        }
    }

    /// Parse a raw status register byte
    pub fn from_bits(byte: u8) -> Self {
        Self {
            under_range: byte & reg::STATUS_UNDER_RANGE != 0,
            over_range: byte & reg::STATUS_OVER_RANGE != 0,
        }
    }

    /// Raw status register byte for these flags
    pub fn bits(self) -> u8 {
        let mut byte = 0;
        if self.under_range {
            byte |= reg::STATUS_UNDER_RANGE;
        }
        if self.over_range {
            byte |= reg::STATUS_OVER_RANGE;
        }
        byte
    }

    /// True while either flag is latched
    pub fn any(self) -> bool {
        self.under_range || self.over_range
    }
}

/// Alert band configuration for one buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlertRange {
    /// Lower bound in millivolts
    pub low_mv: u16,
    /// Upper bound in millivolts
    pub high_mv: u16,
    /// False when the reserved (0, MAX_VOLTAGE_MV) pair is configured
    pub enabled: bool,
    /// Conversion rate the band is checked at
    pub sample_rate: SampleRate,
}

impl AlertRange {
    /// The reserved "no alert configured" band
    pub const fn disabled() -> Self {
        Self {
            low_mv: 0,
            high_mv: MAX_VOLTAGE_MV,
            enabled: false,
            sample_rate: SampleRate::Ksps1,
        }
    }

    /// True if (low, high) is the reserved disabled pair
    ///
    /// The comparison is exact, so an enabled band spanning the full range
    /// cannot be expressed; such a request always decodes to disabled.
    pub fn is_sentinel(low_mv: u16, high_mv: u16) -> bool {
        low_mv == 0 && high_mv == MAX_VOLTAGE_MV
    }
}

/// Per-buffer alert pin life-cycle
///
/// The pin-enable bit of the configuration register doubles as the
/// rearm/disarm flag, which makes the polling protocol easiest to audit as
/// a state machine over the two registers:
///
/// ```text
/// Armed ──excursion (device-internal)──▶ LatchedArmed
/// LatchedArmed ──poll, keep latch──▶ LatchedDisarmed
/// LatchedArmed / LatchedDisarmed ──poll, acknowledge──▶ Armed
/// ```
///
/// `LatchedDisarmed` exists solely so the shared line can be re-checked
/// for the other buffer without starvation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LatchState {
    /// No latched flags; the pin output follows new excursions
    Armed,
    /// Flags latched, pin output pulling the shared line
    LatchedArmed,
    /// Flags latched, pin output disarmed
    LatchedDisarmed,
}

impl LatchState {
    /// Reconstruct a buffer's state from its status and configuration
    /// registers
    pub fn from_registers(status: AlertStatus, control: u8) -> Self {
        match (status.any(), control & reg::CONFIG_ALERT_PIN_EN != 0) {
            (false, _) => LatchState::Armed,
            (true, true) => LatchState::LatchedArmed,
            (true, false) => LatchState::LatchedDisarmed,
        }
    }

    /// State after one poll pass visits this buffer
    ///
    /// Acknowledging (`clear`) wipes the latched flags and re-arms the pin
    /// output; declining keeps the latch and disarms the pin output.
    pub fn after_poll(self, clear: bool) -> Self {
        match self {
            LatchState::Armed => LatchState::Armed,
            LatchState::LatchedArmed | LatchState::LatchedDisarmed => {
                if clear {
                    LatchState::Armed
                } else {
                    LatchState::LatchedDisarmed
                }
            }
        }
    }

    /// True while flags are latched
    pub fn is_latched(self) -> bool {
        !matches!(self, LatchState::Armed)
    }
}
