//! ADC081C021 I/O buffer voltage monitor
//!
//! Two of these converters sit on the shared I2C bus, one per I/O buffer,
//! each digitizing its buffer's rail and latching out-of-band excursions.
//! Their open-drain alert outputs are wired-OR onto one active-low line.
//!
//! # Register protocol
//!
//! Every register access is a multi-step bus transaction: address the
//! device for writing, send the register pointer, then either re-address
//! for reading or keep writing payload bytes. A failed step aborts the
//! whole access with a stop condition so the bus is released on every exit
//! path; no partial data escapes. Each call performs exactly one
//! transaction and never retries; retry policy belongs to the caller.

use metron_hal::{Direction, I2cBus, InputPin};

use super::alert::{AlertRange, AlertStatus, LatchState, SampleRate};
use super::codec;

/// ADC081C021 register map and bit assignments
pub mod reg {
    /// Current conversion result (2 bytes, read-only)
    pub const CONV_RESULT: u8 = 0x0;
    /// Latched under/over range flags (1 byte, write flags back to clear)
    pub const ALERT_STATUS: u8 = 0x1;
    /// Operating mode and alert pin control (1 byte)
    pub const CONFIGURATION: u8 = 0x2;
    /// Lower alert limit (2 bytes)
    pub const LOW_LIMIT: u8 = 0x3;
    /// Upper alert limit (2 bytes)
    pub const HIGH_LIMIT: u8 = 0x4;
    /// Alert hysteresis (2 bytes, unused by this driver)
    pub const HYSTERESIS: u8 = 0x5;
    /// Lowest conversion seen (2 bytes, unused by this driver)
    pub const LOWEST_CONV: u8 = 0x6;
    /// Highest conversion seen (2 bytes, unused by this driver)
    pub const HIGHEST_CONV: u8 = 0x7;

    /// Conversion result bit 15: alert flag (flag output is never enabled
    /// here, so the bit stays clear)
    pub const CONV_ALERT_FLAG: u16 = 1 << 15;
    /// Status bit: voltage fell below the low limit
    pub const STATUS_UNDER_RANGE: u8 = 1 << 0;
    /// Status bit: voltage rose above the high limit
    pub const STATUS_OVER_RANGE: u8 = 1 << 1;
    /// Configuration bit: alert pin polarity (0 = active low)
    pub const CONFIG_POLARITY: u8 = 1 << 0;
    /// Configuration bit: drive the alert pin on excursions
    pub const CONFIG_ALERT_PIN_EN: u8 = 1 << 2;
    /// Configuration bit: mirror excursions into conversion result bit 15
    pub const CONFIG_ALERT_FLAG_EN: u8 = 1 << 3;
    /// Configuration bit: hold latched flags until written back
    pub const CONFIG_ALERT_HOLD: u8 = 1 << 4;
}

/// Selector bit for I/O buffer A
pub const BUFFER_A: u8 = 1 << 0;
/// Selector bit for I/O buffer B
pub const BUFFER_B: u8 = 1 << 1;

/// One monitored buffer: logical selector bit and converter bus address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BufferDesc {
    selector: u8,
    address: u8,
}

/// Monitored buffers in polling order
///
/// The two converters are identical parts at distinct addresses, so both
/// configuration and polling iterate this table instead of carrying
/// per-device code paths.
const BUFFERS: &[BufferDesc] = &[
    BufferDesc {
        selector: BUFFER_A,
        address: 0x54,
    },
    BufferDesc {
        selector: BUFFER_B,
        address: 0x55,
    },
];

fn resolve(selector: u8) -> Option<&'static BufferDesc> {
    BUFFERS.iter().find(|buffer| buffer.selector == selector)
}

/// Voltage monitor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// A bus primitive failed; the transaction was aborted with a stop
    Bus(E),
    /// Selector bit not present in the buffer table
    UnknownBuffer,
    /// Alert thresholds above the voltage ceiling or inverted
    InvalidRange,
}

/// Dual-rail voltage monitor built from two ADC081C021 converters
///
/// Owns the bus handle and the shared alert line input. The devices
/// themselves hold all configuration and latched state; the driver keeps
/// nothing between calls.
///
/// The alert input must already be configured as a level-triggered
/// interrupt source at system init; this driver only samples its level.
pub struct Adc081Monitor<B, P> {
    bus: B,
    alert_pin: P,
}

impl<B: I2cBus, P: InputPin> Adc081Monitor<B, P> {
    /// Create a new monitor over the given bus and alert line input
    pub fn new(bus: B, alert_pin: P) -> Self {
        Self { bus, alert_pin }
    }

    /// Release the bus and pin handles
    pub fn release(self) -> (B, P) {
        (self.bus, self.alert_pin)
    }

    /// Read `buf.len()` bytes from a device register
    ///
    /// Selects the register with an addressed write, then re-opens the
    /// transaction for reading; the read itself concludes the transfer.
    fn read_register(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Error<B::Error>> {
        if let Err(e) = self.try_read_register(address, register, buf) {
            // Never leave the bus with a transaction open
            let _ = self.bus.stop();
            return Err(Error::Bus(e));
        }
        Ok(())
    }

    fn try_read_register(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), B::Error> {
        self.bus.start(address, Direction::Write)?;
        self.bus.write(&[register])?;
        self.bus.start(address, Direction::Read)?;
        self.bus.read(buf)
    }

    /// Write `data` to a device register
    fn write_register(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), Error<B::Error>> {
        if let Err(e) = self.try_write_register(address, register, data) {
            let _ = self.bus.stop();
            return Err(Error::Bus(e));
        }
        // Closing the transaction is itself fallible; a failed stop is a
        // failed write even though the payload went out.
        self.bus.stop().map_err(Error::Bus)
    }

    fn try_write_register(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), B::Error> {
        self.bus.start(address, Direction::Write)?;
        self.bus.write(&[register])?;
        self.bus.write(data)
    }

    /// Level of the shared alert line (asserted low)
    ///
    /// Cheap pre-check before a poll round; touches no bus.
    pub fn is_alert_line_active(&self) -> bool {
        self.alert_pin.is_low()
    }

    /// One-shot read of a buffer's current rail voltage in millivolts
    ///
    /// Neither consults nor alters alert state.
    pub fn measure(&mut self, selector: u8) -> Result<u16, Error<B::Error>> {
        let buffer = resolve(selector).ok_or(Error::UnknownBuffer)?;

        let mut code_bytes = [0u8; 2];
        self.read_register(buffer.address, reg::CONV_RESULT, &mut code_bytes)?;
        Ok(codec::decode(code_bytes))
    }

    /// Configure the alert band on every buffer selected by `mask`
    ///
    /// The reserved (0, [`MAX_VOLTAGE_MV`](codec::MAX_VOLTAGE_MV)) pair
    /// disables alerting; it always means "disable", so an enabled band
    /// spanning the full range cannot be expressed. Any other band arms
    /// the alert pin output with the excursion held latched until
    /// acknowledged by a clearing poll.
    ///
    /// Selector bits without a registry entry are skipped. Buffers are
    /// written in table order; on a bus failure the operation stops where
    /// it is, so buffers already written keep the new band (no rollback).
    pub fn set_alert(&mut self, mask: u8, low_mv: u16, high_mv: u16) -> Result<(), Error<B::Error>> {
        if low_mv > codec::MAX_VOLTAGE_MV || high_mv > codec::MAX_VOLTAGE_MV || low_mv > high_mv {
            return Err(Error::InvalidRange);
        }

        let (low_bytes, high_bytes, control) = if AlertRange::is_sentinel(low_mv, high_mv) {
            // Disabled: full-scale limits, everything in the control word off
            ([0x00, 0x00], [0x0f, 0xf0], 0u8)
        } else {
            (
                codec::encode(low_mv),
                codec::encode(high_mv),
                reg::CONFIG_ALERT_PIN_EN | reg::CONFIG_ALERT_HOLD | SampleRate::Ksps1.bits(),
            )
        };

        for buffer in BUFFERS {
            if mask & buffer.selector == 0 {
                continue;
            }

            self.write_register(buffer.address, reg::LOW_LIMIT, &low_bytes)?;
            self.write_register(buffer.address, reg::HIGH_LIMIT, &high_bytes)?;
            // A stale latch from a previous band would re-trigger the
            // moment the new configuration arms, so it goes first.
            self.write_register(buffer.address, reg::ALERT_STATUS, &[AlertStatus::all().bits()])?;
            self.write_register(buffer.address, reg::CONFIGURATION, &[control])?;
        }

        Ok(())
    }

    /// Read back a buffer's alert band
    ///
    /// An all-zero control word is the disabled state; the limit registers
    /// are not read in that case.
    pub fn get_alert(&mut self, selector: u8) -> Result<AlertRange, Error<B::Error>> {
        let buffer = resolve(selector).ok_or(Error::UnknownBuffer)?;

        let mut control = [0u8; 1];
        self.read_register(buffer.address, reg::CONFIGURATION, &mut control)?;
        if control[0] == 0 {
            return Ok(AlertRange::disabled());
        }

        let mut code_bytes = [0u8; 2];
        self.read_register(buffer.address, reg::LOW_LIMIT, &mut code_bytes)?;
        let low_mv = codec::decode(code_bytes);
        self.read_register(buffer.address, reg::HIGH_LIMIT, &mut code_bytes)?;
        let high_mv = codec::decode(code_bytes);

        Ok(AlertRange {
            low_mv,
            high_mv,
            enabled: true,
            sample_rate: SampleRate::Ksps1,
        })
    }

    /// Scan both converters for latched alerts
    ///
    /// Returns the selector mask of alerting buffers. With `clear` set,
    /// each latched buffer is acknowledged (write-to-clear) and its pin
    /// output re-armed; without it the pin output is disarmed and the
    /// latch kept, so a caller can walk multiple simultaneous alerts on
    /// the shared line with `clear` false passes and finish with a single
    /// `clear` true pass.
    ///
    /// Any bus failure aborts the whole round; the mask accumulated so far
    /// is discarded.
    pub fn poll(&mut self, clear: bool) -> Result<u8, Error<B::Error>> {
        let mut mask = 0;

        for buffer in BUFFERS {
            let mut status_byte = [0u8; 1];
            self.read_register(buffer.address, reg::ALERT_STATUS, &mut status_byte)?;

            let status = AlertStatus::from_bits(status_byte[0]);
            if !status.any() {
                continue;
            }
            mask |= buffer.selector;

            let mut control = [0u8; 1];
            self.read_register(buffer.address, reg::CONFIGURATION, &mut control)?;

            let state = LatchState::from_registers(status, control[0]);
            match state.after_poll(clear) {
                LatchState::Armed => {
                    // Acknowledge the latch, then re-arm the pin output for
                    // the next excursion.
                    self.write_register(buffer.address, reg::ALERT_STATUS, &status_byte)?;
                    self.write_register(
                        buffer.address,
                        reg::CONFIGURATION,
                        &[control[0] | reg::CONFIG_ALERT_PIN_EN],
                    )?;
                }
                LatchState::LatchedDisarmed => {
                    // Keep the latch, silence this device's pull on the
                    // shared line.
                    self.write_register(
                        buffer.address,
                        reg::CONFIGURATION,
                        &[control[0] & !reg::CONFIG_ALERT_PIN_EN],
                    )?;
                }
                // A buffer the poll visited never stays pin-armed while
                // latched.
                LatchState::LatchedArmed => {}
            }
        }

        Ok(mask)
    }
}
