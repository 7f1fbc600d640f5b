//! Raw conversion code / millivolt arithmetic
//!
//! The converter reports its conversion left-aligned in a 16-bit big-endian
//! register word: 0x000 = 0 mV, 0xff0 = 6600 mV, 16 LSB = 25.9 mV. The
//! limit registers use the same layout, so one pair of functions serves
//! both directions.

/// Highest voltage the reference circuit can present to a converter, in mV
///
/// The highest code word actually achievable is 0xd50 = 5500 mV, so
/// arithmetic on decoded values never overflows a u16.
pub const MAX_VOLTAGE_MV: u16 = 5500;

/// One quantization step of the left-aligned code, in raw register units
pub const CODE_STEP: u16 = 16;

/// Convert a register word to millivolts
///
/// The low 4 bits of the word are padding and are discarded; the remaining
/// 12-bit value scales at 25.9 mV per step, truncating. Bit 15 of the
/// conversion-result register is the alert flag, which stays clear because
/// this driver never enables the flag output.
pub fn decode(code_bytes: [u8; 2]) -> u16 {
    let code_word = u16::from_be_bytes(code_bytes);
    (u32::from(code_word >> 4) * 259 / 10) as u16
}

/// Convert millivolts to a register word for the limit registers
///
/// Inverse of [`decode`] up to quantization: `decode(encode(mv))` lands
/// within one code step below `mv`. Callers keep `mv` at or below
/// [`MAX_VOLTAGE_MV`]; the alert configuration path enforces it.
pub fn encode(millivolts: u16) -> [u8; 2] {
    let code_word = ((u32::from(millivolts) * 10 / 259) << 4) as u16;
    code_word.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_zero() {
        assert_eq!(decode([0x00, 0x00]), 0);
    }

    #[test]
    fn test_decode_full_scale() {
        // 0x0ff0 -> code 0x0ff, then (0x0ff * 259) / 10 truncated
        assert_eq!(decode([0x0f, 0xf0]), (0x0ff_u32 * 259 / 10) as u16);
    }

    #[test]
    fn test_decode_discards_low_nibble() {
        assert_eq!(decode([0x0d, 0x5f]), decode([0x0d, 0x50]));
    }

    #[test]
    fn test_decode_truncates() {
        // One code step is 25.9 mV; a single step reads as 25, not 26
        assert_eq!(decode([0x00, 0x10]), 25);
    }

    #[test]
    fn test_encode_splits_big_endian() {
        // 5500 * 10 / 259 = 212 = 0xd4, left-aligned to 0x0d40
        assert_eq!(encode(5500), [0x0d, 0x40]);
    }

    #[test]
    fn test_encoded_max_voltage_stays_in_band() {
        assert!(decode(encode(MAX_VOLTAGE_MV)) <= MAX_VOLTAGE_MV);
    }

    proptest! {
        /// Re-encoding a decoded value moves the code by at most one step
        #[test]
        fn test_round_trip_within_one_step(code in 0u16..=0xff) {
            let raw = code << 4;
            let mv = decode(raw.to_be_bytes());
            let requantized = u16::from_be_bytes(encode(mv));
            prop_assert!(raw.abs_diff(requantized) <= CODE_STEP);
        }

        /// Decoded millivolts drift by less than one step across the trip
        #[test]
        fn test_round_trip_millivolts(code in 0u16..=0xff) {
            let raw = code << 4;
            let mv = decode(raw.to_be_bytes());
            let back = decode(encode(mv));
            prop_assert!(mv.abs_diff(back) <= 26);
        }
    }
}
