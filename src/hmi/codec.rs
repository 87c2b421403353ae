//! Wire codec: big-endian fixed-point and IEEE-754 fields.
//!
//! Everything numeric on the HMI link goes through this module, in both
//! directions — there is exactly one place where byte order and scaling
//! live.
//!
//! - Time: unsigned 16-bit, quarter-second units (`round(s × 4)`), good
//!   for ~4.5 hours of recipe.
//! - Temperature: signed 16-bit, quarter-degree units (`round(°C × 4)`).
//! - PID gains: IEEE-754 single precision, 4 bytes, MSB first.

/// Encode seconds as a big-endian quarter-second field.
pub fn encode_time(secs: f32) -> [u8; 2] {
    let quarters = (secs * 4.0).round().clamp(0.0, f32::from(u16::MAX)) as u16;
    quarters.to_be_bytes()
}

/// Decode a big-endian quarter-second field into seconds.
pub fn decode_time(bytes: [u8; 2]) -> f32 {
    f32::from(u16::from_be_bytes(bytes)) / 4.0
}

/// Encode °C as a big-endian signed quarter-degree field.
pub fn encode_temperature(celsius: f32) -> [u8; 2] {
    let quarters = (celsius * 4.0)
        .round()
        .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
    quarters.to_be_bytes()
}

/// Decode a big-endian signed quarter-degree field into °C.
pub fn decode_temperature(bytes: [u8; 2]) -> f32 {
    f32::from(i16::from_be_bytes(bytes)) / 4.0
}

/// Encode an f32 as 4 bytes, most significant byte first.
pub fn encode_f32(value: f32) -> [u8; 4] {
    value.to_bits().to_be_bytes()
}

/// Reconstruct an f32 from 4 big-endian bytes.
pub fn decode_f32(bytes: [u8; 4]) -> f32 {
    f32::from_bits(u32::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_reference_vector() {
        // 30.0 s → 120 quarter-seconds → 0x0078
        assert_eq!(encode_time(30.0), [0x00, 0x78]);
        assert!((decode_time([0x00, 0x78]) - 30.0).abs() < 1e-6);
    }

    #[test]
    fn temperature_reference_vector() {
        // 150.25 °C → 601 quarter-degrees → 0x0259
        assert_eq!(encode_temperature(150.25), [0x02, 0x59]);
        assert!((decode_temperature([0x02, 0x59]) - 150.25).abs() < 1e-6);
    }

    #[test]
    fn negative_temperature_is_twos_complement() {
        // −0.25 °C → −1 → 0xFFFF
        assert_eq!(encode_temperature(-0.25), [0xFF, 0xFF]);
        assert!((decode_temperature([0xFF, 0xFF]) + 0.25).abs() < 1e-6);
    }

    #[test]
    fn time_saturates_instead_of_wrapping() {
        assert_eq!(encode_time(-5.0), [0x00, 0x00]);
        assert_eq!(encode_time(1.0e9), [0xFF, 0xFF]);
    }

    #[test]
    fn f32_reference_vector() {
        // 1.5f32 = 0x3FC00000
        assert_eq!(encode_f32(1.5), [0x3F, 0xC0, 0x00, 0x00]);
        assert_eq!(decode_f32([0x3F, 0xC0, 0x00, 0x00]), 1.5);
    }

    #[test]
    fn f32_roundtrip_is_bit_exact() {
        for v in [0.0f32, -0.0, 1.0, -2.75, 3.141_592_7, f32::MIN_POSITIVE] {
            assert_eq!(decode_f32(encode_f32(v)).to_bits(), v.to_bits());
        }
    }

    #[test]
    fn quarter_unit_roundtrip() {
        for s in [0.0f32, 0.25, 7.5, 30.0, 3600.0] {
            assert!((decode_time(encode_time(s)) - s).abs() < 1e-4);
        }
        for t in [-40.0f32, -0.25, 0.0, 150.25, 300.0] {
            assert!((decode_temperature(encode_temperature(t)) - t).abs() < 1e-4);
        }
    }
}
