// src/record/packed.rs
//! Presence-flagged 15-bit fields.
//!
//! Bit 7 of the first byte says whether a value is stored; the remaining
//! 15 bits (first byte low 7 bits, then the second byte) hold
//! `value / PACKED_SCALE + bias`.

/// Presence bit in the first byte of a packed field
pub const PRESENCE_BIT: u8 = 0x80;

/// Value units per raw count
pub const PACKED_SCALE: f64 = 0.1;

/// Pitch and roll are stored as `angle * 10 + 900`
pub const ATTITUDE_BIAS: f64 = 900.0;

/// Heading and sound velocity carry no bias
pub const NO_BIAS: f64 = 0.0;

const MAX_RAW: f64 = 0x7FFF as f64;

/// Decode a packed field, `None` when the presence bit is clear
pub fn decode_optional_packed(hi: u8, lo: u8, bias: f64) -> Option<f64> {
    if hi & PRESENCE_BIT == 0 {
        return None;
    }
    let raw = (((hi & !PRESENCE_BIT) as u16) << 8) | lo as u16;
    Some((raw as f64 - bias) * PACKED_SCALE)
}

/// Encode a packed field. Values outside the 15-bit range are clamped.
pub fn encode_optional_packed(value: Option<f64>, bias: f64) -> [u8; 2] {
    match value {
        None => [0, 0],
        Some(v) => {
            let raw = (v / PACKED_SCALE + bias).round().clamp(0.0, MAX_RAW) as u16;
            [PRESENCE_BIT | (raw >> 8) as u8, (raw & 0xFF) as u8]
        }
    }
}
