//! Hex digit primitives shared by the decoder and encoder

use crate::error::SRecordError;

/// Decode a single ASCII hex digit into its nibble value.
///
/// Accepts `0-9`, `A-F` and `a-f`.
pub fn decode_nibble(ch: u8) -> Result<u8, SRecordError> {
    match ch {
        b'0'..=b'9' => Ok(ch - b'0'),
        b'A'..=b'F' => Ok(ch - b'A' + 10),
        b'a'..=b'f' => Ok(ch - b'a' + 10),
        _ => Err(SRecordError::InvalidHexDigit(ch)),
    }
}

/// True if `buf` is non-empty and made only of hex digits
pub fn is_hex_digits(buf: &[u8]) -> bool {
    !buf.is_empty() && buf.iter().all(u8::is_ascii_hexdigit)
}

/// Accumulate hex digits big-endian into an integer.
///
/// Callers validate with [`is_hex_digits`] first; a non-hex digit is
/// treated as zero. At most eight digits are meaningful, anything longer
/// wraps.
pub fn hex_to_uint(buf: &[u8]) -> u32 {
    buf.iter().fold(0u32, |acc, &ch| {
        (acc << 4) | u32::from(decode_nibble(ch).unwrap_or(0))
    })
}

/// Decode a pair of hex digits into a byte
pub fn hex_pair_to_byte(pair: [u8; 2]) -> Result<u8, SRecordError> {
    Ok((decode_nibble(pair[0])? << 4) | decode_nibble(pair[1])?)
}
