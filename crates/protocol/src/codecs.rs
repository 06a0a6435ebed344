//! EO protocol number codec
//!
//! Unsigned integers are written base-253, least significant digit first,
//! with every digit offset by +1 so that encoded bytes fall in 1..=253.
//! Digit positions above the value's magnitude are written as 254.
//! The codec never emits byte 0.

use bytes::{Buf, BufMut, BytesMut};
use eoclient_core::{EoError, Result};

/// Exclusive upper bound of the value representable with 1, 2, 3 and 4 bytes
pub const NUMBER_MAX: [u64; 4] = [253, 64_009, 16_194_277, 4_097_152_081];

/// Written in digit positions above the value's magnitude
pub const NO_DIGIT_BYTE: u8 = 254;

/// Reserved/unused slot in fixed-layout records
///
/// Shares its value with [`NO_DIGIT_BYTE`] but is a record-layout concept:
/// padding is never decoded as a number.
pub const PADDING_BYTE: u8 = 254;

/// Caller-level "absent" marker; never produced by [`encode_number`]
pub const ABSENT_BYTE: u8 = 0;

/// Terminator for break strings
pub const BREAK_BYTE: u8 = 255;

pub const CHAR_WIDTH: usize = 1;
pub const SHORT_WIDTH: usize = 2;
pub const THREE_WIDTH: usize = 3;
pub const INT_WIDTH: usize = 4;

/// Types with a fixed EO binary representation
pub trait EoSerializable: Sized {
    /// Encoded size in bytes
    const DATA_SIZE: usize;

    fn write_eo(&self, buf: &mut BytesMut) -> Result<()>;
    fn read_eo(buf: &mut BytesMut) -> Result<Self>;
}

fn check_width(width: usize) -> Result<()> {
    if (CHAR_WIDTH..=INT_WIDTH).contains(&width) {
        Ok(())
    } else {
        Err(EoError::InvalidWidth(width))
    }
}

/// Largest value that fits in `width` encoded bytes
pub fn max_value(width: usize) -> Result<u32> {
    check_width(width)?;
    Ok((NUMBER_MAX[width - 1] - 1) as u32)
}

/// Encode `value` into exactly `width` bytes
///
/// # Errors
/// - `InvalidWidth` if `width` is not 1..=4
/// - `EncodingOverflow` if `value` does not fit in `width` bytes
pub fn encode_number(value: u32, width: usize) -> Result<Vec<u8>> {
    check_width(width)?;

    let original = value as u64;
    if original >= NUMBER_MAX[width - 1] {
        return Err(EoError::EncodingOverflow { value: original, width });
    }

    let mut bytes = vec![NO_DIGIT_BYTE; width];
    let mut remaining = original;

    for index in (1..width).rev() {
        let base = NUMBER_MAX[index - 1];
        if original >= base {
            bytes[index] = (remaining / base + 1) as u8;
            remaining %= base;
        }
    }
    bytes[0] = (remaining + 1) as u8;

    Ok(bytes)
}

#[inline]
fn decode_digit(byte: u8) -> u64 {
    match byte {
        NO_DIGIT_BYTE => 0,
        // Raw zero bytes from the server read as 128 before the offset
        ABSENT_BYTE => 127,
        b => (b - 1) as u64,
    }
}

/// Decode a 1 to 4 byte encoded number
///
/// The slice must hold exactly the field's width.
pub fn decode_number(bytes: &[u8]) -> Result<u32> {
    check_width(bytes.len())?;

    let value = bytes.iter().enumerate().fold(0u64, |acc, (index, &byte)| {
        let base = if index == 0 { 1 } else { NUMBER_MAX[index - 1] };
        acc + decode_digit(byte) * base
    });

    u32::try_from(value)
        .map_err(|_| EoError::InvalidData(format!("Decoded number out of range: {}", value)))
}

/// Append `value` encoded at `width` bytes
#[inline]
pub fn write_number(buf: &mut BytesMut, value: u32, width: usize) -> Result<()> {
    let bytes = encode_number(value, width)?;
    buf.put_slice(&bytes);
    Ok(())
}

/// Consume and decode a `width`-byte number
#[inline]
pub fn read_number<B: Buf>(buf: &mut B, width: usize) -> Result<u32> {
    check_width(width)?;
    if buf.remaining() < width {
        return Err(EoError::TruncatedFrame {
            needed: width,
            available: buf.remaining(),
        });
    }

    let mut bytes = [0u8; INT_WIDTH];
    buf.copy_to_slice(&mut bytes[..width]);
    decode_number(&bytes[..width])
}

/// Append a string as a 1-byte encoded length followed by raw bytes
pub fn write_prefixed_string(buf: &mut BytesMut, val: &str) -> Result<()> {
    let bytes = val.as_bytes();
    write_number(buf, bytes.len() as u32, CHAR_WIDTH)?;
    buf.put_slice(bytes);
    Ok(())
}

/// Read a string written by [`write_prefixed_string`]
pub fn read_prefixed_string<B: Buf>(buf: &mut B) -> Result<String> {
    let len = read_number(buf, CHAR_WIDTH)? as usize;
    read_fixed_string(buf, len)
}

/// Read `len` raw bytes as a string (one char per byte)
pub fn read_fixed_string<B: Buf>(buf: &mut B, len: usize) -> Result<String> {
    if buf.remaining() < len {
        return Err(EoError::TruncatedFrame {
            needed: len,
            available: buf.remaining(),
        });
    }
    let bytes = buf.copy_to_bytes(len);
    Ok(bytes_to_string(&bytes))
}

/// Latin-1 view of raw protocol bytes
#[inline]
pub fn bytes_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
