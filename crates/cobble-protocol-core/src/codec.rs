//! Wire primitives shared by every legacy protocol variant: fixed-width big-endian
//! integers, bit-exact floats and length-prefixed UTF-16BE text.
//!
//! Readers take the packet slice and an absolute offset into it and bound-check
//! before touching any byte. Writers append to a `BytesMut`.

use bytes::{BufMut, BytesMut};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Not enough data: need {needed} bytes, have {available}")]
    NotEnoughData { needed: usize, available: usize },
    #[error("Text too long: {0} UTF-16 units")]
    TextTooLong(usize),
}

pub type CodecResult<T> = Result<T, CodecError>;

fn slice(buf: &[u8], offset: usize, len: usize) -> CodecResult<&[u8]> {
    let end = offset.saturating_add(len);
    buf.get(offset..end).ok_or(CodecError::NotEnoughData {
        needed: end,
        available: buf.len(),
    })
}

/// Read a single byte.
pub fn read_u8(buf: &[u8], offset: usize) -> CodecResult<u8> {
    Ok(slice(buf, offset, 1)?[0])
}

/// Read a big-endian unsigned 16-bit integer.
pub fn read_u16(buf: &[u8], offset: usize) -> CodecResult<u16> {
    let b = slice(buf, offset, 2)?;
    Ok(u16::from_be_bytes([b[0], b[1]]))
}

/// Read a big-endian signed 32-bit integer.
pub fn read_i32(buf: &[u8], offset: usize) -> CodecResult<i32> {
    let b = slice(buf, offset, 4)?;
    Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Read a 32-bit float transmitted as its raw IEEE-754 bit pattern.
pub fn read_f32(buf: &[u8], offset: usize) -> CodecResult<f32> {
    Ok(f32::from_bits(read_i32(buf, offset)? as u32))
}

pub fn write_u16(buf: &mut BytesMut, value: u16) {
    buf.put_u16(value);
}

pub fn write_i32(buf: &mut BytesMut, value: i32) {
    buf.put_i32(value);
}

/// Write a 32-bit float as its exact bit pattern (NaN payloads included).
pub fn write_f32(buf: &mut BytesMut, value: f32) {
    buf.put_u32(value.to_bits());
}

/// Byte length of the text body whose unit count is stored at `offset`.
/// The prefix counts UTF-16 units, so the body is twice as long in bytes.
pub fn read_text_len(buf: &[u8], offset: usize) -> CodecResult<usize> {
    Ok(read_u16(buf, offset)? as usize * 2)
}

/// Read length-prefixed UTF-16BE text. Unpaired surrogates decode as U+FFFD.
pub fn read_text(buf: &[u8], offset: usize) -> CodecResult<String> {
    let len = read_text_len(buf, offset)?;
    let body = slice(buf, offset + 2, len)?;
    let units = body
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    Ok(char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect())
}

/// Encoded body size of `text` in bytes, excluding the 2-byte prefix.
pub fn text_byte_len(text: &str) -> usize {
    text.encode_utf16().count() * 2
}

/// Write length-prefixed UTF-16BE text. The prefix stores the unit count (bytes / 2).
pub fn write_text(buf: &mut BytesMut, text: &str) -> CodecResult<()> {
    let units = text.encode_utf16().count();
    let count = u16::try_from(units).map_err(|_| CodecError::TextTooLong(units))?;
    buf.reserve(2 + units * 2);
    buf.put_u16(count);
    for unit in text.encode_utf16() {
        buf.put_u16(unit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_are_big_endian() {
        let mut buf = BytesMut::new();
        write_u16(&mut buf, 0x1234);
        write_i32(&mut buf, -2);
        assert_eq!(buf.to_vec(), vec![0x12, 0x34, 0xFF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(read_u16(&buf, 0).unwrap(), 0x1234);
        assert_eq!(read_i32(&buf, 2).unwrap(), -2);
    }

    #[test]
    fn test_float_bit_patterns_survive() {
        let patterns = [
            0.0f32.to_bits(),
            (-0.0f32).to_bits(),
            f32::NAN.to_bits(),
            0x7FC0_1234, // NaN with payload
            0xFF80_0001, // signalling NaN, sign bit set
            f32::INFINITY.to_bits(),
            f32::NEG_INFINITY.to_bits(),
            1.59375f32.to_bits(),
        ];
        for bits in patterns {
            let mut buf = BytesMut::new();
            write_f32(&mut buf, f32::from_bits(bits));
            assert_eq!(buf.to_vec(), bits.to_be_bytes().to_vec());
            assert_eq!(read_f32(&buf, 0).unwrap().to_bits(), bits, "{bits:#010X}");
        }
    }

    #[test]
    fn test_text_roundtrip() {
        for text in ["", "Steve", "Loading level...", "§cred §fwhite", "日本語", "𝄞 clef"] {
            let mut buf = BytesMut::new();
            write_text(&mut buf, text).unwrap();
            assert_eq!(read_text_len(&buf, 0).unwrap(), buf.len() - 2);
            assert_eq!(read_text_len(&buf, 0).unwrap(), text_byte_len(text));
            assert_eq!(read_text(&buf, 0).unwrap(), text);
        }
    }

    #[test]
    fn test_text_prefix_counts_units() {
        let mut buf = BytesMut::new();
        write_text(&mut buf, "abc").unwrap();
        assert_eq!(&buf[..2], &[0x00, 0x03]);
        assert_eq!(buf.len(), 2 + 6);
    }

    #[test]
    fn test_text_body_bound_checked() {
        let mut buf = BytesMut::new();
        write_text(&mut buf, "Hello").unwrap();
        let truncated = &buf[..buf.len() - 1];
        assert!(matches!(
            read_text(truncated, 0),
            Err(CodecError::NotEnoughData { .. })
        ));
    }

    #[test]
    fn test_text_too_long() {
        let text = "a".repeat(u16::MAX as usize + 1);
        let mut buf = BytesMut::new();
        assert!(matches!(
            write_text(&mut buf, &text),
            Err(CodecError::TextTooLong(_))
        ));
    }

    #[test]
    fn test_reads_past_end_fail() {
        let buf = [0u8; 3];
        assert!(read_i32(&buf, 0).is_err());
        assert!(read_u16(&buf, 2).is_err());
        assert!(read_u8(&buf, 3).is_err());
        assert!(read_u8(&buf, usize::MAX).is_err());
    }
}
