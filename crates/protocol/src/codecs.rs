//! Minecraft protocol field codecs
//!
//! Primitive field encodings used by the Java Edition protocol before
//! compression/encryption are negotiated. All multi-byte integers are
//! big-endian; variable-length integers use 7 data bits per byte with the
//! high bit as a continuation flag (LEB128, two's complement for negatives).

use bytes::{Buf, BufMut, BytesMut};
use mcproxy_core::{ProxyError, Result};

/// Maximum encoded size of a VarInt
pub const MAX_VARINT_LEN: usize = 5;

/// Default maximum string length in characters (protocol-wide limit)
pub const MAX_STRING_LEN: usize = 32767;

/// Write a VarInt
///
/// # Format
/// - 1 to 5 bytes
/// - Each byte: 7 bits of data + continuation bit (0x80)
/// - Negative values always take 5 bytes
#[inline]
pub fn write_varint(buf: &mut BytesMut, val: i32) {
    let mut val = val as u32;
    loop {
        if val & !0x7F == 0 {
            buf.put_u8(val as u8);
            return;
        }
        buf.put_u8((val & 0x7F) as u8 | 0x80);
        val >>= 7;
    }
}

/// Read a VarInt
///
/// Fails if the buffer runs out or the value does not terminate within
/// [`MAX_VARINT_LEN`] bytes.
#[inline]
pub fn read_varint<B: Buf>(buf: &mut B) -> Result<i32> {
    let mut val: u32 = 0;
    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(ProxyError::malformed("Not enough bytes for VarInt"));
        }
        let byte = buf.get_u8();
        val |= ((byte & 0x7F) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(val as i32);
        }
    }
    Err(ProxyError::malformed("VarInt is too big"))
}

/// Number of bytes `val` occupies when encoded as a VarInt
#[inline]
pub fn varint_len(val: i32) -> usize {
    let val = val as u32;
    match val {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}

/// Write a String
///
/// # Format
/// - VarInt: length in bytes
/// - UTF-8 bytes (not null-terminated)
#[inline]
pub fn write_string(buf: &mut BytesMut, val: &str) {
    write_varint(buf, val.len() as i32);
    buf.put_slice(val.as_bytes());
}

/// Read a String of at most `max_chars` characters
///
/// The byte length is checked against `max_chars * 4` before anything is
/// copied, so a hostile length prefix cannot force a large allocation.
pub fn read_string<B: Buf>(buf: &mut B, max_chars: usize) -> Result<String> {
    let len = read_varint(buf)?;
    if len < 0 {
        return Err(ProxyError::malformed(format!("Negative string length: {}", len)));
    }
    let len = len as usize;
    if len > max_chars * 4 {
        return Err(ProxyError::malformed(format!(
            "String length {} exceeds limit of {} characters",
            len, max_chars
        )));
    }
    if buf.remaining() < len {
        return Err(ProxyError::malformed("Not enough bytes for String"));
    }

    let bytes = buf.copy_to_bytes(len);
    let s = String::from_utf8(bytes.to_vec())
        .map_err(|e| ProxyError::malformed(format!("Invalid UTF-8: {}", e)))?;

    if s.chars().count() > max_chars {
        return Err(ProxyError::malformed(format!(
            "String exceeds limit of {} characters",
            max_chars
        )));
    }
    Ok(s)
}

/// Write an Unsigned Short (2 bytes, big-endian)
#[inline]
pub fn write_ushort(buf: &mut BytesMut, val: u16) {
    buf.put_u16(val);
}

/// Read an Unsigned Short
#[inline]
pub fn read_ushort<B: Buf>(buf: &mut B) -> Result<u16> {
    if buf.remaining() < 2 {
        return Err(ProxyError::malformed("Not enough bytes for Unsigned Short"));
    }
    Ok(buf.get_u16())
}

/// Write a single Byte
#[inline]
pub fn write_byte(buf: &mut BytesMut, val: u8) {
    buf.put_u8(val);
}

/// Read a single Byte
#[inline]
pub fn read_byte<B: Buf>(buf: &mut B) -> Result<u8> {
    if !buf.has_remaining() {
        return Err(ProxyError::malformed("Not enough bytes for Byte"));
    }
    Ok(buf.get_u8())
}

/// Write a Long (8 bytes, big-endian, signed)
#[inline]
pub fn write_long(buf: &mut BytesMut, val: i64) {
    buf.put_i64(val);
}

/// Read a Long
#[inline]
pub fn read_long<B: Buf>(buf: &mut B) -> Result<i64> {
    if buf.remaining() < 8 {
        return Err(ProxyError::malformed("Not enough bytes for Long"));
    }
    Ok(buf.get_i64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_known_encodings() {
        let cases: &[(i32, &[u8])] = &[
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7f]),
            (128, &[0x80, 0x01]),
            (255, &[0xff, 0x01]),
            (25565, &[0xdd, 0xc7, 0x01]),
            (2097151, &[0xff, 0xff, 0x7f]),
            (i32::MAX, &[0xff, 0xff, 0xff, 0xff, 0x07]),
            (-1, &[0xff, 0xff, 0xff, 0xff, 0x0f]),
            (i32::MIN, &[0x80, 0x80, 0x80, 0x80, 0x08]),
        ];

        for (val, expected) in cases {
            let mut buf = BytesMut::new();
            write_varint(&mut buf, *val);
            assert_eq!(&buf[..], *expected, "Failed encoding {}", val);
            assert_eq!(varint_len(*val), expected.len(), "Wrong length for {}", val);

            let decoded = read_varint(&mut &expected[..]).unwrap();
            assert_eq!(decoded, *val, "Failed decoding {}", val);
        }
    }

    #[test]
    fn test_varint_too_big() {
        let bytes = [0x80u8, 0x80, 0x80, 0x80, 0x80, 0x01];
        let err = read_varint(&mut &bytes[..]).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_varint_truncated() {
        let bytes = [0x80u8, 0x80];
        assert!(read_varint(&mut &bytes[..]).is_err());
        assert!(read_varint(&mut &[0u8; 0][..]).is_err());
    }

    #[test]
    fn test_string_with_suffix_bytes() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "example.com\0FML\0");
        let decoded = read_string(&mut buf, 255).unwrap();
        assert_eq!(decoded, "example.com\0FML\0");
    }

    #[test]
    fn test_string_length_limit() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "abcdef");
        assert!(read_string(&mut buf.clone(), 5).is_err());
        assert_eq!(read_string(&mut buf, 6).unwrap(), "abcdef");
    }

    #[test]
    fn test_string_hostile_length_prefix() {
        // Claims 2 MiB of data with only 3 bytes present
        let mut buf = BytesMut::new();
        write_varint(&mut buf, 2_000_000);
        buf.put_slice(b"abc");
        let err = read_string(&mut buf, MAX_STRING_LEN).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_string_negative_length() {
        let mut buf = BytesMut::new();
        write_varint(&mut buf, -5);
        assert!(read_string(&mut buf, MAX_STRING_LEN).is_err());
    }

    #[test]
    fn test_string_invalid_utf8() {
        let bytes = [0x02u8, 0xc3, 0x28];
        assert!(read_string(&mut &bytes[..], MAX_STRING_LEN).is_err());
    }

    #[test]
    fn test_fixed_width_fields() {
        let mut buf = BytesMut::new();
        write_ushort(&mut buf, 25565);
        write_byte(&mut buf, 2);
        write_long(&mut buf, -42);
        assert_eq!(&buf[..3], &[0x63, 0xdd, 0x02]);

        assert_eq!(read_ushort(&mut buf).unwrap(), 25565);
        assert_eq!(read_byte(&mut buf).unwrap(), 2);
        assert_eq!(read_long(&mut buf).unwrap(), -42);
        assert!(read_byte(&mut buf).is_err());
        assert!(read_ushort(&mut buf).is_err());
        assert!(read_long(&mut buf).is_err());
    }
}
