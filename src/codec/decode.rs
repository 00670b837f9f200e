//! Bytes → typed values.
//!
//! Ascii scanners follow the C stream conventions hosts expect from a
//! serial console: leading whitespace is skipped, a number ends at the first
//! byte that cannot extend it, and that byte stays in the stream. A scanner
//! that fails consumes nothing but the skipped whitespace.

use super::source::ByteSource;
use crate::port::PortError;
use tracing::warn;

/// Longest whitespace-delimited token `scan_token` will return.
pub const MAX_TOKEN_LEN: usize = 1024;

fn skip_whitespace<S: ByteSource + ?Sized>(src: &mut S) -> Result<(), PortError> {
    while let Some(b) = src.peek_at(0)? {
        if !b.is_ascii_whitespace() {
            break;
        }
        src.consume(1);
    }
    Ok(())
}

fn digit_value(b: u8, radix: u32) -> Option<u32> {
    (b as char).to_digit(radix)
}

/// Parse an integer with automatic base detection.
///
/// Accepts an optional sign, then `0x`/`0X` hex, a leading-`0` octal, or
/// decimal digits. Out-of-range values clamp to `i64::MIN`/`i64::MAX`.
/// Returns `None` if no digits follow.
pub fn scan_int<S: ByteSource + ?Sized>(src: &mut S) -> Result<Option<i64>, PortError> {
    skip_whitespace(src)?;

    let mut off = 0;
    let negative = match src.peek_at(0)? {
        Some(b'-') => {
            off = 1;
            true
        }
        Some(b'+') => {
            off = 1;
            false
        }
        _ => false,
    };

    let mut radix = 10;
    if src.peek_at(off)? == Some(b'0') {
        let is_hex_prefix = matches!(src.peek_at(off + 1)?, Some(b'x' | b'X'));
        if is_hex_prefix && src.peek_at(off + 2)?.is_some_and(|b| b.is_ascii_hexdigit()) {
            radix = 16;
            off += 2;
        } else {
            radix = 8;
        }
    }

    let mut magnitude: u64 = 0;
    let mut overflow = false;
    let mut digits = 0;
    while let Some(d) = src.peek_at(off)?.and_then(|b| digit_value(b, radix)) {
        match magnitude
            .checked_mul(radix as u64)
            .and_then(|m| m.checked_add(d as u64))
        {
            Some(m) => magnitude = m,
            None => overflow = true,
        }
        digits += 1;
        off += 1;
    }

    if digits == 0 {
        return Ok(None);
    }
    src.consume(off);

    let value = if negative {
        if overflow || magnitude > i64::MIN.unsigned_abs() {
            i64::MIN
        } else {
            (magnitude as i64).wrapping_neg()
        }
    } else if overflow || magnitude > i64::MAX as u64 {
        i64::MAX
    } else {
        magnitude as i64
    };
    Ok(Some(value))
}

fn matches_word<S: ByteSource + ?Sized>(
    src: &mut S,
    off: usize,
    word: &[u8],
) -> Result<bool, PortError> {
    for (i, expected) in word.iter().enumerate() {
        match src.peek_at(off + i)? {
            Some(b) if b.eq_ignore_ascii_case(expected) => {}
            _ => return Ok(false),
        }
    }
    Ok(true)
}

/// Parse a decimal floating-point number (`1`, `-2.5`, `.5`, `3e-2`,
/// `inf`, `nan`). Returns `None` if no number starts here.
pub fn scan_float<S: ByteSource + ?Sized>(src: &mut S) -> Result<Option<f64>, PortError> {
    skip_whitespace(src)?;

    let mut off = 0;
    if matches!(src.peek_at(0)?, Some(b'-' | b'+')) {
        off = 1;
    }

    for word in [&b"infinity"[..], b"inf", b"nan"] {
        if matches_word(src, off, word)? {
            let text = src.take(off + word.len());
            return Ok(String::from_utf8_lossy(&text).parse().ok());
        }
    }

    let mut mantissa_digits = 0;
    while src.peek_at(off)?.is_some_and(|b| b.is_ascii_digit()) {
        mantissa_digits += 1;
        off += 1;
    }
    if src.peek_at(off)? == Some(b'.') {
        off += 1;
        while src.peek_at(off)?.is_some_and(|b| b.is_ascii_digit()) {
            mantissa_digits += 1;
            off += 1;
        }
    }
    if mantissa_digits == 0 {
        return Ok(None);
    }

    // An exponent only counts if at least one digit follows it.
    if matches!(src.peek_at(off)?, Some(b'e' | b'E')) {
        let mut exp_off = off + 1;
        if matches!(src.peek_at(exp_off)?, Some(b'-' | b'+')) {
            exp_off += 1;
        }
        if src.peek_at(exp_off)?.is_some_and(|b| b.is_ascii_digit()) {
            off = exp_off;
            while src.peek_at(off)?.is_some_and(|b| b.is_ascii_digit()) {
                off += 1;
            }
        }
    }

    let text = src.take(off);
    Ok(String::from_utf8_lossy(&text).parse().ok())
}

/// Read one whitespace-delimited token of at most `max` bytes.
pub fn scan_token<S: ByteSource + ?Sized>(
    src: &mut S,
    max: usize,
) -> Result<Option<String>, PortError> {
    skip_whitespace(src)?;
    let mut n = 0;
    while n < max && src.peek_at(n)?.is_some_and(|b| !b.is_ascii_whitespace()) {
        n += 1;
    }
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&src.take(n)).into_owned()))
}

/// Read one line of at most `max` bytes with trailing `\r`/`\n` removed.
pub fn read_line<S: ByteSource + ?Sized>(
    src: &mut S,
    max: usize,
) -> Result<Option<String>, PortError> {
    let Some(mut raw) = src.take_line(max)? else {
        return Ok(None);
    };
    while matches!(raw.last(), Some(b'\n' | b'\r')) {
        raw.pop();
    }
    Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
}

/// How many `width`-byte elements fit a read of `requested` into a buffer
/// of `capacity` bytes. Oversized requests are truncated with a warning.
pub fn clamp_count(requested: usize, width: usize, capacity: usize) -> usize {
    let fit = capacity / width;
    if requested > fit {
        warn!(
            "request size {} too large ({} bytes), truncating to {}",
            requested,
            requested.saturating_mul(width),
            fit
        );
        fit
    } else {
        requested
    }
}

/// Read up to `count` whole `width`-byte elements in one bounded read.
///
/// A trailing partial element is left in the stream.
pub fn read_elements<S: ByteSource + ?Sized>(
    src: &mut S,
    width: usize,
    count: usize,
) -> Result<Vec<u8>, PortError> {
    let available = src.available_up_to(width * count)?;
    Ok(src.take(available - available % width))
}

/// Little-endian unsigned integer of up to eight bytes, zero-extended.
pub fn decode_uint(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    let n = bytes.len().min(8);
    buf[..n].copy_from_slice(&bytes[..n]);
    u64::from_le_bytes(buf) as i64
}

/// Little-endian 32-bit unsigned integers.
pub fn decode_u32s(bytes: &[u8]) -> Vec<i64> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as i64)
        .collect()
}

/// Little-endian single-precision floats, widened.
pub fn decode_f32s(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SliceSource;
    use pretty_assertions::assert_eq;

    fn ints(input: &[u8]) -> (Vec<i64>, Vec<u8>) {
        let mut src = SliceSource::new(input);
        let mut out = Vec::new();
        while let Some(v) = scan_int(&mut src).unwrap() {
            out.push(v);
        }
        (out, src.remaining().to_vec())
    }

    #[test]
    fn test_scan_int_decimal_sequence() {
        assert_eq!(ints(b"10 20\n-3"), (vec![10, 20, -3], vec![]));
    }

    #[test]
    fn test_scan_int_bases() {
        assert_eq!(ints(b"0x1F 010 0 +7"), (vec![31, 8, 0, 7], vec![]));
    }

    #[test]
    fn test_scan_int_stops_at_garbage() {
        let (values, rest) = ints(b" 12abc");
        assert_eq!(values, vec![12]);
        assert_eq!(rest, b"abc");

        let (values, rest) = ints(b"-x");
        assert!(values.is_empty());
        assert_eq!(rest, b"-x");
    }

    #[test]
    fn test_scan_int_hex_prefix_without_digits() {
        // "0x" not followed by a hex digit is the number zero followed by 'x'.
        let (values, rest) = ints(b"0xg");
        assert_eq!(values, vec![0]);
        assert_eq!(rest, b"xg");
    }

    #[test]
    fn test_scan_int_clamps() {
        let (values, _) = ints(b"99999999999999999999 -99999999999999999999");
        assert_eq!(values, vec![i64::MAX, i64::MIN]);
    }

    #[test]
    fn test_scan_float_forms() {
        let mut src = SliceSource::new(b"1 -2.5 .5 3e-2 4E 1e+ inf -NaN");
        let mut out = Vec::new();
        while let Some(v) = scan_float(&mut src).unwrap() {
            out.push(v);
        }
        // "4E" stops before the dangling exponent marker, which then fails.
        assert_eq!(out, vec![1.0, -2.5, 0.5, 0.03, 4.0]);
        assert_eq!(src.remaining(), b"E 1e+ inf -NaN");

        let mut src = SliceSource::new(b"1e+ x");
        assert_eq!(scan_float(&mut src).unwrap(), Some(1.0));
        assert_eq!(src.remaining(), b"e+ x");

        let mut src = SliceSource::new(b"inf -NaN");
        assert_eq!(scan_float(&mut src).unwrap(), Some(f64::INFINITY));
        assert!(scan_float(&mut src).unwrap().unwrap().is_nan());
    }

    #[test]
    fn test_scan_float_rejects_lone_sign_or_dot() {
        let mut src = SliceSource::new(b"- .");
        assert_eq!(scan_float(&mut src).unwrap(), None);
        assert_eq!(src.remaining(), b"- .");
    }

    #[test]
    fn test_scan_token_and_limit() {
        let mut src = SliceSource::new(b"  alpha beta");
        assert_eq!(scan_token(&mut src, 3).unwrap(), Some("alp".to_string()));
        assert_eq!(scan_token(&mut src, 64).unwrap(), Some("ha".to_string()));
        assert_eq!(scan_token(&mut src, 64).unwrap(), Some("beta".to_string()));
        assert_eq!(scan_token(&mut src, 64).unwrap(), None);
    }

    #[test]
    fn test_read_line_strips_terminators() {
        let mut src = SliceSource::new(b"ok\r\n\n\r\nlast");
        assert_eq!(read_line(&mut src, 1024).unwrap(), Some("ok".to_string()));
        assert_eq!(read_line(&mut src, 1024).unwrap(), Some(String::new()));
        assert_eq!(read_line(&mut src, 1024).unwrap(), Some(String::new()));
        assert_eq!(read_line(&mut src, 1024).unwrap(), Some("last".to_string()));
        assert_eq!(read_line(&mut src, 1024).unwrap(), None);
    }

    #[test]
    fn test_clamp_count() {
        assert_eq!(clamp_count(10, 4, 1024), 10);
        assert_eq!(clamp_count(300, 4, 1024), 256);
        assert_eq!(clamp_count(2000, 1, 1024), 1024);
    }

    #[test]
    fn test_read_elements_keeps_partial_tail() {
        let mut src = SliceSource::new(&[1, 0, 0, 0, 2, 0, 0, 0, 9, 9]);
        let bytes = read_elements(&mut src, 4, 5).unwrap();
        assert_eq!(decode_u32s(&bytes), vec![1, 2]);
        assert_eq!(src.remaining(), &[9, 9]);
    }

    #[test]
    fn test_binary_decoders() {
        assert_eq!(decode_uint(&[0x34, 0x12]), 0x1234);
        assert_eq!(decode_uint(&[0xff]), 255);
        let floats = decode_f32s(&1.5f32.to_le_bytes());
        assert_eq!(floats, vec![1.5]);
    }
}
