//! Typed values → bytes.

use super::Framing;
use std::fmt::Write as _;

/// Byte width of a binary integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    One,
    Two,
    Four,
    Eight,
}

impl IntWidth {
    /// Width for a byte count, if it is one of 1, 2, 4 or 8.
    pub fn from_bytes(size: i64) -> Option<Self> {
        match size {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            4 => Some(Self::Four),
            8 => Some(Self::Eight),
            _ => None,
        }
    }

    pub const fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }
}

impl Default for IntWidth {
    fn default() -> Self {
        Self::Four
    }
}

/// A value to be written to the device.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteValue {
    Int { value: i64, width: IntWidth },
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Ints { values: Vec<i64>, width: IntWidth },
    Floats(Vec<f64>),
}

impl From<&str> for WriteValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for WriteValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for WriteValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<Vec<u8>> for WriteValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

fn push_ascii_float(out: &mut Vec<u8>, value: f64) {
    let mut text = String::new();
    if value.is_nan() {
        text.push_str("nan");
    } else if value.is_infinite() {
        text.push_str(if value < 0.0 { "-inf" } else { "inf" });
    } else {
        let _ = write!(text, "{value:.6}");
    }
    out.extend_from_slice(text.as_bytes());
}

fn push_binary_int(out: &mut Vec<u8>, value: i64, width: IntWidth) {
    out.extend_from_slice(&value.to_le_bytes()[..width.bytes()]);
}

fn push_binary_float(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&(value as f32).to_le_bytes());
}

/// Encode `value` under `framing`.
///
/// Ascii numbers are decimal text (floats with six fractional digits) and
/// sequences of numbers are separated by a single space. Binary integers are
/// little-endian truncated to their width and binary floats are 4-byte
/// single precision. Text and raw bytes go out unchanged under either
/// framing. Nothing is appended: no delimiter, no terminator.
pub fn encode(value: &WriteValue, framing: Framing) -> Vec<u8> {
    let mut out = Vec::new();
    match (value, framing) {
        (WriteValue::Text(s), _) => out.extend_from_slice(s.as_bytes()),
        (WriteValue::Bytes(b), _) => out.extend_from_slice(b),
        (WriteValue::Int { value, .. }, Framing::Ascii) => {
            out.extend_from_slice(value.to_string().as_bytes())
        }
        (WriteValue::Int { value, width }, Framing::Binary) => {
            push_binary_int(&mut out, *value, *width)
        }
        (WriteValue::Float(v), Framing::Ascii) => push_ascii_float(&mut out, *v),
        (WriteValue::Float(v), Framing::Binary) => push_binary_float(&mut out, *v),
        (WriteValue::Ints { values, .. }, Framing::Ascii) => {
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                out.extend_from_slice(v.to_string().as_bytes());
            }
        }
        (WriteValue::Ints { values, width }, Framing::Binary) => {
            for v in values {
                push_binary_int(&mut out, *v, *width);
            }
        }
        (WriteValue::Floats(values), Framing::Ascii) => {
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                push_ascii_float(&mut out, *v);
            }
        }
        (WriteValue::Floats(values), Framing::Binary) => {
            for v in values {
                push_binary_float(&mut out, *v);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ascii_text_has_no_delimiter() {
        assert_eq!(encode(&"42".into(), Framing::Ascii), b"42");
    }

    #[test]
    fn test_ascii_numbers() {
        let int = WriteValue::Int { value: -17, width: IntWidth::One };
        assert_eq!(encode(&int, Framing::Ascii), b"-17");
        assert_eq!(encode(&2.5.into(), Framing::Ascii), b"2.500000");
        assert_eq!(encode(&f64::NAN.into(), Framing::Ascii), b"nan");

        let ints = WriteValue::Ints { values: vec![1, 22, 333], width: IntWidth::Four };
        assert_eq!(encode(&ints, Framing::Ascii), b"1 22 333");
    }

    #[test]
    fn test_binary_int_widths() {
        let v = 0x0102_0304_0506_0708i64;
        let enc = |width| encode(&WriteValue::Int { value: v, width }, Framing::Binary);
        assert_eq!(enc(IntWidth::One), vec![0x08]);
        assert_eq!(enc(IntWidth::Two), vec![0x08, 0x07]);
        assert_eq!(enc(IntWidth::Four), vec![0x08, 0x07, 0x06, 0x05]);
        assert_eq!(enc(IntWidth::Eight), v.to_le_bytes().to_vec());
    }

    #[test]
    fn test_binary_float_is_single_precision() {
        assert_eq!(encode(&1.5.into(), Framing::Binary), 1.5f32.to_le_bytes().to_vec());
        let floats = WriteValue::Floats(vec![1.0, -2.0]);
        let mut expected = 1.0f32.to_le_bytes().to_vec();
        expected.extend_from_slice(&(-2.0f32).to_le_bytes());
        assert_eq!(encode(&floats, Framing::Binary), expected);
    }

    #[test]
    fn test_binary_arrays_keep_declared_order() {
        let ints = WriteValue::Ints { values: vec![1, 2], width: IntWidth::Two };
        assert_eq!(encode(&ints, Framing::Binary), vec![1, 0, 2, 0]);
        assert_eq!(encode(&vec![9u8, 8, 7].into(), Framing::Binary), vec![9, 8, 7]);
    }

    #[test]
    fn test_width_validation() {
        assert_eq!(IntWidth::from_bytes(2), Some(IntWidth::Two));
        assert_eq!(IntWidth::from_bytes(3), None);
        assert_eq!(IntWidth::from_bytes(0), None);
        assert_eq!(IntWidth::default().bytes(), 4);
    }
}
