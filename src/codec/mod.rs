//! Encoding and decoding of device payloads.
//!
//! Everything here is stateless except [`DeviceReader`], which holds the
//! input bytes the decoders have looked at but not consumed.

pub mod decode;
pub mod encode;
pub mod reader;
pub mod source;

pub use decode::{read_line, scan_float, scan_int, scan_token, MAX_TOKEN_LEN};
pub use encode::{encode, IntWidth, WriteValue};
pub use reader::DeviceReader;
pub use source::{ByteSource, SliceSource};

use std::fmt;

/// How payloads are represented on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framing {
    /// Human-readable text: numbers as decimal digits, lines, tokens.
    Ascii,
    /// Raw fixed-width little-endian values.
    Binary,
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framing::Ascii => f.write_str("ascii"),
            Framing::Binary => f.write_str("binary"),
        }
    }
}
