//! Pull-based byte input for the decoders.

use crate::port::PortError;

/// Something the decoders can look ahead into and consume from.
///
/// Looking ahead may block on the device; `Ok(None)` means the input has
/// nothing more to give right now and is treated as end of input.
pub trait ByteSource {
    /// The byte `offset` positions past the cursor.
    fn peek_at(&mut self, offset: usize) -> Result<Option<u8>, PortError>;

    /// Remove and return `n` bytes. Callers only take what `peek_at` has
    /// already shown to exist.
    fn take(&mut self, n: usize) -> Vec<u8>;

    fn consume(&mut self, n: usize) {
        let _ = self.take(n);
    }

    /// Buffer up to `max` bytes and report how many are available.
    fn available_up_to(&mut self, max: usize) -> Result<usize, PortError> {
        let mut n = 0;
        while n < max && self.peek_at(n)?.is_some() {
            n += 1;
        }
        Ok(n)
    }

    /// Take bytes up to and including the next `\n`, at most `max` bytes.
    ///
    /// Returns whatever was collected if input ends first, or `None` if it
    /// ends before any byte.
    fn take_line(&mut self, max: usize) -> Result<Option<Vec<u8>>, PortError> {
        let mut n = 0;
        while n < max {
            match self.peek_at(n)? {
                Some(b'\n') => {
                    n += 1;
                    break;
                }
                Some(_) => n += 1,
                None => break,
            }
        }
        Ok((n > 0).then(|| self.take(n)))
    }
}

/// In-memory input, for decoding already-received bytes.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

impl ByteSource for SliceSource<'_> {
    fn peek_at(&mut self, offset: usize) -> Result<Option<u8>, PortError> {
        Ok(self.data.get(self.pos + offset).copied())
    }

    fn take(&mut self, n: usize) -> Vec<u8> {
        let end = (self.pos + n).min(self.data.len());
        let out = self.data[self.pos..end].to_vec();
        self.pos = end;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_line_includes_newline() {
        let mut src = SliceSource::new(b"ab\ncd");
        assert_eq!(src.take_line(64).unwrap(), Some(b"ab\n".to_vec()));
        assert_eq!(src.take_line(64).unwrap(), Some(b"cd".to_vec()));
        assert_eq!(src.take_line(64).unwrap(), None);
    }

    #[test]
    fn test_take_line_respects_max() {
        let mut src = SliceSource::new(b"abcdef\n");
        assert_eq!(src.take_line(4).unwrap(), Some(b"abcd".to_vec()));
        assert_eq!(src.remaining(), b"ef\n");
    }

    #[test]
    fn test_available_up_to_stops_at_end() {
        let mut src = SliceSource::new(b"xyz");
        assert_eq!(src.available_up_to(2).unwrap(), 2);
        assert_eq!(src.available_up_to(10).unwrap(), 3);
    }
}
