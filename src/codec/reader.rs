//! Buffered reader over a device adapter.
//!
//! The decoders need look-ahead (a number ends at the first byte that is not
//! a digit, and that byte must stay in the stream). `DeviceReader` keeps the
//! bytes read from the device but not yet decoded, and tracks end of input.

use super::source::ByteSource;
use crate::port::{PortError, SerialPortAdapter};
use memchr::memchr;

/// Default size of a single device read.
const FILL_CHUNK: usize = 256;

/// The device handle plus its pending input.
#[derive(Debug)]
pub struct DeviceReader {
    port: Box<dyn SerialPortAdapter>,
    pending: Vec<u8>,
    scratch: Vec<u8>,
    eof: bool,
}

impl DeviceReader {
    pub fn new(port: Box<dyn SerialPortAdapter>) -> Self {
        Self {
            port,
            pending: Vec::new(),
            scratch: vec![0; FILL_CHUNK],
            eof: false,
        }
    }

    /// Read once from the device into `pending`.
    ///
    /// Returns `false` when the device had nothing to give, which also sets
    /// the eof flag.
    fn fill(&mut self) -> Result<bool, PortError> {
        match self.port.read_bytes(&mut self.scratch) {
            Ok(0) => {
                self.eof = true;
                Ok(false)
            }
            Ok(n) => {
                self.pending.extend_from_slice(&self.scratch[..n]);
                self.eof = false;
                Ok(true)
            }
            Err(e) if e.is_no_data() => {
                self.eof = true;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Whether the last attempt to read found the input exhausted.
    pub fn eof(&self) -> bool {
        self.eof
    }

    /// True if input can be consumed without waiting.
    pub fn has_input(&self) -> bool {
        !self.pending.is_empty() || self.port.bytes_to_read().is_some_and(|n| n > 0)
    }

    /// Bytes already read from the device but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Drop pending input here and on the device. Returns how many
    /// already-read bytes were dropped.
    pub fn discard_input(&mut self) -> Result<usize, PortError> {
        let dropped = self.pending.len();
        self.pending.clear();
        self.port.clear_buffers()?;
        Ok(dropped)
    }

    pub fn write_all(&mut self, mut data: &[u8]) -> Result<(), PortError> {
        while !data.is_empty() {
            let n = self.port.write_bytes(data)?;
            if n == 0 {
                return Err(PortError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "device accepted no bytes",
                )));
            }
            data = &data[n..];
        }
        Ok(())
    }

    pub fn port(&self) -> &dyn SerialPortAdapter {
        &*self.port
    }

    pub fn port_mut(&mut self) -> &mut dyn SerialPortAdapter {
        &mut *self.port
    }
}

impl ByteSource for DeviceReader {
    fn peek_at(&mut self, offset: usize) -> Result<Option<u8>, PortError> {
        while self.pending.len() <= offset {
            if !self.fill()? {
                return Ok(None);
            }
        }
        Ok(Some(self.pending[offset]))
    }

    fn take(&mut self, n: usize) -> Vec<u8> {
        let n = n.min(self.pending.len());
        self.pending.drain(..n).collect()
    }

    fn take_line(&mut self, max: usize) -> Result<Option<Vec<u8>>, PortError> {
        let mut scanned = 0;
        loop {
            let window_end = self.pending.len().min(max);
            if let Some(i) = memchr(b'\n', &self.pending[scanned..window_end]) {
                return Ok(Some(self.take(scanned + i + 1)));
            }
            if self.pending.len() >= max {
                return Ok(Some(self.take(max)));
            }
            scanned = self.pending.len();
            if !self.fill()? {
                return Ok((!self.pending.is_empty()).then(|| self.take(max)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockSerialPort;

    fn reader_with(input: &[u8]) -> (DeviceReader, MockSerialPort) {
        let mock = MockSerialPort::new("MOCK0");
        mock.enqueue_read(input);
        (DeviceReader::new(Box::new(mock.clone())), mock)
    }

    #[test]
    fn test_peek_does_not_consume() {
        let (mut reader, _mock) = reader_with(b"ab");
        assert_eq!(reader.peek_at(1).unwrap(), Some(b'b'));
        assert_eq!(reader.take(1), b"a");
        assert_eq!(reader.peek_at(0).unwrap(), Some(b'b'));
        assert_eq!(reader.peek_at(1).unwrap(), None);
        assert!(reader.eof());
    }

    #[test]
    fn test_line_spanning_fills() {
        let (mut reader, mock) = reader_with(b"hel");
        assert_eq!(reader.peek_at(0).unwrap(), Some(b'h'));
        mock.enqueue_read(b"lo\nrest");
        assert_eq!(reader.take_line(1024).unwrap(), Some(b"hello\n".to_vec()));
        assert_eq!(reader.buffered(), 4);
        assert!(!reader.eof());
    }

    #[test]
    fn test_line_without_newline_at_end_of_input() {
        let (mut reader, _mock) = reader_with(b"partial");
        assert_eq!(reader.take_line(1024).unwrap(), Some(b"partial".to_vec()));
        assert_eq!(reader.take_line(1024).unwrap(), None);
    }

    #[test]
    fn test_has_input_sees_device_and_buffer() {
        let (mut reader, mock) = reader_with(b"");
        assert!(!reader.has_input());
        mock.enqueue_read(b"z");
        assert!(reader.has_input());
        assert_eq!(reader.peek_at(0).unwrap(), Some(b'z'));
        assert_eq!(mock.available_bytes(), 0);
        assert!(reader.has_input());
    }

    #[test]
    fn test_device_errors_propagate() {
        let (mut reader, mock) = reader_with(b"");
        mock.fail_next_read();
        assert!(reader.peek_at(0).is_err());
    }

    #[test]
    fn test_write_all_reaches_device() {
        let (mut reader, mock) = reader_with(b"");
        reader.write_all(b"42").unwrap();
        assert_eq!(mock.written(), b"42");
    }
}
