//! In-memory serial device for tests and demos.
//!
//! `MockSerialPort` is cheap to clone and every clone shares the same state,
//! so a test can hand one clone to the engine and keep another to feed input
//! and inspect what was written.

use super::baud::BaudRate;
use super::error::PortError;
use super::traits::SerialPortAdapter;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Every buffer passed to `write_bytes`, in order.
    write_log: Vec<Vec<u8>>,
    flush_count: usize,
    /// Fail the next read with a broken-pipe error.
    fail_next_read: bool,
    /// Fail the next write with a broken-pipe error.
    fail_next_write: bool,
    timeout: Duration,
    baud_rate: u32,
    buffers_cleared: bool,
}

/// Mock serial device.
///
/// # Example
/// ```
/// use serial_io::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"Hello");
///
/// let mut buffer = [0u8; 5];
/// assert_eq!(port.read_bytes(&mut buffer).unwrap(), 5);
/// assert_eq!(&buffer, b"Hello");
///
/// port.write_bytes(b"ok").unwrap();
/// assert_eq!(port.written(), b"ok");
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock device with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_millis(100),
                baud_rate: BaudRate::DEFAULT.bits_per_second(),
                ..Default::default()
            })),
        }
    }

    /// Append bytes to the input that later reads will return.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Every write call's buffer, in order.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// All written bytes concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().write_log.concat()
    }

    /// How many times `flush` was called.
    pub fn flush_count(&self) -> usize {
        self.state.lock().flush_count
    }

    /// Make the next read fail with an I/O error.
    pub fn fail_next_read(&self) {
        self.state.lock().fail_next_read = true;
    }

    /// Make the next write fail with an I/O error.
    pub fn fail_next_write(&self) {
        self.state.lock().fail_next_write = true;
    }

    /// Whether `clear_buffers` has been called.
    pub fn was_cleared(&self) -> bool {
        self.state.lock().buffers_cleared
    }

    /// Number of input bytes not yet read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// The timeout most recently set through the adapter.
    pub fn timeout(&self) -> Duration {
        self.state.lock().timeout
    }
}

fn broken_pipe(what: &str) -> PortError {
    PortError::Io(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        format!("simulated {what} failure"),
    ))
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.fail_next_write) {
            return Err(broken_pipe("write"));
        }
        state.write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.fail_next_read) {
            return Err(broken_pipe("read"));
        }

        let n = buffer.len().min(state.read_queue.len());
        for (slot, byte) in buffer.iter_mut().zip(state.read_queue.drain(..n)) {
            *slot = byte;
        }

        if n == 0 {
            // Same shape as a non-blocking descriptor with nothing pending.
            Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "No data available",
            )))
        } else {
            Ok(n)
        }
    }

    fn flush(&mut self) -> Result<(), PortError> {
        self.state.lock().flush_count += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.state.lock().timeout = timeout;
        Ok(())
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.read_queue.clear();
        state.buffers_cleared = true;
        Ok(())
    }

    fn set_baud_rate(&mut self, rate: BaudRate) -> Result<(), PortError> {
        self.state.lock().baud_rate = rate.bits_per_second();
        Ok(())
    }

    fn baud_rate(&self) -> Result<u32, PortError> {
        Ok(self.state.lock().baud_rate)
    }

    fn bytes_to_read(&self) -> Option<usize> {
        Some(self.available_bytes())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_read_leaves_remainder() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello, World!");

        let mut buffer = [0u8; 5];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"Hello");
        assert_eq!(port.available_bytes(), 8);
    }

    #[test]
    fn test_empty_read_is_would_block() {
        let mut port = MockSerialPort::new("MOCK0");
        let mut buffer = [0u8; 4];
        let err = port.read_bytes(&mut buffer).unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn test_clones_share_state() {
        let observer = MockSerialPort::new("MOCK0");
        let mut device = observer.clone();

        device.write_bytes(b"ab").unwrap();
        device.write_bytes(b"c").unwrap();
        device.flush().unwrap();

        assert_eq!(observer.write_log(), vec![b"ab".to_vec(), b"c".to_vec()]);
        assert_eq!(observer.written(), b"abc");
        assert_eq!(observer.flush_count(), 1);
    }

    #[test]
    fn test_injected_failures_fire_once() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"x");
        port.fail_next_read();

        let mut buffer = [0u8; 1];
        assert!(port.read_bytes(&mut buffer).is_err());
        assert_eq!(port.read_bytes(&mut buffer).unwrap(), 1);

        port.fail_next_write();
        assert!(port.write_bytes(b"y").is_err());
        assert!(port.write_bytes(b"y").is_ok());
    }

    #[test]
    fn test_baud_and_clear() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_baud_rate(BaudRate::B57600).unwrap();
        assert_eq!(port.baud_rate().unwrap(), 57600);

        port.enqueue_read(b"discard me");
        port.clear_buffers().unwrap();
        assert!(port.was_cleared());
        assert_eq!(port.bytes_to_read(), Some(0));
    }
}
