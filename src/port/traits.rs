//! Core traits for serial device abstraction.
//!
//! Defines the `SerialPortAdapter` trait that allows both real serial ports
//! and mock implementations to sit behind the engine interchangeably.

use super::baud::BaudRate;
use super::error::PortError;
use std::time::Duration;

/// Parameters used when acquiring a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfiguration {
    /// Line rate.
    pub baud_rate: BaudRate,

    /// Read/write timeout. Bounds how long a single device call can stall
    /// the worker, and therefore how long `close()` can wait on a join.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: BaudRate::DEFAULT,
            timeout: Duration::from_millis(100),
        }
    }
}

/// Trait for serial device I/O operations.
///
/// Implementations perform blocking calls; the engine decides which thread
/// they run on.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the device.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the device into the provided buffer.
    ///
    /// Returns the number of bytes actually read. "Nothing available" may be
    /// reported as `Ok(0)` or as an error for which
    /// [`PortError::is_no_data`] holds.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Push buffered output to the wire.
    fn flush(&mut self) -> Result<(), PortError>;

    /// Get the name/path of this device.
    fn name(&self) -> &str;

    /// Set the read/write timeout for this device.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Discard unread input and unsent output.
    fn clear_buffers(&mut self) -> Result<(), PortError>;

    /// Change the line rate.
    fn set_baud_rate(&mut self, rate: BaudRate) -> Result<(), PortError>;

    /// Current line rate as reported by the device.
    fn baud_rate(&self) -> Result<u32, PortError>;

    /// Get the current bytes available to read (if supported).
    ///
    /// Returns `None` if the operation is not supported or cannot be determined.
    fn bytes_to_read(&self) -> Option<usize> {
        None
    }
}
