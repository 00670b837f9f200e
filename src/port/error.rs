//! Device-level error types.
//!
//! Errors raised by a [`SerialPortAdapter`](super::SerialPortAdapter) while
//! talking to hardware, kept apart from the engine-level taxonomy in
//! [`crate::error`].

use thiserror::Error;

/// Errors that can occur while operating a serial device.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial device was not found on the system.
    #[error("Serial device not found: {0}")]
    NotFound(String),

    /// An I/O error occurred on the device.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Device configuration failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested baud rate is not one of the supported rates.
    #[error("Unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a device name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error only means "nothing to read right now".
    ///
    /// Serial reads report an empty line as `TimedOut` and non-blocking
    /// backends report it as `WouldBlock`; both are treated as end of input
    /// by the decoders rather than as failures.
    pub fn is_no_data(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::not_found("/dev/ttyUSB0");
        assert_eq!(err.to_string(), "Serial device not found: /dev/ttyUSB0");

        let err = PortError::config("Invalid parity");
        assert_eq!(err.to_string(), "Configuration error: Invalid parity");

        let err = PortError::UnsupportedBaudRate(1234);
        assert_eq!(err.to_string(), "Unsupported baud rate: 1234");
    }

    #[test]
    fn test_no_data_classification() {
        let would_block = PortError::Io(std::io::Error::new(
            std::io::ErrorKind::WouldBlock,
            "No data available",
        ));
        assert!(would_block.is_no_data());
        let timed_out = PortError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "Operation timed out",
        ));
        assert!(timed_out.is_no_data());

        let broken = PortError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "unplugged",
        ));
        assert!(!broken.is_no_data());
        assert!(!PortError::not_found("COM9").is_no_data());
    }
}
