//! Engine-level error taxonomy.
//!
//! Every condition the serial object can hit, with the severity it is
//! logged at. Sentinel-returning entry points log these and carry on;
//! the `try_*` entry points hand them to the caller.

use crate::codec::Framing;
use crate::port::PortError;
use crate::request::RequestKind;
use crate::serial_io::TransferMode;
use thiserror::Error;
use tracing::{error, warn};

/// How loudly a condition is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Routine misuse; nothing was lost.
    Warning,
    /// Data was dropped.
    Severe,
}

/// Errors raised by [`SerialIo`](crate::SerialIo) operations.
#[derive(Debug, Error)]
pub enum SerialIoError {
    #[error("device is not open")]
    NotOpen,

    #[error("device is busy with a queued request")]
    DeviceBusy,

    #[error("{operation} is not available in {mode} mode")]
    WrongTransferMode {
        operation: &'static str,
        mode: TransferMode,
    },

    #[error("{operation} is not available with {framing} framing")]
    UnsupportedFraming {
        operation: &'static str,
        framing: Framing,
    },

    #[error("invalid int size {0}, expected 1, 2, 4 or 8")]
    InvalidWriteWidth(i64),

    #[error("{0} cannot be submitted as a read")]
    InvalidRequestKind(RequestKind),

    #[error("request buffer overflow, dropping {0}")]
    RequestQueueOverflow(RequestKind),

    #[error("response buffer overflow, dropping {0} read")]
    ResponseQueueOverflow(RequestKind),

    #[error("write buffer overflow, dropping {dropped} byte(s) ({free} free)")]
    StagingOverflow { dropped: usize, free: usize },

    #[error("short read: {actual} of {requested} item(s)")]
    ShortRead { requested: usize, actual: usize },

    #[error("failed to decode {0}")]
    DecodeFailure(RequestKind),

    #[error("invalid device index {index} ({available} available)")]
    InvalidDevice { index: usize, available: usize },

    #[error("unable to open serial device '{path}': {source}")]
    DeviceOpenFailure {
        path: String,
        #[source]
        source: PortError,
    },

    #[error(transparent)]
    Port(#[from] PortError),
}

impl SerialIoError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::RequestQueueOverflow(_)
            | Self::ResponseQueueOverflow(_)
            | Self::StagingOverflow { .. } => Severity::Severe,
            _ => Severity::Warning,
        }
    }

    /// Emit this error through `tracing` at its severity, tagged with the
    /// operation that hit it.
    pub fn log(&self, operation: &str) {
        match self.severity() {
            Severity::Warning => warn!("({}): {}", operation, self),
            Severity::Severe => error!("({}): {}", operation, self),
        }
    }
}

/// Result alias for fallible serial operations.
pub type SerialIoResult<T> = Result<T, SerialIoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_loss_is_severe() {
        assert_eq!(
            SerialIoError::RequestQueueOverflow(RequestKind::Line).severity(),
            Severity::Severe
        );
        assert_eq!(
            SerialIoError::StagingOverflow { dropped: 3, free: 1 }.severity(),
            Severity::Severe
        );
        assert_eq!(SerialIoError::NotOpen.severity(), Severity::Warning);
        assert_eq!(
            SerialIoError::ShortRead { requested: 3, actual: 2 }.severity(),
            Severity::Warning
        );
        assert_eq!(SerialIoError::InvalidWriteWidth(3).severity(), Severity::Warning);
    }

    #[test]
    fn test_messages() {
        let err = SerialIoError::WrongTransferMode {
            operation: "readInt",
            mode: TransferMode::Async,
        };
        assert_eq!(err.to_string(), "readInt is not available in async mode");

        let err = SerialIoError::UnsupportedFraming {
            operation: "readLine",
            framing: Framing::Binary,
        };
        assert_eq!(err.to_string(), "readLine is not available with binary framing");

        let err = SerialIoError::InvalidWriteWidth(3);
        assert_eq!(err.to_string(), "invalid int size 3, expected 1, 2, 4 or 8");
    }
}
