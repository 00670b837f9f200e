//! Serial device I/O with a queued asynchronous engine.
//!
//! A [`SerialIo`] opens one device and talks to it either synchronously
//! (each call blocks on the device) or asynchronously: reads are queued as
//! requests, a worker thread services them, and completed responses are
//! collected with non-blocking `get_*` calls after the [`Notifier`] fires.
//! Values are framed as ASCII text or as raw little-endian binary.
//!
//! # Modules
//!
//! - `port`: device adapters (real, mock), baud rates, enumeration
//! - `buffer`: fixed-capacity FIFO ring used for every queue
//! - `request`: the request/response record
//! - `codec`: encoding of written values, decoding of read values
//! - `engine`: request router and worker loop
//! - `notifier`: coalesced wake signal
//! - `serial_io`: the host-facing object
//! - `config`: TOML configuration with environment overrides
//! - `logging`: `tracing` subscriber setup
//!
//! # Example
//!
//! ```
//! use serial_io::{Framing, MockSerialPort, RequestKind, SerialIo};
//! use std::time::Duration;
//!
//! let device = MockSerialPort::new("MOCK0");
//! device.enqueue_read(b"hello\n");
//!
//! let mut io = SerialIo::new();
//! io.open_with_adapter(Box::new(device.clone()), Framing::Ascii);
//!
//! let seen = io.notifier().generation();
//! assert!(io.submit_read(RequestKind::Line, 1));
//! io.notifier().wait_timeout(seen, Duration::from_secs(5));
//! assert_eq!(io.get_line().as_deref(), Some("hello"));
//! ```

pub mod buffer;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod port;
pub mod request;
pub mod serial_io;

// Re-export commonly used types for convenience
pub use buffer::CircularBuffer;
pub use codec::{Framing, IntWidth, WriteValue};
pub use engine::{AsyncEngine, EngineSettings};
pub use error::{SerialIoError, SerialIoResult, Severity};
pub use notifier::Notifier;
pub use port::{
    BaudRate, DeviceEnumerator, MockSerialPort, PortConfiguration, PortError, SerialPortAdapter,
    StaticEnumerator, SyncSerialPort, SystemEnumerator,
};
pub use request::{Payload, Request, RequestKind, ResponseInfo, Status};
pub use serial_io::{SerialIo, TransferMode};
