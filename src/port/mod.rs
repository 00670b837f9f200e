//! Device abstraction layer.
//!
//! Provides the adapter trait the engine talks to, a `serialport`-backed
//! implementation, an in-memory mock, and device enumeration.

pub mod baud;
pub mod enumerate;
pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use baud::BaudRate;
pub use enumerate::{DeviceEnumerator, StaticEnumerator, SystemEnumerator};
pub use error::PortError;
pub use mock::MockSerialPort;
pub use sync_port::SyncSerialPort;
pub use traits::{PortConfiguration, SerialPortAdapter};
