//! Device enumeration.
//!
//! Opening "device 0" needs an ordered list of what is attached. The list is
//! supplied by a `DeviceEnumerator` so hosts (and tests) can substitute
//! their own.

use super::error::PortError;
use tracing::debug;

/// Source of currently available device identifiers.
pub trait DeviceEnumerator: Send + Sync + std::fmt::Debug {
    /// Device paths, in the order indices refer to them.
    fn available_devices(&self) -> Result<Vec<String>, PortError>;
}

/// Enumerates devices through `serialport::available_ports`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnumerator;

impl DeviceEnumerator for SystemEnumerator {
    fn available_devices(&self) -> Result<Vec<String>, PortError> {
        let ports = serialport::available_ports()?;
        debug!("Enumerated {} serial device(s)", ports.len());
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }
}

/// A fixed list of devices.
#[derive(Debug, Default, Clone)]
pub struct StaticEnumerator {
    devices: Vec<String>,
}

impl StaticEnumerator {
    pub fn new<I, S>(devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            devices: devices.into_iter().map(Into::into).collect(),
        }
    }
}

impl DeviceEnumerator for StaticEnumerator {
    fn available_devices(&self) -> Result<Vec<String>, PortError> {
        Ok(self.devices.clone())
    }
}
