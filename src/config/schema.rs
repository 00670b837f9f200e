//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! Every section has defaults, so an empty file (or none at all) is valid.

use super::error::{ConfigError, ConfigResult};
use crate::engine::EngineSettings;
use crate::port::{BaudRate, PortConfiguration};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial device configuration
    pub serial: SerialConfig,
    /// Request engine configuration
    pub engine: EngineConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        BaudRate::try_from(self.serial.default_baud).map_err(|_| {
            ConfigError::validation(
                "serial.default_baud",
                format!("{} is not a supported rate", self.serial.default_baud),
            )
        })?;
        if self.serial.device_buffer_size < 2 {
            return Err(ConfigError::validation(
                "serial.device_buffer_size",
                "must be at least 2",
            ));
        }
        for (key, value) in [
            ("engine.request_capacity", self.engine.request_capacity),
            ("engine.response_capacity", self.engine.response_capacity),
            ("engine.write_buffer_capacity", self.engine.write_buffer_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::validation(key, "must be non-zero"));
            }
        }
        Ok(())
    }

    /// Engine queue sizes and timing.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            request_capacity: self.engine.request_capacity,
            response_capacity: self.engine.response_capacity,
            write_buffer_capacity: self.engine.write_buffer_capacity,
            device_buffer_size: self.serial.device_buffer_size,
            poll_interval: self.engine.poll_interval(),
        }
    }
}

/// Serial device configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Baud rate for devices opened without an explicit rate
    pub default_baud: u32,
    /// Read/write timeout in milliseconds
    pub timeout_ms: u64,
    /// Largest single device transfer in bytes
    pub device_buffer_size: usize,
    /// Short names for device paths
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            default_baud: BaudRate::DEFAULT.bits_per_second(),
            timeout_ms: 100,
            device_buffer_size: 1024,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Open parameters for path and index opens. An unsupported
    /// `default_baud` falls back to 9600; [`Config::validate`] rejects it
    /// at load time.
    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration {
            baud_rate: BaudRate::try_from(self.default_baud).unwrap_or(BaudRate::DEFAULT),
            timeout: self.timeout(),
        }
    }
}

/// Request engine configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pending read requests and write triggers
    pub request_capacity: usize,
    /// Completed responses awaiting retrieval
    pub response_capacity: usize,
    /// Bytes staged for writing
    pub write_buffer_capacity: usize,
    /// Sleep between worker cycles in microseconds
    pub poll_interval_us: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let defaults = EngineSettings::default();
        Self {
            request_capacity: defaults.request_capacity,
            response_capacity: defaults.response_capacity,
            write_buffer_capacity: defaults.write_buffer_capacity,
            poll_interval_us: defaults.poll_interval.as_micros() as u64,
        }
    }
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. "info" or
    /// "serial_io=debug"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serial.default_baud, 9600);
        assert_eq!(config.engine.request_capacity, 32);
        assert_eq!(config.engine.poll_interval(), Duration::from_micros(100));
        assert!(config.validate().is_ok());
        assert_eq!(config.engine_settings(), EngineSettings::default());
    }

    #[test]
    fn test_port_alias_resolution() {
        let mut config = SerialConfig::default();
        config
            .port_aliases
            .insert("arduino".to_string(), "/dev/ttyACM0".to_string());

        assert_eq!(config.resolve_port("arduino"), "/dev/ttyACM0");
        assert_eq!(config.resolve_port("/dev/ttyUSB1"), "/dev/ttyUSB1");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[serial]"));
        assert!(toml_str.contains("[engine]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [serial]
            default_baud = 115200

            [engine]
            response_capacity = 8
            poll_interval_us = 500

            [logging]
            format = "json"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.default_baud, 115200);
        assert_eq!(config.engine.response_capacity, 8);
        assert_eq!(config.logging.format, LogFormat::Json);
        // Defaults should still work
        assert_eq!(config.engine.request_capacity, 32);
        assert_eq!(
            config.serial.port_configuration().baud_rate,
            BaudRate::B115200
        );
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.serial.default_baud = 12345;
        assert!(matches!(
            config.validate(),
            Err(ref e) if e.key() == Some("serial.default_baud")
        ));

        let mut config = Config::default();
        config.engine.write_buffer_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.serial.device_buffer_size = 1;
        assert!(config.validate().is_err());
    }
}
