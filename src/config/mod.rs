//! Configuration module for serial-io.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_IO_CONFIG` environment variable (explicit path)
//! 2. `./serial-io.toml` (current directory)
//! 3. `serial-io.toml` in the platform config directory
//!    (`~/.config/serial-io` on Linux, `%APPDATA%\serial-io\config` on Windows)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Any configuration value can be overridden via environment variables.
//! The pattern is: `SERIAL_IO_<SECTION>_<KEY>`
//!
//! Examples:
//! - `SERIAL_IO_SERIAL_DEFAULT_BAUD=115200`
//! - `SERIAL_IO_ENGINE_RESPONSE_CAPACITY=64`
//! - `SERIAL_IO_LOGGING_LEVEL=serial_io=debug`
//!
//! # Example
//!
//! ```rust,no_run
//! use serial_io::config::ConfigLoader;
//! use serial_io::SerialIo;
//!
//! let loader = ConfigLoader::load()?;
//! let io = SerialIo::from_config(loader.config());
//! # Ok::<(), serial_io::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, EngineConfig, LogFormat, LoggingConfig, SerialConfig};
