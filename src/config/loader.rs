//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_IO";

/// Config file name
const CONFIG_FILE_NAME: &str = "serial-io.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_IO_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `SERIAL_IO_CONFIG` environment variable (explicit path)
    /// 2. `./serial-io.toml` (current directory)
    /// 3. `serial-io.toml` in the platform config directory
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables then override individual values, and the
    /// result is validated.
    pub fn load() -> ConfigResult<Self> {
        match resolve_config_path() {
            Some(path) => Self::load_from(path),
            None => Self::with_defaults(),
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;
        debug!("loaded configuration from {}", path.display());

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Defaults plus environment overrides, no file.
    pub fn with_defaults() -> ConfigResult<Self> {
        let mut config = Config::default();
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: None,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The effective configuration as TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(&self.config)?)
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
        debug!("{} points at missing file {}", CONFIG_PATH_ENV, path.display());
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|p| p.exists())
}

/// Platform config directory for serial-io, e.g. `~/.config/serial-io`.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "serial-io").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default config file path inside [`get_default_config_dir`].
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse `SERIAL_IO_<name>` into `target` if it is set.
fn override_from_env<T: FromStr>(name: &str, target: &mut T) -> ConfigResult<()> {
    let var = format!("{ENV_PREFIX}_{name}");
    if let Ok(val) = std::env::var(&var) {
        *target = val
            .trim()
            .parse()
            .map_err(|_| ConfigError::env_parse(&var, format!("unexpected value '{val}'")))?;
    }
    Ok(())
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `SERIAL_IO_<SECTION>_<KEY>`
/// For example:
/// - `SERIAL_IO_SERIAL_DEFAULT_BAUD=115200`
/// - `SERIAL_IO_ENGINE_POLL_INTERVAL_US=250`
/// - `SERIAL_IO_LOGGING_FORMAT=json`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    let serial = &mut config.serial;
    override_from_env("SERIAL_DEFAULT_BAUD", &mut serial.default_baud)?;
    override_from_env("SERIAL_TIMEOUT_MS", &mut serial.timeout_ms)?;
    override_from_env("SERIAL_DEVICE_BUFFER_SIZE", &mut serial.device_buffer_size)?;

    let engine = &mut config.engine;
    override_from_env("ENGINE_REQUEST_CAPACITY", &mut engine.request_capacity)?;
    override_from_env("ENGINE_RESPONSE_CAPACITY", &mut engine.response_capacity)?;
    override_from_env("ENGINE_WRITE_BUFFER_CAPACITY", &mut engine.write_buffer_capacity)?;
    override_from_env("ENGINE_POLL_INTERVAL_US", &mut engine.poll_interval_us)?;

    override_from_env("LOGGING_LEVEL", &mut config.logging.level)?;
    override_from_env("LOGGING_FORMAT", &mut config.logging.format)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults().unwrap();
        assert_eq!(loader.config().engine.request_capacity, 32);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("SERIAL_IO_ENGINE_RESPONSE_CAPACITY", "4");
        env::set_var("SERIAL_IO_LOGGING_FORMAT", "compact");

        let loader = ConfigLoader::with_defaults().unwrap();
        assert_eq!(loader.config().engine.response_capacity, 4);
        assert_eq!(loader.config().logging.format, LogFormat::Compact);

        env::remove_var("SERIAL_IO_ENGINE_RESPONSE_CAPACITY");
        env::remove_var("SERIAL_IO_LOGGING_FORMAT");
    }

    #[test]
    #[serial]
    fn test_env_parse_failure_names_variable() {
        env::set_var("SERIAL_IO_SERIAL_TIMEOUT_MS", "soon");
        let err = ConfigLoader::with_defaults().unwrap_err();
        env::remove_var("SERIAL_IO_SERIAL_TIMEOUT_MS");

        assert_eq!(err.key(), Some("SERIAL_IO_SERIAL_TIMEOUT_MS"));
    }

    #[test]
    #[serial]
    fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[serial]\ndefault_baud = 57600\n\n[engine]\nrequest_capacity = 8").unwrap();

        env::set_var("SERIAL_IO_ENGINE_REQUEST_CAPACITY", "16");
        let loader = ConfigLoader::load_from(file.path()).unwrap();
        env::remove_var("SERIAL_IO_ENGINE_REQUEST_CAPACITY");

        assert_eq!(loader.config().serial.default_baud, 57600);
        assert_eq!(loader.config().engine.request_capacity, 16);
        assert_eq!(loader.config_path.as_deref(), Some(file.path()));
    }

    #[test]
    #[serial]
    fn test_explicit_path_env_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        env::set_var(CONFIG_PATH_ENV, &path);
        let loader = ConfigLoader::load().unwrap();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(loader.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(loader.config().logging.level, "debug");
    }

    #[test]
    #[serial]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bad_toml = dir.path().join("bad.toml");
        std::fs::write(&bad_toml, "[serial\n").unwrap();
        assert!(matches!(
            ConfigLoader::load_from(&bad_toml),
            Err(ConfigError::Parse { .. })
        ));

        let bad_baud = dir.path().join("baud.toml");
        std::fs::write(&bad_baud, "[serial]\ndefault_baud = 1000\n").unwrap();
        assert!(matches!(
            ConfigLoader::load_from(&bad_baud),
            Err(ConfigError::Validation { .. })
        ));
    }
}
