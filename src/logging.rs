//! `tracing` subscriber setup for the binary and for hosts that want the
//! same output.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG` if set, otherwise from the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install a global fmt subscriber writing to stderr.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(config: &LoggingConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_rust_log_overrides_configured_level() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        };
        std::env::remove_var("RUST_LOG");
        assert_eq!(env_filter(&config).to_string(), "warn");

        std::env::set_var("RUST_LOG", "serial_io=trace");
        assert_eq!(env_filter(&config).to_string(), "serial_io=trace");
        std::env::remove_var("RUST_LOG");
    }

    #[test]
    #[serial]
    fn test_second_init_reports_existing_subscriber() {
        let config = LoggingConfig::default();
        init(&config);
        assert!(!init(&config));
    }
}
