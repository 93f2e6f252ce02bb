//! Logging setup for the cutscene player
//!
//! Console output is compact text or JSON. A log file can be added next to
//! either; it is written through a non-blocking appender.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Filter variable, checked before `RUST_LOG`
pub const LOG_FILTER_ENV: &str = "FMV_LOG";
/// Set to "json" for JSON console output
pub const LOG_FORMAT_ENV: &str = "FMV_LOG_FORMAT";
/// Path of an additional plain-text log file
pub const LOG_FILE_ENV: &str = "FMV_LOG_FILE";

/// Logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// Filter used when neither `FMV_LOG` nor `RUST_LOG` is set
    pub default_level: String,
    pub json_format: bool,
    /// Mirror every event into this file
    pub file_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            json_format: false,
            file_path: None,
        }
    }
}

impl LogConfig {
    /// Defaults overridden by `FMV_LOG_FORMAT` and `FMV_LOG_FILE`
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(LOG_FORMAT_ENV).ok().as_deref(),
            std::env::var_os(LOG_FILE_ENV).map(PathBuf::from),
        )
    }

    fn from_vars(format: Option<&str>, file: Option<PathBuf>) -> Self {
        Self {
            json_format: format.is_some_and(|f| f.eq_ignore_ascii_case("json")),
            file_path: file.filter(|p| !p.as_os_str().is_empty()),
            ..Self::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_FILTER_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(&self.default_level))
    }
}

/// Install the global subscriber
///
/// Keep the returned guard alive until exit when a log file is configured,
/// otherwise buffered file output is lost.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let (file_layer, guard) = match &config.file_path {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(std::fs::File::create(path)?);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let (json_layer, text_layer) = if config.json_format {
        (Some(fmt::layer().json().with_thread_ids(true)), None)
    } else {
        (None, Some(fmt::layer().compact()))
    };

    tracing_subscriber::registry()
        .with(config.filter())
        .with(file_layer)
        .with(json_layer)
        .with(text_layer)
        .try_init()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        json = config.json_format,
        file = ?config.file_path,
        "Logging initialized"
    );

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.default_level, "info");
        assert!(!config.json_format);
        assert!(config.file_path.is_none());
    }

    #[test]
    fn test_log_config_from_vars() {
        let config = LogConfig::from_vars(Some("JSON"), Some(PathBuf::from("cutscene.log")));
        assert!(config.json_format);
        assert_eq!(config.file_path, Some(PathBuf::from("cutscene.log")));

        let config = LogConfig::from_vars(Some("text"), Some(PathBuf::new()));
        assert_eq!(config, LogConfig::default());
    }
}
