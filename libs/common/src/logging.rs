//! Logging setup for the smartcalc binaries
//!
//! Console output goes to stderr so it never mixes with calculator output on
//! stdout. An optional log directory adds a daily rolling file named
//! `{app}.{YYYY-MM-DD}.log`.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::error::{Error, Result};

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Event formatter that outputs: `timestamp [LEVEL] message`
///
/// Example output: `2026-10-17T08:12:03.118202Z [INFO] math query submitted query=15% of 80`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m",
                Level::DEBUG => "\x1b[34m",
                Level::INFO => "\x1b[32m",
                Level::WARN => "\x1b[33m",
                Level::ERROR => "\x1b[31m",
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

// Keeps the non-blocking file writer flushing until process exit
static GUARDS: OnceLock<Arc<Mutex<Vec<WorkerGuard>>>> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Used as the log file name prefix
    pub app_name: String,
    /// Filter directive used when `RUST_LOG` is not set, e.g. `warn` or `info,smartcalc_core=debug`
    pub level: String,
    /// Directory for the daily log file; no file output when `None`
    pub log_dir: Option<PathBuf>,
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "smartcalc".to_string(),
            level: "warn".to_string(),
            log_dir: None,
            console: true,
        }
    }
}

/// Resolve the filter, preferring a valid `RUST_LOG` over the configured level
fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(env_str) = std::env::var("RUST_LOG") {
        if let Ok(filter) = EnvFilter::try_new(&env_str) {
            return Ok(filter);
        }
        eprintln!("Warning: ignoring invalid RUST_LOG '{}'", env_str);
    }
    EnvFilter::try_new(level)
        .map_err(|e| Error::Logging(format!("Invalid log level '{}': {}", level, e)))
}

/// Install the global subscriber
///
/// Fails if the level is not a valid filter, the log directory cannot be
/// created, or a global subscriber is already installed.
pub fn init_with_config(config: &LogConfig) -> Result<()> {
    let env_filter = build_filter(&config.level)?;

    let console_layer = config.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .event_format(BracketedLevelFormat)
            .boxed()
    });

    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(&config.app_name)
                .filename_suffix("log")
                .build(dir)
                .map_err(|e| Error::Logging(format!("Failed to open log file: {}", e)))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            let guards = GUARDS.get_or_init(|| Arc::new(Mutex::new(Vec::new())));
            match guards.lock() {
                Ok(mut g) => g.push(guard),
                Err(poisoned) => poisoned.into_inner().push(guard),
            }

            Some(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .event_format(BracketedLevelFormat)
                    .boxed(),
            )
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

/// Console-only logging at `level`
pub fn init(level: &str) -> Result<()> {
    init_with_config(&LogConfig {
        level: level.to_string(),
        ..Default::default()
    })
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_format_level() {
        assert_eq!(format_level(&Level::INFO), "[INFO]");
        assert_eq!(format_level(&Level::ERROR), "[ERROR]");
    }

    #[test]
    fn test_default_config_is_console_only() {
        let config = LogConfig::default();
        assert!(config.console);
        assert!(config.log_dir.is_none());
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let err = build_filter("smartcalc=loud").unwrap_err();
        assert!(matches!(err, Error::Logging(_)));
    }
}
