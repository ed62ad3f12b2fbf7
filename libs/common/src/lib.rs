//! Shared plumbing for the smartcalc binaries
//!
//! - [`config`]: layered configuration (defaults, TOML file, environment)
//! - [`logging`]: console and optional daily-file tracing output

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AiSettings, LogSettings, SmartCalcConfig};
pub use error::{Error, Result};
pub use logging::LogConfig;
