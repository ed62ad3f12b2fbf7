//! Configuration for the smartcalc binaries
//!
//! Priority (highest to lowest):
//! 1. Environment variables prefixed `SMARTCALC_`, nested with `__`
//!    (e.g. `SMARTCALC_AI__MODEL`)
//! 2. TOML file (`--config`, `SMARTCALC_CONFIG`, or `./smartcalc.toml`)
//! 3. Default values
//!
//! The Gemini key falls back to `GEMINI_API_KEY`, then `API_KEY`.

use crate::{Error, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "smartcalc.toml";
pub const CONFIG_PATH_ENV: &str = "SMARTCALC_CONFIG";
pub const ENV_PREFIX: &str = "SMARTCALC_";

/// Checked in order when no key is configured
pub const API_KEY_FALLBACK_ENV: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SmartCalcConfig {
    /// JSON file holding theme, history limit and history
    pub state_file: PathBuf,
    pub ai: AiSettings,
    pub log: LogSettings,
}

impl Default for SmartCalcConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("smartcalc-state.json"),
            ai: AiSettings::default(),
            log: LogSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-3-pro-preview".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            dir: None,
        }
    }
}

impl SmartCalcConfig {
    /// Load from defaults, the config file and the process environment
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let path = match config_file {
            Some(path) => path.to_path_buf(),
            None => std::env::var_os(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
        };
        // an explicitly named file must exist
        if config_file.is_some() && !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let mut config = Self::from_figment(figment(&path, ENV_PREFIX))?;
        config.fill_api_key(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| Error::Config(format!("Failed to load configuration: {}", e)))
    }

    /// Use the first non-empty fallback variable when no key is configured
    fn fill_api_key<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let configured = self
            .ai
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if configured {
            return;
        }
        self.ai.api_key = API_KEY_FALLBACK_ENV
            .iter()
            .filter_map(|name| lookup(name))
            .find(|k| !k.trim().is_empty());
    }

    pub fn validate(&self) -> Result<()> {
        if self.ai.model.trim().is_empty() {
            return Err(Error::Config("ai.model must not be empty".to_string()));
        }
        if !self.ai.endpoint.starts_with("http://") && !self.ai.endpoint.starts_with("https://") {
            return Err(Error::Config(format!(
                "ai.endpoint must be an http(s) URL, got '{}'",
                self.ai.endpoint
            )));
        }
        if self.ai.timeout_secs == 0 {
            return Err(Error::Config(
                "ai.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.state_file.as_os_str().is_empty() {
            return Err(Error::Config("state_file must not be empty".to_string()));
        }
        Ok(())
    }
}

fn figment(path: &Path, env_prefix: &str) -> Figment {
    Figment::from(Serialized::defaults(SmartCalcConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(env_prefix).split("__"))
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use std::io::Write;

    // unique per test so parallel tests never see each other's variables
    fn isolated(path: &Path, prefix: &str) -> Result<SmartCalcConfig> {
        SmartCalcConfig::from_figment(figment(path, prefix))
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = isolated(&dir.path().join("missing.toml"), "SMARTCALC_T1_").unwrap();
        assert_eq!(config, SmartCalcConfig::default());
        assert_eq!(config.ai.model, "gemini-3-pro-preview");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
state_file = "/tmp/calc.json"

[ai]
model = "gemini-test"
timeout_secs = 5

[log]
level = "debug"
dir = "logs"
"#
        )
        .unwrap();

        let config = isolated(file.path(), "SMARTCALC_T2_").unwrap();
        assert_eq!(config.state_file, PathBuf::from("/tmp/calc.json"));
        assert_eq!(config.ai.model, "gemini-test");
        assert_eq!(config.ai.timeout_secs, 5);
        assert_eq!(
            config.ai.endpoint,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.dir, Some(PathBuf::from("logs")));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ai]\nmodel = \"from-file\"").unwrap();

        std::env::set_var("SMARTCALC_T3_AI__MODEL", "from-env");
        std::env::set_var("SMARTCALC_T3_AI__TIMEOUT_SECS", "7");
        let config = isolated(file.path(), "SMARTCALC_T3_").unwrap();
        std::env::remove_var("SMARTCALC_T3_AI__MODEL");
        std::env::remove_var("SMARTCALC_T3_AI__TIMEOUT_SECS");

        assert_eq!(config.ai.model, "from-env");
        assert_eq!(config.ai.timeout_secs, 7);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ai]\ntimeout_secs = \"soon\"").unwrap();

        let err = isolated(file.path(), "SMARTCALC_T4_").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(SmartCalcConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_api_key_fallback_order() {
        let mut config = SmartCalcConfig::default();
        config.fill_api_key(|name| match name {
            "GEMINI_API_KEY" => Some(" ".to_string()),
            "API_KEY" => Some("secondary".to_string()),
            _ => None,
        });
        assert_eq!(config.ai.api_key.as_deref(), Some("secondary"));

        // a configured key wins
        let mut config = SmartCalcConfig::default();
        config.ai.api_key = Some("configured".to_string());
        config.fill_api_key(|_| Some("env".to_string()));
        assert_eq!(config.ai.api_key.as_deref(), Some("configured"));
    }

    #[test]
    fn test_validation() {
        let mut config = SmartCalcConfig::default();
        config.ai.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = SmartCalcConfig::default();
        config.ai.model = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = SmartCalcConfig::default();
        config.ai.endpoint = "generativelanguage.googleapis.com".to_string();
        assert!(config.validate().is_err());
    }
}
