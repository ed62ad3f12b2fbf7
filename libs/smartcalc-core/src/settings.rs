//! Persisted settings schema
//!
//! | key            | value                                         |
//! |----------------|-----------------------------------------------|
//! | `theme`        | `light`, `dark` or `system`                   |
//! | `historyLimit` | positive decimal integer, default 50          |
//! | `history`      | JSON array of history items, newest first     |

use crate::error::{CalcError, Result};
use crate::history::{HistoryItem, DEFAULT_HISTORY_LIMIT};
use crate::store::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

pub const THEME_KEY: &str = "theme";
pub const HISTORY_LIMIT_KEY: &str = "historyLimit";
pub const HISTORY_KEY: &str = "history";

/// History limits offered by the settings screen
pub const HISTORY_LIMIT_CHOICES: [usize; 5] = [10, 25, 50, 100, 250];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(CalcError::expression(format!("Unknown theme: {}", other))),
        }
    }
}

/// Everything a session persists between runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSettings {
    pub theme: Theme,
    pub history_limit: usize,
    /// Newest first, never longer than `history_limit`
    pub history: Vec<HistoryItem>,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            history: Vec::new(),
        }
    }
}

impl PersistedSettings {
    /// Load settings, falling back to defaults for missing or bad entries
    ///
    /// Only store failures are errors; unreadable values are logged and
    /// replaced by their defaults.
    pub async fn load<S: KeyValueStore>(store: &S) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(raw) = store.get(THEME_KEY).await? {
            match raw.parse() {
                Ok(theme) => settings.theme = theme,
                Err(_) => warn!(value = %raw, "ignoring unknown theme"),
            }
        }

        if let Some(raw) = store.get(HISTORY_LIMIT_KEY).await? {
            match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => settings.history_limit = limit,
                _ => warn!(value = %raw, "ignoring invalid history limit"),
            }
        }

        if let Some(raw) = store.get(HISTORY_KEY).await? {
            match serde_json::from_str::<Vec<HistoryItem>>(&raw) {
                Ok(mut items) => {
                    items.truncate(settings.history_limit);
                    settings.history = items;
                },
                Err(e) => warn!(error = %e, "ignoring unreadable history"),
            }
        }

        debug!(
            theme = %settings.theme,
            history_limit = settings.history_limit,
            history = settings.history.len(),
            "settings loaded"
        );
        Ok(settings)
    }

    pub async fn save<S: KeyValueStore>(&self, store: &S) -> Result<()> {
        store.set(THEME_KEY, self.theme.as_str()).await?;
        store
            .set(HISTORY_LIMIT_KEY, &self.history_limit.to_string())
            .await?;
        let history = serde_json::to_string(&self.history)?;
        store.set(HISTORY_KEY, &history).await?;
        debug!(history = self.history.len(), "settings saved");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_empty_store_gives_defaults() {
        let store = MemoryStore::new();
        let settings = PersistedSettings::load(&store).await.unwrap();
        assert_eq!(settings, PersistedSettings::default());
        assert_eq!(settings.history_limit, 50);
        assert_eq!(settings.theme, Theme::System);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MemoryStore::new();
        let settings = PersistedSettings {
            theme: Theme::Dark,
            history_limit: 25,
            history: vec![HistoryItem::ai("what is 2+2", "4"), HistoryItem::new("1 + 1", "2")],
        };
        settings.save(&store).await.unwrap();

        let loaded = PersistedSettings::load(&store).await.unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(store.get(THEME_KEY).await.unwrap().as_deref(), Some("dark"));
        assert_eq!(
            store.get(HISTORY_LIMIT_KEY).await.unwrap().as_deref(),
            Some("25")
        );
    }

    #[tokio::test]
    async fn test_invalid_values_fall_back() {
        let store = MemoryStore::new();
        store.set(THEME_KEY, "neon").await.unwrap();
        store.set(HISTORY_LIMIT_KEY, "0").await.unwrap();
        store.set(HISTORY_KEY, "not json").await.unwrap();

        let loaded = PersistedSettings::load(&store).await.unwrap();
        assert_eq!(loaded, PersistedSettings::default());
    }

    #[tokio::test]
    async fn test_loaded_history_is_trimmed_to_limit() {
        let store = MemoryStore::new();
        let items: Vec<HistoryItem> = (0..30)
            .map(|i| HistoryItem::new(format!("{}", i), format!("{}", i)))
            .collect();
        store
            .set(HISTORY_KEY, &serde_json::to_string(&items).unwrap())
            .await
            .unwrap();
        store.set(HISTORY_LIMIT_KEY, "10").await.unwrap();

        let loaded = PersistedSettings::load(&store).await.unwrap();
        assert_eq!(loaded.history.len(), 10);
        assert_eq!(loaded.history[0].result, "0");
    }

    #[tokio::test]
    async fn test_history_without_ai_flag_defaults_to_false() {
        let store = MemoryStore::new();
        let raw = r#"[{"id":"a","expression":"1 + 1","result":"2","timestamp":1700000000000}]"#;
        store.set(HISTORY_KEY, raw).await.unwrap();

        let loaded = PersistedSettings::load(&store).await.unwrap();
        assert_eq!(loaded.history.len(), 1);
        assert!(!loaded.history[0].is_ai);
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
    }
}
