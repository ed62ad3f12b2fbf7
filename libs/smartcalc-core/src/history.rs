//! Bounded, newest-first log of computed results

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Default number of retained history items
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// One successful computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub expression: String,
    pub result: String,
    /// Creation time (Unix milliseconds)
    pub timestamp: i64,
    #[serde(default, rename = "isAI")]
    pub is_ai: bool,
}

impl HistoryItem {
    pub fn new(expression: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            expression: expression.into(),
            result: result.into(),
            timestamp: Utc::now().timestamp_millis(),
            is_ai: false,
        }
    }

    /// Create an item produced by the math-reasoning service
    pub fn ai(expression: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            is_ai: true,
            ..Self::new(expression, result)
        }
    }
}

/// History store with eager capacity enforcement
///
/// `len() <= limit()` holds after every mutation.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    items: Vec<HistoryItem>,
    limit: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryStore {
    /// Create an empty store; a zero limit is raised to 1
    pub fn new(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Build a store from persisted items (newest first), trimming to `limit`
    pub fn from_items(items: Vec<HistoryItem>, limit: usize) -> Self {
        let mut store = Self { items, limit: 1 };
        store.set_limit(limit);
        store
    }

    /// Insert at the front, evicting the oldest entries past the limit
    pub fn push(&mut self, item: HistoryItem) {
        debug!(expression = %item.expression, result = %item.result, "history push");
        self.items.insert(0, item);
        self.items.truncate(self.limit);
    }

    pub fn clear(&mut self) {
        debug!(count = self.items.len(), "history clear");
        self.items.clear();
    }

    /// Change the bound and trim immediately
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        if self.items.len() > self.limit {
            debug!(
                limit = self.limit,
                dropped = self.items.len() - self.limit,
                "history trimmed"
            );
            self.items.truncate(self.limit);
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&HistoryItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
