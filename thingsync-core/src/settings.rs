//! Settings the core consumes. Storage of these values belongs to the host.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackTargets {
    pub scheme: String,
    pub single_handler: String,
    pub bulk_handler: String,
}

impl Default for CallbackTargets {
    fn default() -> Self {
        Self {
            scheme: "obsidian".to_string(),
            single_handler: "things-sync-id".to_string(),
            bulk_handler: "things-sync-ids".to_string(),
        }
    }
}

impl CallbackTargets {
    pub fn single_url(&self) -> String {
        format!("{}://{}", self.scheme, self.single_handler)
    }

    pub fn bulk_url(&self) -> String {
        format!("{}://{}", self.scheme, self.bulk_handler)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSettings {
    /// Appended to a task's tags when the document has no context label.
    pub default_tags: Vec<String>,
    pub callbacks: CallbackTargets,
}

impl SyncSettings {
    /// Parse a comma-separated default tag setting.
    pub fn with_default_tags(mut self, tags: &str) -> Self {
        self.default_tags = tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        self
    }
}
