//! Task-oriented parameter presets

use super::overrides::ParamOverrides;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Named, read-only mapping from task category to partial parameter overrides
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    entries: BTreeMap<String, ParamOverrides>,
}

static SHARED_CATALOG: OnceLock<Arc<PresetCatalog>> = OnceLock::new();

impl PresetCatalog {
    /// The built-in table: `creative`, `factual` and `code`
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();

        entries.insert(
            "creative".to_string(),
            ParamOverrides {
                temperature: Some(0.9),
                top_p: Some(0.95),
                max_tokens: Some(300),
                frequency_penalty: Some(0.5),
                ..Default::default()
            },
        );

        entries.insert(
            "factual".to_string(),
            ParamOverrides {
                temperature: Some(0.3),
                top_p: Some(0.85),
                max_tokens: Some(150),
                frequency_penalty: Some(0.0),
                ..Default::default()
            },
        );

        entries.insert(
            "code".to_string(),
            ParamOverrides {
                temperature: Some(0.5),
                top_p: Some(0.9),
                max_tokens: Some(500),
                frequency_penalty: Some(0.2),
                stop_sequences: Some(vec!["\n\n".to_string(), "```".to_string()]),
                ..Default::default()
            },
        );

        Self { entries }
    }

    /// Process-wide built-in catalog, initialized on first use
    pub fn shared() -> Arc<PresetCatalog> {
        SHARED_CATALOG
            .get_or_init(|| Arc::new(Self::builtin()))
            .clone()
    }

    /// Build a catalog from an explicit table
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, ParamOverrides)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, overrides)| (name.into(), overrides))
                .collect(),
        }
    }

    /// Exact-match lookup of a task name
    pub fn resolve(&self, task_name: &str) -> Result<&ParamOverrides> {
        self.entries
            .get(task_name)
            .ok_or_else(|| Error::PresetNotFound {
                name: task_name.to_string(),
            })
    }

    /// Preset names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// All presets in sorted order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ParamOverrides)> {
        self.entries
            .iter()
            .map(|(name, overrides)| (name.as_str(), overrides))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
