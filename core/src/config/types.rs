//! Service settings types
//!
//! Core only accepts fully resolved settings.
//! Discovery, layering and overrides happen in the CLI layer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of epochs when a training request does not name one
pub const DEFAULT_EPOCHS: usize = 10;

/// Default number of superseded records kept by the file store
pub const DEFAULT_HISTORY_LIMIT: usize = 2;

/// Resolved settings for running one model session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Model artifact the session is bound to
    pub model_path: PathBuf,
    /// Directory holding the persisted parameter record
    pub store_dir: PathBuf,
    /// Epochs used when a training request omits them
    pub default_epochs: usize,
    /// Superseded records to keep, 0 disables history
    pub history_limit: usize,
    /// Log filter used when no verbose flag is given
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        let store_dir = crate::store::FileConfigStore::default_dir();
        Self {
            model_path: store_dir.join("model.bin"),
            store_dir,
            default_epochs: DEFAULT_EPOCHS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            log_level: "info".to_string(),
        }
    }
}

impl ServiceSettings {
    /// Model identity used to key the session
    pub fn model_id(&self) -> String {
        self.model_path.display().to_string()
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.model_path.as_os_str().is_empty() {
            return Err("Model path cannot be empty".to_string());
        }

        if self.store_dir.as_os_str().is_empty() {
            return Err("Store directory cannot be empty".to_string());
        }

        if self.default_epochs == 0 {
            return Err("Default epochs must be greater than 0".to_string());
        }

        Ok(())
    }
}
