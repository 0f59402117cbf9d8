//! Durable persistence of the current parameter set

pub mod file;
pub mod memory;
pub mod record;

pub use file::FileConfigStore;
pub use memory::MemoryConfigStore;
pub use record::ConfigRecord;

use crate::error::Result;
use crate::params::ParameterSet;
use async_trait::async_trait;
use tracing::{error, info, warn};

/// Single-record persistence for one model instance's parameters
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read the live record, `None` when nothing has been saved yet
    async fn load_record(&self) -> Result<Option<ConfigRecord>>;

    /// Replace the live record with `params`.
    ///
    /// Readers observe either the previous record or the new one, never a
    /// partial write.
    async fn save(&self, params: &ParameterSet) -> Result<ConfigRecord>;

    /// Previously superseded records, oldest first
    async fn history(&self) -> Result<Vec<ConfigRecord>> {
        Ok(Vec::new())
    }

    /// Human-readable location for logs
    fn location(&self) -> String;

    /// Load the persisted parameters, falling back to defaults.
    ///
    /// Never fails: a missing, unreadable or invalid record is logged and
    /// the defaults are returned instead.
    async fn load(&self) -> ParameterSet {
        let defaults = ParameterSet::default();

        let record = match self.load_record().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!(
                    "No stored parameters at {}, using defaults",
                    self.location()
                );
                return defaults;
            }
            Err(e) => {
                error!(
                    "Failed to read parameters from {}: {}. Using defaults",
                    self.location(),
                    e
                );
                return defaults;
            }
        };

        let loaded = record
            .parameters(&defaults)
            .and_then(|params| params.validate().map(|_| params));

        match loaded {
            Ok(params) => {
                info!(
                    "Loaded parameters from {} (saved at {})",
                    self.location(),
                    record.saved_at
                );
                params
            }
            Err(e) => {
                warn!(
                    "Stored parameters at {} rejected: {}. Using defaults",
                    self.location(),
                    e
                );
                defaults
            }
        }
    }
}
