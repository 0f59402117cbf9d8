//! Epoch-bounded training runs with per-epoch checkpoints

pub mod runner;

pub use runner::{TrainingHost, TrainingLoop};

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Outcome of a training run, complete or partial
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Epochs the caller asked for
    pub epochs_requested: usize,

    /// Epochs that finished and were checkpointed
    pub epochs_completed: usize,

    /// Items that succeeded in the last epoch that was started
    pub items_processed_in_last_epoch: usize,

    /// Failure that stopped the run, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EngineError>,

    /// Per-epoch progress for every completed epoch
    #[serde(default)]
    pub epochs: Vec<EpochSummary>,
}

impl TrainingReport {
    /// Whether every requested epoch completed
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.epochs_completed == self.epochs_requested
    }
}

/// Progress record for one completed epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    /// 1-based epoch number
    pub epoch: usize,
    /// Items trained in this epoch
    pub items: usize,
    /// Wall time of the epoch including its checkpoint
    pub duration_ms: u64,
}
