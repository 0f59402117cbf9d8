//! Generation and training engine abstractions
//!
//! The numeric work (tokenization, forward passes, gradient updates) lives
//! behind these traits; the session layer only hands over a prompt or a
//! corpus item together with a resolved [`ParameterSet`].

pub mod echo;

pub use echo::EchoEngine;

use crate::error::EngineError;
use crate::params::ParameterSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type for engine calls
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Produces text for a single prompt
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    /// Generate a completion for `prompt` using exactly `params`
    async fn generate(&self, prompt: &str, params: &ParameterSet) -> EngineResult<String>;

    /// Name of the engine, for logs
    fn engine_name(&self) -> &str;
}

/// Applies training updates one corpus item at a time
#[async_trait]
pub trait TrainingEngine: Send + Sync {
    /// Run one training step on `item`, found at `index` (0-based) in the corpus
    async fn train_step(
        &self,
        index: usize,
        item: &str,
        params: &ParameterSet,
    ) -> EngineResult<()>;

    /// Persist model artifact state at the end of `epoch` (1-based)
    async fn save_checkpoint(&self, _epoch: usize, _params: &ParameterSet) -> EngineResult<()> {
        Ok(())
    }

    /// Name of the engine, for logs
    fn engine_name(&self) -> &str;
}

/// Result of a generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedText {
    /// Generated text
    pub text: String,

    /// Model identity the session is bound to
    pub model: String,

    /// Parameters the engine was called with
    pub params: ParameterSet,

    /// Wall time spent in the engine, in milliseconds
    pub duration_ms: u64,
}
