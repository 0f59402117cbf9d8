//! Simulated engine that echoes prompts

use super::{EngineResult, GenerationEngine, TrainingEngine};
use crate::error::EngineError;
use crate::params::ParameterSet;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Stand-in engine used when no real model backend is wired in.
///
/// Generation echoes the prompt, cut at the first stop sequence and limited
/// to `max_tokens` whitespace-separated words. Training steps only count.
#[derive(Debug, Default)]
pub struct EchoEngine {
    steps: AtomicUsize,
    checkpoints: AtomicUsize,
}

impl EchoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Training steps run so far
    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }

    /// Artifact checkpoints written so far
    pub fn checkpoints(&self) -> usize {
        self.checkpoints.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationEngine for EchoEngine {
    async fn generate(&self, prompt: &str, params: &ParameterSet) -> EngineResult<String> {
        let text = format!("Generated from prompt: {}", prompt);

        let cut = params
            .stop_sequences
            .iter()
            .filter_map(|stop| text.find(stop.as_str()))
            .min()
            .unwrap_or(text.len());

        let limited: Vec<&str> = text[..cut]
            .split_whitespace()
            .take(params.max_tokens as usize)
            .collect();

        Ok(limited.join(" "))
    }

    fn engine_name(&self) -> &str {
        "echo"
    }
}

#[async_trait]
impl TrainingEngine for EchoEngine {
    async fn train_step(
        &self,
        index: usize,
        item: &str,
        _params: &ParameterSet,
    ) -> EngineResult<()> {
        if item.trim().is_empty() {
            return Err(EngineError::TrainingStep {
                item: index,
                message: "empty training item".to_string(),
            });
        }

        let step = self.steps.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("echo train step {}: {} chars", step, item.len());
        Ok(())
    }

    async fn save_checkpoint(&self, epoch: usize, _params: &ParameterSet) -> EngineResult<()> {
        self.checkpoints.fetch_add(1, Ordering::SeqCst);
        debug!("echo checkpoint after epoch {}", epoch);
        Ok(())
    }

    fn engine_name(&self) -> &str {
        "echo"
    }
}
