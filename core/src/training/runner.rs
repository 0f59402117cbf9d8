//! Training loop driver

use super::{EpochSummary, TrainingReport};
use crate::engine::TrainingEngine;
use crate::error::{Error, Result};
use crate::params::ParameterSet;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Log a progress line every this many items
const LOG_EVERY_ITEMS: usize = 10;

/// What a training run needs from the session that owns it
#[async_trait]
pub trait TrainingHost: Send + Sync {
    /// Parameters to train the next epoch with
    fn training_params(&self) -> Arc<ParameterSet>;

    /// Persist the configuration at the end of `epoch` (1-based)
    async fn checkpoint(&self, epoch: usize) -> Result<()>;
}

/// Runs epochs over a corpus, one engine step per item
pub struct TrainingLoop {
    engine: Arc<dyn TrainingEngine>,
}

impl TrainingLoop {
    pub fn new(engine: Arc<dyn TrainingEngine>) -> Self {
        Self { engine }
    }

    /// Train for `epochs` passes over `corpus`.
    ///
    /// Epochs and items run strictly in order. After every complete epoch
    /// the engine saves its artifact and the host checkpoints the
    /// configuration. The first engine failure stops the run and is
    /// returned as [`Error::TrainingAborted`] carrying the partial report;
    /// the interrupted epoch is never checkpointed. A failed configuration
    /// checkpoint ends the run as [`Error::CheckpointFailed`], with
    /// `epochs_completed` still at the last saved epoch.
    pub async fn run(
        &self,
        corpus: &[String],
        epochs: usize,
        host: &dyn TrainingHost,
    ) -> Result<TrainingReport> {
        if corpus.is_empty() {
            return Err(Error::invalid_input("training corpus is empty"));
        }
        if epochs == 0 {
            return Err(Error::invalid_input("epochs must be greater than 0"));
        }

        info!(
            "Starting training with {} epoch(s) over {} item(s) using {}",
            epochs,
            corpus.len(),
            self.engine.engine_name()
        );

        let mut report = TrainingReport {
            epochs_requested: epochs,
            ..Default::default()
        };

        for epoch in 1..=epochs {
            let started = Instant::now();
            let params = host.training_params();
            report.items_processed_in_last_epoch = 0;

            info!("Epoch {}/{} starting", epoch, epochs);

            for (index, item) in corpus.iter().enumerate() {
                if let Err(source) = self.engine.train_step(index, item, &params).await {
                    error!(
                        "Epoch {}/{} aborted at item {}: {}",
                        epoch,
                        epochs,
                        index + 1,
                        source
                    );
                    report.error = Some(source.clone());
                    return Err(Error::TrainingAborted {
                        report: Box::new(report),
                        source,
                    });
                }

                report.items_processed_in_last_epoch = index + 1;
                if index % LOG_EVERY_ITEMS == 0 {
                    debug!("Epoch {} item {}/{}", epoch, index + 1, corpus.len());
                }
            }

            if let Err(source) = self.engine.save_checkpoint(epoch, &params).await {
                error!("Artifact checkpoint for epoch {} failed: {}", epoch, source);
                report.error = Some(source.clone());
                return Err(Error::TrainingAborted {
                    report: Box::new(report),
                    source,
                });
            }

            if let Err(source) = host.checkpoint(epoch).await {
                error!("Checkpoint for epoch {} failed: {}", epoch, source);
                return Err(Error::CheckpointFailed {
                    report: Box::new(report),
                    source: Box::new(source),
                });
            }

            report.epochs_completed = epoch;
            report.epochs.push(EpochSummary {
                epoch,
                items: corpus.len(),
                duration_ms: started.elapsed().as_millis() as u64,
            });

            info!("Epoch {}/{} finished, checkpoint saved", epoch, epochs);
        }

        info!("Training complete");
        Ok(report)
    }
}
