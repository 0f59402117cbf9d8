//! Training command

use super::session::open_session;
use crate::output::print_json;
use anyhow::{Context, Result};
use omega_core::{Error, ServiceSettings};
use std::path::Path;
use tracing::{error, info};

/// Train over a corpus file for the given or configured number of epochs
pub async fn train_command(
    settings: &ServiceSettings,
    file: &Path,
    epochs: Option<usize>,
) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read corpus file: {}", file.display()))?;
    let corpus = read_corpus(&content);
    let epochs = epochs.unwrap_or(settings.default_epochs);

    let session = open_session(settings).await?;
    info!(
        "📚 Training {} on {} item(s) for {} epoch(s)",
        session.model(),
        corpus.len(),
        epochs
    );

    match session.train(&corpus, epochs).await {
        Ok(report) => {
            info!("✅ Training complete");
            print_json(&report)
        }
        Err(Error::TrainingAborted { report, source }) => {
            error!("❌ Training aborted: {}", source);
            print_json(&report)?;
            Err(Error::TrainingAborted { report, source }.into())
        }
        Err(Error::CheckpointFailed { report, source }) => {
            error!("❌ Training stopped, checkpoint failed: {}", source);
            print_json(&report)?;
            Err(Error::CheckpointFailed { report, source }.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// One training item per non-blank line, trimmed
fn read_corpus(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
