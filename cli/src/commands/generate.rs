//! Single prompt generation command

use super::session::{open_session, parse_assignments};
use anyhow::Result;
use omega_core::ServiceSettings;
use tracing::{debug, info};

/// Generate text for one prompt, with optional per-call overrides
pub async fn generate_command(
    settings: &ServiceSettings,
    prompt: &str,
    overrides: &[String],
) -> Result<()> {
    let session = open_session(settings).await?;
    let overrides = parse_assignments(overrides)?;

    info!("🤖 Generating with model: {}", session.model());

    let result = session
        .generate(prompt, Some(&overrides).filter(|map| !map.is_empty()))
        .await?;

    debug!("Generation took {}ms", result.duration_ms);
    println!("{}", result.text);

    Ok(())
}
