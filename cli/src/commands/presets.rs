//! Preset commands

use super::session::open_session;
use crate::output::{format_preset, print_params};
use anyhow::Result;
use omega_core::{PresetCatalog, ServiceSettings};
use tracing::info;

/// List available presets
pub async fn presets_command() -> Result<()> {
    info!("Listing presets");

    let catalog = PresetCatalog::shared();
    for (name, overrides) in catalog.entries() {
        println!("{}", format_preset(name, overrides));
    }

    Ok(())
}

/// Apply a preset to the live parameters
pub async fn preset_command(settings: &ServiceSettings, name: &str) -> Result<()> {
    let session = open_session(settings).await?;
    let params = session.apply_preset(name).await?;

    info!("✅ Preset '{}' applied to {}", name, session.model());
    print_params(&params)
}
