//! Status and history commands

use super::session::open_session;
use crate::output::print_json;
use anyhow::Result;
use omega_core::ServiceSettings;
use tracing::info;

/// Show the session status
pub async fn status_command(settings: &ServiceSettings) -> Result<()> {
    let session = open_session(settings).await?;
    print_json(&session.status().await)
}

/// Show superseded parameter records, oldest first
pub async fn history_command(settings: &ServiceSettings) -> Result<()> {
    let session = open_session(settings).await?;
    let history = session.history().await?;

    info!("{} superseded record(s)", history.len());
    print_json(&history)
}
