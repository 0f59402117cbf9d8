//! Parameter inspection and update commands

use super::session::{open_session, parse_assignments};
use crate::output::print_params;
use anyhow::Result;
use clap::Subcommand;
use omega_core::ServiceSettings;
use tracing::info;

#[derive(Subcommand)]
pub enum ParamsAction {
    /// Print the live parameters
    Show,

    /// Update and persist parameters, KEY=VALUE
    Set {
        #[arg(value_name = "KEY=VALUE", required = true)]
        assignments: Vec<String>,
    },

    /// Restore and persist the default parameters
    Reset,
}

/// Show, update or reset the session parameters
pub async fn params_command(settings: &ServiceSettings, action: ParamsAction) -> Result<()> {
    let session = open_session(settings).await?;

    match action {
        ParamsAction::Show => print_params(&session.current_params()),
        ParamsAction::Set { assignments } => {
            let overrides = parse_assignments(&assignments)?;
            let params = session.update_params(&overrides).await?;
            info!("✅ Parameters updated for {}", session.model());
            print_params(&params)
        }
        ParamsAction::Reset => {
            let params = session.reset_params().await?;
            info!("✅ Parameters reset for {}", session.model());
            print_params(&params)
        }
    }
}
