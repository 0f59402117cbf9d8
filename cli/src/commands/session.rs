//! Shared session setup for commands

use anyhow::{anyhow, Context, Result};
use omega_core::{EchoEngine, FileConfigStore, ParamMap, ServiceSettings, SessionManager};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Open the file store and build a session for the configured model
pub async fn open_session(settings: &ServiceSettings) -> Result<SessionManager> {
    let store = FileConfigStore::open(&settings.store_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to open parameter store at {}",
                settings.store_dir.display()
            )
        })?
        .with_history_limit(settings.history_limit);

    debug!("📁 Store: {}", store.record_path().display());

    let session = SessionManager::builder(settings.model_id(), Arc::new(store))
        .with_engine(Arc::new(EchoEngine::new()))
        .build()
        .await;

    Ok(session)
}

/// Parse `KEY=VALUE` arguments into a parameter mapping.
///
/// Values are read as JSON when possible (`0.5`, `20`, `["a","b"]`) and
/// as plain strings otherwise.
pub fn parse_assignments(assignments: &[String]) -> Result<ParamMap> {
    let mut map = ParamMap::new();

    for assignment in assignments {
        let (key, raw) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected KEY=VALUE, got '{}'", assignment))?;

        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("Missing key in '{}'", assignment));
        }

        let value = serde_json::from_str::<Value>(raw.trim())
            .unwrap_or_else(|_| Value::String(raw.to_string()));
        map.insert(key.to_string(), value);
    }

    Ok(map)
}
