//! Sessions keyed by model identity

use super::SessionManager;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Holds one [`SessionManager`] per model so several models can be served side by side
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionManager>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `model`, opening it with `open` if absent.
    ///
    /// Concurrent callers for the same model share one session.
    pub async fn get_or_open<F, Fut>(&self, model: &str, open: F) -> Result<Arc<SessionManager>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SessionManager>>,
    {
        if let Some(session) = self.sessions.read().await.get(model) {
            return Ok(session.clone());
        }

        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(model) {
            return Ok(session.clone());
        }

        let session = Arc::new(open().await?);
        sessions.insert(model.to_string(), session.clone());
        info!("Opened session for {}", model);

        Ok(session)
    }

    /// Session for `model`
    pub async fn get(&self, model: &str) -> Result<Arc<SessionManager>> {
        self.sessions
            .read()
            .await
            .get(model)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound {
                model: model.to_string(),
            })
    }

    /// Drop the session for `model`; in-flight requests keep their handle
    pub async fn remove(&self, model: &str) -> Option<Arc<SessionManager>> {
        self.sessions.write().await.remove(model)
    }

    /// Models with an open session, sorted
    pub async fn models(&self) -> Vec<String> {
        let mut models: Vec<_> = self.sessions.read().await.keys().cloned().collect();
        models.sort();
        models
    }
}
