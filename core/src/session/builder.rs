//! Session construction

use super::SessionManager;
use crate::engine::{EchoEngine, GenerationEngine, TrainingEngine};
use crate::params::PresetCatalog;
use crate::store::ConfigStore;
use std::sync::Arc;
use tracing::info;

/// Builder for creating a [`SessionManager`] bound to one model and store
pub struct SessionBuilder {
    model: String,
    store: Arc<dyn ConfigStore>,
    presets: Option<Arc<PresetCatalog>>,
    generator: Option<Arc<dyn GenerationEngine>>,
    trainer: Option<Arc<dyn TrainingEngine>>,
}

impl SessionBuilder {
    /// Create a builder for `model` persisted in `store`
    pub fn new<S: Into<String>>(model: S, store: Arc<dyn ConfigStore>) -> Self {
        Self {
            model: model.into(),
            store,
            presets: None,
            generator: None,
            trainer: None,
        }
    }

    /// Use one engine for both generation and training
    pub fn with_engine<E>(mut self, engine: Arc<E>) -> Self
    where
        E: GenerationEngine + TrainingEngine + 'static,
    {
        self.generator = Some(engine.clone());
        self.trainer = Some(engine);
        self
    }

    /// Set the generation engine
    pub fn with_generation_engine(mut self, engine: Arc<dyn GenerationEngine>) -> Self {
        self.generator = Some(engine);
        self
    }

    /// Set the training engine
    pub fn with_training_engine(mut self, engine: Arc<dyn TrainingEngine>) -> Self {
        self.trainer = Some(engine);
        self
    }

    /// Replace the process-wide preset catalog
    pub fn with_presets(mut self, presets: Arc<PresetCatalog>) -> Self {
        self.presets = Some(presets);
        self
    }

    /// Load the persisted parameters and build the session.
    ///
    /// Engines not set explicitly default to [`EchoEngine`].
    pub async fn build(self) -> SessionManager {
        let params = self.store.load().await;
        info!(
            "Session for {} ready (store: {})",
            self.model,
            self.store.location()
        );

        let echo = Arc::new(EchoEngine::new());
        let generator = self
            .generator
            .unwrap_or_else(|| echo.clone() as Arc<dyn GenerationEngine>);
        let trainer = self
            .trainer
            .unwrap_or_else(|| echo as Arc<dyn TrainingEngine>);

        SessionManager::from_parts(
            self.model,
            params,
            self.store,
            self.presets.unwrap_or_else(PresetCatalog::shared),
            generator,
            trainer,
        )
    }
}
