//! SessionManager implementation

use super::builder::SessionBuilder;
use crate::engine::{GeneratedText, GenerationEngine, TrainingEngine};
use crate::error::{Error, Result};
use crate::params::{ParamMap, ParamOverrides, ParameterSet, PresetCatalog};
use crate::store::{ConfigRecord, ConfigStore};
use crate::training::{TrainingHost, TrainingLoop, TrainingReport};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Owns the live parameter set for one model and routes work to the engines.
///
/// Readers take an `Arc` snapshot of the current parameters and keep it for
/// the whole request. Writers (updates, presets, resets, training
/// checkpoints) are serialized by one async mutex that spans
/// validate, persist and swap, so the store and the in-memory value never
/// disagree.
pub struct SessionManager {
    model: String,
    current: RwLock<Arc<ParameterSet>>,
    update_lock: Mutex<()>,
    store: Arc<dyn ConfigStore>,
    presets: Arc<PresetCatalog>,
    generator: Arc<dyn GenerationEngine>,
    trainer: Arc<dyn TrainingEngine>,
    training_active: AtomicBool,
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub model: String,
    pub store: String,
    pub params: ParameterSet,
    pub saved_at: Option<DateTime<Utc>>,
    pub training: bool,
}

impl SessionManager {
    /// Start building a session for `model` persisted in `store`
    pub fn builder<S: Into<String>>(model: S, store: Arc<dyn ConfigStore>) -> SessionBuilder {
        SessionBuilder::new(model, store)
    }

    pub(crate) fn from_parts(
        model: String,
        params: ParameterSet,
        store: Arc<dyn ConfigStore>,
        presets: Arc<PresetCatalog>,
        generator: Arc<dyn GenerationEngine>,
        trainer: Arc<dyn TrainingEngine>,
    ) -> Self {
        Self {
            model,
            current: RwLock::new(Arc::new(params)),
            update_lock: Mutex::new(()),
            store,
            presets,
            generator,
            trainer,
            training_active: AtomicBool::new(false),
        }
    }

    /// Model identity this session is bound to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Preset table used by [`SessionManager::apply_preset`]
    pub fn presets(&self) -> &PresetCatalog {
        &self.presets
    }

    /// Snapshot of the live configuration
    pub fn current_params(&self) -> Arc<ParameterSet> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merge `overrides` into the live configuration, persist it, then activate it.
    ///
    /// All-or-nothing: on any error the previous configuration stays active
    /// and the store is untouched or holds the previous record.
    pub async fn update_params(&self, overrides: &ParamMap) -> Result<Arc<ParameterSet>> {
        if overrides.is_empty() {
            return Err(Error::invalid_input("no parameters provided"));
        }

        let overrides = ParamOverrides::from_map(overrides)?;
        info!("Updating parameters: {:?}", overrides.fields());

        self.commit(|current| current.merge(&overrides)).await
    }

    /// Apply the named preset on top of the live configuration
    pub async fn apply_preset(&self, task_name: &str) -> Result<Arc<ParameterSet>> {
        let overrides = self.presets.resolve(task_name)?.clone();
        info!("Applying preset '{}'", task_name);

        self.commit(|current| current.merge(&overrides)).await
    }

    /// Restore and persist the default configuration
    pub async fn reset_params(&self) -> Result<Arc<ParameterSet>> {
        info!("Resetting parameters to defaults");
        self.commit(|_| ParameterSet::default()).await
    }

    /// Generate text for `prompt`.
    ///
    /// `overrides` apply to this call only and are never persisted. The
    /// engine call runs without holding any lock.
    pub async fn generate(
        &self,
        prompt: &str,
        overrides: Option<&ParamMap>,
    ) -> Result<GeneratedText> {
        if prompt.trim().is_empty() {
            return Err(Error::invalid_input("prompt must not be empty"));
        }

        let snapshot = self.current_params();
        let params = match overrides {
            Some(map) if !map.is_empty() => {
                let params = snapshot.merge_mapping(map)?;
                params.validate()?;
                params
            }
            _ => (*snapshot).clone(),
        };

        debug!(
            "Generating with {} (temperature {}, max_tokens {})",
            self.generator.engine_name(),
            params.temperature,
            params.max_tokens
        );

        let started = Instant::now();
        let text = self
            .generator
            .generate(prompt, &params)
            .await
            .map_err(|e| {
                warn!("Generation failed for model {}: {}", self.model, e);
                Error::Engine(e)
            })?;

        Ok(GeneratedText {
            text,
            model: self.model.clone(),
            params,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Train over `corpus` for `epochs`, checkpointing after each epoch.
    ///
    /// Only one run may be active per session; a second concurrent call is
    /// rejected as invalid input.
    pub async fn train(&self, corpus: &[String], epochs: usize) -> Result<TrainingReport> {
        if self
            .training_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::invalid_input(format!(
                "a training run is already in progress for {}",
                self.model
            )));
        }
        let _active = TrainingFlag(&self.training_active);

        TrainingLoop::new(self.trainer.clone())
            .run(corpus, epochs, self)
            .await
    }

    /// Model, store location, live parameters and training state
    pub async fn status(&self) -> SessionStatus {
        let saved_at = match self.store.load_record().await {
            Ok(record) => record.map(|r| r.saved_at),
            Err(e) => {
                warn!("Failed to read record for status: {}", e);
                None
            }
        };

        SessionStatus {
            model: self.model.clone(),
            store: self.store.location(),
            params: (*self.current_params()).clone(),
            saved_at,
            training: self.training_active.load(Ordering::SeqCst),
        }
    }

    /// Superseded records kept by the store, oldest first
    pub async fn history(&self) -> Result<Vec<ConfigRecord>> {
        self.store.history().await
    }

    /// Validate, persist, then swap, all under the update lock
    async fn commit<F>(&self, next: F) -> Result<Arc<ParameterSet>>
    where
        F: FnOnce(&ParameterSet) -> ParameterSet,
    {
        let _guard = self.update_lock.lock().await;

        let current = self.current_params();
        let candidate = next(current.as_ref());
        if let Err(e) = candidate.validate() {
            warn!("Rejected parameter update: {}", e);
            return Err(e);
        }

        self.store.save(&candidate).await?;

        let candidate = Arc::new(candidate);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = candidate.clone();
        debug!("Activated new parameters for {}", self.model);

        Ok(candidate)
    }
}

#[async_trait]
impl TrainingHost for SessionManager {
    fn training_params(&self) -> Arc<ParameterSet> {
        self.current_params()
    }

    async fn checkpoint(&self, epoch: usize) -> Result<()> {
        let _guard = self.update_lock.lock().await;
        let params = self.current_params();
        self.store.save(&params).await?;
        debug!("Checkpointed parameters after epoch {}", epoch);
        Ok(())
    }
}

/// Clears the training flag when a run ends, including on early return
struct TrainingFlag<'a>(&'a AtomicBool);

impl Drop for TrainingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
