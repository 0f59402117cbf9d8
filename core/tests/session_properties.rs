//! End-to-end behaviour of a session against in-memory and file stores

use async_trait::async_trait;
use omega_core::engine::EngineResult;
use omega_core::{
    ConfigStore, EngineError, Error, FileConfigStore, GenerationEngine, MemoryConfigStore,
    ParamMap, ParameterSet, SessionManager, TrainingEngine,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::Notify;

fn map(value: Value) -> ParamMap {
    value.as_object().cloned().unwrap()
}

/// Records the parameters of every generation call
#[derive(Default)]
struct RecordingEngine {
    seen: Mutex<Vec<ParameterSet>>,
}

#[async_trait]
impl GenerationEngine for RecordingEngine {
    async fn generate(&self, prompt: &str, params: &ParameterSet) -> EngineResult<String> {
        self.seen.lock().unwrap().push(params.clone());
        Ok(prompt.to_uppercase())
    }

    fn engine_name(&self) -> &str {
        "recording"
    }
}

/// Blocks every generation until released
#[derive(Default)]
struct GatedEngine {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl GenerationEngine for GatedEngine {
    async fn generate(&self, _prompt: &str, params: &ParameterSet) -> EngineResult<String> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(format!("t={}", params.temperature))
    }

    fn engine_name(&self) -> &str {
        "gated"
    }
}

struct BrokenEngine;

#[async_trait]
impl GenerationEngine for BrokenEngine {
    async fn generate(&self, _prompt: &str, _params: &ParameterSet) -> EngineResult<String> {
        Err(EngineError::Generation {
            message: "model not loaded".into(),
        })
    }

    fn engine_name(&self) -> &str {
        "broken"
    }
}

/// Fails the n-th step overall (1-based); `None` never fails
struct CountingTrainer {
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
}

impl CountingTrainer {
    fn new(fail_on_call: Option<usize>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on_call,
        }
    }
}

#[async_trait]
impl TrainingEngine for CountingTrainer {
    async fn train_step(
        &self,
        _index: usize,
        _item: &str,
        _params: &ParameterSet,
    ) -> EngineResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if Some(call) == self.fail_on_call {
            return Err(EngineError::TrainingStep {
                item: call,
                message: "nan loss".into(),
            });
        }
        tokio::task::yield_now().await;
        Ok(())
    }

    fn engine_name(&self) -> &str {
        "counting"
    }
}

#[tokio::test]
async fn update_round_trips_through_store() {
    let temp_dir = tempdir().unwrap();
    let store = Arc::new(FileConfigStore::open(temp_dir.path()).await.unwrap());
    let session = SessionManager::builder("model.bin", store.clone())
        .build()
        .await;

    let overrides = map(json!({"temperature": 0.25, "stop_sequences": ["</s>"]}));
    let expected = ParameterSet::default().merge_mapping(&overrides).unwrap();

    let updated = session.update_params(&overrides).await.unwrap();
    assert_eq!(*updated, expected);
    assert_eq!(store.load().await, expected);

    // a fresh session over the same directory sees the persisted value
    let reopened = FileConfigStore::open(temp_dir.path()).await.unwrap();
    let restarted = SessionManager::builder("model.bin", Arc::new(reopened))
        .build()
        .await;
    assert_eq!(*restarted.current_params(), expected);
}

#[tokio::test]
async fn out_of_domain_update_changes_nothing() {
    let store = Arc::new(MemoryConfigStore::new());
    let session = SessionManager::builder("model.bin", store.clone())
        .build()
        .await;
    let before = session.current_params();

    let err = session
        .update_params(&map(json!({"temperature": 5.0, "top_k": 3})))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidParameter { ref field, .. } if field == "temperature"));
    assert!(err.is_client_error());
    assert_eq!(session.current_params(), before);
    assert!(store.writes().await.is_empty());
}

#[tokio::test]
async fn unknown_key_is_rejected() {
    let store = Arc::new(MemoryConfigStore::new());
    let session = SessionManager::builder("model.bin", store.clone())
        .build()
        .await;

    let err = session
        .update_params(&map(json!({"temperature": 0.5, "seed": 42})))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownParameter { ref key } if key == "seed"));
    assert_eq!(*session.current_params(), ParameterSet::default());
}

#[tokio::test]
async fn code_preset_overrides_only_its_fields() {
    let store = Arc::new(MemoryConfigStore::new());
    let session = SessionManager::builder("model.bin", store.clone())
        .build()
        .await;
    session
        .update_params(&map(json!({"top_k": 7, "repeat_penalty": 1.3})))
        .await
        .unwrap();

    let params = session.apply_preset("code").await.unwrap();

    assert_eq!(params.temperature, 0.5);
    assert_eq!(params.top_p, 0.9);
    assert_eq!(params.max_tokens, 500);
    assert_eq!(params.frequency_penalty, 0.2);
    assert_eq!(params.stop_sequences, vec!["\n\n", "```"]);
    // untouched by the preset
    assert_eq!(params.top_k, 7);
    assert_eq!(params.repeat_penalty, 1.3);
    assert_eq!(store.load().await, *params);
}

#[tokio::test]
async fn unknown_preset_is_reported() {
    let store = Arc::new(MemoryConfigStore::new());
    let session = SessionManager::builder("model.bin", store.clone())
        .build()
        .await;

    let err = session.apply_preset("poetry").await.unwrap_err();
    assert!(matches!(err, Error::PresetNotFound { ref name } if name == "poetry"));
    assert!(store.writes().await.is_empty());
}

#[tokio::test]
async fn per_call_override_never_touches_session_state() {
    let store = Arc::new(MemoryConfigStore::new());
    let engine = Arc::new(RecordingEngine::default());
    let session = SessionManager::builder("model.bin", store.clone())
        .with_generation_engine(engine.clone())
        .build()
        .await;
    let before = session.current_params();

    let result = session
        .generate("hello", Some(&map(json!({"temperature": 1.9, "max_tokens": 5}))))
        .await
        .unwrap();

    assert_eq!(result.text, "HELLO");
    assert_eq!(result.params.temperature, 1.9);
    assert_eq!(result.params.max_tokens, 5);
    assert_eq!(session.current_params(), before);
    assert!(store.writes().await.is_empty());

    let plain = session.generate("again", None).await.unwrap();
    assert_eq!(plain.params, *before);
    assert_eq!(engine.seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn engine_failure_is_surfaced() {
    let session = SessionManager::builder("model.bin", Arc::new(MemoryConfigStore::new()))
        .with_generation_engine(Arc::new(BrokenEngine))
        .build()
        .await;

    let err = session.generate("hi", None).await.unwrap_err();
    assert!(matches!(err, Error::Engine(EngineError::Generation { .. })));
    assert!(!err.is_client_error());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_flight_generation_keeps_its_snapshot() {
    let engine = Arc::new(GatedEngine::default());
    let session = Arc::new(
        SessionManager::builder("model.bin", Arc::new(MemoryConfigStore::new()))
            .with_generation_engine(engine.clone())
            .build()
            .await,
    );

    let generating = {
        let session = session.clone();
        tokio::spawn(async move { session.generate("slow", None).await })
    };
    engine.entered.notified().await;

    // the update must not wait for the engine call to finish
    let updated = tokio::time::timeout(
        Duration::from_secs(5),
        session.update_params(&map(json!({"temperature": 1.5}))),
    )
    .await
    .expect("update blocked by generation")
    .unwrap();
    assert_eq!(updated.temperature, 1.5);

    engine.release.notify_one();
    let result = generating.await.unwrap().unwrap();
    assert_eq!(result.text, "t=0.7");
    assert_eq!(result.params.temperature, 0.7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_never_mix_payloads() {
    let store = Arc::new(MemoryConfigStore::new());
    let session = Arc::new(
        SessionManager::builder("model.bin", store.clone())
            .build()
            .await,
    );

    let handles: Vec<_> = (1..=32u32)
        .map(|i| {
            let session = session.clone();
            tokio::spawn(async move {
                let payload = map(json!({
                    "temperature": f64::from(i) / 20.0,
                    "top_k": i,
                    "max_tokens": 1000 + i,
                }));
                session.update_params(&payload).await
            })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    let writes = store.writes().await;
    assert_eq!(writes.len(), 32);
    for record in &writes {
        let params = record.parameters(&ParameterSet::default()).unwrap();
        let i = params.top_k;
        assert_eq!(params.max_tokens, 1000 + i);
        assert_eq!(params.temperature, f64::from(i) / 20.0);
    }

    // the last persisted record is the active one
    let last = writes
        .last()
        .unwrap()
        .parameters(&ParameterSet::default())
        .unwrap();
    assert_eq!(*session.current_params(), last);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_file_writes_are_never_torn() {
    let temp_dir = tempdir().unwrap();
    let store = Arc::new(FileConfigStore::open(temp_dir.path()).await.unwrap());
    let session = Arc::new(
        SessionManager::builder("model.bin", store.clone())
            .build()
            .await,
    );
    session
        .update_params(&map(json!({"top_k": 0, "stop_sequences": []})))
        .await
        .unwrap();

    let writers: Vec<_> = (1..=16u32)
        .map(|i| {
            let session = session.clone();
            tokio::spawn(async move {
                let stops: Vec<String> = (0..i).map(|n| format!("stop-{}", n)).collect();
                session
                    .update_params(&map(json!({"top_k": i, "stop_sequences": stops})))
                    .await
            })
        })
        .collect();

    let reader = {
        let store = store.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                let record = store.load_record().await.unwrap().unwrap();
                let params = record.parameters(&ParameterSet::default()).unwrap();
                assert_eq!(params.stop_sequences.len(), params.top_k as usize);
                tokio::task::yield_now().await;
            }
        })
    };

    for result in futures::future::join_all(writers).await {
        result.unwrap().unwrap();
    }
    reader.await.unwrap();

    assert_eq!(store.load().await, *session.current_params());
}

#[tokio::test]
async fn training_failure_in_first_epoch_writes_no_checkpoint() {
    let store = Arc::new(MemoryConfigStore::new());
    let session = SessionManager::builder("model.bin", store.clone())
        .with_training_engine(Arc::new(CountingTrainer::new(Some(2))))
        .build()
        .await;

    let corpus = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let err = session.train(&corpus, 2).await.unwrap_err();

    let Error::TrainingAborted { report, .. } = err else {
        panic!("expected TrainingAborted");
    };
    assert_eq!(report.epochs_completed, 0);
    assert_eq!(report.items_processed_in_last_epoch, 1);
    assert!(matches!(
        report.error,
        Some(EngineError::TrainingStep { .. })
    ));
    assert!(store.writes().await.is_empty());
    assert!(!session.status().await.training);
}

/// Turns the store read-only from the artifact checkpoint of a given epoch
struct StoreBreakingTrainer {
    store: Arc<MemoryConfigStore>,
    break_at_epoch: usize,
}

#[async_trait]
impl TrainingEngine for StoreBreakingTrainer {
    async fn train_step(
        &self,
        _index: usize,
        _item: &str,
        _params: &ParameterSet,
    ) -> EngineResult<()> {
        Ok(())
    }

    async fn save_checkpoint(&self, epoch: usize, _params: &ParameterSet) -> EngineResult<()> {
        if epoch == self.break_at_epoch {
            self.store.set_reject_writes(true);
        }
        Ok(())
    }

    fn engine_name(&self) -> &str {
        "store-breaking"
    }
}

#[tokio::test]
async fn failed_checkpoint_save_keeps_training_report() {
    let store = Arc::new(MemoryConfigStore::new());
    let session = SessionManager::builder("model.bin", store.clone())
        .with_training_engine(Arc::new(StoreBreakingTrainer {
            store: store.clone(),
            break_at_epoch: 2,
        }))
        .build()
        .await;

    let corpus = vec!["a".to_string(), "b".to_string()];
    let err = session.train(&corpus, 3).await.unwrap_err();

    let Error::CheckpointFailed { report, source } = err else {
        panic!("expected CheckpointFailed");
    };
    assert!(matches!(*source, Error::Store(_)));
    assert_eq!(report.epochs_requested, 3);
    assert_eq!(report.epochs_completed, 1);
    assert_eq!(report.items_processed_in_last_epoch, 2);
    assert_eq!(store.writes().await.len(), 1);
    assert!(!session.status().await.training);
}

#[tokio::test]
async fn read_only_store_fails_first_checkpoint_with_report() {
    let store = Arc::new(MemoryConfigStore::new());
    store.set_reject_writes(true);
    let session = SessionManager::builder("model.bin", store.clone())
        .with_training_engine(Arc::new(CountingTrainer::new(None)))
        .build()
        .await;

    let corpus = vec!["a".to_string(), "b".to_string()];
    let err = session.train(&corpus, 3).await.unwrap_err();

    let Error::CheckpointFailed { report, .. } = err else {
        panic!("expected CheckpointFailed");
    };
    assert_eq!(report.epochs_completed, 0);
    assert_eq!(report.items_processed_in_last_epoch, 2);
    assert!(report.epochs.is_empty());
}

#[tokio::test]
async fn training_checkpoints_every_epoch() {
    let store = Arc::new(MemoryConfigStore::new());
    let session = SessionManager::builder("model.bin", store.clone())
        .with_training_engine(Arc::new(CountingTrainer::new(None)))
        .build()
        .await;

    let corpus = vec!["a".to_string(), "b".to_string()];
    let report = session.train(&corpus, 3).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.epochs_completed, 3);
    assert_eq!(report.items_processed_in_last_epoch, 2);
    assert_eq!(
        report.epochs.iter().map(|e| e.epoch).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    // parameters unchanged, yet each epoch still checkpointed
    let writes = store.writes().await;
    assert_eq!(writes.len(), 3);
    for record in writes {
        assert_eq!(
            record.parameters(&ParameterSet::default()).unwrap(),
            ParameterSet::default()
        );
    }
}

#[tokio::test]
async fn training_rejects_bad_input() {
    let session = SessionManager::builder("model.bin", Arc::new(MemoryConfigStore::new()))
        .build()
        .await;

    let err = session.train(&[], 2).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }));

    let err = session.train(&["x".to_string()], 0).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }));
}

#[tokio::test]
async fn empty_store_yields_documented_defaults() {
    let temp_dir = tempdir().unwrap();
    let store = FileConfigStore::open(temp_dir.path()).await.unwrap();
    let params = store.load().await;

    assert_eq!(params.temperature, 0.7);
    assert_eq!(params.top_p, 0.95);
    assert_eq!(params.top_k, 40);
    assert_eq!(params.max_tokens, 200);
    assert_eq!(params.presence_penalty, 0.0);
    assert_eq!(params.frequency_penalty, 0.0);
    assert!(params.stop_sequences.is_empty());
    assert_eq!(params.repeat_penalty, 1.1);
}
