//! In-memory configuration store

use super::{ConfigRecord, ConfigStore};
use crate::error::{Result, StoreError};
use crate::params::ParameterSet;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Keeps records in process memory; nothing survives a restart.
///
/// Every save is retained in [`MemoryConfigStore::writes`], and writes can
/// be switched off to simulate an unwritable medium.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    records: RwLock<Vec<ConfigRecord>>,
    reject_writes: AtomicBool,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `params` already persisted
    pub fn with_params(params: &ParameterSet) -> Self {
        Self {
            records: RwLock::new(vec![ConfigRecord::new(params)]),
            reject_writes: AtomicBool::new(false),
        }
    }

    /// Make subsequent saves fail with `StoreError::Unavailable`
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Every record written so far, oldest first
    pub async fn writes(&self) -> Vec<ConfigRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load_record(&self) -> Result<Option<ConfigRecord>> {
        Ok(self.records.read().await.last().cloned())
    }

    async fn save(&self, params: &ParameterSet) -> Result<ConfigRecord> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: "memory store is read-only".to_string(),
            }
            .into());
        }

        let record = ConfigRecord::new(params);
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn history(&self) -> Result<Vec<ConfigRecord>> {
        let records = self.records.read().await;
        let superseded = records.len().saturating_sub(1);
        Ok(records[..superseded].to_vec())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
