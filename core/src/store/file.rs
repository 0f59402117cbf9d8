//! File-backed configuration store

use super::{ConfigRecord, ConfigStore};
use crate::error::{Result, StoreError};
use crate::params::ParameterSet;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Name of the live record inside the store directory
pub const RECORD_FILE_NAME: &str = "api.json";

/// Subdirectory holding superseded records
pub const HISTORY_DIR_NAME: &str = "history";

/// Stores the live record as `<dir>/api.json`, replaced by atomic rename
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    dir: PathBuf,
    record_path: PathBuf,
    history_limit: usize,
}

impl FileConfigStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// Fails immediately when the directory cannot be created.
    pub async fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        fs::create_dir_all(&dir)
            .await
            .map_err(|source| StoreError::CreateDir {
                path: dir.clone(),
                source,
            })?;

        let record_path = dir.join(RECORD_FILE_NAME);
        debug!("Opened config store at {}", record_path.display());

        Ok(Self {
            dir,
            record_path,
            history_limit: 0,
        })
    }

    /// Keep up to `limit` superseded records under `history/` (0 disables)
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Default store directory under the user's data dir
    pub fn default_dir() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("omega");
        path.push("models");
        path
    }

    /// Path of the live record
    pub fn record_path(&self) -> &Path {
        &self.record_path
    }

    /// Store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn history_dir(&self) -> PathBuf {
        self.dir.join(HISTORY_DIR_NAME)
    }

    /// Add a superseded record to history and prune the oldest entries
    async fn archive(&self, superseded: Vec<u8>) -> Result<()> {
        let history_dir = self.history_dir();
        fs::create_dir_all(&history_dir)
            .await
            .map_err(|source| StoreError::CreateDir {
                path: history_dir.clone(),
                source,
            })?;

        let name = format!(
            "api_{}_{}.json",
            Utc::now().format("%Y%m%dT%H%M%S%.6f"),
            Uuid::new_v4().simple()
        );
        write_atomic(&history_dir, &history_dir.join(name), superseded).await?;

        let mut archived = list_json_files(&history_dir).await?;
        if archived.len() > self.history_limit {
            archived.sort();
            let excess = archived.len() - self.history_limit;
            for old in archived.into_iter().take(excess) {
                if let Err(e) = fs::remove_file(&old).await {
                    warn!("Failed to prune {}: {}", old.display(), e);
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load_record(&self) -> Result<Option<ConfigRecord>> {
        read_record(&self.record_path).await
    }

    async fn save(&self, params: &ParameterSet) -> Result<ConfigRecord> {
        let record = ConfigRecord::new(params);
        let content = serde_json::to_vec_pretty(&record).map_err(StoreError::from)?;

        let superseded = if self.history_limit > 0 {
            read_bytes(&self.record_path).await?
        } else {
            None
        };

        write_atomic(&self.dir, &self.record_path, content).await?;
        info!("Parameters saved to {}", self.record_path.display());

        // the new record is live now, so history trouble must not fail the save
        if let Some(superseded) = superseded {
            if let Err(e) = self.archive(superseded).await {
                warn!("Failed to archive superseded record: {}", e);
            }
        }

        Ok(record)
    }

    async fn history(&self) -> Result<Vec<ConfigRecord>> {
        let history_dir = self.history_dir();
        let exists = fs::try_exists(&history_dir)
            .await
            .map_err(|source| StoreError::Read {
                path: history_dir.clone(),
                source,
            })?;
        if !exists {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for path in list_json_files(&history_dir).await? {
            match read_record(&path).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable history entry: {}", e),
            }
        }
        records.sort_by_key(|record| record.saved_at);

        Ok(records)
    }

    fn location(&self) -> String {
        self.record_path.display().to_string()
    }
}

/// Write `content` to a temp file in `dir`, flush it, then rename over `path`
async fn write_atomic(dir: &Path, path: &Path, content: Vec<u8>) -> Result<()> {
    let dir = dir.to_path_buf();
    let target = path.to_path_buf();

    let written = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(&content)?;
        temp.as_file().sync_all()?;
        temp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| StoreError::Unavailable {
        message: format!("write task failed: {}", e),
    })?;

    written.map_err(|source| {
        StoreError::Write {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// File contents, `None` when the file does not exist
async fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Read {
            path: path.to_path_buf(),
            source,
        }
        .into()),
    }
}

async fn read_record(path: &Path) -> Result<Option<ConfigRecord>> {
    let Some(bytes) = read_bytes(path).await? else {
        return Ok(None);
    };

    let corrupt = |message: String| StoreError::Corrupt {
        path: path.to_path_buf(),
        message,
    };

    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;

    let legacy_saved_at = fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    let record = ConfigRecord::from_value(value, legacy_saved_at).map_err(corrupt)?;
    Ok(Some(record))
}

async fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_err = |source| StoreError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir).await.map_err(read_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            files.push(path);
        }
    }

    Ok(files)
}
