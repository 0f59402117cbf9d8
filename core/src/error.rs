//! Error types and handling for Omega Core

use crate::training::TrainingReport;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Omega operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Omega Core
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing request fields (empty prompt, empty corpus, zero epochs)
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// A parameter value outside its declared domain
    #[error("Invalid value for parameter '{field}': {reason}")]
    InvalidParameter { field: String, reason: String },

    /// An override key that names no known parameter
    #[error("Unknown parameter: {key}")]
    UnknownParameter { key: String },

    /// Preset lookup by an unknown task name
    #[error("Preset not found: {name}")]
    PresetNotFound { name: String },

    /// No session is open for the requested model
    #[error("No session open for model: {model}")]
    SessionNotFound { model: String },

    /// Persistence medium errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Generation/training collaborator errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// A training run stopped part-way through an epoch
    #[error(
        "Training aborted in epoch {} after {} item(s): {source}",
        .report.epochs_completed + 1,
        .report.items_processed_in_last_epoch
    )]
    TrainingAborted {
        report: Box<TrainingReport>,
        #[source]
        source: EngineError,
    },

    /// The configuration checkpoint at the end of an epoch could not be saved
    #[error(
        "Checkpoint after epoch {} failed, {} epoch(s) saved: {source}",
        .report.epochs_completed + 1,
        .report.epochs_completed
    )]
    CheckpointFailed {
        report: Box<TrainingReport>,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Whether the caller can recover by correcting its input.
    ///
    /// An API layer maps these to 4xx responses and everything else to 5xx.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput { .. }
                | Error::InvalidParameter { .. }
                | Error::UnknownParameter { .. }
                | Error::PresetNotFound { .. }
                | Error::SessionNotFound { .. }
        )
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_parameter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Persistence errors raised by a [`crate::store::ConfigStore`]
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cannot create store directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write record {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read record {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Corrupt record at {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}

/// Failures reported by the generation or training collaborator
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineError {
    #[error("generation failed: {message}")]
    Generation { message: String },

    /// `item` is the 0-based corpus position of the failing item
    #[error("training step failed on item {item}: {message}")]
    TrainingStep { item: usize, message: String },

    #[error("artifact checkpoint failed: {message}")]
    Checkpoint { message: String },

    #[error("engine unavailable: {message}")]
    Unavailable { message: String },
}
