//! Minimal configuration module for omega core
//!
//! Only exports pure data types. All loading logic is in CLI layer.

pub mod types;

pub use types::{ServiceSettings, DEFAULT_EPOCHS, DEFAULT_HISTORY_LIMIT};
