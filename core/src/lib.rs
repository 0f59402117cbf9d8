//! # Omega Core
//!
//! Core library for Omega - the parameter and session state manager for a
//! text-generation model service.
//!
//! This library owns the canonical generation configuration, persists it
//! durably, exposes task presets, and serializes concurrent updates so that
//! generation and training requests never observe a partially applied
//! configuration.

// Core modules
pub mod config;
pub mod engine;
pub mod error;
pub mod params;
pub mod session;
pub mod store;
pub mod training;

// Re-export commonly used types
pub use config::ServiceSettings;
pub use engine::{EchoEngine, GeneratedText, GenerationEngine, TrainingEngine};
pub use error::{EngineError, Error, Result, StoreError};
pub use params::{ParamMap, ParamOverrides, ParameterSet, PresetCatalog};
pub use session::{SessionBuilder, SessionManager, SessionRegistry, SessionStatus};
pub use store::{ConfigRecord, ConfigStore, FileConfigStore, MemoryConfigStore};
pub use training::{EpochSummary, TrainingLoop, TrainingReport};

/// Current version of the omega-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing with the given filter directive (e.g. `info`, `omega_core=debug`)
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_tracing(filter: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
