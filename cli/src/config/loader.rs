//! Settings loader for the omega CLI
//!
//! Implements single-source priority loading with environment and flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./omega.json or ./.omega/config.json
//! 3. XDG config: $XDG_CONFIG_HOME/omega/config.json or ~/.config/omega/config.json
//! 4. Built-in defaults (no file)
//!
//! `OMEGA_*` environment variables override the file, and command-line
//! flags override everything.

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File, FileFormat};
use omega_core::ServiceSettings;
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `OMEGA_STORE_DIR`
const ENV_PREFIX: &str = "OMEGA";

/// CLI settings loader
#[derive(Debug, Default)]
pub struct SettingsLoader {
    /// Override settings file/directory path
    config_override: Option<PathBuf>,
    /// Flag overrides
    model_override: Option<PathBuf>,
    store_dir_override: Option<PathBuf>,
}

impl SettingsLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set settings file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Set model path override
    pub fn with_model_override(mut self, model: PathBuf) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Set store directory override
    pub fn with_store_dir_override(mut self, store_dir: PathBuf) -> Self {
        self.store_dir_override = Some(store_dir);
        self
    }

    /// Load and resolve settings
    pub fn load(&self) -> Result<ServiceSettings> {
        let defaults = ServiceSettings::default();

        // Step 1: Built-in defaults
        let mut builder = Config::builder()
            .set_default("model_path", defaults.model_path.display().to_string())?
            .set_default("store_dir", defaults.store_dir.display().to_string())?
            .set_default("default_epochs", defaults.default_epochs as u64)?
            .set_default("history_limit", defaults.history_limit as u64)?
            .set_default("log_level", defaults.log_level.clone())?;

        // Step 2: Settings file, first match in priority order
        if let Some(path) = self.find_settings_file()? {
            builder = builder.add_source(File::from(path).format(FileFormat::Json));
        }

        // Step 3: Environment variables
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        // Step 4: Flag overrides
        if let Some(model) = &self.model_override {
            builder = builder.set_override("model_path", model.display().to_string())?;
        }
        if let Some(store_dir) = &self.store_dir_override {
            builder = builder.set_override("store_dir", store_dir.display().to_string())?;
        }

        let mut settings: ServiceSettings = builder
            .build()
            .context("Failed to assemble settings")?
            .try_deserialize()
            .context("Invalid settings")?;

        settings.model_path = expand_path(&settings.model_path);
        settings.store_dir = expand_path(&settings.store_dir);

        settings
            .validate()
            .map_err(|e| anyhow!("Settings validation failed: {}", e))?;

        Ok(settings)
    }

    /// Find the settings file to use, if any
    fn find_settings_file(&self) -> Result<Option<PathBuf>> {
        if let Some(override_path) = &self.config_override {
            return self.resolve_override(override_path).map(Some);
        }

        let cwd = std::env::current_dir()?;

        // Try ./omega.json first
        let omega_json = cwd.join("omega.json");
        if omega_json.is_file() {
            return Ok(Some(omega_json));
        }

        // Try ./.omega/config.json
        let omega_dir_config = cwd.join(".omega").join("config.json");
        if omega_dir_config.is_file() {
            return Ok(Some(omega_dir_config));
        }

        // XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("omega").join("config.json");
            if config_path.is_file() {
                return Ok(Some(config_path));
            }
        }

        Ok(None)
    }

    /// Resolve an explicit --config path (file or directory)
    fn resolve_override(&self, path: &Path) -> Result<PathBuf> {
        if path.is_file() {
            Ok(path.to_path_buf())
        } else if path.is_dir() {
            let config_file = path.join("config.json");
            if config_file.is_file() {
                Ok(config_file)
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }
}

/// Expand a leading `~` and environment references in a path
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(&raw).as_ref()),
    }
}
