//! The canonical generation configuration

use super::overrides::{ParamMap, ParamOverrides};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Names of every field a [`ParameterSet`] carries, in persisted order
pub const PARAMETER_FIELDS: [&str; 8] = [
    "temperature",
    "top_p",
    "top_k",
    "max_tokens",
    "presence_penalty",
    "frequency_penalty",
    "stop_sequences",
    "repeat_penalty",
];

/// One fully populated generation configuration.
///
/// Instances are never edited in place by the session layer: every update
/// produces a new value via [`ParameterSet::merge`] and the old one is
/// dropped once no in-flight request holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Sampling temperature, 0.0 to 2.0
    pub temperature: f64,
    /// Nucleus sampling mass, 0.0 to 1.0
    pub top_p: f64,
    /// Top-k cutoff, 0 disables it
    pub top_k: u32,
    /// Maximum tokens to generate, at least 1
    pub max_tokens: u32,
    /// Presence penalty, -2.0 to 2.0
    pub presence_penalty: f64,
    /// Frequency penalty, -2.0 to 2.0
    pub frequency_penalty: f64,
    /// Sequences that end generation, may be empty
    pub stop_sequences: Vec<String>,
    /// Repetition penalty, non-negative
    pub repeat_penalty: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_tokens: 200,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            stop_sequences: Vec::new(),
            repeat_penalty: 1.1,
        }
    }
}

impl ParameterSet {
    /// Check every field against its domain.
    ///
    /// Reports the first offending field; nothing is persisted or used
    /// before this passes.
    pub fn validate(&self) -> Result<()> {
        check_range("temperature", self.temperature, 0.0, 2.0)?;
        check_range("top_p", self.top_p, 0.0, 1.0)?;

        if self.max_tokens == 0 {
            return Err(Error::invalid_parameter(
                "max_tokens",
                "must be greater than 0",
            ));
        }

        check_range("presence_penalty", self.presence_penalty, -2.0, 2.0)?;
        check_range("frequency_penalty", self.frequency_penalty, -2.0, 2.0)?;

        for (i, stop) in self.stop_sequences.iter().enumerate() {
            if stop.is_empty() {
                return Err(Error::invalid_parameter(
                    format!("stop_sequences[{}]", i),
                    "stop sequences must not be empty",
                ));
            }
        }

        if !self.repeat_penalty.is_finite() || self.repeat_penalty < 0.0 {
            return Err(Error::invalid_parameter(
                "repeat_penalty",
                format!("must be a non-negative number, got {}", self.repeat_penalty),
            ));
        }

        Ok(())
    }

    /// Produce a new set equal to `self` except for the fields present in `overrides`
    pub fn merge(&self, overrides: &ParamOverrides) -> ParameterSet {
        let mut merged = self.clone();
        if let Some(v) = overrides.temperature {
            merged.temperature = v;
        }
        if let Some(v) = overrides.top_p {
            merged.top_p = v;
        }
        if let Some(v) = overrides.top_k {
            merged.top_k = v;
        }
        if let Some(v) = overrides.max_tokens {
            merged.max_tokens = v;
        }
        if let Some(v) = overrides.presence_penalty {
            merged.presence_penalty = v;
        }
        if let Some(v) = overrides.frequency_penalty {
            merged.frequency_penalty = v;
        }
        if let Some(v) = &overrides.stop_sequences {
            merged.stop_sequences = v.clone();
        }
        if let Some(v) = overrides.repeat_penalty {
            merged.repeat_penalty = v;
        }
        merged
    }

    /// Merge a raw key/value mapping, rejecting keys that name no parameter
    pub fn merge_mapping(&self, overrides: &ParamMap) -> Result<ParameterSet> {
        let parsed = ParamOverrides::from_map(overrides)?;
        Ok(self.merge(&parsed))
    }

    /// Plain key/value form used for persistence and transport
    pub fn to_mapping(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("temperature".into(), Value::from(self.temperature));
        map.insert("top_p".into(), Value::from(self.top_p));
        map.insert("top_k".into(), Value::from(self.top_k));
        map.insert("max_tokens".into(), Value::from(self.max_tokens));
        map.insert("presence_penalty".into(), Value::from(self.presence_penalty));
        map.insert(
            "frequency_penalty".into(),
            Value::from(self.frequency_penalty),
        );
        map.insert(
            "stop_sequences".into(),
            Value::from(self.stop_sequences.clone()),
        );
        map.insert("repeat_penalty".into(), Value::from(self.repeat_penalty));
        map
    }

    /// Rebuild a set from a persisted mapping.
    ///
    /// Missing keys come from `defaults` so records written before a field
    /// existed still load. Unknown keys are skipped with a warning; a known
    /// key with the wrong type is still an error.
    pub fn from_mapping(mapping: &ParamMap, defaults: &ParameterSet) -> Result<ParameterSet> {
        let mut known = ParamMap::new();
        for (key, value) in mapping {
            if PARAMETER_FIELDS.contains(&key.as_str()) {
                known.insert(key.clone(), value.clone());
            } else {
                warn!("Ignoring unknown parameter '{}' in stored record", key);
            }
        }

        let overrides = ParamOverrides::from_map(&known)?;
        Ok(defaults.merge(&overrides))
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(Error::invalid_parameter(
            field,
            format!("must be between {:.1} and {:.1}, got {}", min, max, value),
        ));
    }
    Ok(())
}
