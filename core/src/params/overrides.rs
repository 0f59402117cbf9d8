//! Partial parameter updates

use super::set::PARAMETER_FIELDS;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw key/value form of parameters as received from callers or read from disk
pub type ParamMap = serde_json::Map<String, Value>;

/// A subset of [`super::ParameterSet`] fields; `None` means "keep the current value"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f64>,
}

impl ParamOverrides {
    /// Parse a raw mapping.
    ///
    /// Any key outside the parameter set fails with `UnknownParameter`;
    /// a value of the wrong shape fails with `InvalidParameter`. Range
    /// checks are left to [`super::ParameterSet::validate`].
    pub fn from_map(map: &ParamMap) -> Result<Self> {
        if let Some(key) = map
            .keys()
            .find(|key| !PARAMETER_FIELDS.contains(&key.as_str()))
        {
            return Err(Error::UnknownParameter { key: key.clone() });
        }

        let mut overrides = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "temperature" => overrides.temperature = Some(as_float(key, value)?),
                "top_p" => overrides.top_p = Some(as_float(key, value)?),
                "top_k" => overrides.top_k = Some(as_count(key, value)?),
                "max_tokens" => overrides.max_tokens = Some(as_count(key, value)?),
                "presence_penalty" => overrides.presence_penalty = Some(as_float(key, value)?),
                "frequency_penalty" => overrides.frequency_penalty = Some(as_float(key, value)?),
                "stop_sequences" => overrides.stop_sequences = Some(as_strings(key, value)?),
                "repeat_penalty" => overrides.repeat_penalty = Some(as_float(key, value)?),
                _ => return Err(Error::UnknownParameter { key: key.clone() }),
            }
        }

        Ok(overrides)
    }

    /// Back to a raw mapping containing only the present fields
    pub fn to_map(&self) -> ParamMap {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => ParamMap::new(),
        }
    }

    /// Whether no field is overridden
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of the overridden fields
    pub fn fields(&self) -> Vec<&'static str> {
        let map = self.to_map();
        PARAMETER_FIELDS
            .iter()
            .copied()
            .filter(|field| map.contains_key(*field))
            .collect()
    }
}

fn as_float(field: &str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| Error::invalid_parameter(field, format!("expected a number, got {}", value)))
}

fn as_count(field: &str, value: &Value) -> Result<u32> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            Error::invalid_parameter(
                field,
                format!("expected a non-negative integer, got {}", value),
            )
        })
}

fn as_strings(field: &str, value: &Value) -> Result<Vec<String>> {
    let invalid = || {
        Error::invalid_parameter(
            field,
            format!("expected a list of strings, got {}", value),
        )
    };

    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}
