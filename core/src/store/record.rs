//! Persisted configuration record format

use crate::error::Result;
use crate::params::{ParamMap, ParameterSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The single live record a store holds for one model instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Parameter set in mapping form
    pub params: ParamMap,

    /// When the record was written
    pub saved_at: DateTime<Utc>,

    /// Unique id of this write; absent in records from older releases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<Uuid>,
}

impl ConfigRecord {
    /// Stamp a parameter set for persistence
    pub fn new(params: &ParameterSet) -> Self {
        Self {
            params: params.to_mapping(),
            saved_at: Utc::now(),
            revision: Some(Uuid::new_v4()),
        }
    }

    /// Decode a stored JSON document.
    ///
    /// Wrapped records (`{"params": {..}, "saved_at": ..}`) decode directly,
    /// taking `legacy_saved_at` when `saved_at` is missing. A bare parameter
    /// object is the legacy layout and is taken as `params` with
    /// `legacy_saved_at` as its timestamp.
    pub fn from_value(
        value: Value,
        legacy_saved_at: DateTime<Utc>,
    ) -> std::result::Result<Self, String> {
        let Value::Object(mut object) = value else {
            return Err("record is not a JSON object".to_string());
        };

        if matches!(object.get("params"), Some(Value::Object(_))) {
            object
                .entry("saved_at")
                .or_insert_with(|| Value::String(legacy_saved_at.to_rfc3339()));
            return serde_json::from_value(Value::Object(object)).map_err(|e| e.to_string());
        }

        Ok(Self {
            params: object,
            saved_at: legacy_saved_at,
            revision: None,
        })
    }

    /// Rebuild the parameter set, filling absent fields from `defaults`
    pub fn parameters(&self, defaults: &ParameterSet) -> Result<ParameterSet> {
        ParameterSet::from_mapping(&self.params, defaults)
    }
}
