//! Terminal output helpers
//!
//! Structured results go to stdout as pretty JSON; logs go to stderr.

use anyhow::Result;
use omega_core::{ParamOverrides, ParameterSet};
use serde::Serialize;

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a parameter set in its persisted mapping form
pub fn print_params(params: &ParameterSet) -> Result<()> {
    print_json(&params.to_mapping())
}

/// One line per preset: name followed by the fields it overrides
pub fn format_preset(name: &str, overrides: &ParamOverrides) -> String {
    let fields = overrides
        .to_map()
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("📦 {:<10} {}", name, fields)
}
