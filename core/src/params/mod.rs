//! Generation parameters, partial overrides and task presets

pub mod overrides;
pub mod presets;
pub mod set;

pub use overrides::{ParamMap, ParamOverrides};
pub use presets::PresetCatalog;
pub use set::{ParameterSet, PARAMETER_FIELDS};
