//! CLI command implementations

pub mod generate;
pub mod params;
pub mod presets;
pub mod session;
pub mod status;
pub mod train;

pub use generate::generate_command;
pub use params::{params_command, ParamsAction};
pub use presets::{preset_command, presets_command};
pub use status::{history_command, status_command};
pub use train::train_command;
