//! Session state: the live configuration for a model and the work routed through it

pub mod builder;
pub mod manager;
pub mod registry;

pub use builder::SessionBuilder;
pub use manager::{SessionManager, SessionStatus};
pub use registry::SessionRegistry;
