//! Configuration and dependency initialization.

mod dependencies;
mod settings;

pub use dependencies::{ConnectionMode, Dependencies};
pub use settings::{SignalSettings, DEFAULT_BUFFER_SIZE};
