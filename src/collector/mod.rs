//! Event collection for the shutter trigger agent.
//!
//! The live platform source (sensor manager, key hooks) is external; this
//! module defines the event types it delivers and a replay collector that
//! feeds recorded or piped JSON-lines streams into the engine.

pub mod replay;
pub mod types;

use thiserror::Error;

// Re-export commonly used types
pub use replay::{CollectorConfig, ReplayCollector};
pub use types::{InputEvent, KeyCode, SampleKind, ScriptEvent, SensorSample};

/// Platform-agnostic collector type alias
pub type Collector = ReplayCollector;

/// Errors that can occur during event collection.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("Collector is already running")]
    AlreadyRunning,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
}
