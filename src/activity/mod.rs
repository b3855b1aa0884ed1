//! Activity module for the shutter trigger agent.
//!
//! Auditable counters of processed samples and triggered pictures.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log_with_persistence, ActivityLog, ActivityStats,
    FireCounts, SampleCounts, SharedActivityLog,
};
