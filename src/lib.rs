//! Shutter Trigger - hands-free "take a picture" triggers from device sensors.
//!
//! This library turns noisy, continuous sensor streams into discrete,
//! debounced fire decisions while a camera app is in the foreground.
//!
//! # Triggers
//!
//! - **Proximity wave**: cover and uncover the proximity sensor in under 500 ms
//! - **Shake**: a sharp change on any accelerometer axis, scaled by sensitivity
//! - **Back tap**: two z-axis impulses within 500 ms, threshold from calibration
//! - **Fingerprint swipe**: a move on the fingerprint reader surface
//! - **Volume key**: either volume key
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Shutter Trigger                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │  Collector  │──▶│   Trigger   │──▶│     Tap     │        │
//! │  │  (samples)  │   │   Engine    │   │ Dispatcher  │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │         │ foreground     ▲                                  │
//! │         └──▶ Activation ─┘ start / stop                     │
//! │                      │        ▲                             │
//! │                      ▼        │ snapshot per sample         │
//! │               ┌───────────┐ ┌─────────────┐                 │
//! │               │ Activity  │ │  Settings   │◀── Calibration  │
//! │               │    Log    │ │    Store    │                 │
//! │               └───────────┘ └─────────────┘                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use shutter_trigger::clock::ManualClock;
//! use shutter_trigger::settings::{keys, JsonSettingsStore, SettingValue};
//! use shutter_trigger::TriggerEngine;
//!
//! let store = JsonSettingsStore::in_memory()
//!     .with(keys::PROXIMITY_ENABLED, SettingValue::Bool(true));
//! let clock = ManualClock::new(0);
//! let mut engine = TriggerEngine::new(store, clock.clone());
//! engine.start();
//!
//! assert!(!engine.proximity(0.0, 5.0));
//! clock.advance(100);
//! assert!(engine.proximity(5.0, 5.0));
//! ```

pub mod activity;
pub mod clock;
pub mod collector;
pub mod config;
pub mod core;
pub mod driver;
pub mod settings;

// Re-export key types at crate root for convenience
pub use activity::{ActivityLog, ActivityStats, SharedActivityLog};
pub use clock::{ClockSource, ManualClock, MonotonicClock};
pub use collector::{Collector, CollectorConfig, CollectorError, InputEvent, KeyCode, SensorSample};
pub use config::{Config, ConfigError};
pub use driver::{Activation, EventClock};
pub use crate::core::{
    CalibrationError, CalibrationSession, TapDispatcher, Trigger, TriggerEngine, TriggerKind,
};
pub use settings::{JsonSettingsStore, SettingValue, Settings, SettingsError, SettingsStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Help text shown before a calibration run.
pub const CALIBRATION_INSTRUCTIONS: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                 SHUTTER TRIGGER - BACK TAP SETUP                 ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  Hold the phone as you would to take a picture, then tap the     ║
║  back firmly three times, pausing briefly between taps.          ║
║                                                                  ║
║  The average strength of your taps sets how hard a back tap      ║
║  must be to take a picture.                                      ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
