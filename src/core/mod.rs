//! Core trigger detection.
//!
//! This module contains:
//! - One stateful detector per gesture
//! - The engine that routes samples to them
//! - The back-tap calibration session

pub mod back_tap;
pub mod calibration;
pub mod cooldown;
pub mod engine;
pub mod proximity;
pub mod shake;
pub mod threshold;

// Re-export commonly used types
pub use back_tap::BackTapDoubleTapDetector;
pub use calibration::{CalibrationError, CalibrationSession, CalibrationState, REQUIRED_SAMPLES};
pub use cooldown::{CooldownGate, FingerprintSwipeDetector, VolumeKeyDetector};
pub use engine::{TapDispatcher, Trigger, TriggerEngine, TriggerKind};
pub use proximity::ProximityWaveDetector;
pub use shake::ShakeTapDetector;
pub use threshold::{shake_threshold, Axes};
