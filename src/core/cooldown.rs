//! Cooldown-gated triggers: fingerprint-reader swipe and volume key.
//!
//! Neither looks at magnitudes. Each qualifying input fires unless the same
//! trigger fired within the last [`FIRE_COOLDOWN_MS`].

use crate::core::threshold::{elapsed_ms, FIRE_COOLDOWN_MS};
use crate::settings::Settings;

/// Shared cooldown state.
#[derive(Debug, Clone, Default)]
pub struct CooldownGate {
    last_fire_time: Option<u64>,
}

impl CooldownGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire at `now` (ms) unless disabled or still cooling down. A refused
    /// attempt leaves the gate unchanged.
    pub fn try_fire(&mut self, enabled: bool, now: u64) -> bool {
        if !enabled {
            return false;
        }
        let ready = self
            .last_fire_time
            .map_or(true, |last| elapsed_ms(now, last) > FIRE_COOLDOWN_MS);
        if ready {
            self.last_fire_time = Some(now);
        }
        ready
    }

    pub fn reset(&mut self) {
        self.last_fire_time = None;
    }
}

/// Swipe on the fingerprint reader, seen as touch moves on a capture surface.
#[derive(Debug, Clone, Default)]
pub struct FingerprintSwipeDetector {
    gate: CooldownGate,
}

impl FingerprintSwipeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// One touch move on the reader at `now` (ms).
    pub fn update(&mut self, settings: &Settings, now: u64) -> bool {
        self.gate.try_fire(settings.fingerprint_enabled, now)
    }

    pub fn reset(&mut self) {
        self.gate.reset();
    }
}

/// Volume key used as a shutter button.
#[derive(Debug, Clone, Default)]
pub struct VolumeKeyDetector {
    gate: CooldownGate,
}

impl VolumeKeyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// One volume key press at `now` (ms). Callers filter out other keys.
    pub fn update(&mut self, settings: &Settings, now: u64) -> bool {
        self.gate.try_fire(settings.volume_key_enabled, now)
    }

    pub fn reset(&mut self) {
        self.gate.reset();
    }
}
