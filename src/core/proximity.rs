//! Proximity wave: a brief cover-and-uncover of the proximity sensor.

use crate::core::threshold::{elapsed_ms, WAVE_MAX_COVER_MS};
use crate::settings::Settings;

/// Detects a hand waved over the proximity sensor.
///
/// A cover longer than [`WAVE_MAX_COVER_MS`] (phone in a pocket, face on a
/// call) is not a wave. The sensor must be covered again before the next fire.
#[derive(Debug, Clone, Default)]
pub struct ProximityWaveDetector {
    covered: bool,
    cover_time: u64,
}

impl ProximityWaveDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one proximity reading taken at `now` (ms).
    ///
    /// `distance` and `max_range` are in the sensor's own unit; anything
    /// below `max_range` counts as covered. Returns true on the uncover that
    /// completes a wave.
    pub fn update(&mut self, settings: &Settings, distance: f64, max_range: f64, now: u64) -> bool {
        if !settings.proximity_enabled {
            return false;
        }

        if distance < max_range {
            if !self.covered {
                self.covered = true;
                self.cover_time = now;
            }
            return false;
        }

        if !self.covered {
            return false;
        }
        self.covered = false;
        elapsed_ms(now, self.cover_time) < WAVE_MAX_COVER_MS
    }

    /// Whether the last reading left the sensor covered.
    pub fn is_covered(&self) -> bool {
        self.covered
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> Settings {
        Settings {
            proximity_enabled: true,
            ..Settings::default()
        }
    }

    #[test]
    fn test_quick_wave_fires_once() {
        let settings = enabled();
        let mut detector = ProximityWaveDetector::new();

        assert!(!detector.update(&settings, 0.0, 5.0, 1_000));
        assert!(detector.is_covered());
        assert!(detector.update(&settings, 5.0, 5.0, 1_300));
        // Still uncovered: nothing to complete.
        assert!(!detector.update(&settings, 5.0, 5.0, 1_350));
    }

    #[test]
    fn test_long_cover_never_fires() {
        let settings = enabled();
        let mut detector = ProximityWaveDetector::new();

        detector.update(&settings, 0.0, 5.0, 0);
        assert!(!detector.update(&settings, 5.0, 5.0, 500));
        assert!(!detector.is_covered());
    }

    #[test]
    fn test_repeated_cover_keeps_first_time() {
        let settings = enabled();
        let mut detector = ProximityWaveDetector::new();

        detector.update(&settings, 0.0, 5.0, 0);
        detector.update(&settings, 1.0, 5.0, 400);
        assert!(!detector.update(&settings, 5.0, 5.0, 600));
    }

    #[test]
    fn test_disabled_ignores_and_keeps_state() {
        let mut detector = ProximityWaveDetector::new();
        assert!(!detector.update(&Settings::default(), 0.0, 5.0, 0));
        assert!(!detector.is_covered());
    }
}
