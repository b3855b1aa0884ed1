//! Shared timing constants and numeric helpers for the detectors.

use serde::{Deserialize, Serialize};

/// Minimum gap between two fires of the same cooldown-gated detector.
pub const FIRE_COOLDOWN_MS: i64 = 500;

/// A proximity cover shorter than this counts as a wave.
pub const WAVE_MAX_COVER_MS: i64 = 500;

/// Window in which a second back tap completes a double tap.
pub const DOUBLE_TAP_WINDOW_MS: i64 = 500;

/// How far past a double tap the back-tap window anchor is pushed.
pub const DOUBLE_TAP_SUPPRESS_MS: u64 = 1_000;

/// Shake threshold at sensitivity 100 (easiest to trip).
pub const SHAKE_BASE_THRESHOLD: f64 = 10.0;

/// Shake threshold at sensitivity 0 (hardest to trip).
pub const SHAKE_MAX_THRESHOLD: f64 = 60.0;

/// Signed milliseconds from `since` to `now`.
///
/// Negative when `since` lies in the future, which the back-tap window
/// anchor can.
pub fn elapsed_ms(now: u64, since: u64) -> i64 {
    now as i64 - since as i64
}

/// Per-axis change threshold for a shake at the given sensitivity.
///
/// `sensitivity` is expected in `0..=100`; it is not clamped here.
pub fn shake_threshold(sensitivity: i64) -> f64 {
    SHAKE_MAX_THRESHOLD
        - (sensitivity as f64 / 100.0) * (SHAKE_MAX_THRESHOLD - SHAKE_BASE_THRESHOLD)
}

/// One accelerometer reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Axes {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Absolute per-axis change from `previous`.
    pub fn abs_delta(&self, previous: &Axes) -> Axes {
        Axes {
            x: (self.x - previous.x).abs(),
            y: (self.y - previous.y).abs(),
            z: (self.z - previous.z).abs(),
        }
    }

    /// Largest component.
    pub fn max_component(&self) -> f64 {
        self.x.max(self.y).max(self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shake_threshold_endpoints() {
        assert!((shake_threshold(0) - 60.0).abs() < 1e-9);
        assert!((shake_threshold(100) - 10.0).abs() < 1e-9);
        assert!((shake_threshold(50) - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_can_be_negative() {
        assert_eq!(elapsed_ms(1_000, 400), 600);
        assert_eq!(elapsed_ms(400, 1_400), -1_000);
    }

    #[test]
    fn test_abs_delta() {
        let delta = Axes::new(1.0, -2.0, 9.8).abs_delta(&Axes::new(3.0, 2.0, 9.8));
        assert!((delta.x - 2.0).abs() < 1e-9);
        assert!((delta.y - 4.0).abs() < 1e-9);
        assert!(delta.z.abs() < 1e-9);
        assert!((delta.max_component() - 4.0).abs() < 1e-9);
    }
}
