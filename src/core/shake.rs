//! Shake: a sharp change on any accelerometer axis.

use crate::core::threshold::{elapsed_ms, shake_threshold, Axes, FIRE_COOLDOWN_MS};
use crate::settings::Settings;

/// Fires when any axis jumps by more than the sensitivity-scaled threshold.
#[derive(Debug, Clone, Default)]
pub struct ShakeTapDetector {
    last_fire_time: Option<u64>,
}

impl ShakeTapDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the reading taken at `now` (ms) against `previous`, the
    /// engine's last accelerometer reading. Both are in m/s².
    ///
    /// Returns true when the largest per-axis change exceeds
    /// [`shake_threshold`] for the current sensitivity and the last fire is
    /// at least [`FIRE_COOLDOWN_MS`] old.
    pub fn update(
        &mut self,
        settings: &Settings,
        current: &Axes,
        previous: &Axes,
        now: u64,
    ) -> bool {
        if !settings.vibration_enabled {
            return false;
        }

        if let Some(last) = self.last_fire_time {
            if elapsed_ms(now, last) < FIRE_COOLDOWN_MS {
                return false;
            }
        }

        let threshold = shake_threshold(settings.vibration_sensitivity);
        if current.abs_delta(previous).max_component() > threshold {
            self.last_fire_time = Some(now);
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(sensitivity: i64) -> Settings {
        Settings {
            vibration_enabled: true,
            vibration_sensitivity: sensitivity,
            ..Settings::default()
        }
    }

    const REST: Axes = Axes {
        x: 0.0,
        y: 0.0,
        z: 9.81,
    };

    #[test]
    fn test_cooldown_suppresses_second_fire() {
        let settings = settings(100);
        let jolt = Axes::new(15.0, 0.0, 9.81);
        let mut detector = ShakeTapDetector::new();

        assert!(detector.update(&settings, &jolt, &REST, 1_000));
        assert!(!detector.update(&settings, &REST, &jolt, 1_499));
        assert!(detector.update(&settings, &jolt, &REST, 1_500));
    }

    #[test]
    fn test_higher_sensitivity_trips_on_smaller_delta() {
        // A 30 m/s² jump on y.
        let jolt = Axes::new(0.0, 30.0, 9.81);

        let mut sensitive = ShakeTapDetector::new();
        assert!(sensitive.update(&settings(100), &jolt, &REST, 0));

        let mut dull = ShakeTapDetector::new();
        assert!(!dull.update(&settings(0), &jolt, &REST, 0));
        // No cooldown was started by the miss.
        let big = Axes::new(0.0, 70.0, 9.81);
        assert!(dull.update(&settings(0), &big, &REST, 100));
    }

    #[test]
    fn test_delta_equal_to_threshold_does_not_fire() {
        let mut detector = ShakeTapDetector::new();
        let jolt = Axes::new(10.0, 0.0, 9.81);
        let rest = Axes::new(0.0, 0.0, 9.81);
        assert!(!detector.update(&settings(100), &jolt, &rest, 0));
    }

    #[test]
    fn test_disabled_never_fires() {
        let mut detector = ShakeTapDetector::new();
        let jolt = Axes::new(100.0, 100.0, 100.0);
        assert!(!detector.update(&Settings::default(), &jolt, &REST, 0));
        assert!(detector.update(&settings(100), &jolt, &REST, 1));
    }
}
