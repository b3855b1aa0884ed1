//! Back-of-device double tap, detected from z-axis impulses.
//!
//! Each call runs three steps in a fixed order:
//!
//! 1. an impulse above the calibrated threshold registers a tap, either
//!    continuing the current sequence (inside the window) or starting a new
//!    one at 1;
//! 2. a second tap fires and clears the count;
//! 3. otherwise a sequence whose anchor is older than the window is dropped.
//!
//! After a fire the window anchor sits [`DOUBLE_TAP_SUPPRESS_MS`] in the
//! future (`suppressed_until`) until the next tap replaces it.

use crate::core::threshold::{elapsed_ms, DOUBLE_TAP_SUPPRESS_MS, DOUBLE_TAP_WINDOW_MS};
use crate::settings::Settings;

/// Counts back taps and fires on the second one inside the window.
///
/// A tap is a z-axis change larger than the calibrated `back_tap_threshold`.
#[derive(Debug, Clone, Default)]
pub struct BackTapDoubleTapDetector {
    tap_count: u32,
    last_tap_time: Option<u64>,
    suppressed_until: Option<u64>,
}

impl BackTapDoubleTapDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the z component of the reading taken at `now` (ms) together with
    /// the engine's previous z, both in m/s². Returns true on a double tap.
    pub fn update(&mut self, settings: &Settings, z: f64, previous_z: f64, now: u64) -> bool {
        if !settings.back_tap_enabled {
            return false;
        }

        let delta_z = (z - previous_z).abs();
        if delta_z > settings.back_tap_threshold {
            let in_window = self
                .window_anchor()
                .is_some_and(|anchor| elapsed_ms(now, anchor) <= DOUBLE_TAP_WINDOW_MS);
            if in_window {
                self.tap_count += 1;
            } else {
                self.tap_count = 1;
            }
            self.last_tap_time = Some(now);
            self.suppressed_until = None;
        }

        if self.tap_count == 2 {
            self.tap_count = 0;
            self.suppressed_until = Some(now + DOUBLE_TAP_SUPPRESS_MS);
            return true;
        }

        if let Some(anchor) = self.window_anchor() {
            if elapsed_ms(now, anchor) > DOUBLE_TAP_WINDOW_MS {
                self.tap_count = 0;
            }
        }
        false
    }

    /// Taps registered in the current sequence.
    pub fn tap_count(&self) -> u32 {
        self.tap_count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn window_anchor(&self) -> Option<u64> {
        self.suppressed_until.or(self.last_tap_time)
    }
}
