//! Back-tap sensitivity calibration.
//!
//! The user taps the back of the device a few times while the engine is
//! suspended. Strong z-axis impulses are recorded until
//! [`REQUIRED_SAMPLES`] have been seen; the threshold is then 75% of their
//! mean.

use crate::clock::ClockSource;
use crate::core::threshold::elapsed_ms;
use crate::settings::{keys, SettingValue, SettingsError, SettingsStore};
use statrs::statistics::Statistics;
use thiserror::Error;

/// Impulses at or below this never count as a calibration tap.
pub const CALIBRATION_FLOOR: f64 = 15.0;

/// Minimum spacing between two recorded impulses.
pub const CALIBRATION_DEBOUNCE_MS: i64 = 300;

/// Impulses needed before a threshold is produced.
pub const REQUIRED_SAMPLES: usize = 3;

/// Fraction of the mean impulse used as the threshold.
pub const THRESHOLD_SCALE: f64 = 0.75;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("Calibration incomplete: {collected} of {required} taps recorded")]
    Incomplete { collected: usize, required: usize },
    #[error("Could not store threshold: {0}")]
    Store(#[from] SettingsError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationState {
    /// Not started, or abandoned.
    Idle,
    Collecting,
    Done { threshold: f64 },
}

/// A single calibration run.
pub struct CalibrationSession<C> {
    clock: C,
    state: CalibrationState,
    forces: Vec<f64>,
    last_z: f64,
    last_tap_time: Option<u64>,
}

impl<C: ClockSource> CalibrationSession<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: CalibrationState::Idle,
            forces: Vec::with_capacity(REQUIRED_SAMPLES),
            last_z: 0.0,
            last_tap_time: None,
        }
    }

    /// Begin (or restart) collecting. Anything recorded before is discarded.
    pub fn start(&mut self) {
        self.forces.clear();
        self.last_z = 0.0;
        self.last_tap_time = None;
        self.state = CalibrationState::Collecting;
        tracing::info!("Calibration started, waiting for {REQUIRED_SAMPLES} taps");
    }

    /// Feed one accelerometer sample. Returns true if it was recorded as a tap.
    pub fn feed_accelerometer(&mut self, _x: f64, _y: f64, z: f64) -> bool {
        if self.state != CalibrationState::Collecting {
            return false;
        }

        let now = self.clock.now_ms();
        let delta_z = (z - self.last_z).abs();
        self.last_z = z;

        let debounced = self
            .last_tap_time
            .map_or(true, |last| elapsed_ms(now, last) > CALIBRATION_DEBOUNCE_MS);
        if delta_z <= CALIBRATION_FLOOR || !debounced {
            return false;
        }

        self.forces.push(delta_z);
        self.last_tap_time = Some(now);
        tracing::debug!(
            "Calibration tap {}/{}: {:.2}",
            self.forces.len(),
            REQUIRED_SAMPLES,
            delta_z
        );

        if self.forces.len() >= REQUIRED_SAMPLES {
            let threshold = self.forces.iter().mean() * THRESHOLD_SCALE;
            self.state = CalibrationState::Done { threshold };
            tracing::info!("Calibration complete, threshold {:.2}", threshold);
        }
        true
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, CalibrationState::Done { .. })
    }

    /// The derived threshold, once complete.
    pub fn result(&self) -> Option<f64> {
        match self.state {
            CalibrationState::Done { threshold } => Some(threshold),
            _ => None,
        }
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// `(collected, required)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.forces.len(), REQUIRED_SAMPLES)
    }

    /// Impulses recorded so far, in order.
    pub fn forces(&self) -> &[f64] {
        &self.forces
    }

    /// Drop the run without producing a threshold.
    pub fn abandon(&mut self) {
        if self.state == CalibrationState::Collecting {
            tracing::info!(
                "Calibration abandoned after {}/{} taps",
                self.forces.len(),
                REQUIRED_SAMPLES
            );
        }
        self.forces.clear();
        self.state = CalibrationState::Idle;
    }

    /// Write the threshold to `store` as `back_tap_threshold`.
    pub fn commit<S: SettingsStore + ?Sized>(
        &self,
        store: &mut S,
    ) -> Result<f64, CalibrationError> {
        let threshold = self.result().ok_or(CalibrationError::Incomplete {
            collected: self.forces.len(),
            required: REQUIRED_SAMPLES,
        })?;
        store.set(keys::BACK_TAP_THRESHOLD, SettingValue::Float(threshold))?;
        Ok(threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::settings::{JsonSettingsStore, Settings};

    fn session() -> (CalibrationSession<ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_000);
        let mut session = CalibrationSession::new(clock.clone());
        session.start();
        (session, clock)
    }

    #[test]
    fn test_three_taps_complete() {
        let (mut session, clock) = session();

        // z deltas: 20, 22, 21
        assert!(session.feed_accelerometer(0.0, 0.0, 20.0));
        clock.advance(400);
        assert!(session.feed_accelerometer(0.0, 0.0, -2.0));
        assert!(!session.is_complete());
        clock.advance(400);
        assert!(session.feed_accelerometer(0.0, 0.0, 19.0));

        assert!(session.is_complete());
        let threshold = session.result().unwrap();
        assert!((threshold - 15.75).abs() < 1e-9);
        assert_eq!(session.forces(), [20.0, 22.0, 21.0].as_slice());
    }

    #[test]
    fn test_debounce_and_floor() {
        let (mut session, clock) = session();

        assert!(session.feed_accelerometer(0.0, 0.0, 20.0));
        // Rebound 100 ms later is the same tap.
        clock.advance(100);
        assert!(!session.feed_accelerometer(0.0, 0.0, 0.0));
        // Exactly at the floor does not count.
        clock.advance(400);
        assert!(!session.feed_accelerometer(0.0, 0.0, 15.0));
        assert_eq!(session.progress(), (1, 3));
    }

    #[test]
    fn test_underrun_never_completes() {
        let (mut session, clock) = session();
        session.feed_accelerometer(0.0, 0.0, 20.0);
        clock.advance(400);
        session.feed_accelerometer(0.0, 0.0, 0.0);
        assert!(!session.is_complete());
        assert_eq!(session.result(), None);

        let mut store = JsonSettingsStore::in_memory();
        let err = session.commit(&mut store).unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::Incomplete {
                collected: 2,
                required: 3
            }
        ));
        assert_eq!(store.get(keys::BACK_TAP_THRESHOLD), None);
    }

    #[test]
    fn test_commit_writes_threshold_only() {
        let (mut session, clock) = session();
        for z in [20.0, -2.0, 19.0] {
            session.feed_accelerometer(0.0, 0.0, z);
            clock.advance(400);
        }

        let mut store = JsonSettingsStore::in_memory();
        let threshold = session.commit(&mut store).unwrap();
        let settings = Settings::read(&store);
        assert!((settings.back_tap_threshold - threshold).abs() < 1e-9);
        assert!(!settings.back_tap_enabled);
    }

    #[test]
    fn test_idle_and_restart() {
        let clock = ManualClock::new(0);
        let mut session = CalibrationSession::new(clock.clone());
        assert!(!session.feed_accelerometer(0.0, 0.0, 50.0));

        session.start();
        session.feed_accelerometer(0.0, 0.0, 50.0);
        clock.advance(400);
        session.start();
        assert_eq!(session.progress(), (0, 3));

        session.abandon();
        assert_eq!(session.state(), CalibrationState::Idle);
    }
}
