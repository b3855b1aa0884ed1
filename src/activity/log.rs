//! Activity log.
//!
//! Counts what the agent saw and did: samples by kind, fires by trigger,
//! engine activations and calibrations. No sample values are kept.

use crate::collector::types::SampleKind;
use crate::core::engine::TriggerKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counters {
    proximity: AtomicU64,
    accelerometer: AtomicU64,
    touch_move: AtomicU64,
    key_press: AtomicU64,
}

#[derive(Debug, Default)]
struct FireCounters {
    proximity_wave: AtomicU64,
    shake: AtomicU64,
    back_tap: AtomicU64,
    fingerprint_swipe: AtomicU64,
    volume_key: AtomicU64,
}

/// Activity statistics for the current session.
#[derive(Debug)]
pub struct ActivityLog {
    samples: Counters,
    fires: FireCounters,
    /// Number of times the engine was switched on
    activations: AtomicU64,
    /// Number of calibrations that produced a threshold
    calibrations: AtomicU64,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            samples: Counters::default(),
            fires: FireCounters::default(),
            activations: AtomicU64::new(0),
            calibrations: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an activity log that starts from, and saves to, `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous activity stats: {e}");
        }

        log
    }

    pub fn record_sample(&self, kind: SampleKind) {
        let counter = match kind {
            SampleKind::Proximity => &self.samples.proximity,
            SampleKind::Accelerometer => &self.samples.accelerometer,
            SampleKind::TouchMove => &self.samples.touch_move,
            SampleKind::KeyPress => &self.samples.key_press,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fire(&self, kind: TriggerKind) {
        self.fire_counter(kind).fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_activation(&self) {
        self.activations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_calibration(&self) {
        self.calibrations.fetch_add(1, Ordering::Relaxed);
    }

    fn fire_counter(&self, kind: TriggerKind) -> &AtomicU64 {
        match kind {
            TriggerKind::ProximityWave => &self.fires.proximity_wave,
            TriggerKind::Shake => &self.fires.shake,
            TriggerKind::BackTap => &self.fires.back_tap,
            TriggerKind::FingerprintSwipe => &self.fires.fingerprint_swipe,
            TriggerKind::VolumeKey => &self.fires.volume_key,
        }
    }

    /// Get the current statistics.
    pub fn stats(&self) -> ActivityStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        ActivityStats {
            samples: SampleCounts {
                proximity: load(&self.samples.proximity),
                accelerometer: load(&self.samples.accelerometer),
                touch_move: load(&self.samples.touch_move),
                key_press: load(&self.samples.key_press),
            },
            fires: FireCounts {
                proximity_wave: load(&self.fires.proximity_wave),
                shake: load(&self.fires.shake),
                back_tap: load(&self.fires.back_tap),
                fingerprint_swipe: load(&self.fires.fingerprint_swipe),
                volume_key: load(&self.fires.volume_key),
            },
            activations: load(&self.activations),
            calibrations: load(&self.calibrations),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Samples processed: {} (proximity {}, accelerometer {}, touch {}, keys {})\n\
             - Pictures triggered: {}\n\
             \x20   proximity wave: {}, shake: {}, back tap: {}, fingerprint: {}, volume key: {}\n\
             - Engine activations: {}\n\
             - Calibrations: {}\n\
             - Session duration: {} seconds",
            stats.samples.total(),
            stats.samples.proximity,
            stats.samples.accelerometer,
            stats.samples.touch_move,
            stats.samples.key_press,
            stats.fires.total(),
            stats.fires.proximity_wave,
            stats.fires.shake,
            stats.fires.back_tap,
            stats.fires.fingerprint_swipe,
            stats.fires.volume_key,
            stats.activations,
            stats.calibrations,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                samples: stats.samples,
                fires: stats.fires,
                activations: stats.activations,
                calibrations: stats.calibrations,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                let store = |c: &AtomicU64, v: u64| c.store(v, Ordering::Relaxed);
                store(&self.samples.proximity, persisted.samples.proximity);
                store(&self.samples.accelerometer, persisted.samples.accelerometer);
                store(&self.samples.touch_move, persisted.samples.touch_move);
                store(&self.samples.key_press, persisted.samples.key_press);
                store(&self.fires.proximity_wave, persisted.fires.proximity_wave);
                store(&self.fires.shake, persisted.fires.shake);
                store(&self.fires.back_tap, persisted.fires.back_tap);
                store(&self.fires.fingerprint_swipe, persisted.fires.fingerprint_swipe);
                store(&self.fires.volume_key, persisted.fires.volume_key);
                store(&self.activations, persisted.activations);
                store(&self.calibrations, persisted.calibrations);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in [
            &self.samples.proximity,
            &self.samples.accelerometer,
            &self.samples.touch_move,
            &self.samples.key_press,
            &self.fires.proximity_wave,
            &self.fires.shake,
            &self.fires.back_tap,
            &self.fires.fingerprint_swipe,
            &self.fires.volume_key,
            &self.activations,
            &self.calibrations,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleCounts {
    pub proximity: u64,
    pub accelerometer: u64,
    pub touch_move: u64,
    pub key_press: u64,
}

impl SampleCounts {
    pub fn total(&self) -> u64 {
        self.proximity + self.accelerometer + self.touch_move + self.key_press
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireCounts {
    pub proximity_wave: u64,
    pub shake: u64,
    pub back_tap: u64,
    pub fingerprint_swipe: u64,
    pub volume_key: u64,
}

impl FireCounts {
    pub fn total(&self) -> u64 {
        self.proximity_wave + self.shake + self.back_tap + self.fingerprint_swipe + self.volume_key
    }
}

/// Snapshot of activity statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStats {
    pub samples: SampleCounts,
    pub fires: FireCounts,
    pub activations: u64,
    pub calibrations: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    samples: SampleCounts,
    fires: FireCounts,
    activations: u64,
    calibrations: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared activity log.
pub type SharedActivityLog = Arc<ActivityLog>;

/// Create a new shared activity log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedActivityLog {
    Arc::new(ActivityLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_log_counting() {
        let log = ActivityLog::new();

        log.record_sample(SampleKind::Accelerometer);
        log.record_sample(SampleKind::Accelerometer);
        log.record_sample(SampleKind::KeyPress);
        log.record_fire(TriggerKind::VolumeKey);

        let stats = log.stats();
        assert_eq!(stats.samples.accelerometer, 2);
        assert_eq!(stats.samples.total(), 3);
        assert_eq!(stats.fires.volume_key, 1);
        assert_eq!(stats.fires.total(), 1);
    }

    #[test]
    fn test_activity_log_reset() {
        let log = ActivityLog::new();

        log.record_fire(TriggerKind::Shake);
        log.record_activation();
        log.record_calibration();
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.fires.total(), 0);
        assert_eq!(stats.activations, 0);
        assert_eq!(stats.calibrations, 0);
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.json");

        let log = ActivityLog::with_persistence(path.clone());
        log.record_fire(TriggerKind::BackTap);
        log.record_sample(SampleKind::Proximity);
        log.save().unwrap();

        let reloaded = ActivityLog::with_persistence(path);
        let stats = reloaded.stats();
        assert_eq!(stats.fires.back_tap, 1);
        assert_eq!(stats.samples.proximity, 1);
    }

    #[test]
    fn test_summary_format() {
        let log = ActivityLog::new();
        let summary = log.summary();

        assert!(summary.contains("Samples processed"));
        assert!(summary.contains("Pictures triggered"));
        assert!(summary.contains("back tap"));
    }
}
