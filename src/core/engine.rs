//! Trigger engine: routes samples to detectors and reports fires.

use crate::clock::ClockSource;
use crate::collector::types::{KeyCode, SensorSample};
use crate::core::back_tap::BackTapDoubleTapDetector;
use crate::core::cooldown::{FingerprintSwipeDetector, VolumeKeyDetector};
use crate::core::proximity::ProximityWaveDetector;
use crate::core::shake::ShakeTapDetector;
use crate::core::threshold::Axes;
use crate::settings::{Settings, SettingsStore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which gesture produced a fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    ProximityWave,
    Shake,
    BackTap,
    FingerprintSwipe,
    VolumeKey,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 5] = [
        TriggerKind::ProximityWave,
        TriggerKind::Shake,
        TriggerKind::BackTap,
        TriggerKind::FingerprintSwipe,
        TriggerKind::VolumeKey,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::ProximityWave => "proximity_wave",
            TriggerKind::Shake => "shake",
            TriggerKind::BackTap => "back_tap",
            TriggerKind::FingerprintSwipe => "fingerprint_swipe",
            TriggerKind::VolumeKey => "volume_key",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A "take a picture now" decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub kind: TriggerKind,
    pub at_ms: u64,
}

/// Receiver of fires, e.g. whatever injects the simulated shutter tap.
pub trait TapDispatcher {
    fn fire(&mut self, trigger: &Trigger);
}

impl<F: FnMut(&Trigger)> TapDispatcher for F {
    fn fire(&mut self, trigger: &Trigger) {
        self(trigger)
    }
}

/// Owns one of each detector and the previous accelerometer reading.
///
/// Settings are re-read from the store on every sample. While stopped,
/// every sample is ignored.
pub struct TriggerEngine<S, C> {
    store: S,
    clock: C,
    active: bool,
    proximity: ProximityWaveDetector,
    shake: ShakeTapDetector,
    back_tap: BackTapDoubleTapDetector,
    fingerprint: FingerprintSwipeDetector,
    volume: VolumeKeyDetector,
    previous: Axes,
    dispatcher: Option<Box<dyn TapDispatcher + Send>>,
}

impl<S: SettingsStore, C: ClockSource> TriggerEngine<S, C> {
    /// Create a stopped engine.
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            active: false,
            proximity: ProximityWaveDetector::new(),
            shake: ShakeTapDetector::new(),
            back_tap: BackTapDoubleTapDetector::new(),
            fingerprint: FingerprintSwipeDetector::new(),
            volume: VolumeKeyDetector::new(),
            previous: Axes::default(),
            dispatcher: None,
        }
    }

    /// Forward every fire to `dispatcher` as well as returning it.
    pub fn with_dispatcher(mut self, dispatcher: impl TapDispatcher + Send + 'static) -> Self {
        self.dispatcher = Some(Box::new(dispatcher));
        self
    }

    /// Activate with every detector back in its initial state.
    pub fn start(&mut self) {
        self.proximity.reset();
        self.shake.reset();
        self.back_tap.reset();
        self.fingerprint.reset();
        self.volume.reset();
        self.previous = Axes::default();
        if !self.active {
            tracing::info!("Trigger engine started");
        }
        self.active = true;
    }

    /// Ignore samples until the next `start`. Detector state is left as is.
    pub fn stop(&mut self) {
        if self.active {
            tracing::info!("Trigger engine stopped");
        }
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Settings changes made here apply from the next sample.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Process one sample, stamped with the engine clock.
    pub fn dispatch(&mut self, sample: SensorSample) -> Option<Trigger> {
        if !self.active {
            return None;
        }

        let now = self.clock.now_ms();
        let settings = Settings::read(&self.store);

        let kind = match sample {
            SensorSample::Proximity {
                distance,
                max_range,
            } => self
                .proximity
                .update(&settings, distance, max_range, now)
                .then_some(TriggerKind::ProximityWave),
            SensorSample::Accelerometer { x, y, z } => {
                let current = Axes::new(x, y, z);
                let previous = self.previous;
                // A back-tap fire consumes the sample; shake never sees it.
                let kind = if self.back_tap.update(&settings, current.z, previous.z, now) {
                    Some(TriggerKind::BackTap)
                } else if self.shake.update(&settings, &current, &previous, now) {
                    Some(TriggerKind::Shake)
                } else {
                    None
                };
                self.previous = current;
                kind
            }
            SensorSample::TouchMove => self
                .fingerprint
                .update(&settings, now)
                .then_some(TriggerKind::FingerprintSwipe),
            SensorSample::KeyPress { key } => {
                if key.is_volume() {
                    self.volume
                        .update(&settings, now)
                        .then_some(TriggerKind::VolumeKey)
                } else {
                    None
                }
            }
        };

        let trigger = kind.map(|kind| Trigger { kind, at_ms: now })?;
        tracing::debug!("Fire: {} at {} ms", trigger.kind, trigger.at_ms);
        if let Some(dispatcher) = self.dispatcher.as_mut() {
            dispatcher.fire(&trigger);
        }
        Some(trigger)
    }

    pub fn proximity(&mut self, distance: f64, max_range: f64) -> bool {
        self.dispatch(SensorSample::Proximity {
            distance,
            max_range,
        })
        .is_some()
    }

    pub fn accelerometer(&mut self, x: f64, y: f64, z: f64) -> bool {
        self.dispatch(SensorSample::Accelerometer { x, y, z })
            .is_some()
    }

    pub fn touch_move(&mut self) -> bool {
        self.dispatch(SensorSample::TouchMove).is_some()
    }

    pub fn key_down(&mut self, key: KeyCode) -> bool {
        self.dispatch(SensorSample::KeyPress { key }).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::settings::{keys, JsonSettingsStore, SettingValue};
    use std::sync::{Arc, Mutex};

    fn engine(
        store: JsonSettingsStore,
    ) -> (TriggerEngine<JsonSettingsStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        let mut engine = TriggerEngine::new(store, clock.clone());
        engine.start();
        (engine, clock)
    }

    #[test]
    fn test_stopped_engine_ignores_samples() {
        let store = JsonSettingsStore::in_memory()
            .with(keys::VOLUME_KEY_ENABLED, SettingValue::Bool(true));
        let mut engine = TriggerEngine::new(store, ManualClock::new(0));
        assert!(!engine.key_down(KeyCode::VolumeUp));

        engine.start();
        assert!(engine.key_down(KeyCode::VolumeUp));
    }

    #[test]
    fn test_non_volume_key_is_ignored() {
        let store = JsonSettingsStore::in_memory()
            .with(keys::VOLUME_KEY_ENABLED, SettingValue::Bool(true));
        let (mut engine, _clock) = engine(store);
        assert!(!engine.key_down(KeyCode::Other(66)));
        assert!(engine.key_down(KeyCode::VolumeDown));
    }

    #[test]
    fn test_back_tap_takes_priority_over_shake() {
        // Shake threshold at sensitivity 60 is 30.
        let store = JsonSettingsStore::in_memory()
            .with(keys::BACK_TAP_ENABLED, SettingValue::Bool(true))
            .with(keys::BACK_TAP_THRESHOLD, SettingValue::Float(10.0))
            .with(keys::VIBRATION_ENABLED, SettingValue::Bool(true))
            .with(keys::VIBRATION_SENSITIVITY, SettingValue::Int(60));
        let (mut engine, clock) = engine(store);

        assert!(!engine.accelerometer(0.0, 0.0, 12.0));

        // Delta 40 would trip the shake too, but the double tap wins.
        clock.set(200);
        let trigger = engine.dispatch(SensorSample::Accelerometer {
            x: 0.0,
            y: 0.0,
            z: 52.0,
        });
        assert_eq!(
            trigger,
            Some(Trigger {
                kind: TriggerKind::BackTap,
                at_ms: 200
            })
        );

        // Shake was never evaluated above, so it is not in cooldown now.
        clock.set(250);
        let trigger = engine.dispatch(SensorSample::Accelerometer {
            x: 0.0,
            y: 0.0,
            z: 12.0,
        });
        assert_eq!(trigger.map(|t| t.kind), Some(TriggerKind::Shake));
    }

    #[test]
    fn test_settings_are_read_live() {
        let (mut engine, clock) = engine(JsonSettingsStore::in_memory());
        assert!(!engine.touch_move());

        engine
            .store_mut()
            .set(keys::FINGERPRINT_ENABLED, SettingValue::Bool(true))
            .unwrap();
        clock.advance(10);
        assert!(engine.touch_move());
    }

    #[test]
    fn test_dispatcher_receives_each_fire() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);

        let store = JsonSettingsStore::in_memory()
            .with(keys::FINGERPRINT_ENABLED, SettingValue::Bool(true));
        let clock = ManualClock::new(0);
        let mut engine = TriggerEngine::new(store, clock.clone())
            .with_dispatcher(move |t: &Trigger| sink.lock().unwrap().push(*t));
        engine.start();

        engine.touch_move();
        clock.advance(100);
        engine.touch_move();
        clock.advance(500);
        engine.touch_move();

        let fired = fired.lock().unwrap();
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[1].at_ms, 600);
        assert!(fired.iter().all(|t| t.kind == TriggerKind::FingerprintSwipe));
    }

    #[test]
    fn test_trigger_kind_names() {
        let names: Vec<&str> = TriggerKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            [
                "proximity_wave",
                "shake",
                "back_tap",
                "fingerprint_swipe",
                "volume_key"
            ]
        );
    }
}
