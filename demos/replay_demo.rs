//! Demonstration of the shutter trigger engine.
//!
//! This example shows how to:
//! 1. Calibrate the back-tap threshold from three taps
//! 2. Enable triggers in a settings store
//! 3. Feed a synthetic sensor stream through the engine
//! 4. Receive fires through a tap dispatcher
//!
//! Run with: cargo run --example replay_demo

use shutter_trigger::{
    activity::ActivityLog,
    settings::{keys, JsonSettingsStore, SettingValue},
    CalibrationSession, KeyCode, ManualClock, SensorSample, Trigger, TriggerEngine,
    CALIBRATION_INSTRUCTIONS,
};
use std::sync::Arc;

fn main() {
    println!("Shutter Trigger - Replay Demo");
    println!("=============================");
    println!("{CALIBRATION_INSTRUCTIONS}");

    let clock = ManualClock::new(0);
    let mut store = JsonSettingsStore::in_memory()
        .with(keys::PROXIMITY_ENABLED, SettingValue::Bool(true))
        .with(keys::BACK_TAP_ENABLED, SettingValue::Bool(true))
        .with(keys::VOLUME_KEY_ENABLED, SettingValue::Bool(true));

    // Three firm taps, 400 ms apart.
    let mut calibration = CalibrationSession::new(clock.clone());
    calibration.start();
    for z in [24.0, -1.0, 22.0] {
        if calibration.feed_accelerometer(0.0, 0.3, z) {
            let (collected, required) = calibration.progress();
            println!("  tap {collected}/{required}");
        }
        clock.advance(400);
    }
    match calibration.commit(&mut store) {
        Ok(threshold) => println!("Back-tap threshold: {threshold:.2}"),
        Err(e) => {
            println!("Calibration failed: {e}");
            return;
        }
    }
    println!();

    let activity = Arc::new(ActivityLog::new());
    let sink = Arc::clone(&activity);
    let mut engine = TriggerEngine::new(store, clock.clone()).with_dispatcher(
        move |trigger: &Trigger| {
            sink.record_fire(trigger.kind);
            println!("[{:>6} ms] Take picture ({})", trigger.at_ms, trigger.kind);
        },
    );

    clock.set(10_000);
    engine.start();
    activity.record_activation();

    let stream = [
        // Resting on a table.
        (10_000, accel(0.1, 0.2, 9.8)),
        (10_020, accel(0.1, 0.1, 9.7)),
        // Hand waved over the proximity sensor.
        (10_500, proximity(0.0)),
        (10_700, proximity(5.0)),
        // Double tap on the back.
        (12_000, accel(0.2, 0.1, 30.0)),
        (12_020, accel(0.1, 0.1, 9.8)),
        // Volume key, pressed twice in quick succession.
        (14_000, volume_up()),
        (14_100, volume_up()),
    ];

    for (at_ms, sample) in stream {
        clock.set(at_ms);
        activity.record_sample(sample.kind());
        engine.dispatch(sample);
    }
    engine.stop();

    println!();
    println!("{}", activity.summary());
}

fn accel(x: f64, y: f64, z: f64) -> SensorSample {
    SensorSample::Accelerometer { x, y, z }
}

/// Reading from a proximity sensor with a 5 cm range.
fn proximity(distance: f64) -> SensorSample {
    SensorSample::Proximity {
        distance,
        max_range: 5.0,
    }
}

fn volume_up() -> SensorSample {
    SensorSample::KeyPress {
        key: KeyCode::VolumeUp,
    }
}
