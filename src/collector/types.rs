//! Input event types consumed by the trigger engine.
//!
//! Samples carry no timestamp of their own: the engine stamps each one from
//! its clock at dispatch time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::CollectorError;

/// A key code as reported by the input system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCode {
    VolumeUp,
    VolumeDown,
    /// Any other key, identified by its raw platform code.
    Other(u32),
}

impl KeyCode {
    /// Only volume keys act as a shutter button.
    pub fn is_volume(&self) -> bool {
        matches!(self, KeyCode::VolumeUp | KeyCode::VolumeDown)
    }
}

/// One raw reading from a sensor or input surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorSample {
    /// Proximity distance; `distance < max_range` means something covers the sensor.
    Proximity { distance: f64, max_range: f64 },
    /// Tri-axis acceleration in m/s².
    Accelerometer { x: f64, y: f64, z: f64 },
    /// A move on the invisible capture surface (fingerprint-reader scroll).
    TouchMove,
    /// A key-down.
    #[serde(alias = "key_down")]
    KeyPress { key: KeyCode },
}

/// Sample kind without payload, used for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    Proximity,
    Accelerometer,
    TouchMove,
    KeyPress,
}

impl SensorSample {
    pub fn kind(&self) -> SampleKind {
        match self {
            SensorSample::Proximity { .. } => SampleKind::Proximity,
            SensorSample::Accelerometer { .. } => SampleKind::Accelerometer,
            SensorSample::TouchMove => SampleKind::TouchMove,
            SensorSample::KeyPress { .. } => SampleKind::KeyPress,
        }
    }
}

/// Everything an event source can deliver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Sample(SensorSample),
    /// The host's camera-foreground observer switched the engine on or off.
    Foreground { active: bool },
}

/// An input event as recorded in a replay script, with its optional capture time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptEvent {
    pub at_ms: Option<u64>,
    pub event: InputEvent,
}

impl ScriptEvent {
    /// Parse one JSON line of a replay script.
    ///
    /// ```text
    /// {"kind":"proximity","distance":0,"max_range":5,"at_ms":0}
    /// {"kind":"accelerometer","x":0.1,"y":0.0,"z":9.8,"at_ms":20}
    /// {"kind":"key_press","key":"volume_up"}
    /// {"kind":"foreground","active":true}
    /// ```
    pub fn parse_line(line: &str) -> Result<Self, CollectorError> {
        let value: Value =
            serde_json::from_str(line).map_err(|e| CollectorError::Parse(e.to_string()))?;

        let at_ms = match value.get("at_ms") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v.as_u64().ok_or_else(|| {
                CollectorError::Parse(format!("at_ms must be a non-negative integer, got {v}"))
            })?),
        };

        let event = if value.get("kind").and_then(Value::as_str) == Some("foreground") {
            let active = value
                .get("active")
                .and_then(Value::as_bool)
                .ok_or_else(|| CollectorError::Parse("foreground needs `active`".to_string()))?;
            InputEvent::Foreground { active }
        } else {
            let sample = SensorSample::deserialize(&value)
                .map_err(|e| CollectorError::Parse(e.to_string()))?;
            InputEvent::Sample(sample)
        };

        Ok(Self { at_ms, event })
    }
}
