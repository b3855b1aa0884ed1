//! Flat key→value settings store and the per-event settings snapshot.
//!
//! The store is owned outside the engine. Detectors only ever see a
//! [`Settings`] snapshot read fresh for each event; calibration is the one
//! writer, and it writes exactly [`keys::BACK_TAP_THRESHOLD`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Setting key names.
pub mod keys {
    pub const PROXIMITY_ENABLED: &str = "proximity_enabled";
    pub const VIBRATION_ENABLED: &str = "vibration_enabled";
    pub const VIBRATION_SENSITIVITY: &str = "vibration_sensitivity";
    pub const BACK_TAP_ENABLED: &str = "back_tap_enabled";
    pub const BACK_TAP_THRESHOLD: &str = "back_tap_threshold";
    pub const FINGERPRINT_ENABLED: &str = "fingerprint_enabled";
    pub const VOLUME_KEY_ENABLED: &str = "volume_key_enabled";

    /// Every key the engine reads, in display order.
    pub const ALL: [&str; 7] = [
        PROXIMITY_ENABLED,
        VIBRATION_ENABLED,
        VIBRATION_SENSITIVITY,
        BACK_TAP_ENABLED,
        BACK_TAP_THRESHOLD,
        FINGERPRINT_ENABLED,
        VOLUME_KEY_ENABLED,
    ];
}

/// Default shake sensitivity (0 = hardest to trip, 100 = easiest).
pub const DEFAULT_VIBRATION_SENSITIVITY: i64 = 50;

/// Back-tap threshold used until a calibration session overwrites it.
pub const DEFAULT_BACK_TAP_THRESHOLD: f64 = 25.0;

/// A single stored value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers are accepted where a float is expected.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SettingValue::Float(f) => Some(*f),
            SettingValue::Int(i) => Some(*i as f64),
            SettingValue::Bool(_) => None,
        }
    }

    /// Parse a raw string for `key`, checking the key exists and the value
    /// has the type and range that key documents.
    pub fn parse_for(key: &str, raw: &str) -> Result<Self, SettingsError> {
        let raw = raw.trim();
        let invalid = |reason: &str| SettingsError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: reason.to_string(),
        };

        match key {
            keys::PROXIMITY_ENABLED
            | keys::VIBRATION_ENABLED
            | keys::BACK_TAP_ENABLED
            | keys::FINGERPRINT_ENABLED
            | keys::VOLUME_KEY_ENABLED => match raw.to_lowercase().as_str() {
                "true" | "on" | "1" => Ok(SettingValue::Bool(true)),
                "false" | "off" | "0" => Ok(SettingValue::Bool(false)),
                _ => Err(invalid("expected true or false")),
            },
            keys::VIBRATION_SENSITIVITY => {
                let level: i64 = raw.parse().map_err(|_| invalid("expected an integer"))?;
                if !(0..=100).contains(&level) {
                    return Err(invalid("must be between 0 and 100"));
                }
                Ok(SettingValue::Int(level))
            }
            keys::BACK_TAP_THRESHOLD => {
                let threshold: f64 = raw.parse().map_err(|_| invalid("expected a number"))?;
                if !threshold.is_finite() || threshold <= 0.0 {
                    return Err(invalid("must be a positive number"));
                }
                Ok(SettingValue::Float(threshold))
            }
            other => Err(SettingsError::UnknownKey(other.to_string())),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{b}"),
            SettingValue::Int(i) => write!(f, "{i}"),
            SettingValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Settings store errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
    #[error("Unknown setting: {0}")]
    UnknownKey(String),
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// The external key→value contract.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<SettingValue>;
    fn set(&mut self, key: &str, value: SettingValue) -> Result<(), SettingsError>;
}

/// Settings kept as a flat JSON object, optionally mirrored to a file.
#[derive(Debug, Clone, Default)]
pub struct JsonSettingsStore {
    values: BTreeMap<String, SettingValue>,
    path: Option<PathBuf>,
}

impl JsonSettingsStore {
    /// A store that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            values,
            path: Some(path),
        })
    }

    /// Builder-style insert, mostly for tests and demos.
    pub fn with(mut self, key: &str, value: SettingValue) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the current values to the backing file, if any.
    pub fn save(&self) -> Result<(), SettingsError> {
        let Some(ref path) = self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.values)
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.get(key).copied()
    }

    fn set(&mut self, key: &str, value: SettingValue) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value);
        self.save()
    }
}

impl<S: SettingsStore + ?Sized> SettingsStore for &mut S {
    fn get(&self, key: &str) -> Option<SettingValue> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: SettingValue) -> Result<(), SettingsError> {
        (**self).set(key, value)
    }
}

/// Immutable view of every setting the detectors consult.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub proximity_enabled: bool,
    pub vibration_enabled: bool,
    /// Always within `0..=100` once read through [`Settings::read`].
    pub vibration_sensitivity: i64,
    pub back_tap_enabled: bool,
    pub back_tap_threshold: f64,
    pub fingerprint_enabled: bool,
    pub volume_key_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            proximity_enabled: false,
            vibration_enabled: false,
            vibration_sensitivity: DEFAULT_VIBRATION_SENSITIVITY,
            back_tap_enabled: false,
            back_tap_threshold: DEFAULT_BACK_TAP_THRESHOLD,
            fingerprint_enabled: false,
            volume_key_enabled: false,
        }
    }
}

impl Settings {
    /// Take a snapshot of `store`.
    ///
    /// Missing keys use the documented default. A value of the wrong type is
    /// logged and treated as missing. Sensitivity is clamped here because the
    /// shake detector assumes it is already in range.
    pub fn read<S: SettingsStore + ?Sized>(store: &S) -> Self {
        let defaults = Self::default();

        let sensitivity = read_with(store, keys::VIBRATION_SENSITIVITY, SettingValue::as_int)
            .unwrap_or(defaults.vibration_sensitivity);
        if !(0..=100).contains(&sensitivity) {
            tracing::warn!(
                "{} = {} out of range, clamping",
                keys::VIBRATION_SENSITIVITY,
                sensitivity
            );
        }

        Self {
            proximity_enabled: read_with(store, keys::PROXIMITY_ENABLED, SettingValue::as_bool)
                .unwrap_or(defaults.proximity_enabled),
            vibration_enabled: read_with(store, keys::VIBRATION_ENABLED, SettingValue::as_bool)
                .unwrap_or(defaults.vibration_enabled),
            vibration_sensitivity: sensitivity.clamp(0, 100),
            back_tap_enabled: read_with(store, keys::BACK_TAP_ENABLED, SettingValue::as_bool)
                .unwrap_or(defaults.back_tap_enabled),
            back_tap_threshold: read_with(store, keys::BACK_TAP_THRESHOLD, SettingValue::as_float)
                .unwrap_or(defaults.back_tap_threshold),
            fingerprint_enabled: read_with(store, keys::FINGERPRINT_ENABLED, SettingValue::as_bool)
                .unwrap_or(defaults.fingerprint_enabled),
            volume_key_enabled: read_with(store, keys::VOLUME_KEY_ENABLED, SettingValue::as_bool)
                .unwrap_or(defaults.volume_key_enabled),
        }
    }

    /// Whether any trigger is switched on at all.
    pub fn any_enabled(&self) -> bool {
        self.proximity_enabled
            || self.vibration_enabled
            || self.back_tap_enabled
            || self.fingerprint_enabled
            || self.volume_key_enabled
    }
}

fn read_with<S, T>(store: &S, key: &str, convert: impl Fn(&SettingValue) -> Option<T>) -> Option<T>
where
    S: SettingsStore + ?Sized,
{
    let value = store.get(key)?;
    let converted = convert(&value);
    if converted.is_none() {
        tracing::warn!("Ignoring {key} = {value}: wrong type, using default");
    }
    converted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_store_empty() {
        let settings = Settings::read(&JsonSettingsStore::in_memory());
        assert_eq!(settings, Settings::default());
        assert!(!settings.any_enabled());
        assert_eq!(settings.vibration_sensitivity, 50);
        assert!((settings.back_tap_threshold - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wrong_type_falls_back_to_default() {
        let store = JsonSettingsStore::in_memory()
            .with(keys::PROXIMITY_ENABLED, SettingValue::Int(1))
            .with(keys::BACK_TAP_THRESHOLD, SettingValue::Bool(true));
        let settings = Settings::read(&store);
        assert!(!settings.proximity_enabled);
        assert!((settings.back_tap_threshold - DEFAULT_BACK_TAP_THRESHOLD).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sensitivity_clamped() {
        let store = JsonSettingsStore::in_memory()
            .with(keys::VIBRATION_SENSITIVITY, SettingValue::Int(250));
        assert_eq!(Settings::read(&store).vibration_sensitivity, 100);

        let store = JsonSettingsStore::in_memory()
            .with(keys::VIBRATION_SENSITIVITY, SettingValue::Int(-4));
        assert_eq!(Settings::read(&store).vibration_sensitivity, 0);
    }

    #[test]
    fn test_integer_threshold_accepted() {
        let store =
            JsonSettingsStore::in_memory().with(keys::BACK_TAP_THRESHOLD, SettingValue::Int(12));
        assert!((Settings::read(&store).back_tap_threshold - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_for_validates() {
        assert_eq!(
            SettingValue::parse_for(keys::PROXIMITY_ENABLED, "on").unwrap(),
            SettingValue::Bool(true)
        );
        assert_eq!(
            SettingValue::parse_for(keys::VIBRATION_SENSITIVITY, "75").unwrap(),
            SettingValue::Int(75)
        );
        assert!(matches!(
            SettingValue::parse_for(keys::VIBRATION_SENSITIVITY, "101"),
            Err(SettingsError::InvalidValue { .. })
        ));
        assert!(matches!(
            SettingValue::parse_for(keys::BACK_TAP_THRESHOLD, "-3"),
            Err(SettingsError::InvalidValue { .. })
        ));
        assert!(matches!(
            SettingValue::parse_for("flash_enabled", "true"),
            Err(SettingsError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut store = JsonSettingsStore::open(&path).unwrap();
        store
            .set(keys::BACK_TAP_THRESHOLD, SettingValue::Float(15.75))
            .unwrap();
        store
            .set(keys::BACK_TAP_ENABLED, SettingValue::Bool(true))
            .unwrap();

        let reopened = JsonSettingsStore::open(&path).unwrap();
        let settings = Settings::read(&reopened);
        assert!(settings.back_tap_enabled);
        assert!((settings.back_tap_threshold - 15.75).abs() < 1e-9);
    }
}
