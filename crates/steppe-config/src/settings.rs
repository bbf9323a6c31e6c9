//! User settings stored as TOML.
//!
//! ```toml
//! [segment]
//! sample_rate = 44100
//! frequency = 850
//! sigma = 2.5
//! duration_ms = 600
//! start_offset_ms = 0
//! stop_offset_ms = 0
//! window = "cosine"
//! window_open_ms = 200
//! window_close_ms = 200
//!
//! [analysis]
//! start_ms = 0
//! stop_ms = -1
//!
//! [calibration]
//! method = "linear"
//! duration_ms = 5000
//! start_hz = 220.0
//! stop_hz = 3520.0
//!
//! [devices]
//! input = "USB"
//! output = "USB"
//! ```
//!
//! Every table and key is optional; missing ones take the defaults shown.

use crate::error::ConfigError;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use steppe_core::{SegmentParameters, WindowKind};

/// Serialize a [`WindowKind`] by its persisted name.
mod window_name {
    use serde::{Deserialize, Deserializer, Serializer};
    use steppe_core::WindowKind;

    pub fn serialize<S: Serializer>(window: &WindowKind, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(window.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<WindowKind, D::Error> {
        let name = String::deserialize(d)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Defaults for newly added segments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentDefaults {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Tone frequency in Hz.
    pub frequency: u32,
    /// Gaussian standard deviation.
    pub sigma: f64,
    /// Flat region length.
    pub duration_ms: u32,
    /// Leading silence.
    pub start_offset_ms: u32,
    /// Trailing silence.
    pub stop_offset_ms: u32,
    /// Taper shape.
    #[serde(with = "window_name")]
    pub window: WindowKind,
    /// Opening taper length.
    pub window_open_ms: u32,
    /// Closing taper length.
    pub window_close_ms: u32,
}

impl Default for SegmentDefaults {
    fn default() -> Self {
        SegmentParameters::default().into()
    }
}

impl From<SegmentParameters> for SegmentDefaults {
    fn from(p: SegmentParameters) -> Self {
        Self {
            sample_rate: p.sample_rate,
            frequency: p.frequency,
            sigma: p.sigma,
            duration_ms: p.duration_ms,
            start_offset_ms: p.start_offset_ms,
            stop_offset_ms: p.stop_offset_ms,
            window: p.window,
            window_open_ms: p.window_open_ms,
            window_close_ms: p.window_close_ms,
        }
    }
}

impl From<SegmentDefaults> for SegmentParameters {
    fn from(d: SegmentDefaults) -> Self {
        Self {
            sample_rate: d.sample_rate,
            frequency: d.frequency,
            sigma: d.sigma,
            duration_ms: d.duration_ms,
            start_offset_ms: d.start_offset_ms,
            stop_offset_ms: d.stop_offset_ms,
            window: d.window,
            window_open_ms: d.window_open_ms,
            window_close_ms: d.window_close_ms,
        }
    }
}

/// Default analysis range. A negative stop means "end of capture".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisDefaults {
    /// Start of the analyzed range.
    pub start_ms: i64,
    /// End of the analyzed range, -1 for the end of the capture.
    pub stop_ms: i64,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            start_ms: 0,
            stop_ms: -1,
        }
    }
}

/// Default calibration sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationDefaults {
    /// Sweep law: `linear`, `logarithmic` or `hyperbolic`.
    pub method: String,
    /// Sweep length.
    pub duration_ms: u32,
    /// Start frequency.
    pub start_hz: f64,
    /// Stop frequency.
    pub stop_hz: f64,
}

impl Default for CalibrationDefaults {
    fn default() -> Self {
        Self {
            method: "linear".to_string(),
            duration_ms: 5000,
            start_hz: 220.0,
            stop_hz: 3520.0,
        }
    }
}

/// Preferred devices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Capture device (index, name or partial name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Playback device (index, name or partial name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Preferred buffer size in frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<u32>,
}

/// All user settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Defaults for new segments.
    pub segment: SegmentDefaults,
    /// Default analysis range.
    pub analysis: AnalysisDefaults,
    /// Default calibration sweep.
    pub calibration: CalibrationDefaults,
    /// Preferred devices.
    pub devices: DeviceSettings,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load from `path` if given, else from the user settings file.
    ///
    /// An explicit path must exist; a missing user settings file yields defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let default_path = paths::settings_path();
        if default_path.is_file() {
            tracing::debug!(path = %default_path.display(), "loading user settings");
            Self::load(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to a TOML file, creating the parent directory if needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        std::fs::write(path, self.to_toml()?).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Segment parameters built from the segment defaults.
    pub fn segment_parameters(&self) -> SegmentParameters {
        self.segment.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_segment() {
        let settings = Settings::default();
        assert_eq!(settings.segment_parameters(), SegmentParameters::default());
        assert_eq!(settings.analysis.stop_ms, -1);
        assert_eq!(settings.calibration.method, "linear");
        assert_eq!(settings.calibration.duration_ms, 5000);
        assert_eq!(settings.calibration.start_hz, 220.0);
        assert_eq!(settings.calibration.stop_hz, 3520.0);
        assert!(settings.devices.input.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings = Settings::from_toml(
            r#"
            [segment]
            frequency = 1000
            window = "triangular"

            [devices]
            output = "USB"
            "#,
        )
        .unwrap();

        assert_eq!(settings.segment.frequency, 1000);
        assert_eq!(settings.segment.window, WindowKind::Triangular);
        assert_eq!(settings.segment.sample_rate, 44100);
        assert_eq!(settings.devices.output.as_deref(), Some("USB"));
        assert_eq!(settings.analysis, AnalysisDefaults::default());
    }

    #[test]
    fn test_window_written_by_persisted_name() {
        let mut settings = Settings::default();
        settings.segment.window = WindowKind::Rectangular;
        let text = settings.to_toml().unwrap();
        assert!(text.contains("window = \"boxcar\""), "{text}");
        assert_eq!(Settings::from_toml(&text).unwrap(), settings);
    }

    #[test]
    fn test_unknown_window_rejected() {
        let err = Settings::from_toml("[segment]\nwindow = \"kaiser\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }
}
