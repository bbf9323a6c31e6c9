//! Configuration for stepped frequency measurements.
//!
//! # Features
//!
//! - **Segment files**: load and save probes as flat comma-separated records
//! - **Settings**: TOML defaults for segments, analysis, calibration and devices
//! - **Paths**: platform-specific config and probe directories
//!
//! # Example
//!
//! ```rust,no_run
//! use steppe_config::{Settings, load_segments, save_segments};
//! use steppe_core::Probe;
//!
//! let settings = Settings::load_or_default(None).unwrap();
//! let mut segments = load_segments("probe.cfg").unwrap();
//! segments.push(settings.segment_parameters());
//!
//! let probe = Probe::from_parameters(&segments).unwrap();
//! save_segments("probe.cfg", &probe.parameters()).unwrap();
//! ```

mod error;
mod record;
mod settings;

/// Platform-specific paths for settings and probes.
pub mod paths;

pub use error::ConfigError;
pub use paths::{find_probe, settings_path, user_config_dir, user_probes_dir};
pub use record::{
    FIELD_COUNT, format_record, format_segments, load_segments, parse_record, parse_segments,
    save_segments,
};
pub use settings::{
    AnalysisDefaults, CalibrationDefaults, DeviceSettings, SegmentDefaults, Settings,
};
