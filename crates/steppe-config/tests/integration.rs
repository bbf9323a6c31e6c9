//! Integration tests for steppe-config.
//!
//! These tests go through the filesystem and into a probe.

use steppe_config::{ConfigError, Settings, load_segments, save_segments};
use steppe_core::{Probe, SegmentParameters, WindowKind};
use tempfile::TempDir;

fn three_steps() -> Vec<SegmentParameters> {
    [440, 880, 1760]
        .into_iter()
        .map(|frequency| SegmentParameters {
            sample_rate: 8000,
            frequency,
            duration_ms: 100,
            window: WindowKind::Hann,
            window_open_ms: 20,
            window_close_ms: 20,
            ..SegmentParameters::default()
        })
        .collect()
}

/// A saved probe loads back into an identical probe.
#[test]
fn test_probe_save_load_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("probes").join("steps.cfg");

    let probe = Probe::from_parameters(&three_steps()).unwrap();
    save_segments(&path, &probe.parameters()).unwrap();
    assert!(path.exists());

    let loaded = load_segments(&path).unwrap();
    let reloaded = Probe::from_parameters(&loaded).unwrap();
    assert_eq!(reloaded.parameters(), probe.parameters());
    assert_eq!(reloaded.composite(), probe.composite());
}

/// A file with one malformed line is rejected and leaves the probe alone.
#[test]
fn test_malformed_file_leaves_probe_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.cfg");
    std::fs::write(
        &path,
        "8000,440,2.5,100,0,0,hann,20,20\n8000,abc,2.5,100,0,0,hann,20,20\n",
    )
    .unwrap();

    let mut probe = Probe::from_parameters(&three_steps()).unwrap();
    let before = probe.composite().to_vec();

    let result = load_segments(&path).map(|segments| probe.extend_from_parameters(&segments));
    assert!(matches!(result, Err(ConfigError::Malformed { line: 2, .. })));
    assert_eq!(probe.len(), 3);
    assert_eq!(probe.composite(), before.as_slice());
}

/// Loading a missing file reports the path.
#[test]
fn test_missing_file() {
    let err = load_segments("/nonexistent/steppe/probe.cfg").unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("probe.cfg"));
}

/// Settings written to disk come back unchanged and feed a valid segment.
#[test]
fn test_settings_save_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("settings.toml");

    let mut settings = Settings::default();
    settings.segment.frequency = 1200;
    settings.segment.window = WindowKind::Gaussian;
    settings.segment.sigma = 3.0;
    settings.analysis.start_ms = 100;
    settings.calibration.method = "logarithmic".to_string();
    settings.devices.input = Some("USB".to_string());
    settings.save(&path).unwrap();

    let loaded = Settings::load_or_default(Some(path.as_path())).unwrap();
    assert_eq!(loaded, settings);

    let params = loaded.segment_parameters();
    assert!(params.validate().is_ok());
    assert_eq!(params.frequency, 1200);
}

/// An explicit settings path must exist.
#[test]
fn test_explicit_settings_path_required() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.toml");
    assert!(matches!(
        Settings::load_or_default(Some(missing.as_path())),
        Err(ConfigError::ReadFile { .. })
    ));
}
