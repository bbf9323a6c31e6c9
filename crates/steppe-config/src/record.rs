//! Flat per-segment record files.
//!
//! One segment per line, nine comma-separated fields:
//!
//! ```text
//! fs,hertz,sigma,duration,start_offset,stop_offset,window,window_open,window_close
//! 44100,850,2.5,600,0,0,cosine,200,200
//! ```
//!
//! Loading is all-or-nothing: one bad line fails the whole file.

use crate::error::ConfigError;
use std::path::Path;
use std::str::FromStr;
use steppe_core::{SegmentParameters, WindowKind};

/// Number of fields in a record.
pub const FIELD_COUNT: usize = 9;

const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "fs",
    "hertz",
    "sigma",
    "duration",
    "start_offset",
    "stop_offset",
    "window",
    "window_open",
    "window_close",
];

fn field<T: FromStr>(fields: &[&str], index: usize, line: usize) -> Result<T, ConfigError> {
    let raw = fields[index].trim();
    raw.parse().map_err(|_| {
        ConfigError::malformed(
            line,
            format!("invalid {} value '{}'", FIELD_NAMES[index], raw),
        )
    })
}

fn parse_line(text: &str, line: usize) -> Result<SegmentParameters, ConfigError> {
    let fields: Vec<&str> = text.trim().split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(ConfigError::malformed(
            line,
            format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
        ));
    }

    let window = WindowKind::from_str(fields[6].trim())
        .map_err(|e| ConfigError::malformed(line, e.to_string()))?;

    let params = SegmentParameters {
        sample_rate: field(&fields, 0, line)?,
        frequency: field(&fields, 1, line)?,
        sigma: field(&fields, 2, line)?,
        duration_ms: field(&fields, 3, line)?,
        start_offset_ms: field(&fields, 4, line)?,
        stop_offset_ms: field(&fields, 5, line)?,
        window,
        window_open_ms: field(&fields, 7, line)?,
        window_close_ms: field(&fields, 8, line)?,
    };

    params
        .validate()
        .map_err(|e| ConfigError::malformed(line, e.to_string()))?;
    Ok(params)
}

/// Parse a single record.
pub fn parse_record(text: &str) -> Result<SegmentParameters, ConfigError> {
    parse_line(text, 1)
}

/// Render a record with the persisted window spelling.
pub fn format_record(params: &SegmentParameters) -> String {
    format!(
        "{},{},{:?},{},{},{},{},{},{}",
        params.sample_rate,
        params.frequency,
        params.sigma,
        params.duration_ms,
        params.start_offset_ms,
        params.stop_offset_ms,
        params.window.name(),
        params.window_open_ms,
        params.window_close_ms,
    )
}

/// Parse a whole file's worth of records. Blank lines are skipped.
pub fn parse_segments(content: &str) -> Result<Vec<SegmentParameters>, ConfigError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(index, text)| parse_line(text, index + 1))
        .collect()
}

/// Render records one per line, without a trailing newline.
pub fn format_segments(segments: &[SegmentParameters]) -> String {
    segments
        .iter()
        .map(format_record)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Load segment records from a file.
pub fn load_segments(path: impl AsRef<Path>) -> Result<Vec<SegmentParameters>, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let segments = parse_segments(&content)?;
    tracing::debug!(path = %path.display(), count = segments.len(), "segments loaded");
    Ok(segments)
}

/// Save segment records to a file, creating the parent directory if needed.
pub fn save_segments(
    path: impl AsRef<Path>,
    segments: &[SegmentParameters],
) -> Result<(), ConfigError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
    }

    std::fs::write(path, format_segments(segments))
        .map_err(|e| ConfigError::write_file(path, e))?;
    tracing::debug!(path = %path.display(), count = segments.len(), "segments saved");
    Ok(())
}
