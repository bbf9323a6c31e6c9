//! Platform-specific paths for settings and saved probes.
//!
//! - **User config**: `~/.config/steppe/` (Linux), `~/Library/Application Support/steppe/`
//!   (macOS), `%APPDATA%\steppe\` (Windows)
//! - **Saved probes**: `probes/` under the user config directory

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "steppe";

/// Settings file name inside the user config directory.
const SETTINGS_FILE: &str = "settings.toml";

/// Subdirectory name for saved probes.
const PROBES_SUBDIR: &str = "probes";

/// File extension of segment record files.
pub const PROBE_EXTENSION: &str = "cfg";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the user settings file path.
pub fn settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

/// Returns the directory saved probes live in.
pub fn user_probes_dir() -> PathBuf {
    user_config_dir().join(PROBES_SUBDIR)
}

/// Find a probe file by path or by name in the user probes directory.
///
/// The name may omit the `.cfg` extension.
pub fn find_probe(name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if path.extension().is_some_and(|e| e == PROBE_EXTENSION) {
        name.to_string()
    } else {
        format!("{}.{}", name, PROBE_EXTENSION)
    };

    let user_path = user_probes_dir().join(filename);
    user_path.is_file().then_some(user_path)
}
