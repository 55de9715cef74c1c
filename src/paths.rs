//! Centralized path definitions for configuration files.

use std::path::{Path, PathBuf};

// ── Application identity ─────────────────────────────────────────

pub const APP_DIR: &str = "mocktopus";

// ── Leaf filenames ───────────────────────────────────────────────

pub const SETTINGS_FILE: &str = "settings.json";

// ── Config-dir functions ─────────────────────────────────────────

/// `<platform config dir>/mocktopus`.
///
/// Windows uses `%APPDATA%`, macOS `~/Library/Application Support`, everything
/// else `$XDG_CONFIG_HOME` falling back to `~/.config`.
pub fn config_dir() -> PathBuf {
    let base = if cfg!(target_os = "windows") {
        std::env::var("APPDATA")
            .map_or_else(|_| PathBuf::from("C:\\Users\\Default\\AppData\\Roaming"), PathBuf::from)
    } else if cfg!(target_os = "macos") {
        home_dir().join("Library/Application Support")
    } else {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|v| !v.is_empty())
            .map_or_else(|| home_dir().join(".config"), PathBuf::from)
    };
    base.join(APP_DIR)
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(SETTINGS_FILE)
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_or_else(|_| PathBuf::from("."), PathBuf::from)
}
