//! Configuration management for the Chat Drop shell.
//!
//! Configuration is loaded from TOML files in the following locations (in order):
//! 1. `<config-home>/chat-drop/config.toml` (next to `settings.json`)
//! 2. `~/.config/chat-drop/config.toml` (Unix-style, for platforms whose
//!    config root lives elsewhere)
//! 3. `./config.toml` (current directory, for development)
//!
//! This file is hand-edited and read-only to the shell; the window origin
//! lives in the separate settings store.

use anyhow::{Context, Result};
use chatdrop_core::store::{default_store_dir, APP_NAME};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Behavior configuration.
    pub behavior: BehaviorConfig,
    /// Hosted content configuration.
    pub content: ContentConfig,
    /// Hotkey bindings.
    pub hotkeys: HotkeyConfig,
    /// Window origin persistence.
    pub persistence: PersistenceConfig,
}

/// Behavior-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Hosted page configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Page loaded into the overlay.
    #[serde(default = "default_url")]
    pub url: String,

    /// Zoom factor applied after the page loads.
    #[serde(default = "default_zoom_factor")]
    pub zoom_factor: f64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            zoom_factor: default_zoom_factor(),
        }
    }
}

/// Hotkey bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Accelerators that toggle the overlay.
    #[serde(default = "default_toggle_hotkeys")]
    pub toggle: Vec<String>,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            toggle: default_toggle_hotkeys(),
        }
    }
}

/// Window origin persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Quiet period after the last move before the origin is written.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Override for the settings directory.
    #[serde(default)]
    pub settings_dir: Option<PathBuf>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            settings_dir: None,
        }
    }
}

// Default value functions for serde
fn default_log_level() -> String {
    "info".to_string()
}

fn default_url() -> String {
    chatdrop_platform::DEFAULT_URL.to_string()
}

fn default_zoom_factor() -> f64 {
    chatdrop_platform::content::DEFAULT_ZOOM_FACTOR
}

fn default_toggle_hotkeys() -> Vec<String> {
    vec![
        "CommandOrControl+I".to_string(),
        "CommandOrControl+1".to_string(),
    ]
}

fn default_debounce_ms() -> u64 {
    chatdrop_core::debounce::MOVE_PERSIST_DELAY.as_millis() as u64
}

const MIN_DEBOUNCE_MS: u64 = 100;
const MAX_DEBOUNCE_MS: u64 = 60_000;
const MIN_ZOOM_FACTOR: f64 = 0.25;
const MAX_ZOOM_FACTOR: f64 = 5.0;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A value that was out of range and has been corrected.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    pub field: &'static str,
    pub message: String,
}

impl Config {
    /// Load configuration from standard locations.
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self> {
        let paths = config_paths();

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Clamp out-of-range values in place and describe what changed.
    pub fn validate(&mut self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let level = self.behavior.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            warnings.push(ConfigWarning {
                field: "behavior.log_level",
                message: format!("unknown level '{}', using 'info'", self.behavior.log_level),
            });
            self.behavior.log_level = default_log_level();
        }

        let debounce = self
            .persistence
            .debounce_ms
            .clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS);
        if debounce != self.persistence.debounce_ms {
            warnings.push(ConfigWarning {
                field: "persistence.debounce_ms",
                message: format!("{} out of range, clamped to {}", self.persistence.debounce_ms, debounce),
            });
            self.persistence.debounce_ms = debounce;
        }

        let zoom = self.content.zoom_factor;
        if !zoom.is_finite() {
            warnings.push(ConfigWarning {
                field: "content.zoom_factor",
                message: format!("{} is not a number, using default", zoom),
            });
            self.content.zoom_factor = default_zoom_factor();
        } else if !(MIN_ZOOM_FACTOR..=MAX_ZOOM_FACTOR).contains(&zoom) {
            let clamped = zoom.clamp(MIN_ZOOM_FACTOR, MAX_ZOOM_FACTOR);
            warnings.push(ConfigWarning {
                field: "content.zoom_factor",
                message: format!("{} out of range, clamped to {}", zoom, clamped),
            });
            self.content.zoom_factor = clamped;
        }

        if self.hotkeys.toggle.is_empty() {
            warnings.push(ConfigWarning {
                field: "hotkeys.toggle",
                message: "no toggle hotkeys configured".to_string(),
            });
        }

        warnings
    }
}

/// Get all possible config file paths in priority order.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. Platform config root: <config-home>/chat-drop/config.toml
    if let Some(dir) = default_store_dir() {
        paths.push(dir.join("config.toml"));
    }

    // 2. Unix-style: ~/.config/chat-drop/config.toml
    if let Some(home) = dirs_home() {
        let unix_style = home.join(".config").join(APP_NAME).join("config.toml");
        if !paths.contains(&unix_style) {
            paths.push(unix_style);
        }
    }

    // 3. Current directory: ./config.toml
    paths.push(PathBuf::from("config.toml"));

    paths
}

/// Get the user's home directory.
fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
