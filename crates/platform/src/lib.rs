//! Chat Drop Platform
//!
//! Host integration for the overlay shell.
//!
//! This crate handles:
//! - Primary display queries and the overlay window host (headless backend)
//! - Accelerator parsing and global hotkey registration
//! - Hosted-content glue: the injected key listener and page zoom

pub mod content;
pub mod headless;
pub mod hotkey;

pub use content::{PageKeyAction, ZoomLevel, DEFAULT_URL, KEY_LISTENER_SCRIPT};
pub use headless::{HeadlessDisplay, HeadlessWindow};
pub use hotkey::{parse_hotkey_string, register_hotkeys, Hotkey, HotkeyHandle, HotkeyParseError, Modifiers};

use chatdrop_core::WindowBounds;

/// Fallback display dimensions when no display is detected.
pub const FALLBACK_DISPLAY_WIDTH: i32 = 1920;
pub const FALLBACK_DISPLAY_HEIGHT: i32 = 1080;

/// How the overlay window is created.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowOptions {
    /// Initial bounds from the bounds resolver.
    pub bounds: WindowBounds,
    /// Page loaded into the window.
    pub url: String,
    /// Draw without title bar or border.
    pub frameless: bool,
    /// Keep above all other windows.
    pub always_on_top: bool,
    /// Allow user resizing.
    pub resizable: bool,
}

impl WindowOptions {
    /// Borderless, always-on-top, fixed-size overlay at `bounds`.
    pub fn overlay(bounds: WindowBounds, url: impl Into<String>) -> Self {
        Self {
            bounds,
            url: url.into(),
            frameless: true,
            always_on_top: true,
            resizable: false,
        }
    }
}
