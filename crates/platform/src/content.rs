//! Hosted web content glue.
//!
//! The overlay loads a fixed remote page. Two small pieces of behavior are
//! layered on top of it: an injected listener that asks the host to hide the
//! window when Escape is pressed, and Ctrl/Cmd shortcuts that adjust the
//! page zoom.

/// Page loaded into the overlay window.
pub const DEFAULT_URL: &str = "https://chat.openai.com/chat?model=gpt-4";

/// Script injected after the page loads.
pub const KEY_LISTENER_SCRIPT: &str = r#"
window.addEventListener("keydown", (event) => {
    if (event.key === "Escape") {
        window.postMessage("hide-main-window", "*");
    }
});
"#;

/// Zoom factor applied when the page first loads.
pub const DEFAULT_ZOOM_FACTOR: f64 = 1.3;

/// Zoom factor restored by Ctrl/Cmd+0.
pub const RESET_ZOOM_FACTOR: f64 = 1.0;

/// Change per Ctrl/Cmd +/- press.
pub const ZOOM_STEP: f64 = 0.1;

const MIN_ZOOM_FACTOR: f64 = 0.1;

/// What a key press inside the hosted page does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKeyAction {
    /// Escape: ask the host to hide the window.
    Hide,
    ZoomIn,
    ZoomOut,
    ZoomReset,
}

impl PageKeyAction {
    /// Classify a key press. `modifier_held` is Ctrl on most platforms and
    /// Cmd on macOS.
    pub fn from_key(key: &str, modifier_held: bool) -> Option<Self> {
        if key == "Escape" {
            return Some(PageKeyAction::Hide);
        }
        if !modifier_held {
            return None;
        }
        match key {
            "=" | "+" => Some(PageKeyAction::ZoomIn),
            "-" => Some(PageKeyAction::ZoomOut),
            "0" => Some(PageKeyAction::ZoomReset),
            _ => None,
        }
    }
}

/// Zoom factor of the hosted page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLevel {
    factor: f64,
}

impl ZoomLevel {
    /// Start at `factor`, clamped to the minimum.
    pub fn new(factor: f64) -> Self {
        Self {
            factor: normalize(factor),
        }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Apply a zoom action; returns the new factor if it changed anything.
    pub fn apply(&mut self, action: PageKeyAction) -> Option<f64> {
        let next = match action {
            PageKeyAction::ZoomIn => self.factor + ZOOM_STEP,
            PageKeyAction::ZoomOut => self.factor - ZOOM_STEP,
            PageKeyAction::ZoomReset => RESET_ZOOM_FACTOR,
            PageKeyAction::Hide => return None,
        };
        self.factor = normalize(next);
        Some(self.factor)
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM_FACTOR)
    }
}

/// Round to hundredths so repeated steps don't drift, and keep it positive.
fn normalize(factor: f64) -> f64 {
    ((factor * 100.0).round() / 100.0).max(MIN_ZOOM_FACTOR)
}
