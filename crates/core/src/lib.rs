//! Chat Drop Core
//!
//! Platform-agnostic window-state persistence for the Chat Drop overlay shell.
//!
//! This crate implements:
//! - Window bounds resolution from the primary display and the stored origin
//! - The on-disk settings store holding the last window origin
//! - A trailing-edge debouncer used to coalesce window move events
//! - The window controller owning the `Hidden`/`Visible` state machine

pub mod debounce;
pub mod store;
pub mod window;

pub use debounce::Debouncer;
pub use store::{OriginUpdate, SettingsRecord, SettingsStore, StoreError};
pub use window::{DisplayQuery, HostError, Visibility, WindowController, WindowHost};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Pixels subtracted from the display width to get the window width.
pub const WIDTH_MARGIN: i32 = 100;

/// Pixels subtracted from the display height to get the window height.
pub const HEIGHT_MARGIN: i32 = 300;

/// Upward shift applied to the centered default origin, keeping the
/// window clear of the taskbar.
pub const VERTICAL_BIAS: i32 = 130;

/// Smallest width or height a resolved window can have.
const MIN_WINDOW_DIMENSION: i32 = 1;

/// A point in virtual screen coordinates (pixels). May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// A rectangle in screen coordinates (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Get the top-left corner.
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Get the width/height pair.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Geometry of the primary display as reported by the host.
///
/// `size` is the raw pixel size; `bounds` is the usable rectangle, which can
/// differ from `size` on scaled or multi-monitor setups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub size: Size,
    pub bounds: Rect,
}

impl DisplayInfo {
    /// Display whose usable bounds start at the origin and cover its full size.
    pub fn at_origin(width: i32, height: i32) -> Self {
        Self {
            size: Size::new(width, height),
            bounds: Rect::new(0, 0, width, height),
        }
    }
}

/// Bounds the overlay window is created with.
///
/// Width and height always come from the current display; only the origin
/// is persisted between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowBounds {
    pub fn new(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Window size for a display: the display size minus the fixed margins.
pub fn window_size(display: &DisplayInfo) -> Size {
    Size::new(
        (display.size.width - WIDTH_MARGIN).max(MIN_WINDOW_DIMENSION),
        (display.size.height - HEIGHT_MARGIN).max(MIN_WINDOW_DIMENSION),
    )
}

/// Origin that centers a window of `size` in the display's usable bounds,
/// shifted up by [`VERTICAL_BIAS`].
///
/// Halving rounds toward negative infinity, so odd or negative slack
/// floors the same way for both axes.
pub fn default_origin(display: &DisplayInfo, size: Size) -> Point {
    let bounds = display.bounds;
    Point::new(
        bounds.x + (bounds.width - size.width).div_euclid(2),
        bounds.y + (bounds.height - size.height).div_euclid(2) - VERTICAL_BIAS,
    )
}

/// Bounds computed purely from the display, without touching the store.
pub fn default_bounds(display: &DisplayInfo) -> WindowBounds {
    let size = window_size(display);
    WindowBounds::new(default_origin(display, size), size)
}

/// Resolve the startup window bounds.
///
/// A stored origin is reused verbatim, even if it lies off every connected
/// display. Without one (missing, corrupt, unreadable or incomplete record),
/// the centered default is used and written back so later launches reuse it.
///
/// Only a store directory that cannot be created is an error; a failed
/// first-run write is logged and the computed bounds are still returned.
pub fn resolve_bounds(
    display: &DisplayInfo,
    store: &SettingsStore,
) -> Result<WindowBounds, StoreError> {
    store.ensure_store_directory()?;

    let size = window_size(display);
    let stored = match store.read_record() {
        Ok(Some(record)) => record.origin(),
        Ok(None) => None,
        Err(e) => {
            warn!("Ignoring unusable settings: {}", e);
            None
        }
    };

    if let Some(origin) = stored {
        info!("Using stored window origin ({}, {})", origin.x, origin.y);
        return Ok(WindowBounds::new(origin, size));
    }

    let origin = default_origin(display, size);
    info!(
        "No stored window origin, using centered default ({}, {})",
        origin.x, origin.y
    );
    if let Err(e) = store.write_record(OriginUpdate::from(origin)) {
        warn!("Failed to persist initial window origin: {}", e);
    }

    Ok(WindowBounds::new(origin, size))
}
