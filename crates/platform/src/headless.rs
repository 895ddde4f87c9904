//! Headless host backend.
//!
//! Stands in for a native display/window system: the display reports a
//! fixed geometry and the window only records what it is told. Host events
//! (moves, load failures) are fed in by the daemon's control protocol.

use crate::{WindowOptions, FALLBACK_DISPLAY_HEIGHT, FALLBACK_DISPLAY_WIDTH};
use chatdrop_core::{DisplayInfo, DisplayQuery, HostError, Point, Rect, Size, WindowBounds, WindowHost};
use tracing::{debug, info};

/// A display with fixed geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessDisplay {
    info: DisplayInfo,
}

impl HeadlessDisplay {
    pub fn new(info: DisplayInfo) -> Self {
        Self { info }
    }

    /// Display of `size` whose usable area is `bounds`.
    pub fn with_bounds(size: Size, bounds: Rect) -> Self {
        Self::new(DisplayInfo { size, bounds })
    }
}

impl Default for HeadlessDisplay {
    fn default() -> Self {
        Self::new(DisplayInfo::at_origin(
            FALLBACK_DISPLAY_WIDTH,
            FALLBACK_DISPLAY_HEIGHT,
        ))
    }
}

impl DisplayQuery for HeadlessDisplay {
    fn primary_display(&self) -> Result<DisplayInfo, HostError> {
        if self.info.size.width <= 0 || self.info.size.height <= 0 {
            return Err(HostError::NoDisplay);
        }
        Ok(self.info)
    }
}

/// Overlay window without a native surface.
#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    options: WindowOptions,
    origin: Point,
    visible: bool,
}

impl HeadlessWindow {
    /// "Create" the window. It starts visible, as native windows do.
    pub fn create(options: WindowOptions) -> Self {
        info!(
            "Created headless window {}x{} at ({}, {}) for {}",
            options.bounds.width,
            options.bounds.height,
            options.bounds.x,
            options.bounds.y,
            options.url
        );
        let origin = options.bounds.origin();
        Self {
            options,
            origin,
            visible: true,
        }
    }

    pub fn options(&self) -> &WindowOptions {
        &self.options
    }

    /// Current bounds: live origin with the creation size.
    pub fn bounds(&self) -> WindowBounds {
        WindowBounds::new(self.origin, self.options.bounds.size())
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl WindowHost for HeadlessWindow {
    fn set_position(&mut self, origin: Point) -> Result<(), HostError> {
        debug!("Window moved to ({}, {})", origin.x, origin.y);
        self.origin = origin;
        Ok(())
    }

    fn position(&self) -> Result<Point, HostError> {
        Ok(self.origin)
    }

    fn show(&mut self) -> Result<(), HostError> {
        self.visible = true;
        Ok(())
    }

    fn hide(&mut self) -> Result<(), HostError> {
        self.visible = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_URL;

    #[test]
    fn test_default_display_is_fallback() {
        let display = HeadlessDisplay::default().primary_display().unwrap();
        assert_eq!(display.size, Size::new(1920, 1080));
        assert_eq!(display.bounds, Rect::new(0, 0, 1920, 1080));
    }

    #[test]
    fn test_degenerate_display_is_error() {
        let display = HeadlessDisplay::new(DisplayInfo::at_origin(0, 0));
        assert!(matches!(display.primary_display(), Err(HostError::NoDisplay)));
    }

    #[test]
    fn test_window_tracks_position_and_visibility() {
        let bounds = WindowBounds::new(Point::new(50, 20), Size::new(1820, 780));
        let mut window = HeadlessWindow::create(WindowOptions::overlay(bounds, DEFAULT_URL));
        assert!(window.is_visible());
        assert_eq!(window.position().unwrap(), Point::new(50, 20));

        window.set_position(Point::new(-10, 400)).unwrap();
        window.hide().unwrap();
        assert!(!window.is_visible());
        assert_eq!(
            window.bounds(),
            WindowBounds { x: -10, y: 400, width: 1820, height: 780 }
        );
    }
}
