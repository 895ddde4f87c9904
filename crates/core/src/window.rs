//! Host interfaces and the overlay window controller.
//!
//! The display and window hosts are external collaborators; this module only
//! defines the narrow surface the shell needs from them, plus the
//! `Hidden`/`Visible` state machine driven by hotkey toggles, hide requests
//! from the hosted page, and page load failures.

use crate::{DisplayInfo, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Errors reported by host implementations.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("No primary display available")]
    NoDisplay,

    #[error("Window operation '{operation}' failed: {message}")]
    OperationFailed {
        operation: &'static str,
        message: String,
    },
}

/// Queries the primary display geometry.
pub trait DisplayQuery {
    fn primary_display(&self) -> Result<DisplayInfo, HostError>;
}

/// The native window hosting the web content.
pub trait WindowHost {
    fn set_position(&mut self, origin: Point) -> Result<(), HostError>;
    fn position(&self) -> Result<Point, HostError>;
    fn show(&mut self) -> Result<(), HostError>;
    fn hide(&mut self) -> Result<(), HostError>;
}

/// Whether the overlay is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Hidden,
    Visible,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }

    /// The state a toggle moves to.
    pub fn toggled(self) -> Self {
        match self {
            Visibility::Hidden => Visibility::Visible,
            Visibility::Visible => Visibility::Hidden,
        }
    }
}

/// Owns the window host and its visibility state.
///
/// State only changes after the host call succeeds, so a failed `show`
/// leaves the controller `Hidden`.
#[derive(Debug)]
pub struct WindowController<W> {
    host: W,
    visibility: Visibility,
}

impl<W: WindowHost> WindowController<W> {
    /// Take ownership of a freshly created window and hide it.
    pub fn start_hidden(mut host: W) -> Result<Self, HostError> {
        host.hide()?;
        Ok(Self {
            host,
            visibility: Visibility::Hidden,
        })
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn host(&self) -> &W {
        &self.host
    }

    /// Hotkey toggle: show when hidden, hide when visible.
    pub fn toggle(&mut self) -> Result<Visibility, HostError> {
        match self.visibility.toggled() {
            Visibility::Visible => self.show()?,
            Visibility::Hidden => self.hide()?,
        }
        Ok(self.visibility)
    }

    pub fn show(&mut self) -> Result<(), HostError> {
        self.host.show()?;
        self.transition(Visibility::Visible);
        Ok(())
    }

    /// Explicit hide, e.g. requested by the hosted page.
    pub fn hide(&mut self) -> Result<(), HostError> {
        self.host.hide()?;
        self.transition(Visibility::Hidden);
        Ok(())
    }

    /// The hosted page failed to load; keep the broken page out of sight.
    pub fn load_failed(&mut self) -> Result<(), HostError> {
        info!("Hosted page failed to load, hiding window");
        self.hide()
    }

    /// Live window origin as reported by the host.
    pub fn position(&self) -> Result<Point, HostError> {
        self.host.position()
    }

    pub fn set_position(&mut self, origin: Point) -> Result<(), HostError> {
        self.host.set_position(origin)
    }

    fn transition(&mut self, next: Visibility) {
        if self.visibility != next {
            debug!("Window visibility {:?} -> {:?}", self.visibility, next);
        }
        self.visibility = next;
    }
}
