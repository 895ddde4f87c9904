//! Global hotkey accelerators.
//!
//! Accelerators are `+`-separated strings such as `CommandOrControl+I`:
//! any number of modifiers followed by exactly one key. Matching is
//! case-insensitive, and `CommandOrControl` matches Cmd on macOS and Ctrl
//! elsewhere.

use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Errors from parsing an accelerator string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HotkeyParseError {
    #[error("Hotkey string is empty")]
    Empty,

    #[error("Hotkey '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("Hotkey '{0}' has no key, only modifiers")]
    MissingKey(String),

    #[error("Hotkey '{0}' has more than one key")]
    MultipleKeys(String),
}

/// Modifier keys held for a hotkey.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Cmd on macOS, Ctrl elsewhere.
    pub command_or_control: bool,
    pub control: bool,
    pub command: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn is_empty(&self) -> bool {
        *self == Modifiers::default()
    }

    /// Replace `command_or_control` with the concrete modifier it stands for
    /// on this platform: Cmd on macOS, Ctrl elsewhere.
    pub fn resolved(self) -> Self {
        let mut resolved = self;
        if resolved.command_or_control {
            resolved.command_or_control = false;
            if cfg!(target_os = "macos") {
                resolved.command = true;
            } else {
                resolved.control = true;
            }
        }
        resolved
    }

    /// Set the flag for `name`. Returns false if `name` is not a modifier.
    fn set(&mut self, name: &str) -> bool {
        match name {
            "commandorcontrol" | "cmdorctrl" => self.command_or_control = true,
            "control" | "ctrl" => self.control = true,
            "command" | "cmd" | "super" | "meta" => self.command = true,
            "alt" | "option" => self.alt = true,
            "shift" => self.shift = true,
            _ => return false,
        }
        true
    }
}

/// A parsed global hotkey.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    /// Key name, upper-cased (`I`, `1`, `F5`, `ESCAPE`).
    pub key: String,
}

impl Hotkey {
    /// Whether both name the same key chord once `CommandOrControl` is
    /// resolved for this platform.
    pub fn same_chord(&self, other: &Hotkey) -> bool {
        self.key == other.key && self.modifiers.resolved() == other.modifiers.resolved()
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.modifiers;
        for (held, name) in [
            (m.command_or_control, "CommandOrControl"),
            (m.control, "Ctrl"),
            (m.command, "Command"),
            (m.alt, "Alt"),
            (m.shift, "Shift"),
        ] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        write!(f, "{}", self.key)
    }
}

/// Parse an accelerator string like `CommandOrControl+I`.
pub fn parse_hotkey_string(accelerator: &str) -> Result<Hotkey, HotkeyParseError> {
    let trimmed = accelerator.trim();
    if trimmed.is_empty() {
        return Err(HotkeyParseError::Empty);
    }

    let mut modifiers = Modifiers::default();
    let mut key: Option<String> = None;

    for segment in trimmed.split('+') {
        let segment = segment.trim();
        if segment.is_empty() {
            return Err(HotkeyParseError::EmptySegment(accelerator.to_string()));
        }
        if modifiers.set(&segment.to_lowercase()) {
            continue;
        }
        if key.is_some() {
            return Err(HotkeyParseError::MultipleKeys(accelerator.to_string()));
        }
        key = Some(segment.to_uppercase());
    }

    let key = key.ok_or_else(|| HotkeyParseError::MissingKey(accelerator.to_string()))?;
    Ok(Hotkey { modifiers, key })
}

/// Keeps hotkey registrations alive; dropping it unregisters them.
#[derive(Debug)]
pub struct HotkeyHandle {
    hotkeys: Vec<Hotkey>,
}

impl HotkeyHandle {
    pub fn registered_count(&self) -> usize {
        self.hotkeys.len()
    }

    /// Whether a pressed accelerator is one of the registered hotkeys.
    pub fn matches(&self, pressed: &Hotkey) -> bool {
        self.hotkeys.iter().any(|h| h.same_chord(pressed))
    }
}

impl Drop for HotkeyHandle {
    fn drop(&mut self) {
        if !self.hotkeys.is_empty() {
            tracing::debug!("Unregistering {} hotkeys", self.hotkeys.len());
        }
    }
}

/// Register global hotkeys.
///
/// The headless backend has no system-wide keyboard hook, so presses only
/// arrive through the control protocol and are matched against the handle.
pub fn register_hotkeys(hotkeys: Vec<Hotkey>) -> HotkeyHandle {
    if !hotkeys.is_empty() {
        warn!(
            "Global hotkeys are not captured by the headless backend; {} binding(s) respond to control-protocol presses only",
            hotkeys.len()
        );
    }
    HotkeyHandle { hotkeys }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_or_control() {
        let hotkey = parse_hotkey_string("CommandOrControl+I").unwrap();
        assert!(hotkey.modifiers.command_or_control);
        assert!(!hotkey.modifiers.shift);
        assert_eq!(hotkey.key, "I");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            parse_hotkey_string("cmdorctrl+i").unwrap(),
            parse_hotkey_string("CommandOrControl+I").unwrap()
        );
    }

    #[test]
    fn test_parse_multiple_modifiers() {
        let hotkey = parse_hotkey_string("Ctrl + Alt + Shift + F5").unwrap();
        assert!(hotkey.modifiers.control);
        assert!(hotkey.modifiers.alt);
        assert!(hotkey.modifiers.shift);
        assert_eq!(hotkey.key, "F5");
    }

    #[test]
    fn test_parse_bare_key() {
        let hotkey = parse_hotkey_string("Escape").unwrap();
        assert!(hotkey.modifiers.is_empty());
        assert_eq!(hotkey.key, "ESCAPE");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_hotkey_string("  "), Err(HotkeyParseError::Empty));
        assert_eq!(
            parse_hotkey_string("Ctrl+"),
            Err(HotkeyParseError::EmptySegment("Ctrl+".to_string()))
        );
        assert_eq!(
            parse_hotkey_string("Ctrl+Shift"),
            Err(HotkeyParseError::MissingKey("Ctrl+Shift".to_string()))
        );
        assert_eq!(
            parse_hotkey_string("I+J"),
            Err(HotkeyParseError::MultipleKeys("I+J".to_string()))
        );
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        let hotkey = parse_hotkey_string("shift+cmdorctrl+1").unwrap();
        assert_eq!(hotkey.to_string(), "CommandOrControl+Shift+1");
        assert_eq!(parse_hotkey_string(&hotkey.to_string()).unwrap(), hotkey);
    }

    #[test]
    fn test_handle_matches_registered_only() {
        let handle = register_hotkeys(vec![
            parse_hotkey_string("CommandOrControl+I").unwrap(),
            parse_hotkey_string("CommandOrControl+1").unwrap(),
        ]);
        assert_eq!(handle.registered_count(), 2);
        assert!(handle.matches(&parse_hotkey_string("CmdOrCtrl+1").unwrap()));
        assert!(!handle.matches(&parse_hotkey_string("CmdOrCtrl+2").unwrap()));
        assert!(!handle.matches(&parse_hotkey_string("CmdOrCtrl+Shift+1").unwrap()));
    }

    #[test]
    fn test_handle_matches_concrete_modifier() {
        let handle = register_hotkeys(vec![parse_hotkey_string("CommandOrControl+1").unwrap()]);
        let (native, foreign) = if cfg!(target_os = "macos") {
            ("Cmd+1", "Ctrl+1")
        } else {
            ("Ctrl+1", "Cmd+1")
        };
        assert!(handle.matches(&parse_hotkey_string(native).unwrap()));
        assert!(!handle.matches(&parse_hotkey_string(foreign).unwrap()));
    }

    #[test]
    fn test_resolved_modifiers() {
        let resolved = parse_hotkey_string("CmdOrCtrl+Alt+I").unwrap().modifiers.resolved();
        assert!(!resolved.command_or_control);
        assert!(resolved.alt);
        assert_eq!(resolved.control, !cfg!(target_os = "macos"));
        assert_eq!(resolved.command, cfg!(target_os = "macos"));
    }
}
