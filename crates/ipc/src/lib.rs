//! Chat Drop IPC Protocol
//!
//! Messages exchanged with the shell:
//! - [`BridgeMessage`]: posted by the hosted page and relayed to the host
//! - [`ShellCommand`] / [`ShellResponse`]: line-delimited JSON control protocol
//!   carrying host events into the daemon and answering state queries

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message the hosted page posts to ask the host to hide the window.
pub const HIDE_MAIN_WINDOW: &str = "hide-main-window";

/// Maximum size of a single protocol line in bytes.
pub const MAX_IPC_MESSAGE_SIZE: usize = 64 * 1024;

/// Errors decoding a protocol line.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Message of {0} bytes exceeds the size limit")]
    TooLarge(usize),

    #[error("Empty message")]
    Empty,

    #[error("Invalid command: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Requests relayed from the hosted page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeMessage {
    HideMainWindow,
}

impl BridgeMessage {
    /// Interpret a raw `postMessage` payload. Unknown payloads are ignored.
    pub fn from_post_message(data: &str) -> Option<Self> {
        match data {
            HIDE_MAIN_WINDOW => Some(BridgeMessage::HideMainWindow),
            _ => None,
        }
    }
}

/// Commands fed to the daemon, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShellCommand {
    /// Toggle visibility, as the global hotkey does.
    Toggle,
    /// Show the window.
    Show,
    /// Hide the window.
    Hide,
    /// The user moved the window to a new origin.
    Moved { x: i32, y: i32 },
    /// A global accelerator was pressed (e.g. `CommandOrControl+I`).
    Hotkey { accelerator: String },
    /// The hosted page posted a message.
    Bridge { message: String },
    /// A key was pressed inside the hosted page.
    Key {
        key: String,
        /// Ctrl (or Cmd on macOS) held.
        #[serde(default)]
        modifier: bool,
    },
    /// The hosted page failed to load.
    LoadFailed,
    /// Report the current window state.
    QueryState,
    /// Shut the shell down.
    Stop,
}

/// Replies from the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShellResponse {
    /// Command executed successfully.
    Ok,
    /// Command failed.
    Error {
        /// Error message describing what went wrong.
        message: String,
    },
    /// Current window state.
    State {
        visible: bool,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        zoom: f64,
    },
}

impl ShellResponse {
    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Decode one protocol line (trailing newline allowed).
pub fn decode_command(line: &str) -> Result<ShellCommand, ProtocolError> {
    if line.len() > MAX_IPC_MESSAGE_SIZE {
        return Err(ProtocolError::TooLarge(line.len()));
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::Empty);
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Encode a response as one newline-terminated line.
pub fn encode_response(response: &ShellResponse) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(response)?;
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_hide_message() {
        assert_eq!(
            BridgeMessage::from_post_message("hide-main-window"),
            Some(BridgeMessage::HideMainWindow)
        );
        assert_eq!(BridgeMessage::from_post_message("show-main-window"), None);
        assert_eq!(BridgeMessage::from_post_message(""), None);
    }

    #[test]
    fn test_command_wire_format() {
        let json = serde_json::to_string(&ShellCommand::Moved { x: -40, y: 12 }).unwrap();
        assert_eq!(json, r#"{"type":"moved","x":-40,"y":12}"#);

        let json = serde_json::to_string(&ShellCommand::LoadFailed).unwrap();
        assert_eq!(json, r#"{"type":"load_failed"}"#);
    }

    #[test]
    fn test_key_modifier_defaults_to_false() {
        let cmd = decode_command(r#"{"type":"key","key":"Escape"}"#).unwrap();
        assert_eq!(
            cmd,
            ShellCommand::Key {
                key: "Escape".to_string(),
                modifier: false
            }
        );
    }

    #[test]
    fn test_decode_trims_newline() {
        let cmd = decode_command("{\"type\":\"toggle\"}\n").unwrap();
        assert_eq!(cmd, ShellCommand::Toggle);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode_command("   \n"), Err(ProtocolError::Empty)));
        assert!(matches!(
            decode_command("not valid json"),
            Err(ProtocolError::InvalidJson(_))
        ));
        assert!(matches!(
            decode_command(r#"{"type": "unknown_command"}"#),
            Err(ProtocolError::InvalidJson(_))
        ));

        let huge = "x".repeat(MAX_IPC_MESSAGE_SIZE + 1);
        assert!(matches!(decode_command(&huge), Err(ProtocolError::TooLarge(_))));
    }

    #[test]
    fn test_encode_response_is_one_line() {
        let line = encode_response(&ShellResponse::State {
            visible: true,
            x: 50,
            y: 20,
            width: 1820,
            height: 780,
            zoom: 1.3,
        })
        .unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.contains(r#""status":"state""#));

        let parsed: ShellResponse = serde_json::from_str(line.trim()).unwrap();
        assert!(matches!(parsed, ShellResponse::State { x: 50, y: 20, .. }));
    }

    #[test]
    fn test_error_response() {
        let resp = ShellResponse::error("Something went wrong");
        if let ShellResponse::Error { message } = resp {
            assert_eq!(message, "Something went wrong");
        } else {
            panic!("Expected Error response");
        }
    }
}
