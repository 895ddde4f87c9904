//! Integration tests for the Chat Drop shell.
//!
//! These tests wire the core, platform and IPC crates together without a
//! real display or window system. They cover:
//! - Startup bounds against the headless display and a real settings file
//! - Move debouncing into settings writes
//! - The page-to-host hide bridge
//! - Control protocol framing

use chatdrop_core::{
    resolve_bounds, Debouncer, DisplayInfo, DisplayQuery, Point, Rect, SettingsStore, Size,
    Visibility, WindowController, WindowHost,
};
use chatdrop_ipc::{decode_command, encode_response, BridgeMessage, ShellCommand, ShellResponse};
use chatdrop_platform::{
    HeadlessDisplay, HeadlessWindow, PageKeyAction, WindowOptions, DEFAULT_URL, KEY_LISTENER_SCRIPT,
};
use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> SettingsStore {
    SettingsStore::new(dir.path().join("chat-drop"))
}

fn read_json(store: &SettingsStore) -> serde_json::Value {
    let text = fs::read_to_string(store.path()).expect("read settings");
    serde_json::from_str(&text).expect("parse settings")
}

// ============================================================================
// Startup Bounds
// ============================================================================

/// First launch on a full-HD display writes the centered default, and the
/// second launch reuses it.
#[test]
fn test_first_and_second_launch() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let display = HeadlessDisplay::default().primary_display().unwrap();

    let first = resolve_bounds(&display, &store).unwrap();
    assert_eq!((first.x, first.y, first.width, first.height), (50, 20, 1820, 780));
    assert_eq!(read_json(&store), serde_json::json!({ "x": 50, "y": 20 }));

    let second = resolve_bounds(&display, &store).unwrap();
    assert_eq!(second, first);
}

/// A moved window comes back where it was left, sized for the current display.
#[test]
fn test_stored_origin_survives_display_change() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.write_record(Point::new(-1500, 300).into()).unwrap();

    let display = HeadlessDisplay::with_bounds(Size::new(2560, 1440), Rect::new(0, 0, 2560, 1400))
        .primary_display()
        .unwrap();
    let bounds = resolve_bounds(&display, &store).unwrap();
    assert_eq!(bounds.origin(), Point::new(-1500, 300));
    assert_eq!(bounds.size(), Size::new(2460, 1140));
}

/// A corrupt settings file does not block startup and is replaced.
#[test]
fn test_corrupt_settings_recovered() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.ensure_store_directory().unwrap();
    fs::write(store.path(), "{ definitely not json").unwrap();

    let bounds = resolve_bounds(&DisplayInfo::at_origin(1920, 1080), &store).unwrap();
    assert_eq!(bounds.origin(), Point::new(50, 20));
    assert_eq!(read_json(&store), serde_json::json!({ "x": 50, "y": 20 }));
}

/// The headless window starts where the resolver put it and the controller
/// hides it immediately.
#[test]
fn test_window_created_hidden_at_resolved_origin() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let display = DisplayInfo::at_origin(1280, 800);
    let bounds = resolve_bounds(&display, &store).unwrap();

    let window = HeadlessWindow::create(WindowOptions::overlay(bounds, DEFAULT_URL));
    assert!(window.is_visible());
    let controller = WindowController::start_hidden(window).unwrap();

    assert_eq!(controller.visibility(), Visibility::Hidden);
    assert!(!controller.host().is_visible());
    assert_eq!(controller.position().unwrap(), Point::new(50, 20));
    assert_eq!(controller.host().bounds().size(), Size::new(1180, 500));
}

// ============================================================================
// Move Persistence
// ============================================================================

/// A drag produces many move events; only the final origin is written, once,
/// after the window has been still for the full delay.
#[tokio::test(start_paused = true)]
async fn test_drag_persists_final_origin_once() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.ensure_store_directory().unwrap();

    let writes = Arc::new(Mutex::new(0usize));
    let mut debouncer = {
        let store = store.clone();
        let writes = Arc::clone(&writes);
        Debouncer::new(Duration::from_millis(2000), move |origin: Point| {
            store.write_record(origin.into()).unwrap();
            *writes.lock().unwrap() += 1;
        })
    };

    let mut window = HeadlessWindow::create(WindowOptions::overlay(
        chatdrop_core::default_bounds(&DisplayInfo::at_origin(1920, 1080)),
        DEFAULT_URL,
    ));
    for step in 0..20 {
        let origin = Point::new(50 + step * 10, 20 + step);
        window.set_position(origin).unwrap();
        debouncer.trigger(origin);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    tokio::time::sleep(Duration::from_millis(1800)).await;
    assert_eq!(*writes.lock().unwrap(), 0);
    assert!(store.read_record().unwrap().is_none());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(*writes.lock().unwrap(), 1);
    let stored = store.read_record().unwrap().unwrap().origin();
    assert_eq!(stored, Some(window.position().unwrap()));
    assert_eq!(stored, Some(Point::new(240, 39)));
}

// ============================================================================
// Hide Bridge
// ============================================================================

/// Escape in the page posts the message the host listens for.
#[test]
fn test_listener_script_matches_bridge_message() {
    let posted = format!("postMessage(\"{}\"", chatdrop_ipc::HIDE_MAIN_WINDOW);
    assert!(KEY_LISTENER_SCRIPT.contains(&posted));
    assert_eq!(
        BridgeMessage::from_post_message(chatdrop_ipc::HIDE_MAIN_WINDOW),
        Some(BridgeMessage::HideMainWindow)
    );
    assert_eq!(PageKeyAction::from_key("Escape", false), Some(PageKeyAction::Hide));
}

/// Bridge hide followed by a hotkey toggle shows the window again.
#[test]
fn test_bridge_hide_then_toggle() {
    let window = HeadlessWindow::create(WindowOptions::overlay(
        chatdrop_core::default_bounds(&DisplayInfo::at_origin(1920, 1080)),
        DEFAULT_URL,
    ));
    let mut controller = WindowController::start_hidden(window).unwrap();
    controller.toggle().unwrap();

    if let Some(BridgeMessage::HideMainWindow) = BridgeMessage::from_post_message("hide-main-window") {
        controller.hide().unwrap();
    }
    assert_eq!(controller.visibility(), Visibility::Hidden);

    assert_eq!(controller.toggle().unwrap(), Visibility::Visible);
    assert!(controller.host().is_visible());
}

// ============================================================================
// Control Protocol
// ============================================================================

/// A scripted session decodes line by line.
#[test]
fn test_protocol_session_decodes() {
    let session = concat!(
        "{\"type\":\"hotkey\",\"accelerator\":\"CommandOrControl+I\"}\n",
        "{\"type\":\"moved\",\"x\":-10,\"y\":5}\n",
        "{\"type\":\"key\",\"key\":\"=\",\"modifier\":true}\n",
        "{\"type\":\"bridge\",\"message\":\"hide-main-window\"}\n",
        "{\"type\":\"query_state\"}\n",
        "{\"type\":\"stop\"}\n",
    );

    let commands: Vec<ShellCommand> = session
        .lines()
        .map(|line| decode_command(line).expect("decode"))
        .collect();

    assert_eq!(commands.len(), 6);
    assert_eq!(commands[1], ShellCommand::Moved { x: -10, y: 5 });
    assert_eq!(commands[5], ShellCommand::Stop);
}

/// Every response is exactly one line, including errors with newlines in
/// the message.
#[test]
fn test_responses_are_single_lines() {
    let responses = vec![
        ShellResponse::Ok,
        ShellResponse::error("line one\nline two"),
        ShellResponse::State {
            visible: false,
            x: -1500,
            y: 300,
            width: 2460,
            height: 1140,
            zoom: 1.3,
        },
    ];

    for response in responses {
        let line = encode_response(&response).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1, "Response not single-line: {:?}", response);
        let parsed: ShellResponse = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed, response);
    }
}
