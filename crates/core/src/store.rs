//! On-disk settings store for the window origin.
//!
//! The store is a single pretty-printed JSON object at
//! `<config-home>/chat-drop/settings.json`. Only `x` and `y` are interpreted;
//! any other keys are carried through writes untouched.

use crate::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Directory name used under the platform config root.
pub const APP_NAME: &str = "chat-drop";

/// File name of the settings record inside the store directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Errors raised by the settings store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Settings directory {path} cannot be created: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Settings file {path} is malformed: {source}")]
    CorruptSettings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read settings file {path}: {source}")]
    StorageReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write settings file {path}: {source}")]
    StorageWriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The persisted settings record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsRecord {
    /// Last known window x origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    /// Last known window y origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    /// Keys this application does not interpret, preserved on rewrite.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SettingsRecord {
    /// The stored origin, if both coordinates are present.
    pub fn origin(&self) -> Option<Point> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        }
    }

    /// Overwrite the supplied coordinates, leaving everything else alone.
    pub fn merge(&mut self, update: OriginUpdate) {
        if let Some(x) = update.x {
            self.x = Some(x);
        }
        if let Some(y) = update.y {
            self.y = Some(y);
        }
    }
}

/// A partial origin write. Absent coordinates are left as they are on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OriginUpdate {
    pub x: Option<i32>,
    pub y: Option<i32>,
}

impl From<Point> for OriginUpdate {
    fn from(point: Point) -> Self {
        Self {
            x: Some(point.x),
            y: Some(point.y),
        }
    }
}

/// Reads and writes the settings record.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
    path: PathBuf,
}

impl SettingsStore {
    /// Store rooted at `dir`; the record lives at `dir/settings.json`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let path = dir.join(SETTINGS_FILE);
        Self { dir, path }
    }

    /// The store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the store directory and any missing parents. No-op if present.
    pub fn ensure_store_directory(&self) -> Result<(), StoreError> {
        if self.dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::StorageUnavailable {
            path: self.dir.clone(),
            source,
        })?;
        debug!("Created settings directory {}", self.dir.display());
        Ok(())
    }

    /// Read the record. `Ok(None)` when the file does not exist.
    pub fn read_record(&self) -> Result<Option<SettingsRecord>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::StorageReadError {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::CorruptSettings {
                path: self.path.clone(),
                source,
            })
    }

    /// Merge `update` into the stored record, creating it if needed, and
    /// rewrite the whole file. Returns the record as written.
    ///
    /// A corrupt or unreadable existing file is replaced by a record built
    /// from `update` alone.
    pub fn write_record(&self, update: OriginUpdate) -> Result<SettingsRecord, StoreError> {
        let mut record = match self.read_record() {
            Ok(Some(record)) => record,
            Ok(None) => SettingsRecord::default(),
            Err(e) => {
                warn!("Replacing unusable settings: {}", e);
                SettingsRecord::default()
            }
        };
        record.merge(update);

        self.write_atomically(&record)
            .map_err(|source| StoreError::StorageWriteError {
                path: self.path.clone(),
                source,
            })?;
        debug!("Settings written to {}", self.path.display());
        Ok(record)
    }

    /// Write through a temp file and rename, so a reader never sees a
    /// half-written record.
    fn write_atomically(&self, record: &SettingsRecord) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)
    }
}

/// `<config-home>/chat-drop`, where `<config-home>` honors `XDG_CONFIG_HOME`
/// on Linux and maps to the platform config root elsewhere.
pub fn default_store_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join(APP_NAME))
}
