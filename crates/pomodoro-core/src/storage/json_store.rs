//! JSON-file persistence.
//!
//! Two independent documents live side by side in the data directory:
//! `settings.json` and `session_states.json`. Either may be edited by hand
//! or by another process between calls, so nothing is cached here.
//!
//! Writes go to a temp file in the same directory and are renamed over the
//! target, so readers never see a half-written document. The directory is
//! recreated on write if it has gone missing.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use super::{data_dir, SessionRepository, Settings, SettingsRepository};
use crate::error::{Result, StorageError};
use crate::timer::SessionState;

pub const SETTINGS_FILE: &str = "settings.json";
pub const SESSION_FILE: &str = "session_states.json";

/// File-backed store for settings and session state.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Open the store in the default data directory.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be resolved or created.
    pub fn open() -> Result<Self> {
        Ok(Self { dir: data_dir()? })
    }

    /// Open the store in `dir`, creating it if needed.
    pub fn at(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    /// `Ok(None)` when the file is missing or empty.
    fn read_document<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(path, e).into()),
        };

        if content.trim().is_empty() {
            tracing::warn!(path = %path.display(), "empty document, treating as missing");
            return Ok(None);
        }

        let value = serde_json::from_str(&content).map_err(|source| StorageError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(value))
    }

    fn write_document<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let content = serde_json::to_vec_pretty(value).map_err(StorageError::from)?;

        std::fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;
        tmp.write_all(&content)
            .map_err(|e| StorageError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StorageError::io(tmp.path(), e))?;
        tmp.persist(path)
            .map_err(|e| StorageError::io(path, e.error))?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "document written");
        Ok(())
    }
}

impl SettingsRepository for JsonStore {
    fn load_settings(&self) -> Result<Settings> {
        let path = self.settings_path();
        match self.read_document(&path)? {
            Some(settings) => Ok(settings),
            None => {
                tracing::info!(path = %path.display(), "no settings yet, writing defaults");
                let settings = Settings::default();
                self.save_settings(&settings)?;
                Ok(settings)
            }
        }
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.write_document(&self.settings_path(), settings)
    }
}

impl SessionRepository for JsonStore {
    fn load_session(&self) -> Result<SessionState> {
        Ok(self
            .read_document(&self.session_path())?
            .unwrap_or_default())
    }

    fn save_session(&self, state: &SessionState) -> Result<()> {
        self.write_document(&self.session_path(), state)
    }

    fn session_exists(&self) -> Result<bool> {
        let path = self.session_path();
        match std::fs::metadata(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(path, e).into()),
        }
    }
}
