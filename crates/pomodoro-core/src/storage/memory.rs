//! In-memory store, for tests and embedding.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{SessionRepository, Settings, SettingsRepository};
use crate::error::{Result, StorageError};
use crate::timer::SessionState;

/// Holds both documents in memory with the same first-run semantics as
/// [`super::JsonStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<Option<Settings>>,
    session: Mutex<Option<SessionState>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
            ..Self::default()
        }
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Stored settings without first-run defaulting.
    pub fn stored_settings(&self) -> Option<Settings> {
        self.settings.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Stored session without zero-value defaulting.
    pub fn stored_session(&self) -> Option<SessionState> {
        self.session.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store is set to fail".into()).into());
        }
        Ok(())
    }
}

impl SettingsRepository for MemoryStore {
    fn load_settings(&self) -> Result<Settings> {
        self.check()?;
        let mut slot = self.settings.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slot.get_or_insert_with(Settings::default).clone())
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.check()?;
        *self.settings.lock().unwrap_or_else(|e| e.into_inner()) = Some(settings.clone());
        Ok(())
    }
}

impl SessionRepository for MemoryStore {
    fn load_session(&self) -> Result<SessionState> {
        self.check()?;
        Ok(self.stored_session().unwrap_or_default())
    }

    fn save_session(&self, state: &SessionState) -> Result<()> {
        self.check()?;
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = Some(state.clone());
        Ok(())
    }

    fn session_exists(&self) -> Result<bool> {
        self.check()?;
        Ok(self.stored_session().is_some())
    }
}
