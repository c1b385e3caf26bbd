mod json_store;
mod memory;
mod settings;

pub use json_store::{JsonStore, SESSION_FILE, SETTINGS_FILE};
pub use memory::MemoryStore;
pub use settings::Settings;

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Result, StorageError};
use crate::timer::SessionState;

/// Overrides the data directory entirely.
pub const HOME_ENV: &str = "POMODORO_TIMER_HOME";
/// `dev` selects a separate development data directory.
pub const ENV_ENV: &str = "POMODORO_TIMER_ENV";

/// Persistence for [`Settings`].
pub trait SettingsRepository: Send + Sync {
    /// Stored settings; on first run the defaults are written and returned.
    fn load_settings(&self) -> Result<Settings>;

    fn save_settings(&self, settings: &Settings) -> Result<()>;
}

/// Persistence for [`SessionState`].
pub trait SessionRepository: Send + Sync {
    /// Stored state, or the zero value when nothing was ever saved.
    ///
    /// Unlike settings, the zero value is not written back.
    fn load_session(&self) -> Result<SessionState>;

    fn save_session(&self, state: &SessionState) -> Result<()>;

    fn session_exists(&self) -> Result<bool>;
}

impl<T: SettingsRepository + ?Sized> SettingsRepository for Arc<T> {
    fn load_settings(&self) -> Result<Settings> {
        (**self).load_settings()
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        (**self).save_settings(settings)
    }
}

impl<T: SessionRepository + ?Sized> SessionRepository for Arc<T> {
    fn load_session(&self) -> Result<SessionState> {
        (**self).load_session()
    }

    fn save_session(&self, state: &SessionState) -> Result<()> {
        (**self).save_session(state)
    }

    fn session_exists(&self) -> Result<bool> {
        (**self).session_exists()
    }
}

/// Returns the application data directory, creating it if needed.
///
/// `<config dir>/pomodoro-timer[-dev]/`, where the config dir is the roaming
/// AppData folder on Windows, `~/Library/Application Support` on macOS and
/// `~/.config` elsewhere. Set POMODORO_TIMER_ENV=dev to use the development
/// directory, or POMODORO_TIMER_HOME to point somewhere else entirely.
///
/// # Errors
/// Returns an error if no config directory exists for this platform or if
/// creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os(HOME_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base = dirs::config_dir().ok_or_else(|| {
                StorageError::DataDir("no configuration directory on this platform".into())
            })?;
            let env = std::env::var(ENV_ENV).unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base.join("pomodoro-timer-dev")
            } else {
                base.join("pomodoro-timer")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
    Ok(dir)
}
