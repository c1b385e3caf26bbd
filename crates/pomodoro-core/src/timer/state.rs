use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::mode::{Mode, StoredMode};

/// Persisted timer state.
///
/// The zero value (`SessionState::default()`) means "never started" and is
/// what a reset writes back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub mode: StoredMode,
    /// When the current mode began. Countdown math is anchored here.
    #[serde(
        rename = "current_session_started_at",
        default,
        deserialize_with = "zero_time_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_mode_started_at: Option<DateTime<Utc>>,
    /// When the whole session began. Fixed for the session's lifetime.
    #[serde(
        rename = "started_at",
        default,
        deserialize_with = "zero_time_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub session_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub paused: bool,
    /// Incremented only when a work interval completes.
    #[serde(rename = "session_count", default)]
    pub completed_work_sessions: u32,
}

impl SessionState {
    /// A fresh session in work mode, both anchors at `now`.
    pub fn started_at(now: DateTime<Utc>) -> Self {
        Self {
            mode: StoredMode::Set(Mode::Work),
            current_mode_started_at: Some(now),
            session_started_at: Some(now),
            paused: false,
            completed_work_sessions: 0,
        }
    }

    pub fn is_started(&self) -> bool {
        self.current_mode_started_at.is_some()
    }
}

/// Older files carry `0001-01-01T00:00:00Z` for "no timestamp".
fn zero_time_as_none<'de, D>(de: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<DateTime<Utc>>::deserialize(de)?;
    Ok(value.filter(|t| t.year() > 1))
}
