//! Pure transition rules.
//!
//! Nothing here reads storage or the clock; the engine feeds in the loaded
//! settings and state and persists whatever comes back.

use chrono::{DateTime, Duration, Utc};

use super::mode::{Mode, StoredMode};
use super::state::SessionState;
use crate::error::{CoreError, Result};
use crate::storage::Settings;

/// Configured length of `mode`.
pub fn mode_duration(mode: Mode, settings: &Settings) -> Duration {
    let minutes = match mode {
        Mode::Work => settings.work_minutes,
        Mode::ShortBreak => settings.short_break_minutes,
        Mode::LongBreak => settings.long_break_minutes,
    };
    Duration::minutes(i64::from(minutes))
}

/// Configured length of a stored mode.
///
/// # Errors
///
/// [`CoreError::InvalidMode`] when the mode is unset or unrecognized.
pub fn duration_for(mode: &StoredMode, settings: &Settings) -> Result<Duration> {
    Ok(mode_duration(known_mode(mode)?, settings))
}

/// When the current mode ends, or `None` for a session that never started.
pub fn mode_end(state: &SessionState, settings: &Settings) -> Result<Option<DateTime<Utc>>> {
    let duration = duration_for(&state.mode, settings)?;
    Ok(state
        .current_mode_started_at
        .map(|started| add_saturating(started, duration)))
}

/// The state that follows `state` once its mode has run out.
///
/// The next mode is anchored at the computed end of the current one, not at
/// the time of the call, so the schedule does not drift with polling latency.
pub fn next_state(state: &SessionState, settings: &Settings) -> Result<SessionState> {
    let mode = known_mode(&state.mode)?;
    let mut completed = state.completed_work_sessions;

    let next_mode = match mode {
        Mode::Work => {
            completed = completed.saturating_add(1);
            if is_long_break_due(completed, settings.long_break_interval) {
                Mode::LongBreak
            } else {
                Mode::ShortBreak
            }
        }
        Mode::ShortBreak | Mode::LongBreak => Mode::Work,
    };

    let duration = mode_duration(mode, settings);
    Ok(SessionState {
        mode: next_mode.into(),
        current_mode_started_at: state
            .current_mode_started_at
            .map(|started| add_saturating(started, duration)),
        session_started_at: state.session_started_at,
        paused: false,
        completed_work_sessions: completed,
    })
}

/// An interval of zero never earns a long break.
fn is_long_break_due(completed: u32, interval: u32) -> bool {
    completed.checked_rem(interval) == Some(0)
}

fn known_mode(mode: &StoredMode) -> Result<Mode> {
    mode.known()
        .ok_or_else(|| CoreError::InvalidMode(mode.as_str().to_string()))
}

fn add_saturating(at: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    at.checked_add_signed(duration)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
