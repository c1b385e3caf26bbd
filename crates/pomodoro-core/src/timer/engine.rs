//! Timer engine implementation.
//!
//! The engine holds no timer state of its own. Every operation loads the
//! current settings and session state from the injected repositories,
//! computes, and writes the result back. State therefore survives restarts
//! and picks up edits made by other processes between calls.
//!
//! ## State Transitions
//!
//! ```text
//! (unset) -> Work -> ShortBreak -> Work -> ... -> LongBreak -> Work -> ...
//! ```
//!
//! Transitions are lazy: any query first checks whether the current mode has
//! run out and, if so, moves exactly one step forward. A session left alone
//! for hours is therefore one mode further along on the next query, not
//! caught up to wall-clock time.
//!
//! ## Usage
//!
//! ```ignore
//! let store = JsonStore::open()?;
//! let engine = TimerEngine::new(store.clone(), store);
//! engine.start_session()?;
//! // Later, from any process:
//! let left = engine.remaining_time()?;
//! ```

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use super::state::SessionState;
use super::transition::{duration_for, mode_duration, mode_end, next_state};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::events::Event;
use crate::storage::{SessionRepository, Settings, SettingsRepository};

/// Core timer engine.
///
/// Read-modify-write sequences are serialized by an internal mutex, so one
/// engine can be shared between threads of a single process. Nothing guards
/// against a second process writing the same files.
pub struct TimerEngine<S, R, C = SystemClock> {
    settings: S,
    sessions: R,
    clock: C,
    lock: Mutex<()>,
}

impl<S, R> TimerEngine<S, R, SystemClock>
where
    S: SettingsRepository,
    R: SessionRepository,
{
    /// Create an engine reading the wall clock.
    pub fn new(settings: S, sessions: R) -> Self {
        Self::with_clock(settings, sessions, SystemClock)
    }
}

impl<S, R, C> TimerEngine<S, R, C>
where
    S: SettingsRepository,
    R: SessionRepository,
    C: Clock,
{
    pub fn with_clock(settings: S, sessions: R, clock: C) -> Self {
        Self {
            settings,
            sessions,
            clock,
            lock: Mutex::new(()),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Current settings, writing defaults on first run.
    pub fn settings(&self) -> Result<Settings> {
        self.settings.load_settings()
    }

    /// Stored session state as-is. Does not advance.
    pub fn session_state(&self) -> Result<SessionState> {
        self.sessions.load_session()
    }

    /// Whether a session document has ever been written.
    pub fn session_exists(&self) -> Result<bool> {
        self.sessions.session_exists()
    }

    /// The state the session would move to when its current mode runs out.
    /// Nothing is persisted.
    pub fn next_state_preview(&self) -> Result<SessionState> {
        let state = self.sessions.load_session()?;
        let settings = self.settings.load_settings()?;
        next_state(&state, &settings)
    }

    /// Time spent in the current mode, after advancing if due.
    pub fn elapsed_time(&self) -> Result<Duration> {
        let _guard = self.guard();
        let now = self.clock.now();
        self.advance_locked(now)?;

        let state = self.sessions.load_session()?;
        Ok(since(state.current_mode_started_at, now))
    }

    /// Time left in the current mode, after advancing if due.
    ///
    /// Zero for a session that never started.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidMode`](crate::CoreError::InvalidMode) when a started
    /// session carries an unset or unrecognized mode.
    pub fn remaining_time(&self) -> Result<Duration> {
        let _guard = self.guard();
        let now = self.clock.now();
        self.advance_locked(now)?;

        let state = self.sessions.load_session()?;
        if !state.is_started() {
            return Ok(Duration::zero());
        }
        let settings = self.settings.load_settings()?;
        let total = duration_for(&state.mode, &settings)?;
        let remaining = total - since(state.current_mode_started_at, now);
        Ok(remaining.max(Duration::zero()))
    }

    /// Time since the whole session started, after advancing if due.
    pub fn session_elapsed(&self) -> Result<Duration> {
        let _guard = self.guard();
        let now = self.clock.now();
        self.advance_locked(now)?;

        let state = self.sessions.load_session()?;
        Ok(since(state.session_started_at, now))
    }

    /// Build a full state snapshot event, after advancing if due.
    pub fn snapshot(&self) -> Result<Event> {
        self.status().map(|(snapshot, _)| snapshot)
    }

    /// Advance if due, then snapshot, as one step under one lock.
    ///
    /// Returns the snapshot and the `ModeCompleted` event when this call
    /// moved the session on. The snapshot always describes the state that
    /// event led to.
    pub fn status(&self) -> Result<(Event, Option<Event>)> {
        let _guard = self.guard();
        let now = self.clock.now();
        let completed = self.advance_locked(now)?;
        Ok((self.snapshot_locked(now)?, completed))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the settings after validating them.
    pub fn update_settings(&self, settings: Settings) -> Result<()> {
        settings.validate()?;
        let _guard = self.guard();
        self.settings.save_settings(&settings)?;
        tracing::info!(?settings, "settings updated");
        Ok(())
    }

    /// Start a fresh session in work mode, discarding any previous one.
    pub fn start_session(&self) -> Result<Event> {
        let _guard = self.guard();
        let now = self.clock.now();
        let settings = self.settings.load_settings()?;

        self.sessions.save_session(&SessionState::started_at(now))?;
        tracing::info!(at = %now, "session started");
        Ok(Event::SessionStarted {
            work_minutes: settings.work_minutes,
            at: now,
        })
    }

    /// Mark the session paused.
    ///
    /// Only the flag changes: the countdown anchor is left alone, so a
    /// paused mode still runs out on schedule.
    pub fn pause_session(&self) -> Result<Event> {
        let _guard = self.guard();
        let now = self.clock.now();
        let mut state = self.sessions.load_session()?;

        state.paused = true;
        self.sessions.save_session(&state)?;
        tracing::info!(mode = state.mode.as_str(), "session paused");
        Ok(Event::SessionPaused {
            mode: state.mode.known(),
            at: now,
        })
    }

    /// Clear the pause flag and restart the current mode's countdown from now.
    ///
    /// Time spent before the pause is forfeited: the mode gets a full
    /// interval again. A session that was never started is left untouched.
    pub fn resume_session(&self) -> Result<Event> {
        let _guard = self.guard();
        let now = self.clock.now();
        let mut state = self.sessions.load_session()?;

        if !state.is_started() {
            tracing::debug!("resume on a session that never started, nothing to do");
            return Ok(Event::SessionResumed {
                mode: None,
                remaining_ms: 0,
                at: now,
            });
        }

        state.paused = false;
        state.current_mode_started_at = Some(now);
        self.sessions.save_session(&state)?;

        let remaining = match state.mode.known() {
            Some(mode) => mode_duration(mode, &self.settings.load_settings()?),
            None => Duration::zero(),
        };
        tracing::info!(mode = state.mode.as_str(), "session resumed");
        Ok(Event::SessionResumed {
            mode: state.mode.known(),
            remaining_ms: to_ms(remaining),
            at: now,
        })
    }

    /// Clear the session back to the zero value.
    pub fn reset_session(&self) -> Result<Event> {
        let _guard = self.guard();
        let now = self.clock.now();
        self.sessions.save_session(&SessionState::default())?;
        tracing::info!("session reset");
        Ok(Event::SessionReset { at: now })
    }

    /// Move to the next mode if the current one has run out.
    ///
    /// Returns `Some(Event::ModeCompleted)` when a transition was persisted.
    /// Every query runs this first; calling it directly is only needed to
    /// observe the event.
    pub fn advance_if_due(&self) -> Result<Option<Event>> {
        let _guard = self.guard();
        self.advance_locked(self.clock.now())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The mutex guards no data, so a poisoned lock is still usable.
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn snapshot_locked(&self, now: DateTime<Utc>) -> Result<Event> {
        let state = self.sessions.load_session()?;
        let (elapsed, total) = if state.is_started() {
            let settings = self.settings.load_settings()?;
            (
                since(state.current_mode_started_at, now),
                duration_for(&state.mode, &settings)?,
            )
        } else {
            (Duration::zero(), Duration::zero())
        };

        Ok(Event::StateSnapshot {
            started: state.is_started(),
            mode: state.mode.known(),
            paused: state.paused,
            completed_work_sessions: state.completed_work_sessions,
            elapsed_ms: to_ms(elapsed),
            remaining_ms: to_ms(total - elapsed),
            total_ms: to_ms(total),
            at: now,
        })
    }

    fn advance_locked(&self, now: DateTime<Utc>) -> Result<Option<Event>> {
        let state = self.sessions.load_session()?;
        if !state.is_started() {
            return Ok(None);
        }
        let Some(from) = state.mode.known() else {
            tracing::warn!(mode = state.mode.as_str(), "unrecognized mode, not advancing");
            return Ok(None);
        };

        let settings = self.settings.load_settings()?;
        match mode_end(&state, &settings)? {
            Some(end) if now >= end => {}
            _ => return Ok(None),
        }

        let next = next_state(&state, &settings)?;
        self.sessions.save_session(&next)?;

        let Some(to) = next.mode.known() else {
            return Ok(None);
        };
        tracing::info!(
            from = %from,
            to = %to,
            completed = next.completed_work_sessions,
            "mode completed"
        );
        Ok(Some(Event::ModeCompleted {
            from,
            to,
            completed_work_sessions: next.completed_work_sessions,
            next_started_at: next.current_mode_started_at,
            at: now,
        }))
    }
}

/// `now - anchor`, zero when there is no anchor or it lies in the future.
fn since(anchor: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
    anchor
        .map(|at| now.signed_duration_since(at))
        .unwrap_or_else(Duration::zero)
        .max(Duration::zero())
}

fn to_ms(d: Duration) -> u64 {
    u64::try_from(d.num_milliseconds()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::{CoreError, StorageError};
    use crate::storage::MemoryStore;
    use crate::timer::{Mode, StoredMode};
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::sync::Arc;

    type TestEngine = TimerEngine<Arc<MemoryStore>, Arc<MemoryStore>, Arc<ManualClock>>;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn engine_with(settings: Settings) -> (TestEngine, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::with_settings(settings));
        let clock = Arc::new(ManualClock::new(t0()));
        let engine = TimerEngine::with_clock(store.clone(), store.clone(), clock.clone());
        (engine, store, clock)
    }

    fn engine() -> (TestEngine, Arc<MemoryStore>, Arc<ManualClock>) {
        engine_with(Settings::default())
    }

    #[test]
    fn start_resets_cleanly() {
        let (engine, store, _clock) = engine();
        store
            .save_session(&SessionState {
                mode: Mode::LongBreak.into(),
                paused: true,
                completed_work_sessions: 7,
                ..SessionState::started_at(t0() - Duration::hours(3))
            })
            .unwrap();

        let event = engine.start_session().unwrap();
        assert!(matches!(event, Event::SessionStarted { work_minutes: 25, .. }));

        let state = engine.session_state().unwrap();
        assert_eq!(state.mode, StoredMode::Set(Mode::Work));
        assert_eq!(state.completed_work_sessions, 0);
        assert!(!state.paused);
        assert_eq!(state.current_mode_started_at, Some(t0()));
        assert_eq!(state.current_mode_started_at, state.session_started_at);
    }

    #[test]
    fn overdue_work_advances_to_short_break() {
        let (engine, _store, clock) = engine();
        engine.start_session().unwrap();
        clock.advance(Duration::minutes(26));

        assert_eq!(engine.remaining_time().unwrap(), Duration::minutes(4));
        let state = engine.session_state().unwrap();
        assert_eq!(state.mode, StoredMode::Set(Mode::ShortBreak));
        assert_eq!(state.completed_work_sessions, 1);
        assert_eq!(state.current_mode_started_at, Some(t0() + Duration::minutes(25)));
        assert_eq!(state.session_started_at, Some(t0()));
    }

    #[test]
    fn transition_fires_exactly_at_mode_end() {
        let (engine, _store, clock) = engine();
        engine.start_session().unwrap();

        clock.advance(Duration::minutes(25) - Duration::milliseconds(1));
        assert_eq!(engine.advance_if_due().unwrap(), None);

        clock.advance(Duration::milliseconds(1));
        let event = engine.advance_if_due().unwrap();
        assert!(matches!(
            event,
            Some(Event::ModeCompleted {
                from: Mode::Work,
                to: Mode::ShortBreak,
                completed_work_sessions: 1,
                ..
            })
        ));
        assert_eq!(engine.elapsed_time().unwrap(), Duration::zero());
    }

    #[test]
    fn elapsed_plus_remaining_is_mode_duration() {
        let (engine, _store, clock) = engine();
        engine.start_session().unwrap();
        clock.advance(Duration::seconds(617));

        let elapsed = engine.elapsed_time().unwrap();
        let remaining = engine.remaining_time().unwrap();
        assert_eq!(elapsed, Duration::seconds(617));
        assert_eq!(elapsed + remaining, Duration::minutes(25));
    }

    #[test]
    fn pause_keeps_countdown_running() {
        let (engine, _store, clock) = engine();
        engine.start_session().unwrap();
        clock.advance(Duration::minutes(10));

        engine.pause_session().unwrap();
        engine.pause_session().unwrap();
        let state = engine.session_state().unwrap();
        assert!(state.paused);
        assert_eq!(state.current_mode_started_at, Some(t0()));

        clock.advance(Duration::minutes(5));
        assert_eq!(engine.remaining_time().unwrap(), Duration::minutes(10));
    }

    #[test]
    fn resume_grants_a_full_interval() {
        let (engine, _store, clock) = engine();
        engine.start_session().unwrap();
        clock.advance(Duration::minutes(20));
        engine.pause_session().unwrap();
        clock.advance(Duration::minutes(3));

        let event = engine.resume_session().unwrap();
        assert!(matches!(
            event,
            Event::SessionResumed {
                mode: Some(Mode::Work),
                remaining_ms: 1_500_000,
                ..
            }
        ));

        let state = engine.session_state().unwrap();
        assert!(!state.paused);
        assert_eq!(state.current_mode_started_at, Some(clock.now()));
        assert_eq!(state.session_started_at, Some(t0()));
        assert_eq!(engine.remaining_time().unwrap(), Duration::minutes(25));
    }

    #[test]
    fn resume_before_start_does_nothing() {
        let (engine, store, _clock) = engine();
        engine.resume_session().unwrap();
        assert!(store.stored_session().is_none());
    }

    #[test]
    fn resume_without_anchor_does_nothing() {
        let (engine, store, _clock) = engine();
        let unanchored = SessionState {
            mode: Mode::Work.into(),
            paused: true,
            ..SessionState::default()
        };
        store.save_session(&unanchored).unwrap();

        let event = engine.resume_session().unwrap();
        assert!(matches!(event, Event::SessionResumed { mode: None, .. }));
        assert_eq!(store.stored_session(), Some(unanchored));
    }

    #[test]
    fn resume_with_empty_mode_reanchors() {
        let (engine, store, clock) = engine();
        store
            .save_session(&SessionState {
                mode: StoredMode::Unset,
                paused: true,
                ..SessionState::started_at(t0())
            })
            .unwrap();
        clock.advance(Duration::minutes(7));

        engine.resume_session().unwrap();
        let state = engine.session_state().unwrap();
        assert!(!state.paused);
        assert_eq!(state.current_mode_started_at, Some(clock.now()));
    }

    #[test]
    fn status_on_long_overdue_session_moves_one_step() {
        let (engine, _store, clock) = engine();
        engine.start_session().unwrap();
        clock.advance(Duration::days(6 * 365));

        let (snapshot, completed) = engine.status().unwrap();
        assert!(matches!(
            completed,
            Some(Event::ModeCompleted {
                from: Mode::Work,
                to: Mode::ShortBreak,
                completed_work_sessions: 1,
                ..
            })
        ));
        assert!(matches!(
            snapshot,
            Event::StateSnapshot {
                mode: Some(Mode::ShortBreak),
                completed_work_sessions: 1,
                remaining_ms: 0,
                ..
            }
        ));

        let state = engine.session_state().unwrap();
        assert_eq!(state.mode, StoredMode::Set(Mode::ShortBreak));
        assert_eq!(state.current_mode_started_at, Some(t0() + Duration::minutes(25)));
    }

    #[test]
    fn status_reports_no_event_when_not_due() {
        let (engine, _store, clock) = engine();
        engine.start_session().unwrap();
        clock.advance(Duration::minutes(3));
        let (_snapshot, completed) = engine.status().unwrap();
        assert_eq!(completed, None);
    }

    #[test]
    fn zero_state_queries_are_zero() {
        let (engine, _store, _clock) = engine();
        engine.reset_session().unwrap();
        let first = engine.session_state().unwrap();
        engine.reset_session().unwrap();
        let second = engine.session_state().unwrap();

        assert_eq!(first, SessionState::default());
        assert_eq!(first, second);
        assert_eq!(engine.elapsed_time().unwrap(), Duration::zero());
        assert_eq!(engine.remaining_time().unwrap(), Duration::zero());
        assert_eq!(engine.session_elapsed().unwrap(), Duration::zero());
    }

    #[test]
    fn invalid_mode_is_rejected() {
        let (engine, store, _clock) = engine();
        store
            .save_session(&SessionState {
                mode: StoredMode::Unrecognized("siesta".into()),
                ..SessionState::started_at(t0())
            })
            .unwrap();

        assert!(matches!(
            engine.remaining_time(),
            Err(CoreError::InvalidMode(raw)) if raw == "siesta"
        ));
        assert!(matches!(
            engine.next_state_preview(),
            Err(CoreError::InvalidMode(_))
        ));
        assert!(matches!(engine.snapshot(), Err(CoreError::InvalidMode(_))));
    }

    #[test]
    fn preview_does_not_persist() {
        let (engine, _store, _clock) = engine();
        engine.start_session().unwrap();
        let preview = engine.next_state_preview().unwrap();
        assert_eq!(preview.mode, StoredMode::Set(Mode::ShortBreak));
        assert_eq!(
            engine.session_state().unwrap().mode,
            StoredMode::Set(Mode::Work)
        );
    }

    #[test]
    fn reset_propagates_storage_failure() {
        let (engine, store, _clock) = engine();
        store.set_failing(true);
        assert!(matches!(
            engine.reset_session(),
            Err(CoreError::Storage(StorageError::Unavailable(_)))
        ));
    }

    #[test]
    fn update_settings_validates() {
        let (engine, store, _clock) = engine();
        let bad = Settings {
            work_minutes: 0,
            ..Settings::default()
        };
        assert!(matches!(
            engine.update_settings(bad),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(store.stored_settings(), Some(Settings::default()));

        let good = Settings {
            work_minutes: 50,
            ..Settings::default()
        };
        engine.update_settings(good.clone()).unwrap();
        assert_eq!(engine.settings().unwrap(), good);
    }

    #[test]
    fn snapshot_reports_progress() {
        let (engine, _store, clock) = engine();
        engine.start_session().unwrap();
        clock.advance(Duration::minutes(5));

        match engine.snapshot().unwrap() {
            Event::StateSnapshot {
                started,
                mode,
                elapsed_ms,
                remaining_ms,
                total_ms,
                ..
            } => {
                assert!(started);
                assert_eq!(mode, Some(Mode::Work));
                assert_eq!(elapsed_ms, 5 * 60 * 1000);
                assert_eq!(remaining_ms, 20 * 60 * 1000);
                assert_eq!(total_ms, 25 * 60 * 1000);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        let (engine, _store, clock) = engine();
        let engine = Arc::new(engine);
        engine.start_session().unwrap();
        clock.advance(Duration::minutes(27));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || engine.remaining_time().unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // One overdue work interval yields exactly one completed session.
        let state = engine.session_state().unwrap();
        assert_eq!(state.completed_work_sessions, 1);
        assert_eq!(state.mode, StoredMode::Set(Mode::ShortBreak));
    }

    proptest! {
        #[test]
        fn one_query_advances_one_step(overdue_min in 25i64..10_000, query in 0usize..5) {
            let (engine, _store, clock) = engine();
            engine.start_session().unwrap();
            clock.advance(Duration::minutes(overdue_min));

            match query {
                0 => {
                    engine.elapsed_time().unwrap();
                }
                1 => {
                    engine.remaining_time().unwrap();
                }
                2 => {
                    engine.session_elapsed().unwrap();
                }
                3 => {
                    engine.snapshot().unwrap();
                }
                _ => {
                    engine.status().unwrap();
                }
            }
            let state = engine.session_state().unwrap();
            prop_assert_eq!(state.mode, StoredMode::Set(Mode::ShortBreak));
            prop_assert_eq!(state.completed_work_sessions, 1);
            prop_assert_eq!(state.current_mode_started_at, Some(t0() + Duration::minutes(25)));
        }

        #[test]
        fn remaining_never_negative(offset_s in -600i64..100_000) {
            let (engine, _store, clock) = engine();
            engine.start_session().unwrap();
            clock.advance(Duration::seconds(offset_s));
            prop_assert!(engine.remaining_time().unwrap() >= Duration::zero());
            prop_assert!(engine.elapsed_time().unwrap() >= Duration::zero());
        }
    }
}
