//! Events returned by engine commands and queries.
//!
//! Serialized with a `type` tag so the CLI can print them as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Mode;

/// Every state change in the engine produces an Event.
/// Front ends print or react to them; nothing is queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        work_minutes: u32,
        at: DateTime<Utc>,
    },
    SessionPaused {
        mode: Option<Mode>,
        at: DateTime<Utc>,
    },
    SessionResumed {
        mode: Option<Mode>,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// A mode ran out and the session moved on to the next one.
    ModeCompleted {
        from: Mode,
        to: Mode,
        completed_work_sessions: u32,
        /// Scheduled start of `to`; earlier than `at` when the query came late.
        next_started_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
    /// Full state snapshot.
    StateSnapshot {
        started: bool,
        mode: Option<Mode>,
        paused: bool,
        completed_work_sessions: u32,
        elapsed_ms: u64,
        remaining_ms: u64,
        total_ms: u64,
        at: DateTime<Utc>,
    },
}
