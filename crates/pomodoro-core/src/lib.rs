//! # Pomodoro Core Library
//!
//! This library provides the core logic for a single-user Pomodoro timer:
//! alternating work and break intervals whose progress survives restarts.
//! The `pomodoro-cli` binary is a thin front end over the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a stateless read-compute-write state machine over
//!   persisted session state. Queries advance the session lazily when the
//!   current mode has run out.
//! - **Storage**: repository traits with a JSON-file implementation and an
//!   in-memory one for tests
//! - **Clock**: injectable time source
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`JsonStore`]: Settings and session persistence
//! - [`Settings`]: Interval lengths and long-break cadence
//! - [`SessionState`]: The persisted timer state

pub mod clock;
pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, Result, StorageError, ValidationError};
pub use events::Event;
pub use storage::{JsonStore, MemoryStore, SessionRepository, Settings, SettingsRepository};
pub use timer::{next_state, Mode, SessionState, StoredMode, TimerEngine};
