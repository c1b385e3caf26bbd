mod engine;
mod mode;
mod state;
mod transition;

pub use engine::TimerEngine;
pub use mode::{Mode, StoredMode};
pub use state::SessionState;
pub use transition::{duration_for, mode_duration, mode_end, next_state};
