pub mod config;
pub mod timer;

use chrono::Duration;
use pomodoro_core::{JsonStore, TimerEngine};
use serde::Serialize;

pub type Engine = TimerEngine<JsonStore, JsonStore>;

/// Engine over the JSON store in the data directory.
pub fn open_engine() -> Result<Engine, Box<dyn std::error::Error>> {
    let store = JsonStore::open()?;
    tracing::debug!(dir = %store.dir().display(), "opened store");
    Ok(TimerEngine::new(store.clone(), store))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A duration as printed by `timer elapsed` and `timer remaining`.
#[derive(Debug, Serialize)]
pub struct DurationOutput {
    pub ms: u64,
    /// `MM:SS`, or `H:MM:SS` past an hour.
    pub display: String,
}

impl From<Duration> for DurationOutput {
    fn from(d: Duration) -> Self {
        let ms = u64::try_from(d.num_milliseconds()).unwrap_or(0);
        let secs = ms / 1000;
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        let display = if h > 0 {
            format!("{h}:{m:02}:{s:02}")
        } else {
            format!("{m:02}:{s:02}")
        };
        Self { ms, display }
    }
}
