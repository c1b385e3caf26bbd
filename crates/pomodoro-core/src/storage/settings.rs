//! Timer settings.
//!
//! Stores the interval lengths and long-break cadence:
//! - Work, short-break and long-break durations (minutes)
//! - How many completed work intervals earn a long break
//! - Whether the next interval should start on its own (advisory)
//!
//! Persisted as `settings.json` in the data directory.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// User-facing timer configuration.
///
/// Replaced wholesale on every write. Fields missing from a stored document
/// fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    /// A long break follows every Nth completed work interval.
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    /// Advisory only; the engine never starts an interval by itself.
    #[serde(default = "default_true")]
    pub auto_start_next: bool,
}

// Default functions
fn default_work_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            long_break_interval: default_long_break_interval(),
            auto_start_next: default_true(),
        }
    }
}

impl Settings {
    /// Check that every duration and the long-break interval are positive.
    ///
    /// # Errors
    ///
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = [
            ("work_minutes", self.work_minutes),
            ("short_break_minutes", self.short_break_minutes),
            ("long_break_minutes", self.long_break_minutes),
            ("long_break_interval", self.long_break_interval),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Get a settings value as string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        json.get(key).map(|val| val.to_string())
    }

    /// Set a settings value by key, parsing `value` as the field's type.
    ///
    /// Does not persist and does not validate ranges; callers go through
    /// [`Settings::validate`] before saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ValidationError> {
        let invalid = |message: String| ValidationError::InvalidValue {
            field: key.to_string(),
            message,
        };

        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| ValidationError::UnknownKey(key.to_string()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ValidationError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => value
                .parse::<bool>()
                .map(serde_json::Value::Bool)
                .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            _ => value
                .parse::<u32>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
        };
        obj.insert(key.to_string(), new_value);

        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }
}
