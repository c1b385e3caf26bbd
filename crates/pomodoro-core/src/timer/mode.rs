use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Work,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Work => "work",
            Mode::ShortBreak => "short_break",
            Mode::LongBreak => "long_break",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The mode slot as persisted.
///
/// The session file is plain JSON that another process may edit, so a value
/// outside the known modes is kept as-is instead of failing the whole read.
/// The engine rejects it when it needs a duration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StoredMode {
    /// Never started, or reset. Stored as `""`.
    #[default]
    Unset,
    Set(Mode),
    Unrecognized(String),
}

impl StoredMode {
    /// The known mode, or `None` when unset or unrecognized.
    pub fn known(&self) -> Option<Mode> {
        match self {
            StoredMode::Set(mode) => Some(*mode),
            _ => None,
        }
    }

    /// The raw string as it appears on disk.
    pub fn as_str(&self) -> &str {
        match self {
            StoredMode::Unset => "",
            StoredMode::Set(mode) => mode.as_str(),
            StoredMode::Unrecognized(raw) => raw,
        }
    }
}

impl From<Mode> for StoredMode {
    fn from(mode: Mode) -> Self {
        StoredMode::Set(mode)
    }
}

impl From<String> for StoredMode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "" => StoredMode::Unset,
            "work" => StoredMode::Set(Mode::Work),
            "short_break" => StoredMode::Set(Mode::ShortBreak),
            "long_break" => StoredMode::Set(Mode::LongBreak),
            _ => StoredMode::Unrecognized(raw),
        }
    }
}

impl From<StoredMode> for String {
    fn from(mode: StoredMode) -> Self {
        match mode {
            StoredMode::Unrecognized(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes() {
        assert_eq!(StoredMode::from("work".to_string()), StoredMode::Set(Mode::Work));
        assert_eq!(
            StoredMode::from("long_break".to_string()),
            StoredMode::Set(Mode::LongBreak)
        );
        assert_eq!(StoredMode::from(String::new()), StoredMode::Unset);
    }

    #[test]
    fn keeps_unrecognized_value() {
        let mode: StoredMode = serde_json::from_str(r#""nap""#).unwrap();
        assert_eq!(mode, StoredMode::Unrecognized("nap".into()));
        assert_eq!(mode.known(), None);
        assert_eq!(serde_json::to_string(&mode).unwrap(), r#""nap""#);
    }

    #[test]
    fn unset_serializes_as_empty_string() {
        assert_eq!(serde_json::to_string(&StoredMode::Unset).unwrap(), r#""""#);
        assert_eq!(
            serde_json::to_string(&StoredMode::from(Mode::ShortBreak)).unwrap(),
            r#""short_break""#
        );
    }
}
