//! Persistence policy for the setting store.

use std::fmt;
use std::str::FromStr;

/// Controls when a [`crate::SettingStore`] writes its mapping to disk.
///
/// The mode is fixed by `initialize`; re-initializing is the only way to
/// change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WriteMode {
    /// Rewrite the whole backing file after every successful `set`.
    #[default]
    OnChange,
    /// Only write when `write_settings` is called explicitly.
    Deferred,
}

impl WriteMode {
    /// Returns `true` when every mutation must be persisted immediately.
    pub fn writes_on_change(self) -> bool {
        matches!(self, WriteMode::OnChange)
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::OnChange => f.write_str("on-change"),
            WriteMode::Deferred => f.write_str("deferred"),
        }
    }
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "onchange" => Ok(WriteMode::OnChange),
            "deferred" => Ok(WriteMode::Deferred),
            other => Err(format!("unknown write mode: {other}")),
        }
    }
}
