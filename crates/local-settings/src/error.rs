//! Error type shared by every layer of the settings store.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`crate::SettingStore`] operations.
///
/// A typed getter that finds unparsable text does **not** produce an error;
/// it falls back to the type's zero value instead.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A get/set/write was attempted before `initialize`.
    #[error("the setting store has not been initialized; call initialize() first")]
    Uninitialized,

    /// The settings file exists but is not a flat mapping of strings.
    #[error("malformed settings file {path}: {reason}")]
    MalformedFile { path: PathBuf, reason: String },

    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The mapping could not be serialized to YAML.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// A structured value could not be flattened into string entries.
    #[error("failed to flatten value for key '{key}': {reason}")]
    Flatten { key: String, reason: String },
}

impl SettingsError {
    /// Wraps an I/O error together with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
