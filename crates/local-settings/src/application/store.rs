//! SettingStore: the file-backed key-value settings service.
//!
//! # Lifecycle (for beginners)
//!
//! ```text
//! new()  ──►  Uninitialized  ──initialize()──►  Initialized
//!                                                   │  ▲
//!                                      get / set ───┘  │
//!                                      write_settings ─┘
//! ```
//!
//! A store starts empty and refuses every read or write until
//! [`SettingService::initialize`] has been called.  Initialization creates the
//! backing file's directory, loads the file when it already exists, and fixes
//! the [`WriteMode`].  There is no way back to `Uninitialized`; calling
//! `initialize` again replaces the file and mode and reloads the mapping.
//!
//! # Keys and values
//!
//! Keys are case-insensitive: every key is lowercased before it is looked up
//! or stored.  Values are always strings.  The typed setters format their
//! input with the culture-invariant rules in [`crate::domain::value`] and the
//! typed getters parse it back, returning the type's zero value when the key
//! is missing *or* holds text that does not parse.  Callers cannot tell those
//! two cases apart.
//!
//! # Thread safety
//!
//! All state lives behind one `std::sync::Mutex` owned by the instance, so a
//! store can be shared through an `Arc` and used from many threads.  Every
//! operation holds the lock for its whole duration, including the file write
//! in [`WriteMode::OnChange`]; operations therefore observe a strict total
//! order and the file always reflects the most recently completed `set`.
//! There is no static state: two stores on different files never contend.
//!
//! Nothing here coordinates *processes*.  Two programs writing the same file
//! will overwrite each other.
//!
//! # Known limitation
//!
//! Every persisted change rewrites the whole file.  With `OnChange` and many
//! small updates, prefer [`SettingService::set_many`] or switch to
//! [`WriteMode::Deferred`] and flush once with
//! [`SettingService::write_settings`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, FixedOffset};
use tracing::{debug, trace, warn};

use crate::domain::value::{self, normalize_key};
use crate::domain::write_mode::WriteMode;
use crate::error::SettingsError;
use crate::infrastructure::file::{FsSettingsFile, SettingsFile};
use crate::infrastructure::yaml;

// ── Public operation surface ──────────────────────────────────────────────────

/// The operations offered by a settings service.
///
/// [`SettingStore`] is the production implementation.  The typed accessors
/// are provided methods built on [`get`](Self::get) and [`set`](Self::set),
/// so an implementation only has to supply the string-level operations.
///
/// The trait is object safe and can be used as `Arc<dyn SettingService>`.
pub trait SettingService: Send + Sync {
    /// `true` once `initialize` has completed successfully.
    fn is_initialized(&self) -> bool;

    /// Binds the service to `file`, loads it when it exists and fixes the
    /// write mode.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Io`] if the directory cannot be created or the file
    /// cannot be read, [`SettingsError::MalformedFile`] if the file is not a
    /// flat mapping of strings.  A corrupt file is never silently discarded.
    fn initialize(
        &self,
        file: Box<dyn SettingsFile>,
        write_mode: WriteMode,
    ) -> Result<(), SettingsError>;

    /// Returns the value stored under `key` (case-insensitive), or `None`.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Uninitialized`] before `initialize`.
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;

    /// Stores `value` under `key` (case-insensitive).
    ///
    /// An empty key is ignored.  In [`WriteMode::OnChange`] the backing file
    /// is rewritten before this call returns.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Uninitialized`] before `initialize`, or the write
    /// error in `OnChange` mode.  The in-memory value is kept even when that
    /// write fails.
    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;

    /// Stores several entries at once, writing the file at most once.
    ///
    /// Returns the number of entries applied (entries with an empty key are
    /// skipped).
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set).
    fn set_many(&self, entries: Vec<(String, String)>) -> Result<usize, SettingsError>;

    /// Serializes the complete mapping and overwrites the backing file.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Uninitialized`] before `initialize`,
    /// [`SettingsError::Io`] if the file cannot be written.
    fn write_settings(&self) -> Result<(), SettingsError>;

    /// Reads `key` as an `i32`; `0` when missing or unparsable.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Uninitialized`] before `initialize`.
    fn get_int(&self, key: &str) -> Result<i32, SettingsError> {
        Ok(parse_or_zero(key, self.get(key)?, value::parse_int, "integer").unwrap_or(0))
    }

    /// Reads `key` as an `f64`; `0.0` when missing or unparsable.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Uninitialized`] before `initialize`.
    fn get_decimal(&self, key: &str) -> Result<f64, SettingsError> {
        Ok(parse_or_zero(key, self.get(key)?, value::parse_decimal, "decimal").unwrap_or(0.0))
    }

    /// Reads `key` as a date-time; [`value::min_date_time`] when missing or
    /// unparsable.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Uninitialized`] before `initialize`.
    fn get_date_time(&self, key: &str) -> Result<DateTime<FixedOffset>, SettingsError> {
        Ok(
            parse_or_zero(key, self.get(key)?, value::parse_date_time, "date-time")
                .unwrap_or_else(value::min_date_time),
        )
    }

    /// Stores an integer as plain base-10 digits.
    fn set_int(&self, key: &str, value: i32) -> Result<(), SettingsError> {
        self.set(key, &value::format_int(value))
    }

    /// Stores a decimal in fixed-point notation with two fraction digits.
    fn set_decimal(&self, key: &str, value: f64) -> Result<(), SettingsError> {
        self.set(key, &value::format_decimal(value))
    }

    /// Stores a date-time with seven fraction digits and its UTC offset.
    fn set_date_time(&self, key: &str, value: DateTime<FixedOffset>) -> Result<(), SettingsError> {
        self.set(key, &value::format_date_time(&value))
    }
}

/// Applies a lenient parser, logging when present text had to be discarded.
fn parse_or_zero<T>(
    key: &str,
    text: Option<String>,
    parse: fn(&str) -> Option<T>,
    kind: &str,
) -> Option<T> {
    let text = text?;
    let parsed = parse(&text);
    if parsed.is_none() {
        debug!("setting '{key}' holds {text:?}, not a valid {kind}; using the zero value");
    }
    parsed
}

// ── SettingStore ──────────────────────────────────────────────────────────────

/// Mutable state guarded by the store's mutex.
struct StoreState {
    file: Option<Box<dyn SettingsFile>>,
    write_mode: WriteMode,
    initialized: bool,
    settings: BTreeMap<String, String>,
}

impl StoreState {
    fn ensure_initialized(&self) -> Result<(), SettingsError> {
        if self.initialized {
            Ok(())
        } else {
            Err(SettingsError::Uninitialized)
        }
    }

    /// Inserts one entry; returns `false` when the key normalizes to empty.
    fn insert(&mut self, key: &str, value: String) -> bool {
        let key = normalize_key(key);
        if key.is_empty() {
            trace!("ignoring set with an empty key");
            return false;
        }
        trace!("set '{key}'");
        self.settings.insert(key, value);
        true
    }

    fn write(&self) -> Result<(), SettingsError> {
        let file = self.file.as_ref().ok_or(SettingsError::Uninitialized)?;
        let yaml = yaml::to_yaml(&self.settings)?;
        file.write_all(&yaml)
            .map_err(|source| SettingsError::io(file.path(), source))?;
        debug!(
            "wrote {} settings to {}",
            self.settings.len(),
            file.path().display()
        );
        Ok(())
    }
}

/// File-backed settings store.
///
/// See the [module documentation](self) for the lifecycle, key rules and
/// threading model.
///
/// # Examples
///
/// ```rust,no_run
/// use local_settings::{SettingService, SettingStore, WriteMode};
///
/// # fn main() -> Result<(), local_settings::SettingsError> {
/// let store = SettingStore::new();
/// store.initialize_path("config/app.yaml", WriteMode::Deferred)?;
/// store.set("Theme", "dark")?;
/// store.set_decimal("zoom", 1.25)?;
/// assert_eq!(store.get("THEME")?.as_deref(), Some("dark"));
/// store.write_settings()?;
/// # Ok(())
/// # }
/// ```
pub struct SettingStore {
    state: Mutex<StoreState>,
}

impl SettingStore {
    /// Creates an uninitialized store with an empty mapping.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                file: None,
                write_mode: WriteMode::default(),
                initialized: false,
                settings: BTreeMap::new(),
            }),
        }
    }

    /// Initializes the store against a file on the local file system.
    ///
    /// # Errors
    ///
    /// See [`SettingService::initialize`].
    pub fn initialize_path(
        &self,
        path: impl AsRef<Path>,
        write_mode: WriteMode,
    ) -> Result<(), SettingsError> {
        self.initialize(
            Box::new(FsSettingsFile::new(path.as_ref())),
            write_mode,
        )
    }

    /// The current write mode (`OnChange` until initialized).
    pub fn write_mode(&self) -> WriteMode {
        self.lock().write_mode
    }

    /// Path of the backing file, or `None` before initialization.
    pub fn setting_file_path(&self) -> Option<PathBuf> {
        self.lock().file.as_ref().map(|file| file.path())
    }

    /// A sorted snapshot of every stored entry.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Uninitialized`] before `initialize`.
    pub fn entries(&self) -> Result<BTreeMap<String, String>, SettingsError> {
        let state = self.lock();
        state.ensure_initialized()?;
        Ok(state.settings.clone())
    }

    /// Acquires the state lock.
    ///
    /// A panic while the lock was held cannot leave the mapping half
    /// updated (each mutation is a single `insert`), so a poisoned lock is
    /// recovered instead of propagated.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(file: &dyn SettingsFile) -> Result<BTreeMap<String, String>, SettingsError> {
        let path = file.path();
        let text = file
            .read_to_string()
            .map_err(|source| SettingsError::io(&path, source))?;

        let entries = yaml::from_yaml(&text).map_err(|e| SettingsError::MalformedFile {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let mut settings = BTreeMap::new();
        for (key, value) in entries {
            let key = normalize_key(&key);
            if key.is_empty() {
                warn!("dropping setting with an empty key from {}", path.display());
                continue;
            }
            settings.insert(key, value);
        }
        Ok(settings)
    }
}

impl Default for SettingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SettingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SettingStore")
            .field("file", &state.file.as_ref().map(|file| file.path()))
            .field("write_mode", &state.write_mode)
            .field("initialized", &state.initialized)
            .field("entries", &state.settings.len())
            .finish()
    }
}

impl SettingService for SettingStore {
    fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    fn initialize(
        &self,
        file: Box<dyn SettingsFile>,
        write_mode: WriteMode,
    ) -> Result<(), SettingsError> {
        let mut state = self.lock();
        let path = file.path();

        file.ensure_parent_dir().map_err(|source| {
            SettingsError::io(path.parent().unwrap_or(path.as_path()), source)
        })?;

        let settings = if file.exists() {
            Self::load(file.as_ref())?
        } else {
            debug!("settings file {} not found, starting empty", path.display());
            BTreeMap::new()
        };

        debug!(
            "initialized settings from {} ({} entries, {write_mode})",
            path.display(),
            settings.len()
        );

        state.file = Some(file);
        state.write_mode = write_mode;
        state.settings = settings;
        state.initialized = true;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let state = self.lock();
        state.ensure_initialized()?;
        let key = normalize_key(key);
        let value = state.settings.get(&key).cloned();
        trace!("get '{key}' found={}", value.is_some());
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let mut state = self.lock();
        state.ensure_initialized()?;
        if state.insert(key, value.to_string()) && state.write_mode.writes_on_change() {
            state.write()?;
        }
        Ok(())
    }

    fn set_many(&self, entries: Vec<(String, String)>) -> Result<usize, SettingsError> {
        let mut state = self.lock();
        state.ensure_initialized()?;
        let mut applied = 0;
        for (key, value) in entries {
            if state.insert(&key, value) {
                applied += 1;
            }
        }
        if applied > 0 && state.write_mode.writes_on_change() {
            state.write()?;
        }
        Ok(applied)
    }

    fn write_settings(&self) -> Result<(), SettingsError> {
        let state = self.lock();
        state.ensure_initialized()?;
        state.write()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
