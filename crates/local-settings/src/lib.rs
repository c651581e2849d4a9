//! # local-settings
//!
//! A local, file-backed key-value settings store.  A [`SettingStore`] reads a
//! YAML file into an in-memory string map, serves typed lookups, and writes
//! modifications back to disk either after every change or only when asked.
//!
//! # Architecture overview (for beginners)
//!
//! The crate is split into three layers:
//!
//! - **`domain`** – Pure value rules with no I/O: the [`WriteMode`] policy and
//!   the culture-invariant formatting/parsing of integers, decimals and
//!   date-times that makes up the on-disk value format.
//!
//! - **`application`** – The [`SettingStore`] itself (initialization gate,
//!   key normalization, mutex guard) and the pluggable "flatten a structured
//!   value into string entries" capability.
//!
//! - **`infrastructure`** – The file abstraction ([`SettingsFile`]) and the
//!   YAML codec that turns the mapping into text and back.
//!
//! # Example
//!
//! ```rust,no_run
//! use local_settings::{SettingService, SettingStore, WriteMode};
//!
//! # fn main() -> Result<(), local_settings::SettingsError> {
//! let store = SettingStore::new();
//! store.initialize_path("settings/app.yaml", WriteMode::OnChange)?;
//! store.set_int("Window_Width", 1280)?;
//! assert_eq!(store.get_int("window_width")?, 1280);
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::complex_value::{ComplexValueExt, SerdeFlattener, ValueFlattener};
pub use application::store::{SettingService, SettingStore};
pub use domain::value::min_date_time;
pub use domain::write_mode::WriteMode;
pub use error::SettingsError;
pub use infrastructure::file::{FsSettingsFile, SettingsFile};
