//! Infrastructure layer: storage adapters for the settings store.
//!
//! - **`file`** – The [`SettingsFile`](file::SettingsFile) abstraction over
//!   "read the whole file / write the whole file", plus the filesystem
//!   implementation used in production.
//! - **`yaml`** – Converts the setting mapping to YAML text and back.
//!
//! Keeping the file format here means the store itself never sees YAML; it
//! only hands a `BTreeMap` to [`yaml::to_yaml`] and receives one from
//! [`yaml::from_yaml`].

pub mod file;
pub mod yaml;
