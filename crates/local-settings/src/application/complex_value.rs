//! Storing structured values as flat settings.
//!
//! The store only holds `key → string`.  To keep a struct in it, the value is
//! first serialized with `serde` into a JSON tree and then *flattened* into
//! one entry per leaf:
//!
//! ```text
//! Window { title: "Main", size: [800, 600] }   stored under "window"
//!
//! window.title  → Main
//! window.size.0 → 800
//! window.size.1 → 600
//! ```
//!
//! How the tree becomes entries is a pluggable [`ValueFlattener`]; the
//! default [`SerdeFlattener`] camel-cases field names and joins path segments
//! with `.`.  The store then lowercases the full key like any other key.

use serde::Serialize;
use serde_json::Value;

use crate::application::store::SettingService;
use crate::error::SettingsError;

/// Converts a serialized value into flat `(key, value)` entries.
pub trait ValueFlattener: Send + Sync {
    /// Flattens `value`, prefixing every produced key with `key`.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Flatten`] when the value has no flat representation.
    fn flatten(&self, key: &str, value: &Value) -> Result<Vec<(String, String)>, SettingsError>;
}

/// Default flattener: dotted paths, camel-cased field names, array indices.
///
/// Leaves are written as follows: strings verbatim, numbers and booleans in
/// their display form, `null` as the empty string.  Empty objects and arrays
/// produce no entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeFlattener;

impl ValueFlattener for SerdeFlattener {
    fn flatten(&self, key: &str, value: &Value) -> Result<Vec<(String, String)>, SettingsError> {
        let mut entries = Vec::new();
        flatten_into(key.to_string(), value, &mut entries);
        Ok(entries)
    }
}

fn flatten_into(path: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(fields) => {
            for (field, child) in fields {
                flatten_into(format!("{path}.{}", to_camel_case(field)), child, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(format!("{path}.{index}"), child, out);
            }
        }
        Value::String(s) => out.push((path, s.clone())),
        Value::Number(n) => out.push((path, n.to_string())),
        Value::Bool(b) => out.push((path, b.to_string())),
        Value::Null => out.push((path, String::new())),
    }
}

/// `integer_value` / `IntegerValue` / `integer-value` → `integerValue`.
fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, word) in name
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Adds structured-value storage to every [`SettingService`].
pub trait ComplexValueExt: SettingService {
    /// Serializes `value` and stores it under `key` using [`SerdeFlattener`].
    ///
    /// All entries are applied under one lock acquisition, so `OnChange`
    /// mode writes the file once.  Returns the number of entries stored.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Flatten`] if `value` cannot be serialized, plus every
    /// error of [`SettingService::set_many`].
    fn set_complex_value<T>(&self, key: &str, value: &T) -> Result<usize, SettingsError>
    where
        T: Serialize + ?Sized,
    {
        self.set_complex_value_with(key, value, &SerdeFlattener)
    }

    /// Like [`set_complex_value`](Self::set_complex_value) with a custom
    /// flattener.
    ///
    /// # Errors
    ///
    /// See [`set_complex_value`](Self::set_complex_value).
    fn set_complex_value_with<T, F>(
        &self,
        key: &str,
        value: &T,
        flattener: &F,
    ) -> Result<usize, SettingsError>
    where
        T: Serialize + ?Sized,
        F: ValueFlattener + ?Sized,
    {
        // An empty key is a no-op, but the initialization gate still applies.
        if key.is_empty() {
            return self.set_many(Vec::new());
        }
        let tree = serde_json::to_value(value).map_err(|e| SettingsError::Flatten {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let entries = flattener.flatten(key, &tree)?;
        self.set_many(entries)
    }
}

impl<S: SettingService + ?Sized> ComplexValueExt for S {}
