//! YAML codec for the setting mapping.
//!
//! The file is a single flat YAML mapping:
//!
//! ```yaml
//! datetime_value: 2020-12-24T08:12:20.0000000+01:00
//! decimal_value: '42.43'
//! int_value: '42'
//! string_value_1: My fancy string
//! ```
//!
//! Keys are written in alphabetical order because the mapping is a
//! `BTreeMap`.  `serde_yaml` quotes values that would otherwise read back as
//! numbers or booleans, so every value survives a write/read cycle as the
//! exact same string.
//!
//! Reading is more forgiving than writing: a hand-edited file may contain
//! unquoted numbers, booleans or empty values.  Each value is taken as the
//! scalar text exactly as written, so `100.20`, `+4912345` or `0x1F` load
//! unchanged instead of being reinterpreted as numbers.  Anything nested (a
//! list or a sub-mapping as a value) is rejected, because the store only
//! holds flat strings.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use thiserror::Error;

/// Reasons a YAML document cannot be read as a flat settings mapping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum YamlShapeError {
    /// The text is not valid YAML.
    #[error("invalid YAML: {0}")]
    Syntax(String),

    /// The document root is a list or scalar instead of a mapping.
    #[error("expected a mapping at the document root, found {0}")]
    NotAMapping(&'static str),

    /// A key is a list or mapping.
    #[error("setting keys must be scalars")]
    NonScalarKey,

    /// A value is a list or mapping.
    #[error("value for key '{0}' must be a scalar, found a nested structure")]
    NestedValue(String),
}

/// Serializes the mapping as a YAML document with keys in sorted order.
///
/// # Errors
///
/// Returns the underlying `serde_yaml` error if emission fails.
pub fn to_yaml(settings: &BTreeMap<String, String>) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(settings)
}

/// Parses a YAML document into `(key, value)` pairs in document order.
///
/// Keys and values are returned exactly as written; normalization is the
/// caller's job.  An empty document (or one containing only `null`) yields
/// no entries.
///
/// # Errors
///
/// Returns [`YamlShapeError`] when the text is not YAML or not a flat mapping.
pub fn from_yaml(text: &str) -> Result<Vec<(String, String)>, YamlShapeError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    // A full pass over the events first, so a syntax error is reported as
    // such rather than as whatever shape the truncated document happens to have.
    serde_yaml::from_str::<IgnoredAny>(text)
        .map_err(|e| YamlShapeError::Syntax(e.to_string()))?;

    let mut shape_error = None;
    let document = serde_yaml::Deserializer::from_str(text);
    let result = document.deserialize_any(FlatMappingVisitor {
        shape_error: &mut shape_error,
    });
    match (result, shape_error) {
        (_, Some(shape)) => Err(shape),
        (Ok(entries), None) => Ok(entries),
        (Err(e), None) => Err(YamlShapeError::Syntax(e.to_string())),
    }
}

/// Collects a root mapping as raw scalar text.
///
/// Requesting every key and value as a string makes `serde_yaml` hand over
/// the scalar exactly as written.  A nested key or value fails that request;
/// the visitor records which shape rule was broken before passing the error on.
struct FlatMappingVisitor<'a> {
    shape_error: &'a mut Option<YamlShapeError>,
}

impl FlatMappingVisitor<'_> {
    fn reject<E: de::Error>(self, error: YamlShapeError) -> E {
        let message = error.to_string();
        *self.shape_error = Some(error);
        E::custom(message)
    }
}

impl<'de> Visitor<'de> for FlatMappingVisitor<'_> {
    type Value = Vec<(String, String)>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a flat mapping of scalar keys to scalar values")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        loop {
            let key = match map.next_key::<String>() {
                Ok(Some(key)) => key,
                Ok(None) => break,
                Err(_) => return Err(self.reject(YamlShapeError::NonScalarKey)),
            };
            match map.next_value::<String>() {
                Ok(value) => entries.push((key, value)),
                Err(_) => return Err(self.reject(YamlShapeError::NestedValue(key))),
            }
        }
        Ok(entries)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Vec::new())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Vec::new())
    }

    fn visit_seq<A>(self, _seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        Err(self.reject(YamlShapeError::NotAMapping("a sequence")))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
        Err(self.reject(YamlShapeError::NotAMapping("a scalar")))
    }

    fn visit_i64<E: de::Error>(self, _v: i64) -> Result<Self::Value, E> {
        Err(self.reject(YamlShapeError::NotAMapping("a scalar")))
    }

    fn visit_u64<E: de::Error>(self, _v: u64) -> Result<Self::Value, E> {
        Err(self.reject(YamlShapeError::NotAMapping("a scalar")))
    }

    fn visit_f64<E: de::Error>(self, _v: f64) -> Result<Self::Value, E> {
        Err(self.reject(YamlShapeError::NotAMapping("a scalar")))
    }

    fn visit_str<E: de::Error>(self, _v: &str) -> Result<Self::Value, E> {
        Err(self.reject(YamlShapeError::NotAMapping("a scalar")))
    }
}
