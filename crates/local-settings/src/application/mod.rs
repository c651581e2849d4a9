//! Application layer: the settings store and its extensions.
//!
//! - **`store`**         – [`SettingStore`](store::SettingStore): the mapping,
//!   the initialization gate, the mutex guard and the write-mode policy.
//! - **`complex_value`** – Turns a structured value into flat string entries
//!   so it can be kept in the store.  The store itself never sees anything
//!   but strings.

pub mod complex_value;
pub mod store;
