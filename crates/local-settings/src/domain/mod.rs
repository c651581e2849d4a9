//! Domain layer: pure value rules for the settings store.
//!
//! Nothing in here touches the file system or takes a lock.
//!
//! - **`write_mode`** – When the store persists its mapping.
//! - **`value`**      – Key normalization and the culture-invariant text form
//!   of typed values.  These rules are part of the on-disk format, so
//!   changing them breaks compatibility with existing settings files.

pub mod value;
pub mod write_mode;

pub use value::{min_date_time, normalize_key};
pub use write_mode::WriteMode;
