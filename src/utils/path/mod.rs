//! Path and URL utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem path handling (`normalize_path`, `clean_path`, `relative_path`)
//! - [`route`]: URL path helpers (`split_path_fragment`, `url_path_extension`)

pub mod fs;
pub mod route;

// Re-export commonly used functions from fs (used in many places)
pub use fs::{clean_path, is_within, normalize_path, relative_path};
