//! Hashing utilities using blake3.
//!
//! # Usage
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let name = hash::hex_digest("https://cdn.example.org/a.png"); // 64 hex chars
//! ```

/// Compute the lowercase hex blake3 digest of byte data.
#[inline]
pub fn hex_digest<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    hex::encode(blake3::hash(data.as_ref()).as_bytes())
}
