//! Shared helpers: process execution, hashing, path arithmetic, wording.

pub mod exec;
pub mod hash;
pub mod path;
pub mod plural;
