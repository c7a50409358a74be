//! Content-addressed store for assets fetched from other hosts.
//!
//! Files live under `<snapshot>/external_assets/`, named after the hash of
//! their source URL, so every run maps a URL to the same filename.

mod cache;
mod fetch;

pub use cache::AssetCache;
#[cfg(test)]
pub use cache::{STORE_DIR, stored_name};
pub use fetch::{AssetFetcher, HttpFetcher};
