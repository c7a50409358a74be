//! URL → stored file resolution with an in-process memo.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tempfile::NamedTempFile;
use url::Url;

use super::AssetFetcher;
use crate::debug;
use crate::error::{MirrorError, Result};
use crate::utils::hash;
use crate::utils::path::route::url_path_extension;

/// Store directory name inside a snapshot.
pub const STORE_DIR: &str = "external_assets";

/// Extension used when the URL path has no usable one.
const FALLBACK_EXT: &str = "img";

/// Filename for a source URL: `<hex hash>.<ext>`.
pub fn stored_name(url: &str) -> String {
    let ext = Url::parse(url)
        .ok()
        .and_then(|u| url_path_extension(u.path()).map(str::to_owned))
        .unwrap_or_else(|| FALLBACK_EXT.to_owned());
    format!("{}.{}", hash::hex_digest(url), ext)
}

/// Asset store bound to one snapshot root.
pub struct AssetCache {
    store: PathBuf,
    fetcher: Box<dyn AssetFetcher>,
    memo: FxHashMap<String, PathBuf>,
}

impl AssetCache {
    pub fn new(snapshot_root: &Path, fetcher: Box<dyn AssetFetcher>) -> Self {
        Self {
            store: snapshot_root.join(STORE_DIR),
            fetcher,
            memo: FxHashMap::default(),
        }
    }

    pub fn store_dir(&self) -> &Path {
        &self.store
    }

    /// Path of the local copy of `url`, downloading it on first use.
    ///
    /// A file already present under the stored name is reused without
    /// network access. Failures leave nothing under the stored name.
    pub fn resolve(&mut self, url: &str) -> Result<PathBuf> {
        if let Some(path) = self.memo.get(url) {
            return Ok(path.clone());
        }

        let path = self.store.join(stored_name(url));
        if !path.is_file() {
            self.download(url, &path)?;
        }

        self.memo.insert(url.to_owned(), path.clone());
        Ok(path)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        fs::create_dir_all(&self.store).map_err(|e| MirrorError::fs("create", &self.store, e))?;

        let mut tmp =
            NamedTempFile::new_in(&self.store).map_err(|e| MirrorError::fs("create", &self.store, e))?;
        let bytes = self
            .fetcher
            .fetch(url, &mut tmp)
            .map_err(|e| MirrorError::NetworkFetch {
                url: url.to_owned(),
                source: e.into(),
            })?;

        tmp.persist(dest)
            .map_err(|e| MirrorError::fs("persist", dest, e.error))?;
        debug!("assets"; "stored {} ({} bytes)", url, bytes);
        Ok(())
    }
}
