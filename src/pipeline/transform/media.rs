//! Cross-host `<img>` sources → files in the asset store.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::bytes::{Captures, Regex};

use super::{Origin, collect_files};
use crate::asset::AssetCache;
use crate::debug;
use crate::utils::path::relative_path;

/// Extensions of files scanned for images.
const MARKUP_EXTS: &[&str] = &["html", "htm"];

/// `<img ... src="URL">`: group 1 is everything up to the opening quote,
/// group 2 the absolute URL, group 3 the closing quote.
static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)(<img[^>]+src=["'])(https?://[^"']+)(["'])"#)
        .unwrap_or_else(|e| unreachable!("img pattern: {e}"))
});

/// Counters for one localize pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalizeStats {
    pub files_changed: usize,
    pub localized: usize,
    pub failed: usize,
}

/// Replace the `src` of every `<img>` served by another host with what
/// `resolve` returns for its URL.
///
/// Returns `None` when nothing changed. A `None` from `resolve` keeps the
/// remote URL for that occurrence.
pub fn localize_images<F>(text: &[u8], origin: &Origin, mut resolve: F) -> Option<Vec<u8>>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut changed = false;
    let out = IMG_SRC.replace_all(text, |caps: &Captures<'_>| {
        let whole = caps[0].to_vec();
        let Ok(url) = std::str::from_utf8(&caps[2]) else {
            return whole;
        };
        if origin.serves(url) {
            return whole;
        }
        let Some(local) = resolve(url) else {
            return whole;
        };

        changed = true;
        let mut replaced = caps[1].to_vec();
        replaced.extend_from_slice(local.as_bytes());
        replaced.extend_from_slice(&caps[3]);
        replaced
    });

    changed.then(|| out.into_owned())
}

/// Localize cross-host images in every markup file under `root`.
pub fn localize(root: &Path, origin: &Origin, cache: &mut AssetCache) -> LocalizeStats {
    let mut stats = LocalizeStats::default();

    for file in collect_files(root, MARKUP_EXTS) {
        let text = match fs::read(&file) {
            Ok(text) => text,
            Err(e) => {
                debug!("assets"; "skip {}: {}", file.display(), e);
                continue;
            }
        };

        let dir = file.parent().unwrap_or(root);
        let (mut localized, mut failed) = (0, 0);
        let rewritten = localize_images(&text, origin, |url| match cache.resolve(url) {
            Ok(stored) => {
                localized += 1;
                Some(relative_path(dir, &stored))
            }
            Err(e) => {
                failed += 1;
                debug!("assets"; "keep remote {}: {}", url, e.report());
                None
            }
        });
        stats.failed += failed;

        let Some(rewritten) = rewritten else { continue };
        if let Err(e) = fs::write(&file, rewritten) {
            debug!("assets"; "cannot write {}: {}", file.display(), e);
            stats.failed += localized;
            continue;
        }
        stats.files_changed += 1;
        stats.localized += localized;
    }

    stats
}
