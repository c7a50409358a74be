//! Snapshot directories and their lifecycle.
//!
//! A snapshot is one complete mirrored tree. Three roles exist side by side:
//!
//! ```text
//! <project>/
//! ├── site/          ← current (published, may not exist on first run)
//! ├── site_tmp/      ← staging (built by this run)
//! └── site_backup/   ← backup  (previous current, only during promotion)
//! ```
//!
//! Staging is prepared (optionally seeded from current), filled and
//! post-processed, then promoted over current by renames only.

mod swap;

pub use swap::{discard, prepare, promote};

use std::path::{Path, PathBuf};

/// Suffix of the staging sibling of an output directory.
const STAGING_SUFFIX: &str = "_tmp";

/// Suffix of the backup sibling of an output directory.
const BACKUP_SUFFIX: &str = "_backup";

/// Locations of the three snapshot roles for one output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotLayout {
    pub current: PathBuf,
    pub staging: PathBuf,
    pub backup: PathBuf,
}

impl SnapshotLayout {
    pub fn new(current: &Path) -> Self {
        Self {
            current: current.to_path_buf(),
            staging: sibling(current, STAGING_SUFFIX),
            backup: sibling(current, BACKUP_SUFFIX),
        }
    }
}

/// `<parent>/<name><suffix>` for a directory path.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
