//! Prepare, promote and discard snapshot directories.
//!
//! Promotion only renames directories. It moves through explicit states:
//!
//! ```text
//! Idle ──rename current→backup──▶ BackedUp ──rename staging→current──▶ Promoted
//!   │                                 │
//!   │                                 └─ failure ─▶ rename backup→current
//!   │                                                  ├─ ok   ▶ Reverted
//!   │                                                  └─ fail ▶ Stranded
//!   └─ (no current) ──rename staging→current──▶ Promoted
//! ```

use std::fs;
use std::io;
use std::path::Path;

use super::SnapshotLayout;
use crate::error::{MirrorError, Result};
use crate::{debug, log};

// ============================================================================
// Directory operations
// ============================================================================

/// Directory-level filesystem operations used by promotion.
pub trait DirOps {
    fn exists(&self, path: &Path) -> bool;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDirOps;

impl DirOps for StdDirOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }
}

// ============================================================================
// Promotion
// ============================================================================

/// Where a promotion stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapState {
    Idle,
    /// The previous current snapshot now lives at the backup path.
    BackedUp,
    Promoted,
    Reverted,
    Stranded,
}

/// Outcome of a successful promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Promotion {
    /// A previous snapshot existed and was replaced.
    pub replaced: bool,
    /// The backup of the previous snapshot could not be removed afterwards.
    pub backup_left: bool,
}

/// Make staging the current snapshot.
pub fn promote(layout: &SnapshotLayout) -> Result<Promotion> {
    promote_with(&StdDirOps, layout)
}

pub(crate) fn promote_with(ops: &dyn DirOps, layout: &SnapshotLayout) -> Result<Promotion> {
    let SnapshotLayout {
        current,
        staging,
        backup,
    } = layout;

    clear_stale_backup(ops, layout)?;

    let mut state = SwapState::Idle;
    if ops.exists(current) {
        ops.rename(current, backup)
            .map_err(|e| MirrorError::fs("back up", current, e))?;
        state = SwapState::BackedUp;
        debug!("promote"; "moved {} aside", current.display());
    }
    let replaced = state == SwapState::BackedUp;

    if let Err(rename) = ops.rename(staging, current) {
        if state == SwapState::Idle {
            return Err(MirrorError::fs("promote", staging, rename));
        }
        return match ops.rename(backup, current) {
            Ok(()) => {
                state = SwapState::Reverted;
                debug!("promote"; "state: {:?}", state);
                Err(MirrorError::PromoteReverted {
                    staging: staging.clone(),
                    source: rename,
                })
            }
            Err(revert) => {
                state = SwapState::Stranded;
                debug!("promote"; "state: {:?}", state);
                Err(MirrorError::PromoteStranded {
                    staging: staging.clone(),
                    backup: backup.clone(),
                    rename,
                    revert,
                })
            }
        };
    }
    state = SwapState::Promoted;
    debug!("promote"; "state: {:?}", state);

    let mut backup_left = false;
    if replaced && let Err(e) = ops.remove_dir_all(backup) {
        backup_left = true;
        log!("promote"; "could not remove {}: {}", backup.display(), e);
    }

    Ok(Promotion {
        replaced,
        backup_left,
    })
}

/// Deal with a backup left behind by an interrupted run.
///
/// With a current snapshot in place the backup is obsolete. Without one,
/// the backup is the last published snapshot and is restored.
fn clear_stale_backup(ops: &dyn DirOps, layout: &SnapshotLayout) -> Result<()> {
    if !ops.exists(&layout.backup) {
        return Ok(());
    }
    if ops.exists(&layout.current) {
        log!("promote"; "removing stale {}", layout.backup.display());
        ops.remove_dir_all(&layout.backup)
            .map_err(|e| MirrorError::fs("remove", &layout.backup, e))
    } else {
        log!("promote"; "restoring {} from an interrupted run", layout.current.display());
        ops.rename(&layout.backup, &layout.current)
            .map_err(|e| MirrorError::fs("restore", &layout.backup, e))
    }
}

// ============================================================================
// Prepare / discard
// ============================================================================

/// Create an empty staging directory, optionally seeded with a copy of
/// `seed_from`. Any previous staging content is removed first.
///
/// Returns the number of files copied from the seed.
pub fn prepare(staging: &Path, seed_from: Option<&Path>) -> Result<usize> {
    discard(staging)?;
    fs::create_dir_all(staging).map_err(|e| MirrorError::fs("create", staging, e))?;

    let mut count = 0;
    if let Some(seed) = seed_from.filter(|p| p.is_dir()) {
        copy_dir_recursive(seed, staging, &mut count)?;
        debug!("mirror"; "seeded staging with {} files", count);
    }
    Ok(count)
}

/// Remove a directory tree. A missing directory is not an error.
pub fn discard(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MirrorError::fs("remove", path, e)),
    }
}

fn copy_dir_recursive(src_dir: &Path, dest_dir: &Path, count: &mut usize) -> Result<()> {
    let entries = fs::read_dir(src_dir).map_err(|e| MirrorError::fs("read", src_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| MirrorError::fs("read", src_dir, e))?;
        let src_path = entry.path();
        let dest_path = dest_dir.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| MirrorError::fs("read", &src_path, e))?;

        // Symlinked files are copied as content, symlinked directories skipped
        if file_type.is_symlink() && !src_path.is_file() {
            debug!("mirror"; "skip symlink {}", src_path.display());
        } else if file_type.is_dir() {
            fs::create_dir_all(&dest_path).map_err(|e| MirrorError::fs("create", &dest_path, e))?;
            copy_dir_recursive(&src_path, &dest_path, count)?;
        } else {
            fs::copy(&src_path, &dest_path).map_err(|e| MirrorError::fs("copy", &src_path, e))?;
            *count += 1;
        }
    }
    Ok(())
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn layout_in(dir: &TempDir) -> SnapshotLayout {
        SnapshotLayout::new(&dir.path().join("site"))
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    /// Real filesystem, except that selected renames or removals fail.
    #[derive(Default)]
    struct FailingOps {
        fail_rename_from: Vec<PathBuf>,
        fail_remove: bool,
        calls: RefCell<Vec<String>>,
    }

    impl DirOps for FailingOps {
        fn exists(&self, path: &Path) -> bool {
            path.exists()
        }

        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            self.calls.borrow_mut().push(format!(
                "rename {} -> {}",
                from.file_name().unwrap().to_string_lossy(),
                to.file_name().unwrap().to_string_lossy()
            ));
            if self.fail_rename_from.iter().any(|p| p == from) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            fs::rename(from, to)
        }

        fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
            if self.fail_remove {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "busy"));
            }
            fs::remove_dir_all(path)
        }
    }

    #[test]
    fn test_prepare_empty() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        write(&layout.staging.join("leftover.html"), "old");

        let copied = prepare(&layout.staging, None).unwrap();
        assert_eq!(copied, 0);
        assert!(layout.staging.is_dir());
        assert_eq!(fs::read_dir(&layout.staging).unwrap().count(), 0);
    }

    #[test]
    fn test_prepare_seeded_copies_tree() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        write(&layout.current.join("index.html"), "home");
        write(&layout.current.join("a/b/c.css"), "body{}");

        let copied = prepare(&layout.staging, Some(&layout.current)).unwrap();
        assert_eq!(copied, 2);
        assert_eq!(read(&layout.staging.join("index.html")), "home");
        assert_eq!(read(&layout.staging.join("a/b/c.css")), "body{}");
        // seed is untouched
        assert_eq!(read(&layout.current.join("index.html")), "home");
    }

    #[cfg(unix)]
    #[test]
    fn test_prepare_seed_with_symlinks() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        write(&layout.current.join("a.css"), "body{}");
        fs::create_dir_all(layout.current.join("sub")).unwrap();
        symlink(&layout.current, layout.current.join("sub/loop")).unwrap();
        symlink(layout.current.join("a.css"), layout.current.join("b.css")).unwrap();

        let copied = prepare(&layout.staging, Some(&layout.current)).unwrap();
        assert_eq!(copied, 2);
        assert_eq!(read(&layout.staging.join("b.css")), "body{}");
        assert!(!layout.staging.join("b.css").is_symlink());
        assert!(layout.staging.join("sub").is_dir());
        assert!(!layout.staging.join("sub/loop").exists());
    }

    #[test]
    fn test_prepare_missing_seed_is_empty() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);

        let copied = prepare(&layout.staging, Some(&layout.current)).unwrap();
        assert_eq!(copied, 0);
        assert!(layout.staging.is_dir());
    }

    #[test]
    fn test_discard() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        write(&layout.staging.join("x/y.html"), "");

        discard(&layout.staging).unwrap();
        assert!(!layout.staging.exists());
        // second call is a no-op
        discard(&layout.staging).unwrap();
    }

    #[test]
    fn test_promote_first_run() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        write(&layout.staging.join("index.html"), "new");

        let promotion = promote(&layout).unwrap();
        assert!(!promotion.replaced);
        assert_eq!(read(&layout.current.join("index.html")), "new");
        assert!(!layout.staging.exists());
        assert!(!layout.backup.exists());
    }

    #[test]
    fn test_promote_replaces_current() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        write(&layout.current.join("index.html"), "old");
        write(&layout.current.join("gone.html"), "stale");
        write(&layout.staging.join("index.html"), "new");

        let promotion = promote(&layout).unwrap();
        assert!(promotion.replaced);
        assert!(!promotion.backup_left);
        assert_eq!(read(&layout.current.join("index.html")), "new");
        assert!(!layout.current.join("gone.html").exists());
        assert!(!layout.staging.exists());
        assert!(!layout.backup.exists());
    }

    #[test]
    fn test_promote_reverts_on_rename_failure() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        write(&layout.current.join("index.html"), "old");
        write(&layout.staging.join("index.html"), "new");

        let ops = FailingOps {
            fail_rename_from: vec![layout.staging.clone()],
            ..Default::default()
        };
        let err = promote_with(&ops, &layout).unwrap_err();

        assert!(matches!(err, MirrorError::PromoteReverted { .. }));
        assert_eq!(read(&layout.current.join("index.html")), "old");
        assert!(!layout.backup.exists());
        assert_eq!(
            ops.calls.borrow().as_slice(),
            [
                "rename site -> site_backup",
                "rename site_tmp -> site",
                "rename site_backup -> site",
            ]
        );
    }

    #[test]
    fn test_promote_stranded_keeps_backup() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        write(&layout.current.join("index.html"), "old");
        write(&layout.staging.join("index.html"), "new");

        let ops = FailingOps {
            fail_rename_from: vec![layout.staging.clone(), layout.backup.clone()],
            ..Default::default()
        };
        let err = promote_with(&ops, &layout).unwrap_err();

        assert!(matches!(err, MirrorError::PromoteStranded { .. }));
        assert!(!layout.current.exists());
        assert_eq!(read(&layout.backup.join("index.html")), "old");
        assert!(err.report().contains("site_backup"));
    }

    #[test]
    fn test_promote_without_current_fails_plainly() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        write(&layout.staging.join("index.html"), "new");

        let ops = FailingOps {
            fail_rename_from: vec![layout.staging.clone()],
            ..Default::default()
        };
        let err = promote_with(&ops, &layout).unwrap_err();
        assert!(matches!(err, MirrorError::Filesystem { .. }));
        assert!(layout.staging.exists());
    }

    #[test]
    fn test_promote_backup_removal_failure_still_succeeds() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        write(&layout.current.join("index.html"), "old");
        write(&layout.staging.join("index.html"), "new");

        let ops = FailingOps {
            fail_remove: true,
            ..Default::default()
        };
        let promotion = promote_with(&ops, &layout).unwrap();
        assert!(promotion.backup_left);
        assert_eq!(read(&layout.current.join("index.html")), "new");
        assert_eq!(read(&layout.backup.join("index.html")), "old");
    }

    #[test]
    fn test_promote_removes_stale_backup() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        write(&layout.current.join("index.html"), "old");
        write(&layout.backup.join("index.html"), "older");
        write(&layout.staging.join("index.html"), "new");

        promote(&layout).unwrap();
        assert_eq!(read(&layout.current.join("index.html")), "new");
        assert!(!layout.backup.exists());
    }

    #[test]
    fn test_promote_restores_orphaned_backup_first() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        write(&layout.backup.join("index.html"), "published");
        write(&layout.staging.join("index.html"), "new");

        let ops = FailingOps {
            fail_rename_from: vec![layout.staging.clone()],
            ..Default::default()
        };
        let err = promote_with(&ops, &layout).unwrap_err();

        // the orphaned backup went back to current before the failed swap
        assert!(matches!(err, MirrorError::PromoteReverted { .. }));
        assert_eq!(read(&layout.current.join("index.html")), "published");
    }
}
