//! wget discovery and invocation.
//!
//! Lookup order:
//!
//! 1. `[mirror].wget` / `--wget` when set (bare names go through `PATH`)
//! 2. Windows: bundled `tools/mingw64/bin/wget.exe`, then `PATH`
//! 3. Elsewhere: `PATH`, then the bundled copy

mod runner;

pub use runner::{WgetJob, run_wget, wget_command};

use std::path::{Path, PathBuf};

use crate::debug;
use crate::error::{MirrorError, Result};

/// Bundled executable, relative to the project root.
pub const BUNDLED_WGET: &str = "tools/mingw64/bin/wget.exe";

/// Locate the wget executable for a project.
pub fn find_wget(root: &Path, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        return find_configured(path);
    }

    let bundled = root.join(BUNDLED_WGET);
    let bundled = bundled.is_file().then_some(bundled);
    let system = which::which("wget").ok();

    let found = pick(cfg!(windows), bundled, system).ok_or_else(|| MirrorError::ToolNotFound {
        hint: if cfg!(windows) {
            format!("Expected bundled wget at {BUNDLED_WGET} or a system wget in PATH.")
        } else {
            format!("Install wget or place it at {BUNDLED_WGET}.")
        },
    })?;
    debug!("mirror"; "using {}", found.display());
    Ok(found)
}

fn find_configured(path: &Path) -> Result<PathBuf> {
    let bare_name = path.components().count() == 1 && !path.is_absolute();
    let found = if bare_name {
        which::which(path).ok()
    } else {
        path.is_file().then(|| path.to_path_buf())
    };
    found.ok_or_else(|| MirrorError::ToolNotFound {
        hint: format!("Configured executable `{}` does not exist.", path.display()),
    })
}

fn pick(
    prefer_bundled: bool,
    bundled: Option<PathBuf>,
    system: Option<PathBuf>,
) -> Option<PathBuf> {
    if prefer_bundled {
        bundled.or(system)
    } else {
        system.or(bundled)
    }
}
