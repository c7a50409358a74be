//! Configuration utility functions.

use std::path::{Path, PathBuf};

use super::ConfigError;
use crate::utils::path::clean_path;

/// Find config file by searching upward from a start directory
///
/// Walks up parent directories until finding `config_name`.
/// Returns the path to the config file if found.
///
/// # Example
/// ```text
/// /home/user/mirror/site/blog/  ← cwd
/// /home/user/mirror/sitemirror.toml   ← found!
/// ```
pub fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

/// Resolve the output directory inside the project root.
///
/// The result is absolute and lexically clean. It must be a strict
/// descendant of `root`: the staging and backup siblings are created next
/// to it, and promotion renames it.
pub fn resolve_output_dir(root: &Path, output: &Path) -> Result<PathBuf, ConfigError> {
    let root = clean_path(root);
    let target = clean_path(&root.join(output));

    if !target.starts_with(&root) {
        return Err(ConfigError::OutputDir {
            path: output.to_path_buf(),
            reason: "must stay under the project root",
        });
    }
    if target == root {
        return Err(ConfigError::OutputDir {
            path: output.to_path_buf(),
            reason: "must not be the project root itself",
        });
    }
    Ok(target)
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_output_dir_relative() {
        let out = resolve_output_dir(Path::new("/srv/project"), Path::new("site")).unwrap();
        assert_eq!(out, PathBuf::from("/srv/project/site"));

        let out = resolve_output_dir(Path::new("/srv/project"), Path::new("./a/../site")).unwrap();
        assert_eq!(out, PathBuf::from("/srv/project/site"));
    }

    #[test]
    fn test_resolve_output_dir_rejects_escape() {
        let err = resolve_output_dir(Path::new("/srv/project"), Path::new("../site")).unwrap_err();
        assert!(matches!(err, ConfigError::OutputDir { .. }));

        let err = resolve_output_dir(Path::new("/srv/project"), Path::new("/tmp/site")).unwrap_err();
        assert!(matches!(err, ConfigError::OutputDir { .. }));
    }

    #[test]
    fn test_resolve_output_dir_rejects_root() {
        let err = resolve_output_dir(Path::new("/srv/project"), Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("project root itself"));
    }

    #[test]
    fn test_resolve_output_dir_absolute_inside_root() {
        let out =
            resolve_output_dir(Path::new("/srv/project"), Path::new("/srv/project/out")).unwrap();
        assert_eq!(out, PathBuf::from("/srv/project/out"));
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("site/blog");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("sitemirror.toml"), "").unwrap();

        let found = find_config_file(&nested, Path::new("sitemirror.toml")).unwrap();
        assert_eq!(found, dir.path().join("sitemirror.toml"));
    }

    #[test]
    fn test_find_config_file_missing() {
        let dir = TempDir::new().unwrap();
        let name = Path::new("no-such-config-7b3e.toml");
        assert!(find_config_file(dir.path(), name).is_none());
    }
}
