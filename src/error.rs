//! Error kinds of a mirroring run.
//!
//! Every fatal failure maps to one process exit code via
//! [`MirrorError::exit_code`]. Network fetch errors never reach `main`;
//! the asset pass recovers from them per reference.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T, E = MirrorError> = std::result::Result<T, E>;

// ============================================================================
// MirrorError
// ============================================================================

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("wget not found. {hint}")]
    ToolNotFound { hint: String },

    #[error("`{tool}` exited with code {code}")]
    ExternalProcess { tool: String, code: i32 },

    #[error("failed to run `{tool}`")]
    Spawn {
        tool: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to {action} `{}`", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Promotion failed, the previous snapshot was put back in place.
    #[error("failed to promote `{}`, previous snapshot restored", staging.display())]
    PromoteReverted {
        staging: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Promotion failed and the previous snapshot could not be put back.
    #[error(
        "failed to promote `{}` ({rename}) and to restore the previous snapshot ({revert}); it is kept at `{}`",
        staging.display(),
        backup.display()
    )]
    PromoteStranded {
        staging: PathBuf,
        backup: PathBuf,
        rename: io::Error,
        revert: io::Error,
    },

    #[error("failed to fetch `{url}`")]
    NetworkFetch {
        url: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl MirrorError {
    /// Shorthand for wrapping an `io::Error` with the failed action and path.
    pub fn fs(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error.
    ///
    /// The mirroring tool's own code is propagated when it is representable;
    /// everything else exits with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ExternalProcess { code, .. } => u8::try_from(*code)
                .ok()
                .filter(|c| *c != 0)
                .unwrap_or(1),
            _ => 1,
        }
    }

    /// One-line diagnostic: the message followed by its chain of causes.
    pub fn report(&self) -> String {
        let mut line = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            line.push_str(": ");
            line.push_str(&cause.to_string());
            source = cause.source();
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn test_exit_code_propagates_tool_code() {
        let err = MirrorError::ExternalProcess {
            tool: "wget".into(),
            code: 8,
        };
        assert_eq!(err.exit_code(), 8);
    }

    #[test]
    fn test_exit_code_unrepresentable() {
        let negative = MirrorError::ExternalProcess {
            tool: "wget".into(),
            code: -1,
        };
        assert_eq!(negative.exit_code(), 1);

        let large = MirrorError::ExternalProcess {
            tool: "wget".into(),
            code: 300,
        };
        assert_eq!(large.exit_code(), 1);
    }

    #[test]
    fn test_filesystem_exit_code_and_report() {
        let err = MirrorError::fs(
            "remove",
            "/tmp/site_tmp",
            io::Error::new(ErrorKind::PermissionDenied, "permission denied"),
        );
        assert_eq!(err.exit_code(), 1);

        let report = err.report();
        assert!(report.contains("failed to remove `/tmp/site_tmp`"));
        assert!(report.ends_with("permission denied"));
    }

    #[test]
    fn test_stranded_report_names_both_errors() {
        let err = MirrorError::PromoteStranded {
            staging: PathBuf::from("site_tmp"),
            backup: PathBuf::from("site_backup"),
            rename: io::Error::new(ErrorKind::NotFound, "rename failed"),
            revert: io::Error::new(ErrorKind::PermissionDenied, "revert failed"),
        };
        let report = err.report();
        assert!(report.contains("rename failed"));
        assert!(report.contains("revert failed"));
        assert!(report.contains("site_backup"));
    }
}
