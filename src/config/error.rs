//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// ConfigError
// ============================================================================

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Output directory `{}` {reason}", path.display())]
    OutputDir { path: PathBuf, reason: &'static str },

    #[error("Invalid site URL `{0}`")]
    Url(String, #[source] url::ParseError),

    #[error("Failed to determine the current working directory")]
    Cwd(#[source] std::io::Error),
}
