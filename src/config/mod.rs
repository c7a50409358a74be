//! Mirror configuration management for `sitemirror.toml`.
//!
//! Values are layered: built-in defaults, then the optional config file,
//! then command-line flags.
//!
//! # Sections
//!
//! | Section    | Purpose                                            |
//! |------------|----------------------------------------------------|
//! | `[mirror]` | Target URL, output directory, wget options         |
//! | `[assets]` | Cross-host image localization and request timeout  |
//!
//! # Example
//!
//! ```toml
//! [mirror]
//! url = "https://typecho.org/"
//! output = "site"
//! clean = true
//! reject = "/(admin|login|register|action|feed)/"
//! wget = "~/bin/wget"
//!
//! [assets]
//! localize = true
//! timeout = 20
//! ```

mod error;
mod util;

pub use error::ConfigError;
use util::{find_config_file, resolve_output_dir};

use crate::cli::Cli;
use crate::log;
use crate::snapshot::SnapshotLayout;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Site mirrored when no URL is configured.
pub const DEFAULT_URL: &str = "https://typecho.org/";

/// Output directory name when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "site";

/// Paths wget must not descend into.
pub const REJECT_REGEX: &str = r"/(admin|login|register|action|feed)/";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sitemirror.toml
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Project root: parent of the config file, or cwd (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Config file the values came from, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Only run the link check, never fetch or promote (CLI only)
    #[serde(skip)]
    pub spider_only: bool,

    /// Mirroring settings
    pub mirror: MirrorSection,

    /// External asset settings
    pub assets: AssetsSection,
}

/// `[mirror]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MirrorSection {
    /// Root URL to mirror.
    pub url: String,

    /// Output directory, relative to the project root.
    /// Absolute after loading.
    pub output: PathBuf,

    /// Start from an empty staging directory instead of seeding it from
    /// the current snapshot.
    pub clean: bool,

    /// `--reject-regex` passed to wget.
    pub reject: String,

    /// Explicit wget executable; skips discovery when set.
    pub wget: Option<PathBuf>,
}

impl Default for MirrorSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
            clean: true,
            reject: REJECT_REGEX.to_string(),
            wget: None,
        }
    }
}

/// `[assets]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssetsSection {
    /// Download cross-host `<img>` sources into the snapshot.
    pub localize: bool,

    /// Per-request timeout in seconds.
    pub timeout: u64,
}

impl Default for AssetsSection {
    fn default() -> Self {
        Self {
            localize: true,
            timeout: 20,
        }
    }
}

impl AssetsSection {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            config_path: None,
            spider_only: false,
            mirror: MirrorSection::default(),
            assets: AssetsSection::default(),
        }
    }
}

impl MirrorConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. Its parent directory
    /// is the project root; without a config file the root is cwd.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::Cwd)?;
        Self::load_from(cli, &cwd)
    }

    /// [`load`](Self::load) with an explicit starting directory.
    pub fn load_from(cli: &Cli, cwd: &Path) -> Result<Self, ConfigError> {
        let mut config = match find_config_file(cwd, &cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| cwd.to_path_buf());
                config.config_path = Some(path);
                config
            }
            None => Self {
                root: cwd.to_path_buf(),
                ..Self::default()
            },
        };

        config.apply_cli(cli);
        config.finalize()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-line flags over file values.
    fn apply_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.mirror.url, cli.url.as_ref());
        Self::update_option(&mut self.mirror.output, cli.output.as_ref());
        Self::update_option(&mut self.mirror.clean, cli.clean_override().as_ref());
        if cli.wget.is_some() {
            self.mirror.wget = cli.wget.clone();
        }
        self.spider_only = cli.spider;
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // normalization and validation
    // ========================================================================

    /// Validate the URL and turn relative paths into absolute ones.
    fn finalize(&mut self) -> Result<(), ConfigError> {
        url::Url::parse(&self.mirror.url)
            .map_err(|err| ConfigError::Url(self.mirror.url.clone(), err))?;

        self.root = crate::utils::path::normalize_path(&self.root);
        self.mirror.output = resolve_output_dir(&self.root, &self.mirror.output)?;

        if let Some(wget) = self.mirror.wget.take() {
            self.mirror.wget = Some(Self::expand_tool_path(&wget, &self.root));
        }
        Ok(())
    }

    /// Expand `~` and resolve relative tool paths against the project root.
    ///
    /// A bare program name (no separator) is kept for `PATH` lookup.
    fn expand_tool_path(path: &Path, root: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        let path = PathBuf::from(expanded);
        if path.is_relative() && path.components().count() > 1 {
            root.join(path)
        } else {
            path
        }
    }

    /// Snapshot directories derived from the output path.
    pub fn layout(&self) -> SnapshotLayout {
        SnapshotLayout::new(&self.mirror.output)
    }
}

// ============================================================================
// tests
// ============================================================================
