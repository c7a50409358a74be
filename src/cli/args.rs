//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Mirror a website into a self-contained offline snapshot
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Root URL to mirror [default: https://typecho.org/]
    #[arg(short, long, value_hint = clap::ValueHint::Url)]
    pub url: Option<String>,

    /// Directory (relative to project root) to store the mirrored site [default: site]
    #[arg(short, long = "output-dir", value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Start from an empty staging directory (default)
    #[arg(long, conflicts_with = "no_clean")]
    pub clean: bool,

    /// Seed the staging directory from the existing output before mirroring
    #[arg(long)]
    pub no_clean: bool,

    /// Only run wget spider mode to test links without downloading files
    #[arg(long)]
    pub spider: bool,

    /// Path to the wget executable (overrides discovery)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub wget: Option<PathBuf>,

    /// Config file path (searched upward from the current directory)
    #[arg(short = 'C', long, default_value = "sitemirror.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Clean flag from the command line, if either form was given.
    pub const fn clean_override(&self) -> Option<bool> {
        if self.clean {
            Some(true)
        } else if self.no_clean {
            Some(false)
        } else {
            None
        }
    }
}
