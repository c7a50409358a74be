//! sitemirror - Mirror a website into an offline snapshot with wget.

mod asset;
mod cli;
mod config;
mod error;
mod logger;
mod pipeline;
mod snapshot;
mod utils;
mod wget;

use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use cli::Cli;
use config::MirrorConfig;
use error::Result;
use pipeline::Pipeline;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log!("error"; "{}", e.report());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = MirrorConfig::load(cli)?;
    let layout = config.layout();
    if let Some(path) = &config.config_path {
        debug!("mirror"; "config: {}", path.display());
    }
    debug!("mirror"; "root: {}", config.root.display());
    log!("mirror"; "output: {}", layout.current.display());

    let tool = wget::find_wget(&config.root, config.mirror.wget.as_deref())?;
    Pipeline::new(&config, tool).run()
}
