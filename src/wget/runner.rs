//! Building and running a wget job.

use std::io::{IsTerminal, stdout};
use std::path::Path;

use crate::error::{MirrorError, Result};
use crate::logger;
use crate::utils::exec::Cmd;
use crate::{debug, log};

/// One wget invocation.
#[derive(Debug, Clone, Copy)]
pub struct WgetJob<'a> {
    pub tool: &'a Path,
    pub url: &'a str,
    pub reject: &'a str,
    /// Directory prefix (`-P`) the mirror is written under.
    pub out_dir: &'a Path,
    /// Link check only; nothing is saved.
    pub spider: bool,
}

/// Full wget command line for a job.
pub fn wget_command(job: &WgetJob<'_>) -> Cmd {
    Cmd::new(job.tool)
        .args([
            "--mirror",
            "--convert-links",
            "--adjust-extension",
            "--page-requisites",
            "--no-parent",
            "--restrict-file-names=windows",
        ])
        .arg(format!("--reject-regex={}", job.reject))
        .arg("-P")
        .arg(job.out_dir)
        .arg("-nH")
        .args(job.spider.then_some("--spider"))
        .arg(job.url)
}

/// Run a job, forwarding wget's output as it is produced.
///
/// A non-zero exit becomes [`MirrorError::ExternalProcess`] carrying the
/// code.
pub fn run_wget(job: &WgetJob<'_>) -> Result<()> {
    let phase = if job.spider { "spider" } else { "mirror" };
    let cmd = wget_command(job).pty(stdout().is_terminal());
    let tool = cmd.program_name();

    log!(phase; "{}", job.url);
    debug!(phase; "{}", cmd.command_line());

    let code = cmd
        .stream(logger::passthrough)
        .map_err(|source| MirrorError::Spawn {
            tool: tool.clone(),
            source,
        })?;

    if code != 0 {
        return Err(MirrorError::ExternalProcess { tool, code });
    }
    Ok(())
}
