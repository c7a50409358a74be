//! External command execution utilities.
//!
//! Provides a Builder-based API for running a long-lived command while
//! forwarding its combined output line by line, optionally under a PTY.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! let code = Cmd::new("wget")
//!     .args(["--spider", "https://example.com/"])
//!     .pty(true)
//!     .stream(|line| println!("{line}"))?;
//! ```

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use portable_pty::{CommandBuilder, NativePtySystem, PtySize, PtySystem};
use std::{
    ffi::{OsStr, OsString},
    io::Read,
    path::Path,
    process::{Command, Stdio},
    thread,
    time::Duration,
};

/// How often the PTY loop checks whether the child has exited.
const PTY_POLL: Duration = Duration::from_millis(50);

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default, Debug)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    use_pty: bool,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if !arg.is_empty() {
                self.args.push(arg.to_owned());
            }
        }
        self
    }

    /// Enable PTY (pseudo-terminal) mode.
    ///
    /// PTY allows commands to behave as if running in a real terminal,
    /// enabling progress bars. Output is already combined in this mode.
    pub fn pty(mut self, enable: bool) -> Self {
        self.use_pty = enable;
        self
    }

    /// Program name for messages (file name only).
    pub fn program_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .to_string()
    }

    /// Arguments as passed to the process.
    #[cfg(test)]
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Space-joined command line for display.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the command, handing every output line to `on_line` as it is
    /// produced, and return the exit code once the process has finished.
    ///
    /// A process killed by a signal reports `-1`. In PTY mode a bare `\r`
    /// also ends a line, which then keeps its trailing `\r` so the caller
    /// can redraw progress output in place.
    pub fn stream(self, on_line: impl FnMut(&str)) -> Result<i32> {
        if self.use_pty {
            self.stream_with_pty(on_line)
        } else {
            self.stream_piped(on_line)
        }
    }
}

impl Cmd {
    /// Stdout and stderr on separate pipes, merged into one channel.
    fn stream_piped(self, mut on_line: impl FnMut(&str)) -> Result<i32> {
        let name = self.program_name();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn `{name}`"))?;

        let (tx, rx) = channel::unbounded();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, false, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, false, tx.clone()));
        }
        drop(tx);

        // Ends once both pipes are closed
        for line in rx {
            on_line(&line);
        }
        for reader in readers {
            reader
                .join()
                .map_err(|_| anyhow::anyhow!("Failed to join output reader thread"))?;
        }

        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for `{name}`"))?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Execution with PTY support.
    fn stream_with_pty(self, mut on_line: impl FnMut(&str)) -> Result<i32> {
        let name = self.program_name();

        let mut cmd_builder = CommandBuilder::new(&self.program);
        cmd_builder.args(&self.args);

        let pty_system = NativePtySystem::default();
        let pair = pty_system.openpty(PtySize {
            rows: 24,
            cols: 120,
            pixel_width: 0,
            pixel_height: 0,
        })?;

        let mut child = pair
            .slave
            .spawn_command(cmd_builder)
            .with_context(|| format!("Failed to spawn `{name}`"))?;
        drop(pair.slave);

        let (tx, rx) = channel::unbounded();
        let reader = spawn_line_reader(pair.master.try_clone_reader()?, true, tx);

        // The master may not report EOF until it is dropped, so poll the
        // child instead of waiting for the channel to close.
        let status = loop {
            match rx.recv_timeout(PTY_POLL) {
                Ok(line) => on_line(&line),
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(status) = child.try_wait()? {
                        break status;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break child.wait()?,
            }
        };

        drop(pair.master);
        drain(&rx, &mut on_line);
        reader
            .join()
            .map_err(|_| anyhow::anyhow!("Failed to join output reader thread"))?;
        drain(&rx, &mut on_line);

        Ok(i32::try_from(status.exit_code()).unwrap_or(-1))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Read `source` line by line on a background thread.
///
/// A read error (the PTY master reports EIO once the child is gone) ends
/// the stream like EOF does.
fn spawn_line_reader<R>(
    mut source: R,
    split_cr: bool,
    tx: Sender<String>,
) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut splitter = LineSplitter::new(split_cr);
        let mut lines = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match source.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => splitter.push(&buf[..n], &mut lines),
            }
            for line in lines.drain(..) {
                if tx.send(line).is_err() {
                    return;
                }
            }
        }
        splitter.finish(&mut lines);
        for line in lines {
            if tx.send(line).is_err() {
                break;
            }
        }
    })
}

/// Splits child output into lines.
///
/// Bytes that are not valid UTF-8 are replaced and `\r\n` ends one line.
/// With `split_cr` a bare `\r` ends a line too and is kept at its end.
#[derive(Debug, Default)]
struct LineSplitter {
    split_cr: bool,
    pending: Vec<u8>,
    /// A `\r` was seen and the next byte decides what it ends.
    after_cr: bool,
}

impl LineSplitter {
    fn new(split_cr: bool) -> Self {
        Self {
            split_cr,
            ..Self::default()
        }
    }

    fn push(&mut self, bytes: &[u8], out: &mut Vec<String>) {
        for &byte in bytes {
            if self.after_cr {
                self.after_cr = false;
                if byte == b'\n' {
                    self.emit(false, out);
                    continue;
                }
                self.emit(true, out);
            }
            match byte {
                b'\n' => self.emit(false, out),
                b'\r' if self.split_cr => self.after_cr = true,
                _ => self.pending.push(byte),
            }
        }
    }

    fn finish(&mut self, out: &mut Vec<String>) {
        if self.after_cr {
            self.after_cr = false;
            self.emit(true, out);
        } else if !self.pending.is_empty() {
            self.emit(false, out);
        }
    }

    fn emit(&mut self, redraw: bool, out: &mut Vec<String>) {
        let mut line = String::from_utf8_lossy(&self.pending)
            .trim_end_matches('\r')
            .to_string();
        if redraw {
            line.push('\r');
        }
        self.pending.clear();
        out.push(line);
    }
}

fn drain(rx: &Receiver<String>, on_line: &mut impl FnMut(&str)) {
    for line in rx.try_iter() {
        on_line(&line);
    }
}

// ============================================================================
// Tests
// ============================================================================
