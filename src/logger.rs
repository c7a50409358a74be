//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro for messages only shown with `--verbose`
//! - `passthrough` for forwarding child process output untouched
//!
//! # Example
//!
//! ```ignore
//! log!("mirror"; "output directory: {}", output.display());
//! debug!("assets"; "could not localize {}: {}", url, err);
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// A progress redraw is on screen without its newline
static PARTIAL: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();
    end_partial(&mut stdout);

    // Child tools (wget progress bars) may leave a partial line behind
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Forward one line of child process output without a prefix.
///
/// A line ending in `\r` is a progress redraw: it is written without a
/// newline and replaced by whatever is printed next.
#[inline]
pub fn passthrough(line: &str) {
    let mut stdout = stdout().lock();
    end_partial(&mut stdout);
    match line.strip_suffix('\r') {
        Some(redraw) => {
            write!(stdout, "{redraw}").ok();
            PARTIAL.store(true, Ordering::SeqCst);
        }
        None => {
            writeln!(stdout, "{line}").ok();
        }
    }
    stdout.flush().ok();
}

/// Return to column 0 and clear a pending progress redraw.
fn end_partial(stdout: &mut impl Write) {
    if PARTIAL.swap(false, Ordering::SeqCst) {
        write!(stdout, "\r").ok();
        execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    }
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "mirror" => prefix.bright_blue().bold().to_string(),
        "spider" | "promote" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
