//! Process-wide run mode and the per-call context that carries it.
//!
//! Two switches affect every mutating call: dry-run (show a diff instead of
//! writing) and exit-on-error (terminate instead of returning the error).
//! They are set explicitly through [`set_dry_run`] and [`set_exit_on_error`];
//! nothing is read from the environment. [`Context::from_process`] takes a
//! snapshot at the start of a call.

use crate::diff::Preview;
use colored::Colorize;
use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::sync::atomic::{AtomicBool, Ordering};

static DRY_RUN: AtomicBool = AtomicBool::new(false);
static EXIT_ON_ERROR: AtomicBool = AtomicBool::new(false);

/// Toggle process-wide dry-run mode.
///
/// While enabled no file is created or rewritten; previews are written to
/// stderr instead.
pub fn set_dry_run(state: bool) {
    DRY_RUN.store(state, Ordering::SeqCst);
}

pub fn dry_run() -> bool {
    DRY_RUN.load(Ordering::SeqCst)
}

/// Toggle process-wide exit-on-error mode.
///
/// While enabled a failing call prints its error to stderr and exits the
/// process with status 1.
pub fn set_exit_on_error(state: bool) {
    EXIT_ON_ERROR.store(state, Ordering::SeqCst);
}

pub fn exit_on_error() -> bool {
    EXIT_ON_ERROR.load(Ordering::SeqCst)
}

/// Run mode for file-level calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    /// Suppress writes and emit previews.
    pub dry_run: bool,
    /// Turn returned errors into process exit.
    pub exit_on_error: bool,
    /// Keep previews out of the diagnostic stream (they are still returned).
    pub quiet: bool,
}

impl Context {
    /// Write-enabled context that returns errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the process-wide switches.
    pub fn from_process() -> Self {
        Self {
            dry_run: dry_run(),
            exit_on_error: exit_on_error(),
            quiet: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_exit_on_error(mut self, exit_on_error: bool) -> Self {
        self.exit_on_error = exit_on_error;
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Write a preview to stderr unless this context is quiet.
    pub fn emit(&self, preview: &Preview) {
        if self.quiet {
            return;
        }
        let color = io::stderr().is_terminal();
        eprint!("{}", preview.render(color));
    }

    /// Apply the exit-on-error policy to `result`.
    ///
    /// Returns `result` untouched unless exit-on-error is enabled and it is
    /// an error, in which case the process terminates.
    pub fn or_exit<T, E: Display>(&self, result: Result<T, E>) -> Result<T, E> {
        match result {
            Err(err) if self.exit_on_error => {
                eprintln!("{} {}", "error:".red().bold(), err);
                std::process::exit(1);
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_writes_and_returns_errors() {
        let ctx = Context::new();
        assert!(!ctx.dry_run);
        assert!(!ctx.exit_on_error);
        assert!(!ctx.quiet);
    }

    #[test]
    fn test_builder() {
        let ctx = Context::new()
            .with_dry_run(true)
            .with_exit_on_error(true)
            .quiet();
        assert!(ctx.dry_run && ctx.exit_on_error && ctx.quiet);
    }

    #[test]
    fn test_or_exit_passes_through_when_disabled() {
        let ctx = Context::new();
        let ok: Result<u8, String> = Ok(1);
        assert_eq!(ctx.or_exit(ok), Ok(1));
        let err: Result<u8, String> = Err("boom".to_string());
        assert_eq!(ctx.or_exit(err), Err("boom".to_string()));
    }

    #[test]
    fn test_or_exit_passes_ok_through_when_enabled() {
        let ctx = Context::new().with_exit_on_error(true);
        let ok: Result<u8, String> = Ok(7);
        assert_eq!(ctx.or_exit(ok), Ok(7));
    }
}
