// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Progress on stdout, warnings and errors on stderr; quiet mode keeps only results.

use crate::diagnostics::Diagnostics;
use std::time::Instant;

/// How chatty the CLI is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Progress lines plus results
    Normal,
    /// Results, warnings and errors only
    Quiet,
}

impl OutputMode {
    pub fn from_quiet(quiet: bool) -> Self {
        if quiet { Self::Quiet } else { Self::Normal }
    }
}

/// Prints progress and results for one command.
pub struct Output {
    mode: OutputMode,
    started: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            started: None,
        }
    }

    /// Time the rest of the command; the result line shows the duration.
    pub fn start_timer(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print the command's result. Always shown.
    pub fn success(&self, message: &str) {
        match self.started {
            Some(started) if self.mode == OutputMode::Normal => {
                println!("{message} ({:.1}s)", started.elapsed().as_secs_f64())
            }
            _ => println!("{message}"),
        }
    }

    pub fn warning(&self, message: &str) {
        eprintln!("Warning: {message}");
    }

    /// Print every warning a lifecycle operation recorded.
    pub fn warnings(&self, diag: &Diagnostics) {
        for warning in diag.warnings() {
            self.warning(&warning.message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("Error: {message}");
    }
}
