//! Centralized shell output.
//!
//! The Shell provides a unified API for CLI output:
//! - Status messages with consistent formatting
//! - Spinners for long package manager runs (via indicatif)
//! - JSON output mode for machine-readable output
//!
//! Human and JSON output are mutually exclusive: in JSON mode only the
//! command's result document is written, to stdout.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

/// Shell output mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    /// Human-readable output with optional colors and spinners.
    Human {
        verbosity: Verbosity,
        color: ColorChoice,
    },
    /// Machine-readable JSON output only.
    Json,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
        }
    }
}

/// Output verbosity level (Human mode only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Normal,
    /// --verbose: no spinners, debug logging
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    Never,
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Added,
    Upgraded,
    Synced,
    Committed,

    // In-progress statuses (cyan)
    Scanning,
    Probing,

    // Info statuses (blue/default)
    Info,

    // Warning statuses (yellow)
    Warning,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Added => "Added",
            Status::Upgraded => "Upgraded",
            Status::Synced => "Synced",
            Status::Committed => "Committed",
            Status::Scanning => "Scanning",
            Status::Probing => "Probing",
            Status::Info => "Info",
            Status::Warning => "Warning",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Added | Status::Upgraded | Status::Synced | Status::Committed => "\x1b[1;32m",
            Status::Scanning | Status::Probing => "\x1b[1;36m",
            Status::Info => "\x1b[1;34m",
            Status::Warning => "\x1b[1;33m",
        }
    }
}

/// Width the status verb is right-aligned to.
const STATUS_WIDTH: usize = 12;

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    mode: ShellMode,
    use_color: bool,
}

impl Shell {
    pub fn new(mode: ShellMode) -> Self {
        let use_color = match &mode {
            ShellMode::Json => false,
            ShellMode::Human { color, .. } => match color {
                ColorChoice::Auto => io::stderr().is_terminal(),
                ColorChoice::Never => false,
            },
        };

        Shell { mode, use_color }
    }

    /// Create a shell from CLI flags. JSON mode takes precedence over verbose.
    pub fn from_flags(verbose: bool, color: ColorChoice, json: bool) -> Self {
        let mode = if json {
            ShellMode::Json
        } else {
            let verbosity = if verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Normal
            };
            ShellMode::Human { verbosity, color }
        };

        Shell::new(mode)
    }

    pub fn is_verbose(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Verbose,
                ..
            }
        )
    }

    pub fn is_json(&self) -> bool {
        matches!(self.mode, ShellMode::Json)
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message to stderr.
    ///
    /// Format: `{status:>12} {message}`. Ignored in JSON mode.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_json() {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Print command output to stdout. Ignored in JSON mode.
    pub fn print(&self, msg: impl Display) {
        if self.is_json() {
            return;
        }
        println!("{}", msg);
    }

    /// Print a result document as a single JSON line on stdout.
    ///
    /// Only works in JSON mode; silently ignored in human mode.
    pub fn json<T: Serialize>(&self, value: &T) -> Result<()> {
        if !self.is_json() {
            return Ok(());
        }
        let line = serde_json::to_string(value)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
        Ok(())
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();

        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }

    /// Start a spinner for a long-running step.
    ///
    /// In verbose or JSON mode the spinner is a no-op and the message is
    /// printed as a plain status line instead (verbose only).
    pub fn spinner(&self, status: Status, msg: impl Display) -> Spinner {
        let msg = msg.to_string();
        if self.is_json() {
            return Spinner { pb: None };
        }
        if self.is_verbose() || !io::stderr().is_terminal() {
            self.status(status, &msg);
            return Spinner { pb: None };
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("{} {}", status.as_str(), msg));
        pb.enable_steady_tick(Duration::from_millis(100));
        Spinner { pb: Some(pb) }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}

/// Spinner handle; cleared when finished or dropped.
pub struct Spinner {
    pb: Option<ProgressBar>,
}

impl Spinner {
    pub fn finish(self) {}
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_modes() {
        let shell = Shell::new(ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Never,
        });
        assert!(!shell.is_verbose());
        assert!(!shell.is_json());
        assert!(!shell.use_color());

        let json_shell = Shell::new(ShellMode::Json);
        assert!(json_shell.is_json());
    }

    #[test]
    fn test_status_formatting() {
        let shell = Shell::new(ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Never,
        });

        let formatted = shell.format_status(Status::Synced);
        assert_eq!(formatted.trim(), "Synced");
        assert_eq!(formatted.len(), 12);
    }

    #[test]
    fn test_from_flags() {
        let shell = Shell::from_flags(true, ColorChoice::Never, false);
        assert!(shell.is_verbose());

        // JSON takes precedence
        let shell = Shell::from_flags(true, ColorChoice::Auto, true);
        assert!(shell.is_json());
        assert!(!shell.is_verbose());
    }

    #[test]
    fn test_spinner_is_noop_in_json_mode() {
        let shell = Shell::new(ShellMode::Json);
        let spinner = shell.spinner(Status::Probing, "left-pad");
        assert!(spinner.pb.is_none());
        spinner.finish();
    }
}
