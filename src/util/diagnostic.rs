//! User-friendly diagnostic messages.
//!
//! Every rejection carries the offending package, what was expected, and
//! at least one way forward.

use std::fmt;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// No manifest path was configured.
    pub const NO_MANIFEST: &str =
        "help: pass --manifest or set `[manifest] path` in .ern/config.toml";

    /// No platform version was configured.
    pub const NO_PLATFORM_VERSION: &str =
        "help: pass --platform-version or set `[manifest] platform-version` in .ern/config.toml";

    /// The descriptor is not recorded in the cauldron.
    pub const UNKNOWN_APP: &str = "help: run `ern cauldron sync <descriptor>` to create it";

    /// The working directory is not a module.
    pub const NOT_A_MODULE: &str = "help: run this command from a mini-app directory";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = match (color, self.severity) {
            (true, Severity::Error) => "\x1b[1;31merror\x1b[0m",
            (true, Severity::Warning) => "\x1b[1;33mwarning\x1b[0m",
            (false, Severity::Error) => "error",
            (false, Severity::Warning) => "warning",
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("version mismatch for `react-native`")
            .with_context("requested: 0.60.0")
            .with_context("manifest: 0.59.0")
            .with_suggestion("Use `react-native@0.59.0`")
            .with_suggestion("Omit the version");

        let output = diag.format(false);
        assert!(output.starts_with("error: version mismatch"));
        assert!(output.contains("= requested: 0.60.0"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("2. Omit the version"));
    }

    #[test]
    fn test_warning_colored() {
        let output = Diagnostic::warning("stale cache").format(true);
        assert!(output.contains("\x1b[1;33mwarning"));
    }
}
