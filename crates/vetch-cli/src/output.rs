//! Terminal output formatting.
//!
//! Progress and result messages for humans go through this handler;
//! diagnostics go through `tracing`. Color is dropped when stdout is not
//! a terminal or `NO_COLOR` is set.

use std::io::IsTerminal;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colored: bool,
}

impl OutputHandler {
    /// Create a new output handler with color auto-detection
    pub fn new() -> Self {
        Self {
            colored: detect_color(),
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        println!("{}", self.paint("2", message));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", self.paint("32", "✓"), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("{} {}", self.paint("33", "⚠"), message);
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.paint("31", "✗"), message);
    }

    /// Print a step message with emoji
    pub fn step(&self, emoji: &str, message: &str) {
        println!("{} {}", emoji, message);
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.colored {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn detect_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}
