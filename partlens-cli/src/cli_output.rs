// ABOUTME: Centralized CLI output utilities for consistent user-facing messages
// ABOUTME: Formats errors with help text, warnings, info and success lines on stderr

use owo_colors::OwoColorize;
use partlens_sdk::PartlensError;
use std::io::IsTerminal;

pub struct CliOutput {
    use_color: bool,
}

impl CliOutput {
    /// Create new CLI output utility with TTY detection
    pub fn new() -> Self {
        Self {
            use_color: std::io::stderr().is_terminal(),
        }
    }

    pub fn with_color(use_color: bool) -> Self {
        Self { use_color }
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    pub fn error(&self, message: &str) {
        eprintln!("{}", self.label("error:", message, Tone::Error));
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{}", self.label("warning:", message, Tone::Warning));
    }

    pub fn info(&self, message: &str) {
        eprintln!("{}", self.label("info:", message, Tone::Info));
    }

    pub fn success(&self, message: &str) {
        eprintln!("{}", self.label("success:", message, Tone::Success));
    }

    /// Report a failed command, preferring the SDK's user-facing wording
    pub fn failure(&self, err: &anyhow::Error) {
        for line in failure_lines(err) {
            match line {
                FailureLine::Message(message) => self.error(&message),
                FailureLine::Help(help) => self.hint(help),
            }
        }
    }

    fn hint(&self, help: &str) {
        if self.use_color {
            eprintln!("  {}", help.dimmed());
        } else {
            eprintln!("  {}", help);
        }
    }

    fn label(&self, label: &str, message: &str, tone: Tone) -> String {
        if !self.use_color {
            return format!("{} {}", label, message);
        }
        let label = match tone {
            Tone::Error => label.red().bold().to_string(),
            Tone::Warning => label.yellow().bold().to_string(),
            Tone::Info => label.blue().bold().to_string(),
            Tone::Success => label.green().bold().to_string(),
        };
        format!("{} {}", label, message)
    }
}

impl Default for CliOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
enum Tone {
    Error,
    Warning,
    Info,
    Success,
}

#[derive(Debug, PartialEq)]
enum FailureLine {
    Message(String),
    Help(&'static str),
}

fn failure_lines(err: &anyhow::Error) -> Vec<FailureLine> {
    match err.downcast_ref::<PartlensError>() {
        Some(sdk_err) => {
            let mut lines = vec![FailureLine::Message(sdk_err.user_message())];
            if let Some(help) = sdk_err.help_text() {
                lines.push(FailureLine::Help(help));
            }
            lines
        }
        None => vec![FailureLine::Message(format!("{:#}", err))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_cli_output_creation() {
        let _cli = CliOutput::new();
        assert!(CliOutput::with_color(true).use_color());
        assert!(!CliOutput::with_color(false).use_color());
    }

    #[test]
    fn test_plain_labels() {
        let cli = CliOutput::with_color(false);
        assert_eq!(cli.label("error:", "boom", Tone::Error), "error: boom");
        assert_eq!(cli.label("warning:", "careful", Tone::Warning), "warning: careful");
    }

    #[test]
    fn test_failure_lines_for_sdk_errors() {
        let err = anyhow::Error::new(PartlensError::Http {
            status: 401,
            message: "Incorrect API key provided".to_string(),
        });

        let lines = failure_lines(&err);
        assert_eq!(lines[0], FailureLine::Message("Invalid API key.".to_string()));
        assert!(matches!(lines[1], FailureLine::Help(help) if help.contains("api-keys")));
    }

    #[test]
    fn test_failure_lines_keep_context_chain() {
        let err = std::fs::read("/definitely/missing/partlens.toml")
            .context("Failed to read config file")
            .unwrap_err();

        let lines = failure_lines(&err);
        assert_eq!(lines.len(), 1);
        match &lines[0] {
            FailureLine::Message(message) => {
                assert!(message.starts_with("Failed to read config file: "))
            }
            other => panic!("unexpected line {other:?}"),
        }
    }

    #[test]
    fn test_message_formatting() {
        let cli = CliOutput::with_color(false);
        cli.error("test error");
        cli.warning("test warning");
        cli.info("test info");
        cli.success("test success");
    }
}
