//! Console output
//!
//! Structured lines so the REPL can colour them and tools can consume them
//! as JSON.

use serde::{Deserialize, Serialize};

use crate::command::CommandResult;

/// Output level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl OutputLevel {
    /// ANSI colour code for this level
    pub fn color_code(&self) -> &'static str {
        match self {
            Self::Info => "\x1b[0m",
            Self::Warning => "\x1b[33m",
            Self::Error => "\x1b[31m",
            Self::Success => "\x1b[32m",
        }
    }

    /// Line prefix
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Info => "",
            Self::Warning => "[WARN]",
            Self::Error => "[ERROR]",
            Self::Success => "[OK]",
        }
    }
}

/// A single line of output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    level: OutputLevel,
    text: String,
}

impl OutputLine {
    pub fn new(level: OutputLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(OutputLevel::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(OutputLevel::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(OutputLevel::Error, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(OutputLevel::Success, text)
    }

    pub fn level(&self) -> OutputLevel {
        self.level
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Format for a terminal
    pub fn format_colored(&self) -> String {
        let prefix = self.level.prefix();
        let color = self.level.color_code();
        let reset = "\x1b[0m";

        if prefix.is_empty() {
            format!("{}{}{}", color, self.text, reset)
        } else {
            format!("{}{} {}{}", color, prefix, self.text, reset)
        }
    }

    /// Format without colours
    pub fn format_plain(&self) -> String {
        let prefix = self.level.prefix();
        if prefix.is_empty() {
            self.text.clone()
        } else {
            format!("{} {}", prefix, self.text)
        }
    }
}

impl std::fmt::Display for OutputLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_plain())
    }
}

/// Collected output of one console line
#[derive(Debug, Clone, Default)]
pub struct Output {
    lines: Vec<OutputLine>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_line(&mut self, line: OutputLine) {
        self.lines.push(line);
    }

    pub fn add_info(&mut self, text: impl Into<String>) {
        self.lines.push(OutputLine::info(text));
    }

    pub fn add_warning(&mut self, text: impl Into<String>) {
        self.lines.push(OutputLine::warning(text));
    }

    pub fn add_error(&mut self, text: impl Into<String>) {
        self.lines.push(OutputLine::error(text));
    }

    /// Append a command's message (as an error when it failed) and its lines
    pub fn add_result(&mut self, result: &CommandResult) {
        if let Some(message) = result.message() {
            if result.is_success() {
                self.add_info(message);
            } else {
                self.add_error(message);
            }
        }
        self.lines.extend(result.output_lines().iter().cloned());
    }

    pub fn lines(&self) -> &[OutputLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.lines.iter().any(|l| l.level == OutputLevel::Error)
    }

    pub fn format_colored(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.format_colored())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn format_plain(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.format_plain())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_plain())
    }
}
