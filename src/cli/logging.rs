//! Logging utilities for CLI output

/// Log level for CLI output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Suppress all output
    Quiet,
    /// Normal output level
    Normal,
    /// Verbose output with additional details
    Verbose,
}

impl LogLevel {
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    pub fn filter_directive(self) -> &'static str {
        match self {
            LogLevel::Quiet => "anomalo=error",
            LogLevel::Normal => "anomalo=warn",
            LogLevel::Verbose => "anomalo=debug",
        }
    }
}

/// Log a message if the current level permits it
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}
