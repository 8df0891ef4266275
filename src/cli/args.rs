//! Command-line arguments

use super::LogLevel;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Anomalo: anomaly-detection module pipelines
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "anomalo")]
#[command(version)]
#[command(about = "Build and inspect anomaly-detection pipelines from YAML")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Output level selected by the global flags.
    pub fn log_level(&self) -> LogLevel {
        if self.quiet {
            LogLevel::Quiet
        } else if self.verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Normal
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Build the configured pipeline and report whether it is valid
    Validate(ValidateArgs),

    /// Display the resolved pipeline of a configuration
    Info(InfoArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to the YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override a configuration value (dotted key, e.g. model.init_args.eps=0.01)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to the YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Override a configuration value (dotted key, e.g. model.init_args.eps=0.01)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,
}

/// Output format for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
    /// YAML
    Yaml,
}
