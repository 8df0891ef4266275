//! Command-line interface for anomalo
//!
//! This module contains the argument definitions and command handlers.

mod args;
mod commands;
mod logging;

pub use args::{Cli, Command, InfoArgs, OutputFormat, ValidateArgs};
pub use commands::run_command;
pub use logging::LogLevel;
