//! Validate command implementation

use super::{build_report, PipelineReport};
use crate::cli::args::ValidateArgs;
use crate::cli::logging::log;
use crate::cli::LogLevel;

/// Format the component slots of a report as a string
pub fn format_components(report: &PipelineReport) -> String {
    let hparams = &report.hparams;
    [
        format!("  Pre-processor: {}", hparams.pre_processor),
        format!("  Post-processor: {}", hparams.post_processor),
        format!("  Evaluator: {}", hparams.evaluator),
        format!("  Visualizer: {}", hparams.visualizer),
    ]
    .join("\n")
}

/// Format the merged trainer arguments as a string
pub fn format_trainer(report: &PipelineReport) -> String {
    let trainer = &report.trainer;
    let mut lines = Vec::new();
    if let Some(epochs) = trainer.max_epochs {
        lines.push(format!("  Max epochs: {epochs}"));
    }
    if let Some(steps) = trainer.num_sanity_val_steps {
        lines.push(format!("  Sanity validation steps: {steps}"));
    }
    if let Some(clip) = trainer.gradient_clip_val {
        lines.push(format!("  Gradient clipping: {clip}"));
    }
    if let Some(devices) = trainer.devices {
        lines.push(format!("  Devices: {devices}"));
    }
    if lines.is_empty() {
        lines.push("  (trainer defaults)".to_string());
    }
    lines.join("\n")
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Validating configuration: {}", args.config.display()),
    );

    let report = build_report(&args.config, &args.overrides)
        .map_err(|e| format!("{e}"))?;

    log(level, LogLevel::Normal, "✓ Configuration is valid");
    log(
        level,
        LogLevel::Normal,
        &format!(
            "  Model: {} ({})",
            report.hparams.model, report.hparams.learning_type
        ),
    );
    log(level, LogLevel::Verbose, &format_components(&report));
    log(level, LogLevel::Verbose, "  Trainer:");
    log(level, LogLevel::Verbose, &format_trainer(&report));

    Ok(())
}
