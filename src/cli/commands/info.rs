//! Info command implementation

use super::{build_report, PipelineReport};
use crate::cli::args::{InfoArgs, OutputFormat};
use crate::cli::logging::log;
use crate::cli::LogLevel;

/// Render a report as human-readable text
pub fn format_report(report: &PipelineReport) -> String {
    let hparams = &report.hparams;
    let mut lines = vec![
        format!("Model: {}", hparams.model),
        format!("Learning type: {}", hparams.learning_type),
        format!("Pre-processor: {}", hparams.pre_processor),
        format!("Post-processor: {}", hparams.post_processor),
        format!("Evaluator: {}", hparams.evaluator),
        format!("Visualizer: {}", hparams.visualizer),
    ];
    match report.input_size {
        Some((height, width)) => lines.push(format!("Input size: {height}x{width}")),
        None => lines.push("Input size: unchanged".to_string()),
    }
    if let Some(epochs) = report.trainer.max_epochs {
        lines.push(format!("Max epochs: {epochs}"));
    }
    if !report.callbacks.is_empty() {
        lines.push(format!("Callbacks: {}", report.callbacks.join(", ")));
    }
    let models = report.available_models.join(", ");
    lines.push(format!("Available models: {models}"));
    lines.join("\n")
}

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let report = build_report(&args.config, &args.overrides)
        .map_err(|e| format!("Config error: {e}"))?;

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, "Pipeline Info:");
            println!();
            println!("{}", format_report(&report));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&report)
                .map_err(|e| format!("YAML serialization error: {e}"))?;
            println!("{yaml}");
        }
    }

    Ok(())
}
