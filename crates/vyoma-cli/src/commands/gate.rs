use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::PathBuf;
use vyoma_gate::{Gate, GateDecision};

use crate::cli::{GateArgs, SummaryFormat};
use crate::config_loader::load_run_config;
use crate::output::formatter::print_summary;

/// Run the gate. Returns `Ok(true)` when the pipeline should fail.
pub fn gate(config_path: Option<&PathBuf>, args: &GateArgs, quiet: bool) -> Result<bool> {
    let text = args.format == SummaryFormat::Text;

    let decision = match load_run_config(config_path, args.overrides()) {
        Ok(config) => {
            if text && !quiet {
                println!("{}", "Starting Vyoma security scan in CI/CD pipeline...".blue());
                println!(
                    "{}",
                    format!("Target: {} (mode: {})", config.target_url, config.scan_mode).dimmed()
                );
            }
            Gate::new().decide(&config)
        }
        Err(e) => GateDecision::config_failure(e),
    };

    let json = decision
        .summary
        .to_json()
        .context("Failed to serialize gate summary")?;

    match args.format {
        SummaryFormat::Text => print_summary(&decision.summary, quiet),
        SummaryFormat::Json => println!("{}", json),
    }

    if let Some(path) = &args.summary_out {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, &json)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        tracing::debug!("Wrote gate summary to {}", path.display());
    }

    Ok(!decision.passed())
}
