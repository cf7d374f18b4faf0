use anyhow::Result;
use std::path::PathBuf;
use vyoma_config::{variables_set, ConfigLayer};

use crate::cli::{ConfigFormat, ConfigLayerName};
use crate::config_loader::load_config_layers;

/// Validate the resolved configuration. Returns `Ok(true)` if it is unusable.
pub fn check(config_path: Option<&PathBuf>) -> Result<bool> {
    println!("🔍 Validating configuration...");

    let layers = match load_config_layers(config_path, ConfigLayer::default()) {
        Ok(layers) => layers,
        Err(e) => {
            println!("❌ {}", e);
            return Ok(true);
        }
    };
    let config = &layers.effective;

    println!("✅ Configuration is valid.");
    match (config_path, &layers.file) {
        (Some(path), Some(_)) => println!("   - Config file: {}", path.display()),
        (Some(path), None) => println!("   - Config file: {} (not found, skipped)", path.display()),
        (None, _) => println!("   - Config file: (none)"),
    }
    let env_set = variables_set(&layers.env);
    if !env_set.is_empty() {
        println!("   - Environment overrides: {}", env_set.join(", "));
    }
    println!("   - Target: {} (mode: {})", config.target_url, config.scan_mode);
    println!(
        "   - Thresholds: {} critical, {} high",
        config.threshold_critical, config.threshold_high
    );
    println!("   - Output dir: {}", config.output_dir.display());
    println!("   - Scanner: {}", config.scanner_command.join(" "));
    println!("   - Timeout: {}s", config.timeout_secs);

    if !config.report_format.is_json() {
        println!(
            "\n⚠️  report_format '{}' cannot be evaluated; `gate` will refuse to run.",
            config.report_format
        );
        return Ok(true);
    }

    Ok(false)
}

pub fn dump(
    explicit_path: Option<&PathBuf>,
    layer: Option<ConfigLayerName>,
    format: Option<ConfigFormat>,
) -> Result<()> {
    let layers = load_config_layers(explicit_path, ConfigLayer::default())?;
    let fmt = format.unwrap_or(ConfigFormat::Json);

    let rendered = match layer.unwrap_or(ConfigLayerName::Effective) {
        ConfigLayerName::Defaults => render(&layers.defaults, fmt)?,
        ConfigLayerName::File => match &layers.file {
            Some(file) => render(file, fmt)?,
            None => {
                println!("(no config for this layer)");
                return Ok(());
            }
        },
        ConfigLayerName::Env => {
            if layers.env.is_empty() {
                println!("(no config for this layer)");
                return Ok(());
            }
            render(&layers.env, fmt)?
        }
        ConfigLayerName::Effective => render(&layers.effective, fmt)?,
    };

    println!("{rendered}");
    Ok(())
}

fn render<T: serde::Serialize>(value: &T, format: ConfigFormat) -> Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(value)?,
        ConfigFormat::Toml => toml::to_string_pretty(value)?,
    })
}
