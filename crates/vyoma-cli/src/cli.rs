use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vyoma_config::{ConfigLayer, ScanMode};

#[derive(Parser)]
#[command(name = "vyoma-ci")]
#[command(version)]
#[command(about = "CI/CD security gate for the Vyoma web scanner", long_about = None)]
pub struct Cli {
    /// Path to a JSON (or .toml) config file
    #[arg(long, short, global = true, env = "VYOMA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scanner and fail (exit 1) if findings exceed the thresholds
    Gate(GateArgs),
    /// Inspect and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Write a starter config file or CI pipeline definitions
    Init {
        /// Generate a pipeline for this CI platform instead of a config file
        #[arg(long, value_enum)]
        ci: Option<CiPlatform>,
        /// Target URL written into the generated config
        #[arg(long)]
        target_url: Option<String>,
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GateArgs {
    /// Target URL to scan
    #[arg(long)]
    pub target: Option<String>,
    /// Scan mode (basic, medium, aggressive)
    #[arg(long)]
    pub mode: Option<ScanMode>,
    /// Critical vulnerability threshold
    #[arg(long)]
    pub threshold_critical: Option<u32>,
    /// High vulnerability threshold
    #[arg(long)]
    pub threshold_high: Option<u32>,
    /// Directory the scanner writes its report into
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// Output format for the gate summary
    #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
    pub format: SummaryFormat,
    /// Also write the JSON summary to this file
    #[arg(long, value_name = "PATH")]
    pub summary_out: Option<PathBuf>,
}

impl GateArgs {
    /// Explicit overrides; flags that were not passed stay `None`.
    pub fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            target_url: self.target.clone(),
            scan_mode: self.mode,
            output_dir: self.output_dir.clone(),
            threshold_critical: self.threshold_critical,
            threshold_high: self.threshold_high,
            ..ConfigLayer::default()
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Resolve and validate the configuration
    Check,
    /// Print one configuration layer, or the merged result
    Dump {
        #[arg(long, value_enum)]
        layer: Option<ConfigLayerName>,
        #[arg(long, value_enum)]
        format: Option<ConfigFormat>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigLayerName {
    Defaults,
    File,
    Env,
    Effective,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Json,
    Toml,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CiPlatform {
    Github,
    Gitlab,
    Jenkins,
    All,
}
