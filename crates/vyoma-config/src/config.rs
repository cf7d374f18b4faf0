use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_TARGET_URL: &str = "http://localhost";
pub const DEFAULT_OUTPUT_DIR: &str = "./reports";
pub const DEFAULT_THRESHOLD_CRITICAL: u32 = 0;
pub const DEFAULT_THRESHOLD_HIGH: u32 = 5;
/// One hour, measured from scanner launch.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;

pub fn default_scanner_command() -> Vec<String> {
    vec!["python3".to_string(), "vyoma.py".to_string()]
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")] // "basic", "medium", "aggressive"
pub enum ScanMode {
    #[default]
    Basic,
    Medium,
    Aggressive,
}

impl ScanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Basic => "basic",
            ScanMode::Medium => "medium",
            ScanMode::Aggressive => "aggressive",
        }
    }

    /// Scanner flag selecting this mode, e.g. `--aggressive`.
    pub fn flag(&self) -> String {
        format!("--{}", self.as_str())
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(ScanMode::Basic),
            "medium" => Ok(ScanMode::Medium),
            "aggressive" => Ok(ScanMode::Aggressive),
            other => Err(format!(
                "unknown scan mode '{}'. Must be one of: basic, medium, aggressive",
                other
            )),
        }
    }
}

/// Report format requested from the scanner. Only `json` can be evaluated by
/// the gate; anything else is passed through verbatim.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
#[serde(try_from = "String", into = "String")]
pub enum ReportFormat {
    #[default]
    Json,
    Other(String),
}

impl ReportFormat {
    pub fn as_str(&self) -> &str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Other(name) => name,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, ReportFormat::Json)
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        match name.as_str() {
            "" => Err("report format must not be empty".to_string()),
            "json" => Ok(ReportFormat::Json),
            _ => Ok(ReportFormat::Other(name)),
        }
    }
}

impl TryFrom<String> for ReportFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReportFormat> for String {
    fn from(format: ReportFormat) -> Self {
        format.as_str().to_string()
    }
}

/// How the gate finds the report the scanner wrote.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LocatorStrategy {
    /// Well-known name, then timestamp probe, then newest matching file.
    #[default]
    Auto,
    WellKnown,
    Timestamp,
    Latest,
}

impl LocatorStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocatorStrategy::Auto => "auto",
            LocatorStrategy::WellKnown => "well-known",
            LocatorStrategy::Timestamp => "timestamp",
            LocatorStrategy::Latest => "latest",
        }
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocatorStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(LocatorStrategy::Auto),
            "well-known" | "wellknown" | "fixed" => Ok(LocatorStrategy::WellKnown),
            "timestamp" | "mtime" => Ok(LocatorStrategy::Timestamp),
            "latest" | "newest" => Ok(LocatorStrategy::Latest),
            other => Err(format!(
                "unknown report locator '{}'. Must be one of: auto, well-known, timestamp, latest",
                other
            )),
        }
    }
}

/// One tier of configuration. Every field is optional; a `Some` value in a
/// higher tier replaces the value below it.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_mode: Option<ScanMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_format: Option<ReportFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_critical: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_high: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanner_command: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_locator: Option<LocatorStrategy>,
}

impl ConfigLayer {
    /// Built-in defaults as a fully populated layer.
    pub fn defaults() -> Self {
        Self {
            target_url: Some(DEFAULT_TARGET_URL.to_string()),
            scan_mode: Some(ScanMode::default()),
            report_format: Some(ReportFormat::default()),
            output_dir: Some(PathBuf::from(DEFAULT_OUTPUT_DIR)),
            threshold_critical: Some(DEFAULT_THRESHOLD_CRITICAL),
            threshold_high: Some(DEFAULT_THRESHOLD_HIGH),
            verbose: Some(false),
            scanner_command: Some(default_scanner_command()),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            report_locator: Some(LocatorStrategy::default()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &ConfigLayer::default()
    }

    pub fn merge(&mut self, other: ConfigLayer) {
        // Scalars: override if other has value
        if let Some(val) = other.target_url {
            self.target_url = Some(val);
        }
        if let Some(val) = other.scan_mode {
            self.scan_mode = Some(val);
        }
        if let Some(val) = other.report_format {
            self.report_format = Some(val);
        }
        if let Some(val) = other.output_dir {
            self.output_dir = Some(val);
        }
        if let Some(val) = other.threshold_critical {
            self.threshold_critical = Some(val);
        }
        if let Some(val) = other.threshold_high {
            self.threshold_high = Some(val);
        }
        if let Some(val) = other.verbose {
            self.verbose = Some(val);
        }
        // The command is replaced as a whole, never appended to.
        if let Some(val) = other.scanner_command {
            self.scanner_command = Some(val);
        }
        if let Some(val) = other.timeout_secs {
            self.timeout_secs = Some(val);
        }
        if let Some(val) = other.report_locator {
            self.report_locator = Some(val);
        }
    }
}

/// Fully resolved configuration for a single gate run.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub target_url: String,
    pub scan_mode: ScanMode,
    pub report_format: ReportFormat,
    pub output_dir: PathBuf,
    pub threshold_critical: u32,
    pub threshold_high: u32,
    pub verbose: bool,
    pub scanner_command: Vec<String>,
    pub timeout_secs: u64,
    pub report_locator: LocatorStrategy,
}

impl RunConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            scan_mode: ScanMode::default(),
            report_format: ReportFormat::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            threshold_critical: DEFAULT_THRESHOLD_CRITICAL,
            threshold_high: DEFAULT_THRESHOLD_HIGH,
            verbose: false,
            scanner_command: default_scanner_command(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            report_locator: LocatorStrategy::default(),
        }
    }
}

impl TryFrom<ConfigLayer> for RunConfig {
    type Error = ConfigError;

    fn try_from(layer: ConfigLayer) -> Result<Self, Self::Error> {
        fn require<T>(value: Option<T>, field: &str) -> Result<T, ConfigError> {
            value.ok_or_else(|| ConfigError::Invalid(format!("'{}' is not set", field)))
        }

        Ok(Self {
            target_url: require(layer.target_url, "target_url")?,
            scan_mode: require(layer.scan_mode, "scan_mode")?,
            report_format: require(layer.report_format, "report_format")?,
            output_dir: require(layer.output_dir, "output_dir")?,
            threshold_critical: require(layer.threshold_critical, "threshold_critical")?,
            threshold_high: require(layer.threshold_high, "threshold_high")?,
            verbose: require(layer.verbose, "verbose")?,
            scanner_command: require(layer.scanner_command, "scanner_command")?,
            timeout_secs: require(layer.timeout_secs, "timeout_secs")?,
            report_locator: require(layer.report_locator, "report_locator")?,
        })
    }
}
