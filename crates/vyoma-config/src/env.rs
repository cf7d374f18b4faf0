use crate::config::ConfigLayer;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_TARGET_URL: &str = "VYOMA_TARGET_URL";
pub const ENV_SCAN_MODE: &str = "VYOMA_SCAN_MODE";
pub const ENV_REPORT_FORMAT: &str = "VYOMA_REPORT_FORMAT";
pub const ENV_OUTPUT_DIR: &str = "VYOMA_OUTPUT_DIR";
pub const ENV_THRESHOLD_CRITICAL: &str = "VYOMA_THRESHOLD_CRITICAL";
pub const ENV_THRESHOLD_HIGH: &str = "VYOMA_THRESHOLD_HIGH";
pub const ENV_VERBOSE: &str = "VYOMA_VERBOSE";
pub const ENV_SCANNER_CMD: &str = "VYOMA_SCANNER_CMD";
pub const ENV_TIMEOUT_SECS: &str = "VYOMA_TIMEOUT_SECS";
pub const ENV_REPORT_LOCATOR: &str = "VYOMA_REPORT_LOCATOR";

pub const ALL_ENV_VARS: [&str; 10] = [
    ENV_TARGET_URL,
    ENV_SCAN_MODE,
    ENV_REPORT_FORMAT,
    ENV_OUTPUT_DIR,
    ENV_THRESHOLD_CRITICAL,
    ENV_THRESHOLD_HIGH,
    ENV_VERBOSE,
    ENV_SCANNER_CMD,
    ENV_TIMEOUT_SECS,
    ENV_REPORT_LOCATOR,
];

/// Read-only view of environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Build the environment tier. Empty values count as unset.
pub fn env_layer(env: &dyn EnvSource) -> Result<ConfigLayer, ConfigError> {
    let layer = ConfigLayer {
        target_url: read(env, ENV_TARGET_URL),
        scan_mode: parse(env, ENV_SCAN_MODE)?,
        report_format: parse(env, ENV_REPORT_FORMAT)?,
        output_dir: read(env, ENV_OUTPUT_DIR).map(PathBuf::from),
        threshold_critical: parse(env, ENV_THRESHOLD_CRITICAL)?,
        threshold_high: parse(env, ENV_THRESHOLD_HIGH)?,
        verbose: read(env, ENV_VERBOSE).map(|v| is_truthy(&v)),
        scanner_command: read(env, ENV_SCANNER_CMD)
            .map(|cmd| cmd.split_whitespace().map(str::to_string).collect()),
        timeout_secs: parse(env, ENV_TIMEOUT_SECS)?,
        report_locator: parse(env, ENV_REPORT_LOCATOR)?,
    };

    Ok(layer)
}

/// Variables behind the fields set in an environment tier, in declaration order.
pub fn variables_set(layer: &ConfigLayer) -> Vec<&'static str> {
    let set = [
        (ENV_TARGET_URL, layer.target_url.is_some()),
        (ENV_SCAN_MODE, layer.scan_mode.is_some()),
        (ENV_REPORT_FORMAT, layer.report_format.is_some()),
        (ENV_OUTPUT_DIR, layer.output_dir.is_some()),
        (ENV_THRESHOLD_CRITICAL, layer.threshold_critical.is_some()),
        (ENV_THRESHOLD_HIGH, layer.threshold_high.is_some()),
        (ENV_VERBOSE, layer.verbose.is_some()),
        (ENV_SCANNER_CMD, layer.scanner_command.is_some()),
        (ENV_TIMEOUT_SECS, layer.timeout_secs.is_some()),
        (ENV_REPORT_LOCATOR, layer.report_locator.is_some()),
    ];
    set.into_iter()
        .filter_map(|(var, present)| present.then_some(var))
        .collect()
}

fn read(env: &dyn EnvSource, var: &str) -> Option<String> {
    env.var(var).filter(|v| !v.trim().is_empty())
}

fn parse<T>(env: &dyn EnvSource, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(value) = read(env, var) else {
        return Ok(None);
    };

    value
        .trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::InvalidEnv {
            var,
            value: value.clone(),
            reason: e.to_string(),
        })
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
