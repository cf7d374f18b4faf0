use crate::config::{ConfigLayer, RunConfig};
use crate::env::{env_layer, EnvSource};
use crate::error::ConfigError;
use crate::loader::load_file_layer;
use crate::validate::validate_run_config;
use std::path::Path;

/// Every tier that went into a run configuration, kept for inspection.
#[derive(Debug, Clone)]
pub struct ResolvedLayers {
    pub defaults: ConfigLayer,
    pub file: Option<ConfigLayer>,
    pub env: ConfigLayer,
    pub cli: ConfigLayer,
    pub effective: RunConfig,
}

/// Merge defaults -> file -> environment -> CLI overrides.
pub fn resolve_layers(
    config_path: Option<&Path>,
    env: &dyn EnvSource,
    cli: ConfigLayer,
) -> Result<ResolvedLayers, ConfigError> {
    let defaults = ConfigLayer::defaults();
    let file = match config_path {
        Some(path) => load_file_layer(path)?,
        None => None,
    };
    let env = env_layer(env)?;

    let mut merged = defaults.clone();
    if let Some(file_cfg) = &file {
        merged.merge(file_cfg.clone());
    }
    merged.merge(env.clone());
    merged.merge(cli.clone());

    let effective = RunConfig::try_from(merged)?;
    validate_run_config(&effective)?;

    tracing::debug!(
        target_url = %effective.target_url,
        mode = %effective.scan_mode,
        file_layer = file.is_some(),
        "Resolved run configuration"
    );

    Ok(ResolvedLayers {
        defaults,
        file,
        env,
        cli,
        effective,
    })
}

pub fn resolve(
    config_path: Option<&Path>,
    env: &dyn EnvSource,
    cli: ConfigLayer,
) -> Result<RunConfig, ConfigError> {
    Ok(resolve_layers(config_path, env, cli)?.effective)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanMode;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_only() {
        let config = resolve(None, &env(&[]), ConfigLayer::default()).unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.output_dir, PathBuf::from("./reports"));
    }

    #[test]
    fn env_overrides_file_and_cli_overrides_env() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("vyoma.json");
        fs::write(
            &file_path,
            r#"{"target_url": "http://from-file", "scan_mode": "medium", "threshold_high": 1, "threshold_critical": 3}"#,
        )
        .unwrap();

        let environment = env(&[
            ("VYOMA_TARGET_URL", "http://from-env"),
            ("VYOMA_THRESHOLD_HIGH", "2"),
        ]);
        let cli = ConfigLayer {
            threshold_high: Some(7),
            ..Default::default()
        };

        let layers = resolve_layers(Some(&file_path), &environment, cli).unwrap();
        let config = &layers.effective;

        // file only
        assert_eq!(config.scan_mode, ScanMode::Medium);
        assert_eq!(config.threshold_critical, 3);
        // file + env -> env
        assert_eq!(config.target_url, "http://from-env");
        // file + env + cli -> cli
        assert_eq!(config.threshold_high, 7);
        assert!(layers.file.is_some());
    }

    #[test]
    fn missing_file_falls_through_to_env() {
        let dir = tempdir().unwrap();
        let config = resolve(
            Some(&dir.path().join("absent.json")),
            &env(&[("VYOMA_SCAN_MODE", "aggressive")]),
            ConfigLayer::default(),
        )
        .unwrap();
        assert_eq!(config.scan_mode, ScanMode::Aggressive);
    }

    #[test]
    fn malformed_file_fails_whole_resolution() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("vyoma.json");
        fs::write(&file_path, r#"{"threshold_high": "many"}"#).unwrap();

        let result = resolve(Some(&file_path), &env(&[]), ConfigLayer::default());
        assert!(matches!(result, Err(ConfigError::Json { .. })));
    }

    #[test]
    fn empty_target_after_merge_is_rejected() {
        let cli = ConfigLayer {
            target_url: Some("   ".to_string()),
            ..Default::default()
        };
        let err = resolve(None, &env(&[]), cli).unwrap_err();
        assert!(err.to_string().contains("target URL"));
    }
}
