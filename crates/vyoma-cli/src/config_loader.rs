use std::path::PathBuf;
use vyoma_config::{ConfigError, ConfigLayer, ProcessEnv, ResolvedLayers, RunConfig};

/// Resolve every layer against the real process environment.
pub fn load_config_layers(
    explicit_path: Option<&PathBuf>,
    overrides: ConfigLayer,
) -> Result<ResolvedLayers, ConfigError> {
    vyoma_config::resolve_layers(explicit_path.map(PathBuf::as_path), &ProcessEnv, overrides)
}

pub fn load_run_config(
    explicit_path: Option<&PathBuf>,
    overrides: ConfigLayer,
) -> Result<RunConfig, ConfigError> {
    Ok(load_config_layers(explicit_path, overrides)?.effective)
}
