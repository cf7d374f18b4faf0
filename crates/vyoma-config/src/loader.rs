use crate::config::ConfigLayer;
use crate::error::ConfigError;
use std::fs;
use std::path::Path;

/// Load the file tier. A path that does not exist yields `Ok(None)`; a file
/// that exists but cannot be read or parsed is an error.
pub fn load_file_layer(path: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    if !path.exists() {
        tracing::warn!(
            "Config file {} not found, continuing with environment and defaults",
            path.display()
        );
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let layer = if is_toml(path) {
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?
    };

    tracing::debug!("Loaded config file {}", path.display());
    Ok(Some(layer))
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}
