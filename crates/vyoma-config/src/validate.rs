use crate::config::RunConfig;
use crate::error::ConfigError;

pub fn validate_run_config(config: &RunConfig) -> Result<(), ConfigError> {
    let target = config.target_url.trim();
    if target.is_empty() {
        return Err(ConfigError::Invalid(
            "target URL must not be empty".to_string(),
        ));
    }
    if target.chars().any(char::is_whitespace) {
        return Err(ConfigError::Invalid(format!(
            "target URL '{}' must not contain whitespace",
            config.target_url
        )));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(
            "output_dir must not be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "timeout_secs must be greater than 0".to_string(),
        ));
    }

    match config.scanner_command.first() {
        Some(program) if !program.trim().is_empty() => {}
        _ => {
            return Err(ConfigError::Invalid(
                "scanner_command must name an executable".to_string(),
            ))
        }
    }

    Ok(())
}
