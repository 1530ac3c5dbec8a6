use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Poll interval is not 0
/// - No region maps to an empty endpoint
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.orchestrator.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.poll_interval_secs cannot be 0".to_string(),
        ));
    }

    if let Some((region, _)) = config
        .regions
        .iter()
        .find(|(_, endpoint)| endpoint.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(format!(
            "regions.{} has an empty endpoint",
            region
        )));
    }

    Ok(())
}
