use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Overrides use the `STACKCTL_` prefix and `__` between sections, e.g.
/// `STACKCTL_ORCHESTRATOR__POLL_INTERVAL_SECS=10`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("STACKCTL_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[orchestrator]
poll_interval_secs = 15

[regions]
us-east-1 = "https://ec2.us-east-1.amazonaws.com"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.orchestrator.poll_interval_secs, 15);
        assert_eq!(config.regions.len(), 1);
    }

    #[test]
    fn test_load_config_from_str_invalid() {
        let result = load_config_from_str("[orchestrator\npoll_interval_secs = 1");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[orchestrator]
max_poll_attempts = 20

[regions]
ap-southeast-2 = "https://ec2.ap-southeast-2.amazonaws.com"

[inventory]
path = "stack.json"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.orchestrator.max_poll_attempts, 20);
        assert_eq!(config.orchestrator.poll_interval_secs, 30);
        assert_eq!(
            config.regions.get("ap-southeast-2"),
            Some("https://ec2.ap-southeast-2.amazonaws.com")
        );
        assert_eq!(config.inventory.path.to_str(), Some("stack.json"));
    }
}
