use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;
use crate::provider::RegionMap;

/// Top-level configuration.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Region name to API endpoint.
    #[serde(default)]
    pub regions: RegionMap,
    #[serde(default)]
    pub inventory: InventoryConfig,
}

/// Location of the instance snapshot used by the file-backed provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default = "default_inventory_path")]
    pub path: PathBuf,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: default_inventory_path(),
        }
    }
}

fn default_inventory_path() -> PathBuf {
    PathBuf::from("inventory.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.orchestrator.poll_interval_secs, 30);
        assert_eq!(config.orchestrator.max_poll_attempts, 1000);
        assert!(config.regions.is_empty());
        assert_eq!(config.inventory.path, PathBuf::from("inventory.json"));
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[orchestrator]
poll_interval_secs = 5
max_poll_attempts = 12

[regions]
us-east-1 = "https://ec2.us-east-1.amazonaws.com"
eu-west-1 = "https://ec2.eu-west-1.amazonaws.com"

[inventory]
path = "/var/lib/stackctl/inventory.json"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.orchestrator.poll_interval_secs, 5);
        assert_eq!(config.orchestrator.max_poll_attempts, 12);
        assert_eq!(config.regions.len(), 2);
        assert_eq!(
            config.regions.get("eu-west-1"),
            Some("https://ec2.eu-west-1.amazonaws.com")
        );
        assert_eq!(
            config.inventory.path,
            PathBuf::from("/var/lib/stackctl/inventory.json")
        );
    }

    #[test]
    fn test_deserialize_partial_orchestrator_section() {
        let toml = r#"
[orchestrator]
max_poll_attempts = 3
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.orchestrator.poll_interval_secs, 30);
        assert_eq!(config.orchestrator.max_poll_attempts, 3);
    }

    #[test]
    fn test_deserialize_wrong_type_fails() {
        let toml = r#"
[orchestrator]
poll_interval_secs = "soon"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }
}
