//! Region to endpoint resolution.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Maps region identifiers to the endpoint a controller should address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionMap(HashMap<String, String>);

impl RegionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping (builder style).
    pub fn with_region(mut self, region: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.0.insert(region.into(), endpoint.into());
        self
    }

    pub fn get(&self, region: &str) -> Option<&str> {
        self.0.get(region).map(String::as_str)
    }

    /// Endpoint for `region`, falling back to the region identifier itself.
    pub fn resolve<'a>(&'a self, region: &'a str) -> &'a str {
        match self.get(region) {
            Some(endpoint) => endpoint,
            None => {
                warn!("No endpoint configured for region {}, using region name", region);
                region
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(r, e)| (r.as_str(), e.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for RegionMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_configured_region() {
        let regions = RegionMap::new().with_region("us-east-1", "ec2.us-east-1.amazonaws.com");
        assert_eq!(regions.resolve("us-east-1"), "ec2.us-east-1.amazonaws.com");
    }

    #[test]
    fn test_resolve_falls_back_to_region() {
        let regions = RegionMap::new();
        assert_eq!(regions.resolve("eu-west-1"), "eu-west-1");
    }

    #[test]
    fn test_deserialize_from_toml_table() {
        let toml = r#"
            ap-southeast-2 = "ec2.ap-southeast-2.amazonaws.com"
            us-west-2 = "ec2.us-west-2.amazonaws.com"
        "#;
        let regions: RegionMap = toml::from_str(toml).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(
            regions.get("us-west-2"),
            Some("ec2.us-west-2.amazonaws.com")
        );
    }
}
