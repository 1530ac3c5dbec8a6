//! Types describing compute instances as reported by a provider.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime state of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    /// Booting.
    Pending,
    /// Up and running.
    Running,
    /// Shutting down before stop.
    Stopping,
    /// Stopped, can be started again.
    Stopped,
    /// Shutting down before termination.
    ShuttingDown,
    /// Gone for good.
    Terminated,
    /// State the provider reported but we do not recognise.
    #[serde(other)]
    Unknown,
}

impl InstanceState {
    /// Returns the provider's string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
            InstanceState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single key/value tag attached to an instance.
///
/// Tags are kept as a list rather than a map: raw provider data may carry the
/// same key more than once and classification must see every occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A compute instance snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Provider instance identifier.
    pub id: String,
    /// Region the instance lives in (e.g. "ap-southeast-2").
    pub region: String,
    /// Account/credential profile the instance was listed under.
    pub profile: String,
    /// State at the time the snapshot was taken.
    pub state: InstanceState,
    /// Raw tags, in provider order.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Instance {
    /// Create an untagged instance.
    pub fn new(
        id: impl Into<String>,
        region: impl Into<String>,
        profile: impl Into<String>,
        state: InstanceState,
    ) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
            profile: profile.into(),
            state,
            tags: Vec::new(),
        }
    }

    /// Append a tag (builder style).
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }
}

/// Current state of one instance, as returned by a status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceStatus {
    pub instance_id: String,
    pub state: InstanceState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_as_str() {
        assert_eq!(InstanceState::Running.as_str(), "running");
        assert_eq!(InstanceState::ShuttingDown.as_str(), "shutting-down");
        assert_eq!(InstanceState::Stopped.to_string(), "stopped");
    }

    #[test]
    fn test_state_deserialize_provider_names() {
        let state: InstanceState = serde_json::from_str("\"shutting-down\"").unwrap();
        assert_eq!(state, InstanceState::ShuttingDown);

        let state: InstanceState = serde_json::from_str("\"rebooting\"").unwrap();
        assert_eq!(state, InstanceState::Unknown);
    }

    #[test]
    fn test_instance_deserialize_without_tags() {
        let json = r#"{"id":"i-1","region":"us-east-1","profile":"prod","state":"running"}"#;
        let instance: Instance = serde_json::from_str(json).unwrap();
        assert_eq!(instance.id, "i-1");
        assert!(instance.tags.is_empty());
    }

    #[test]
    fn test_with_tag_preserves_order() {
        let instance = Instance::new("i-1", "r1", "p", InstanceState::Stopped)
            .with_tag("Stack", "web")
            .with_tag("Stack", "api");
        assert_eq!(instance.tags[0].value, "web");
        assert_eq!(instance.tags[1].value, "api");
    }
}
