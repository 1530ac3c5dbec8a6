//! Tag classification.

use serde::Serialize;

use super::types::Instance;

pub const TAG_NAME: &str = "Name";
pub const TAG_STACK: &str = "Stack";
pub const TAG_ENVIRONMENT: &str = "Environment";
pub const TAG_START_ORDER: &str = "StartOrder";
pub const TAG_STOP_ORDER: &str = "StopOrder";

/// Semantic fields extracted from an instance's tags.
///
/// A missing tag is an empty string, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstanceTags {
    pub environment: String,
    pub stack: String,
    pub name: String,
    pub start_order: String,
    pub stop_order: String,
}

/// Classify an instance by scanning its tags once.
///
/// Keys are matched case-sensitively and unknown keys are ignored. When a
/// recognised key appears more than once the last occurrence wins.
pub fn classify(instance: &Instance) -> InstanceTags {
    let mut tags = InstanceTags::default();
    for tag in &instance.tags {
        let slot = match tag.key.as_str() {
            TAG_NAME => &mut tags.name,
            TAG_STACK => &mut tags.stack,
            TAG_ENVIRONMENT => &mut tags.environment,
            TAG_START_ORDER => &mut tags.start_order,
            TAG_STOP_ORDER => &mut tags.stop_order,
            _ => continue,
        };
        slot.clone_from(&tag.value);
    }
    tags
}
