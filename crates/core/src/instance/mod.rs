//! Instance data model and tag classification.
//!
//! Instances are owned by the cloud provider; this crate only reads them.
//! The semantic fields used for tiering (environment, stack, start/stop order)
//! live in free-form tags and are extracted by [`classify`].

mod tags;
mod types;

pub use tags::{
    classify, InstanceTags, TAG_ENVIRONMENT, TAG_NAME, TAG_STACK, TAG_START_ORDER, TAG_STOP_ORDER,
};
pub use types::{Instance, InstanceState, InstanceStatus, Tag};
