//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits,
//! allowing orchestrations to be exercised without a cloud account.
//!
//! # Example
//!
//! ```rust,ignore
//! use stackctl_core::testing::{fixtures, MockInstanceProvider, RecordingNotifier};
//!
//! let provider = Arc::new(MockInstanceProvider::with_instances(vec![
//!     fixtures::tiered_instance("db", "r1", "1", "2"),
//!     fixtures::tiered_instance("app", "r1", "2", "1"),
//! ]));
//! let notifier = Arc::new(RecordingNotifier::new());
//!
//! // Build a StackOrchestrator over them, run it, then inspect
//! // provider.recorded_calls() and notifier.events().
//! ```

mod mock_instance_provider;
mod recording_notifier;

pub use mock_instance_provider::{CallKind, MockInstanceProvider, RecordedCall};
pub use recording_notifier::RecordingNotifier;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::instance::{Instance, InstanceState};
    use crate::provider::RegionMap;
    use crate::tier::StackTarget;

    pub const STACK: &str = "web";
    pub const ENVIRONMENT: &str = "prod";
    pub const PROFILE: &str = "main";

    /// The stack every fixture instance belongs to.
    pub fn target() -> StackTarget {
        StackTarget::new(STACK, ENVIRONMENT, PROFILE)
    }

    /// A running member of the fixture stack with the given order tags.
    pub fn tiered_instance(id: &str, region: &str, start_order: &str, stop_order: &str) -> Instance {
        Instance::new(id, region, PROFILE, InstanceState::Running)
            .with_tag("Name", id)
            .with_tag("Stack", STACK)
            .with_tag("Environment", ENVIRONMENT)
            .with_tag("StartOrder", start_order)
            .with_tag("StopOrder", stop_order)
    }

    /// A stopped member of the fixture stack with the given order tags.
    pub fn stopped_instance(id: &str, region: &str, start_order: &str, stop_order: &str) -> Instance {
        let mut instance = tiered_instance(id, region, start_order, stop_order);
        instance.state = InstanceState::Stopped;
        instance
    }

    /// An instance of some other stack.
    pub fn foreign_instance(id: &str, region: &str) -> Instance {
        Instance::new(id, region, PROFILE, InstanceState::Running)
            .with_tag("Stack", "batch")
            .with_tag("Environment", ENVIRONMENT)
            .with_tag("StartOrder", "1")
            .with_tag("StopOrder", "1")
    }

    /// Region map resolving `r1`, `r2` and `r3` to `endpoint-r1` etc.
    pub fn regions() -> RegionMap {
        ["r1", "r2", "r3"]
            .into_iter()
            .map(|r| (r.to_string(), format!("endpoint-{}", r)))
            .collect()
    }
}
