//! Collaborators that own the instances.
//!
//! The orchestrator never talks to a cloud API directly. It reads snapshots
//! through [`InstanceSource`] and changes state through [`InstanceController`],
//! addressing each region by the endpoint resolved from a [`RegionMap`].
//!
//! [`InventoryProvider`] implements both traits over a JSON snapshot file,
//! which is enough to plan and rehearse an orchestration offline.

mod error;
mod inventory;
mod region;
mod traits;

pub use error::ProviderError;
pub use inventory::{InventoryFile, InventoryProvider};
pub use region::RegionMap;
pub use traits::{InstanceController, InstanceSource, InstanceStateChange};
