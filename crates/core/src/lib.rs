pub mod config;
pub mod executor;
pub mod instance;
pub mod metrics;
pub mod notify;
pub mod orchestrator;
pub mod provider;
pub mod testing;
pub mod tier;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, InventoryConfig,
};
pub use executor::{
    partition_by_region, ConvergenceError, ConvergencePoller, RegionBatch, TierAction,
    TieredExecutor, TierResult,
};
pub use instance::{classify, Instance, InstanceState, InstanceStatus, InstanceTags, Tag};
pub use notify::{ChannelNotifier, LogNotifier, Notification, Notifier, StackEvent};
pub use orchestrator::{
    Convergence, LifecycleAction, OrchestratorConfig, OrchestratorError, RegionOutcome, RunReport,
    StackOrchestrator, TierReport,
};
pub use provider::{
    InstanceController, InstanceSource, InstanceStateChange, InventoryFile, InventoryProvider,
    ProviderError, RegionMap,
};
pub use tier::{build_tier_plan, OrderSelector, PlanError, StackTarget, TierPlan};
