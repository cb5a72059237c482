//! The serde boundary between this core and the surrounding, out-of-scope
//! CLI/file-parsing layer (spec.md §1, §6): the `Config` record consumed at
//! startup and the `Results` record emitted at simulation end.

mod config;
mod error;
mod results;

pub use config::{
    ClusterConfig, Config, DistributionOverrides, FailuresConfig, MapReducePolicyConfig, PlacementStrategyConfig,
    SchedulerConfig, SchedulerType, SimulationConfig, WorkloadConfig,
};
pub use error::ConfigError;
pub use results::{CellStateSummary, JobTrace, Results, SchedulerSummary, Utilization};
