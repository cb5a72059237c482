use thiserror::Error;

/// Fatal at startup (spec.md §7): surfaced before the simulation loop runs,
/// never during it.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("cluster.num_machines must be >= 1, got {0}")]
    EmptyCluster(u32),

    #[error("simulation.duration must be > 0, got {0}")]
    NonPositiveDuration(f64),

    #[error("schedulers list is empty but the workload will generate jobs")]
    NoSchedulers,

    #[error("unknown scheduler type {0:?}")]
    UnknownSchedulerType(String),

    #[error("scheduler id {0:?} is used by more than one entry")]
    DuplicateSchedulerId(String),

    #[error("workload.batch_ratio must be within [0, 1], got {0}")]
    BatchRatioOutOfRange(f64),

    #[error("failures.rate must be >= 0, got {0}")]
    NegativeFailureRate(f64),
}
