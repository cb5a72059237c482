//! Scheduler actors: the shared plan-commit-retry loop of
//! [`actor::SchedulerActor`], and the placement policies that plug into it
//! — batch, service, mapreduce, and the simple baseline variants.

mod actor;
mod batch;
mod job;
mod mapreduce;
mod policy;
mod service;
mod simple;
mod stats;

pub use actor::{AcceptedPlacement, ActivationReport, JobOutcome, PlanOutput, SchedulerActor, SchedulerKind, SchedulingPolicy};
pub use batch::BatchPolicy;
pub use job::PendingJob;
pub use mapreduce::{ElasticPolicy, MapReducePolicy};
pub use policy::{select_machine, service_score, Overlay, PlacementStrategy};
pub use service::ServicePolicy;
pub use simple::{FirstFitPolicy, PriorityPolicy, RandomPolicy, WeightedRoundRobinPolicy};
pub use stats::SchedulerStats;
