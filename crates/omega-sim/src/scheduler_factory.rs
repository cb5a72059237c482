use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use omega_cell::CellState;
use omega_config::{MapReducePolicyConfig, PlacementStrategyConfig, SchedulerConfig, SchedulerType};
use omega_resource_model::SchedulerId;
use omega_schedulers::{
    BatchPolicy, ElasticPolicy, FirstFitPolicy, MapReducePolicy, PlacementStrategy, PriorityPolicy, RandomPolicy,
    SchedulerActor, SchedulerKind, ServicePolicy, WeightedRoundRobinPolicy,
};

use crate::any_scheduler::AnyScheduler;

fn strategy_of(config: Option<PlacementStrategyConfig>) -> PlacementStrategy {
    match config {
        Some(PlacementStrategyConfig::FirstFit) => PlacementStrategy::FirstFit,
        Some(PlacementStrategyConfig::BestFit) => PlacementStrategy::BestFit,
        Some(PlacementStrategyConfig::WorstFit) => PlacementStrategy::WorstFit,
        None => PlacementStrategy::default(),
    }
}

fn elastic_policy_of(config: Option<MapReducePolicyConfig>) -> ElasticPolicy {
    match config {
        Some(MapReducePolicyConfig::MaxParallelism { hard_cap }) => ElasticPolicy::MaxParallelism { hard_cap },
        Some(MapReducePolicyConfig::GlobalCap { threshold }) => ElasticPolicy::GlobalCap { threshold },
        Some(MapReducePolicyConfig::RelativeJobSize { relative_factor }) => {
            ElasticPolicy::RelativeJobSize { relative_factor }
        }
        // spec.md §4.2.3 names `max_parallelism` first among the three
        // elastic policies; taken as the default when a MapReduce scheduler
        // doesn't pin one down.
        None => ElasticPolicy::MaxParallelism { hard_cap: 64 },
    }
}

/// Builds the scheduler actor named by one `schedulers[]` config entry
/// (spec.md §6), deriving its own sub-seed from `seed` for variants that
/// need an RNG (`Random`), so the whole run stays deterministic for a given
/// top-level seed regardless of how many schedulers are configured (spec.md
/// §9 "deterministic parallelism").
pub fn build_scheduler(config: &SchedulerConfig, cell: &Arc<CellState>, seed: u64) -> AnyScheduler {
    let id = SchedulerId::from(config.id.as_str());
    let overrides = (config.decision_time_job, config.decision_time_task);

    match config.scheduler_type {
        SchedulerType::Batch => {
            let policy = BatchPolicy {
                strategy: strategy_of(config.placement_strategy),
            };
            let actor = SchedulerActor::new(id, SchedulerKind::Batch, cell.clone(), policy)
                .with_max_retries(config.max_retries)
                .with_decision_time_overrides(overrides.0, overrides.1);
            AnyScheduler::Batch(actor)
        }
        SchedulerType::Service => {
            let actor = SchedulerActor::new(id, SchedulerKind::Service, cell.clone(), ServicePolicy::default())
                .with_max_retries(config.max_retries)
                .with_decision_time_overrides(overrides.0, overrides.1);
            AnyScheduler::Service(actor)
        }
        SchedulerType::MapReduce => {
            let mut policy = MapReducePolicy::new(elastic_policy_of(config.policy));
            policy.strategy = strategy_of(config.placement_strategy);
            let actor = SchedulerActor::new(id, SchedulerKind::MapReduce, cell.clone(), policy)
                .with_max_retries(config.max_retries)
                .with_decision_time_overrides(overrides.0, overrides.1);
            AnyScheduler::MapReduce(actor)
        }
        SchedulerType::Priority => {
            let actor = SchedulerActor::new(id, SchedulerKind::Priority, cell.clone(), PriorityPolicy::default())
                .with_max_retries(config.max_retries)
                .with_decision_time_overrides(overrides.0, overrides.1);
            AnyScheduler::Priority(actor)
        }
        SchedulerType::WeightedRoundRobin => {
            let actor = SchedulerActor::new(
                id,
                SchedulerKind::WeightedRoundRobin,
                cell.clone(),
                WeightedRoundRobinPolicy::default(),
            )
            .with_max_retries(config.max_retries)
            .with_decision_time_overrides(overrides.0, overrides.1);
            AnyScheduler::WeightedRoundRobin(actor)
        }
        SchedulerType::FirstFit => {
            let actor = SchedulerActor::new(id, SchedulerKind::FirstFit, cell.clone(), FirstFitPolicy::default())
                .with_max_retries(config.max_retries)
                .with_decision_time_overrides(overrides.0, overrides.1);
            AnyScheduler::FirstFit(actor)
        }
        SchedulerType::Random => {
            let rng = StdRng::seed_from_u64(seed);
            let actor = SchedulerActor::new(id, SchedulerKind::Random, cell.clone(), RandomPolicy::new(rng))
                .with_max_retries(config.max_retries)
                .with_decision_time_overrides(overrides.0, overrides.1);
            AnyScheduler::Random(actor)
        }
    }
}
