use omega_config::{
    ClusterConfig, Config, FailuresConfig, MapReducePolicyConfig, SchedulerConfig, SchedulerType, SimulationConfig,
    WorkloadConfig,
};

fn default_batch_scheduler(id: &str) -> SchedulerConfig {
    SchedulerConfig {
        id: id.to_string(),
        scheduler_type: SchedulerType::Batch,
        decision_time_job: None,
        decision_time_task: None,
        placement_strategy: None,
        max_retries: 3,
        require_gang: false,
        policy: None,
    }
}

fn default_service_scheduler(id: &str) -> SchedulerConfig {
    SchedulerConfig {
        id: id.to_string(),
        scheduler_type: SchedulerType::Service,
        decision_time_job: None,
        decision_time_task: None,
        placement_strategy: None,
        max_retries: 3,
        require_gang: true,
        policy: None,
    }
}

fn default_mapreduce_scheduler(id: &str) -> SchedulerConfig {
    SchedulerConfig {
        id: id.to_string(),
        scheduler_type: SchedulerType::MapReduce,
        decision_time_job: None,
        decision_time_task: None,
        placement_strategy: None,
        max_retries: 3,
        require_gang: false,
        policy: Some(MapReducePolicyConfig::MaxParallelism { hard_cap: 64 }),
    }
}

fn no_failures() -> FailuresConfig {
    FailuresConfig {
        enabled: false,
        rate: None,
        recovery_mean: None,
    }
}

/// A small set of illustrative, fully-deterministic configs, loosely shaped
/// after spec.md §8's end-to-end scenarios (tight clusters that force OCC
/// conflicts, a service cluster spread across failure domains, a cluster
/// with failures enabled, and a MapReduce cluster with idle elastic
/// headroom). Unlike §8's unit-level walkthroughs these run the whole
/// simulator end to end rather than replaying one transaction by hand —
/// this binary's entire job is demonstrating that wiring, not re-proving
/// the invariants the crate's own test suites already cover.
pub fn presets() -> Vec<Config> {
    vec![
        Config {
            experiment_name: "tight_batch_cluster".into(),
            seed: 42,
            output_dir: "/tmp/omega/tight_batch_cluster".into(),
            cluster: ClusterConfig {
                num_machines: 4,
                heterogeneous: false,
            },
            schedulers: vec![default_batch_scheduler("batch-0")],
            simulation: SimulationConfig { duration: 5_000.0 },
            workload: WorkloadConfig {
                batch_ratio: 1.0,
                arrival_rate_batch: 0.2,
                arrival_rate_service: 0.0,
                include_mapreduce: false,
                overrides: None,
            },
            failures: no_failures(),
            trace_jobs: false,
        },
        Config {
            experiment_name: "service_spread_across_failure_domains".into(),
            seed: 42,
            output_dir: "/tmp/omega/service_spread_across_failure_domains".into(),
            cluster: ClusterConfig {
                num_machines: 4,
                heterogeneous: false,
            },
            schedulers: vec![default_service_scheduler("service-0")],
            simulation: SimulationConfig { duration: 10_000.0 },
            workload: WorkloadConfig {
                batch_ratio: 0.0,
                arrival_rate_batch: 0.0,
                arrival_rate_service: 0.05,
                include_mapreduce: false,
                overrides: None,
            },
            failures: no_failures(),
            trace_jobs: false,
        },
        Config {
            experiment_name: "machine_failures_and_recovery".into(),
            seed: 42,
            output_dir: "/tmp/omega/machine_failures_and_recovery".into(),
            cluster: ClusterConfig {
                num_machines: 8,
                heterogeneous: false,
            },
            schedulers: vec![default_batch_scheduler("batch-0")],
            simulation: SimulationConfig { duration: 20_000.0 },
            workload: WorkloadConfig {
                batch_ratio: 1.0,
                arrival_rate_batch: 0.1,
                arrival_rate_service: 0.0,
                include_mapreduce: false,
                overrides: None,
            },
            failures: FailuresConfig {
                enabled: true,
                rate: Some(0.0002),
                recovery_mean: Some(200.0),
            },
            trace_jobs: true,
        },
        Config {
            experiment_name: "mapreduce_opportunistic_scale".into(),
            seed: 42,
            output_dir: "/tmp/omega/mapreduce_opportunistic_scale".into(),
            cluster: ClusterConfig {
                num_machines: 16,
                heterogeneous: true,
            },
            schedulers: vec![default_mapreduce_scheduler("mapreduce-0")],
            simulation: SimulationConfig { duration: 10_000.0 },
            workload: WorkloadConfig {
                batch_ratio: 0.0,
                arrival_rate_batch: 0.0,
                arrival_rate_service: 0.0,
                include_mapreduce: true,
                overrides: None,
            },
            failures: no_failures(),
            trace_jobs: false,
        },
    ]
}
