use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The configuration record consumed at startup (spec.md §6). Parsing it
/// from a file is outside this core's scope — callers hand in an already
/// deserialized `Config`, or build one programmatically for a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub experiment_name: String,
    pub seed: u64,
    pub output_dir: String,
    pub cluster: ClusterConfig,
    pub schedulers: Vec<SchedulerConfig>,
    pub simulation: SimulationConfig,
    pub workload: WorkloadConfig,
    pub failures: FailuresConfig,
    /// Gates `Results.per_job_trace` (spec.md §6 calls the trace
    /// "optional"); recording one for every job is the kind of thing a real
    /// deployment would make opt-in for memory reasons.
    #[serde(default)]
    pub trace_jobs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub num_machines: u32,
    pub heterogeneous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerType {
    Batch,
    Service,
    MapReduce,
    Priority,
    WeightedRoundRobin,
    FirstFit,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategyConfig {
    FirstFit,
    BestFit,
    WorstFit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapReducePolicyConfig {
    MaxParallelism { hard_cap: usize },
    GlobalCap { threshold: f64 },
    RelativeJobSize { relative_factor: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub scheduler_type: SchedulerType,
    pub decision_time_job: Option<f64>,
    pub decision_time_task: Option<f64>,
    pub placement_strategy: Option<PlacementStrategyConfig>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub require_gang: bool,
    pub policy: Option<MapReducePolicyConfig>,
}

fn default_max_retries() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    #[serde(default = "default_batch_ratio")]
    pub batch_ratio: f64,
    pub arrival_rate_batch: f64,
    pub arrival_rate_service: f64,
    #[serde(default)]
    pub include_mapreduce: bool,
    pub overrides: Option<DistributionOverrides>,
}

fn default_batch_ratio() -> f64 {
    0.8
}

/// Optional overrides of spec.md §4.3's default distribution parameters.
/// Any field left `None` uses the generator's built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistributionOverrides {
    pub task_count_log_mean: Option<f64>,
    pub task_count_log_std: Option<f64>,
    pub batch_duration_mean_seconds: Option<f64>,
    pub service_duration_mean_seconds: Option<f64>,
    pub resource_cpu_mean: Option<f64>,
    pub resource_cpu_std: Option<f64>,
    pub resource_memory_mean_gb: Option<f64>,
    pub resource_memory_std_gb: Option<f64>,
    pub batch_gpu_fraction: Option<f64>,
    pub service_gpu_fraction: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailuresConfig {
    #[serde(default)]
    pub enabled: bool,
    pub rate: Option<f64>,
    pub recovery_mean: Option<f64>,
}

impl Config {
    /// Checks spec.md §7's "configuration error" conditions before the
    /// simulation loop starts: unknown scheduler type, negative sizes,
    /// empty scheduler list when jobs would arrive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster.num_machines < 1 {
            return Err(ConfigError::EmptyCluster(self.cluster.num_machines));
        }
        if self.simulation.duration <= 0.0 {
            return Err(ConfigError::NonPositiveDuration(self.simulation.duration));
        }
        if self.schedulers.is_empty() {
            return Err(ConfigError::NoSchedulers);
        }
        if !(0.0..=1.0).contains(&self.workload.batch_ratio) {
            return Err(ConfigError::BatchRatioOutOfRange(self.workload.batch_ratio));
        }
        if let Some(rate) = self.failures.rate {
            if rate < 0.0 {
                return Err(ConfigError::NegativeFailureRate(rate));
            }
        }

        let mut seen_ids = HashSet::new();
        for scheduler in &self.schedulers {
            if !seen_ids.insert(scheduler.id.clone()) {
                return Err(ConfigError::DuplicateSchedulerId(scheduler.id.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> Config {
        Config {
            experiment_name: "test".into(),
            seed: 42,
            output_dir: "/tmp/omega".into(),
            cluster: ClusterConfig {
                num_machines: 4,
                heterogeneous: false,
            },
            schedulers: vec![SchedulerConfig {
                id: "batch-0".into(),
                scheduler_type: SchedulerType::Batch,
                decision_time_job: None,
                decision_time_task: None,
                placement_strategy: None,
                max_retries: 3,
                require_gang: false,
                policy: None,
            }],
            simulation: SimulationConfig { duration: 1000.0 },
            workload: WorkloadConfig {
                batch_ratio: 0.8,
                arrival_rate_batch: 10.0,
                arrival_rate_service: 60.0,
                include_mapreduce: false,
                overrides: None,
            },
            failures: FailuresConfig {
                enabled: false,
                rate: None,
                recovery_mean: None,
            },
            trace_jobs: false,
        }
    }

    #[test]
    fn minimal_config_validates() {
        minimal_config().validate().unwrap();
    }

    #[test]
    fn rejects_empty_cluster() {
        let mut config = minimal_config();
        config.cluster.num_machines = 0;
        assert_eq!(config.validate(), Err(ConfigError::EmptyCluster(0)));
    }

    #[test]
    fn rejects_non_positive_duration() {
        let mut config = minimal_config();
        config.simulation.duration = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveDuration(0.0)));
    }

    #[test]
    fn rejects_empty_scheduler_list() {
        let mut config = minimal_config();
        config.schedulers.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoSchedulers));
    }

    #[test]
    fn rejects_duplicate_scheduler_ids() {
        let mut config = minimal_config();
        let dup = config.schedulers[0].clone();
        config.schedulers.push(dup);
        assert_eq!(config.validate(), Err(ConfigError::DuplicateSchedulerId("batch-0".into())));
    }

    #[test]
    fn round_trips_through_json() {
        let config = minimal_config();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.experiment_name, config.experiment_name);
        assert_eq!(back.schedulers.len(), config.schedulers.len());
    }
}
