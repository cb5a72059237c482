/// Distribution parameters for [`crate::WorkloadGenerator`] (spec.md §4.3).
/// Mirrors `omega_config::WorkloadConfig`/`DistributionOverrides` field for
/// field, but stays free of any dependency on the config crate — the
/// simulator's wiring layer is what bridges the two (spec.md §1: config
/// parsing is an external collaborator of this core).
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadParams {
    /// Mean seconds between batch job arrivals (spec.md §4.3: "~10 s").
    pub mean_interarrival_batch: f64,
    /// Mean seconds between service job arrivals (spec.md §4.3: "~60 s").
    pub mean_interarrival_service: f64,
    /// Mean seconds between MapReduce job arrivals. Only drawn from when
    /// `include_mapreduce` is set — MapReduce is "off by default" (spec.md
    /// §4.3).
    pub mean_interarrival_mapreduce: f64,
    pub include_mapreduce: bool,

    /// Mean/std of the (log-normal, truncated >= 1) task-count-per-job
    /// distribution, shared by every job type.
    pub task_count_mean: f64,
    pub task_count_std: f64,

    /// Mean task duration in seconds for batch jobs (spec.md: "~5 min").
    pub batch_duration_mean_seconds: f64,
    /// Mean task duration in seconds for service jobs (spec.md: "~24 h").
    pub service_duration_mean_seconds: f64,

    pub resource_cpu_mean: f64,
    pub resource_cpu_std: f64,
    pub resource_memory_mean_gb: f64,
    pub resource_memory_std_gb: f64,

    /// Fraction of batch tasks that demand exactly 1 GPU (spec.md: "10%").
    pub batch_gpu_fraction: f64,
    /// Fraction of service tasks that demand 1-2 GPUs (spec.md: "5%").
    pub service_gpu_fraction: f64,
}

impl Default for WorkloadParams {
    fn default() -> Self {
        Self {
            mean_interarrival_batch: 10.0,
            mean_interarrival_service: 60.0,
            mean_interarrival_mapreduce: 120.0,
            include_mapreduce: false,
            task_count_mean: 5.0,
            task_count_std: 2.0,
            batch_duration_mean_seconds: 300.0,
            service_duration_mean_seconds: 86_400.0,
            resource_cpu_mean: 2.0,
            resource_cpu_std: 1.0,
            resource_memory_mean_gb: 4.0,
            resource_memory_std_gb: 2.0,
            batch_gpu_fraction: 0.10,
            service_gpu_fraction: 0.05,
        }
    }
}
