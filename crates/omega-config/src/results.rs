use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-scheduler accounting block named in spec.md §6.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SchedulerSummary {
    pub jobs_scheduled: u64,
    pub tasks_scheduled: u64,
    pub jobs_failed: u64,
    pub conflicts: u64,
    pub conflict_rate: f64,
    pub busy_time: f64,
    pub avg_wait_time: f64,
}

/// Componentwise cluster utilization over the run, as reported by
/// `omega_cell::Snapshot::cluster_utilization` (spec.md §6).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Utilization {
    pub cpu: f64,
    pub gpu: f64,
    pub memory: f64,
}

/// The cell's own accounting block (spec.md §6).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CellStateSummary {
    pub total_transactions: u64,
    pub total_commits: u64,
    pub total_conflicts: u64,
    pub conflict_rate: f64,
    pub utilization: Utilization,
}

/// One job's lifecycle, recorded only when `Config.trace_jobs` is set
/// (spec.md §6 calls the per-job trace "optional"). `job_id`/`job_type` are
/// plain `u64`/`String` rather than `omega-resource-model` newtypes, since
/// this crate stays free of a dependency on the core's internal id types —
/// it's the documented serde boundary to the excluded CLI layer (spec.md
/// §1), not a core module itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTrace {
    pub job_id: u64,
    pub job_type: String,
    pub submit_time: f64,
    pub completion_time: Option<f64>,
    pub failed: bool,
    pub task_count: usize,
}

/// The results record emitted at simulation end (spec.md §6). Serialization
/// format is left to the excluded CLI layer; this crate only derives serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Results {
    pub experiment_name: String,
    pub simulation_time: f64,
    pub completed_jobs: u64,
    pub failed_jobs: u64,
    /// Keyed by `schedulers[].id` (spec.md §6).
    pub schedulers: BTreeMap<String, SchedulerSummary>,
    pub cell_state: CellStateSummary,
    pub per_job_trace: Option<Vec<JobTrace>>,
}
