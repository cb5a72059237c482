use omega_cell::TaskSpec;
use omega_resource_model::{JobId, JobType};

/// A job as seen by a scheduler actor's queue: enough to plan a transaction,
/// but none of the cell's own bookkeeping (state, machine assignment) —
/// those only exist once the cell has accepted a placement.
#[derive(Debug, Clone)]
pub struct PendingJob {
    pub id: JobId,
    pub job_type: JobType,
    pub priority: i32,
    pub submit_time: f64,
    pub tasks: Vec<TaskSpec>,
    /// Mirrors `schedulers[].require_gang` (spec.md §6): a service job
    /// marked this way must not partially succeed.
    pub require_gang: bool,
}

impl PendingJob {
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}
