use omega_resource_model::{JobId, JobType, TaskId};

/// A job's authoritative record inside the cell. Jobs own their tasks by id,
/// never by handle (spec.md §9 "back-references"), so results serialize
/// without cycles.
#[derive(Debug, Clone)]
pub(crate) struct Job {
    pub id: JobId,
    pub job_type: JobType,
    pub priority: i32,
    pub submit_time: f64,
    pub tasks: Vec<TaskId>,
}

impl Job {
    pub fn new(id: JobId, job_type: JobType, priority: i32, submit_time: f64, tasks: Vec<TaskId>) -> Self {
        Self {
            id,
            job_type,
            priority,
            submit_time,
            tasks,
        }
    }
}
