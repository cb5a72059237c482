use std::collections::BTreeSet;

use omega_resource_model::{JobId, MachineId, ResourceVector, TaskId, TaskState};

/// A task's authoritative record inside the cell.
#[derive(Debug, Clone)]
pub(crate) struct Task {
    pub id: TaskId,
    pub job_id: JobId,
    pub requirement: ResourceVector,
    pub duration: f64,
    pub state: TaskState,
    pub machine_id: Option<MachineId>,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub dependencies: BTreeSet<TaskId>,
}

impl Task {
    pub fn new(
        id: TaskId,
        job_id: JobId,
        requirement: ResourceVector,
        duration: f64,
        dependencies: BTreeSet<TaskId>,
    ) -> Self {
        Self {
            id,
            job_id,
            requirement,
            duration,
            state: TaskState::Pending,
            machine_id: None,
            start_time: None,
            end_time: None,
            dependencies,
        }
    }
}

/// A task description as submitted by a scheduler's plan, detached from the
/// cell's own bookkeeping (no state, no `machine_id` — those only exist once
/// the cell has accepted a placement).
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub id: TaskId,
    pub job_id: JobId,
    pub requirement: ResourceVector,
    pub duration: f64,
    pub dependencies: BTreeSet<TaskId>,
}
