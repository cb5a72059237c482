use omega_resource_model::MachineId;
use thiserror::Error;

/// Fatal misuse of the cell API — distinct from `RejectReason`, which is an
/// expected, every-day outcome of optimistic concurrency control.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CellError {
    #[error("machine {0} is not registered in this cell")]
    UnknownMachine(MachineId),

    #[error("machine {0} is already registered in this cell")]
    DuplicateMachine(MachineId),

    #[error("task {0:?} is not tracked by this cell")]
    UnknownTask(omega_resource_model::TaskId),

    #[error("job {0:?} is not tracked by this cell")]
    UnknownJob(omega_resource_model::JobId),

    #[error("snapshot is stale: taken at version {snapshot_version}, machine {machine} is now at {current_version}")]
    StaleSnapshot {
        machine: MachineId,
        snapshot_version: u64,
        current_version: u64,
    },
}
