//! Shared vocabulary of the cluster scheduler: newtype ids, the resource
//! vector arithmetic used by every placement decision, and the small enums
//! (job type, task/machine state, machine type) that the rest of the
//! workspace builds on.

mod ids;
mod kinds;
mod resource;

pub use ids::{FailureDomain, JobId, MachineId, SchedulerId, TaskId};
pub use kinds::{JobType, MachineState, MachineType, TaskState};
pub use resource::ResourceVector;
