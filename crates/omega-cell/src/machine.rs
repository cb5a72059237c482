use std::collections::BTreeSet;

use omega_resource_model::{FailureDomain, MachineId, MachineState, MachineType, ResourceVector, TaskId};

/// A machine's authoritative record inside the cell. Never exposed directly
/// to callers outside `omega-cell` — schedulers see a [`crate::Snapshot`]
/// instead.
#[derive(Debug, Clone)]
pub(crate) struct Machine {
    pub id: MachineId,
    pub machine_type: MachineType,
    pub capacity: ResourceVector,
    pub allocated: ResourceVector,
    pub tasks: BTreeSet<TaskId>,
    pub version: u64,
    pub failure_domain: FailureDomain,
    pub state: MachineState,
}

impl Machine {
    pub fn new(
        id: MachineId,
        machine_type: MachineType,
        capacity: ResourceVector,
        failure_domain: FailureDomain,
    ) -> Self {
        Self {
            id,
            machine_type,
            capacity,
            allocated: ResourceVector::ZERO,
            tasks: BTreeSet::new(),
            version: 0,
            failure_domain,
            state: MachineState::Healthy,
        }
    }

    pub fn remaining(&self) -> ResourceVector {
        self.capacity.saturating_sub(&self.allocated)
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.state, MachineState::Healthy)
    }
}
