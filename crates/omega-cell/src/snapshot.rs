use std::collections::{BTreeMap, BTreeSet};

use omega_resource_model::{FailureDomain, MachineId, MachineState, ResourceVector, TaskId};

/// A consistent, immutable view of every machine in the cell, taken
/// atomically with respect to commits (spec.md §4.1). Cloning a `Snapshot`
/// is cheap relative to re-reading the cell, but snapshots are normally
/// passed by reference — a scheduler's plan phase never needs to mutate one.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub(crate) machines: BTreeMap<MachineId, MachineView>,
    pub(crate) cell_version: u64,
}

/// Per-machine state as captured at snapshot time. Deliberately a plain data
/// copy, not a reference into the cell — callers may hold a snapshot for as
/// long as they like without blocking writers.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineView {
    pub capacity: ResourceVector,
    pub allocated: ResourceVector,
    pub version: u64,
    pub state: MachineState,
    pub failure_domain: FailureDomain,
    pub tasks: BTreeSet<TaskId>,
}

impl MachineView {
    pub fn remaining(&self) -> ResourceVector {
        self.capacity.saturating_sub(&self.allocated)
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.state, MachineState::Healthy)
    }
}

impl Snapshot {
    pub fn cell_version(&self) -> u64 {
        self.cell_version
    }

    pub fn machine(&self, id: MachineId) -> Option<&MachineView> {
        self.machines.get(&id)
    }

    pub fn machines(&self) -> impl Iterator<Item = (&MachineId, &MachineView)> {
        self.machines.iter()
    }

    /// Aggregate `(cpu, gpu, memory)` utilization across healthy machines,
    /// used both by `MapReduce`'s `global_cap` policy and by the cell's own
    /// results block (spec.md §6).
    pub fn cluster_utilization(&self) -> (f64, f64, f64) {
        let mut capacity = ResourceVector::ZERO;
        let mut allocated = ResourceVector::ZERO;
        for view in self.machines.values() {
            if !view.is_healthy() {
                continue;
            }
            capacity = capacity + view.capacity;
            allocated = allocated + view.allocated;
        }
        let ratio = |num: f64, den: f64| if den > 0.0 { num / den } else { 0.0 };
        (
            ratio(allocated.cpu_cores as f64, capacity.cpu_cores as f64),
            ratio(allocated.gpu_count as f64, capacity.gpu_count as f64),
            ratio(allocated.memory_gb, capacity.memory_gb),
        )
    }
}
