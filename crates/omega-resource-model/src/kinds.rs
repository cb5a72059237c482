use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    Batch,
    Service,
    MapReduce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    Pending,
    Scheduled,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineState {
    Healthy,
    Failed,
}

/// A named machine-type template (spec.md §3 "Machine" has a machine-type
/// tag; §6 names the heterogeneous 50/30/15/5 mix without enumerating it —
/// these four tiers are this project's concrete reading of that mix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineType {
    Small,
    Medium,
    Large,
    GpuLarge,
}

impl MachineType {
    /// The standard, homogeneous-cluster profile (`cluster.heterogeneous =
    /// false`, spec.md §6).
    pub const STANDARD: MachineType = MachineType::Medium;

    /// `(machine_type, capacity, weight)` for the heterogeneous mix, weights
    /// summing to 100 and matching the 50/30/15/5 split named in spec.md §6.
    pub fn heterogeneous_mix() -> [(MachineType, super::resource::ResourceVector, u32); 4] {
        use super::resource::ResourceVector;
        [
            (MachineType::Small, ResourceVector::new(8, 0, 16.0), 50),
            (MachineType::Medium, ResourceVector::new(32, 0, 64.0), 30),
            (MachineType::Large, ResourceVector::new(64, 0, 256.0), 15),
            (MachineType::GpuLarge, ResourceVector::new(64, 4, 256.0), 5),
        ]
    }

    pub fn standard_capacity() -> super::resource::ResourceVector {
        super::resource::ResourceVector::new(32, 0, 64.0)
    }
}
