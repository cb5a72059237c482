use omega_resource_model::{MachineId, SchedulerId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    Incremental,
    Gang,
}

/// One proposed `(task, machine, expected_machine_version)` mutation within
/// a transaction (spec.md §3).
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub task_id: TaskId,
    pub machine_id: MachineId,
    pub expected_machine_version: u64,
}

/// A scheduler's proposed mutation, submitted to [`crate::CellState::commit`]
/// as a single unit.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub scheduler_id: SchedulerId,
    pub placements: Vec<Placement>,
    pub mode: CommitMode,
}

impl Transaction {
    pub fn new(scheduler_id: SchedulerId, placements: Vec<Placement>, mode: CommitMode) -> Self {
        Self {
            scheduler_id,
            placements,
            mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    VersionStale,
    InsufficientResources,
    MachineFailed,
    DuplicateTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    Accepted,
    Rejected(RejectReason),
}

/// The per-placement verdict plus transaction-level accounting, mirroring
/// spec.md §3's "derived attributes on commit".
#[derive(Debug, Clone)]
pub struct TransactionResult {
    pub outcomes: Vec<(Placement, PlacementOutcome)>,
    pub applied: bool,
}

impl TransactionResult {
    pub fn accepted_placements(&self) -> impl Iterator<Item = &Placement> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, PlacementOutcome::Accepted))
            .map(|(placement, _)| placement)
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted_placements().count()
    }

    pub fn rejected_count(&self) -> usize {
        self.outcomes.len() - self.accepted_count()
    }
}
