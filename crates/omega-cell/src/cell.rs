use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use omega_resource_model::{
    FailureDomain, JobId, JobType, MachineId, MachineState, MachineType, ResourceVector, TaskId,
    TaskState,
};

use crate::error::CellError;
use crate::job::Job;
use crate::machine::Machine;
use crate::snapshot::{MachineView, Snapshot};
use crate::task::{Task, TaskSpec};
use crate::transaction::{CommitMode, Placement, PlacementOutcome, RejectReason, Transaction, TransactionResult};

/// Aggregate counters the cell keeps on itself, surfaced in the results
/// record's `cell_state` block (spec.md §6).
#[derive(Debug, Clone, Copy, Default)]
pub struct CellStats {
    pub total_transactions: u64,
    pub total_commits: u64,
    pub total_conflicts: u64,
}

impl CellStats {
    pub fn conflict_rate(&self) -> f64 {
        if self.total_transactions == 0 {
            0.0
        } else {
            self.total_conflicts as f64 / self.total_transactions as f64
        }
    }
}

struct CellInner {
    machines: BTreeMap<MachineId, Machine>,
    tasks: BTreeMap<TaskId, Task>,
    jobs: BTreeMap<JobId, Job>,
    cell_version: u64,
    stats: CellStats,
}

/// The single authoritative record of cluster state (spec.md §4.1). Shared
/// across scheduler actors behind an `Arc`; internally guarded by a single
/// reader/writer lock so snapshot reads never block behind each other and
/// commits serialize with respect to one another.
pub struct CellState {
    inner: RwLock<CellInner>,
}

impl CellState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(CellInner {
                machines: BTreeMap::new(),
                tasks: BTreeMap::new(),
                jobs: BTreeMap::new(),
                cell_version: 0,
                stats: CellStats::default(),
            }),
        })
    }

    pub fn register_machine(
        &self,
        id: MachineId,
        machine_type: MachineType,
        capacity: ResourceVector,
        failure_domain: FailureDomain,
    ) -> Result<(), CellError> {
        let mut inner = self.inner.write();
        if inner.machines.contains_key(&id) {
            return Err(CellError::DuplicateMachine(id));
        }
        inner
            .machines
            .insert(id, Machine::new(id, machine_type, capacity, failure_domain));
        Ok(())
    }

    pub fn register_job(&self, job_id: JobId, job_type: JobType, priority: i32, submit_time: f64, tasks: Vec<TaskSpec>) {
        let mut inner = self.inner.write();
        let task_ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
        for spec in tasks {
            inner.tasks.insert(
                spec.id,
                Task::new(spec.id, spec.job_id, spec.requirement, spec.duration, spec.dependencies),
            );
        }
        inner
            .jobs
            .insert(job_id, Job::new(job_id, job_type, priority, submit_time, task_ids));
    }

    /// Adds tasks to an already-registered job, e.g. the MapReduce
    /// scheduler's elastic clones of a base task template (spec.md §4.2.3).
    /// The cell must know about a task before any placement referencing it
    /// can be validated.
    pub fn add_tasks(&self, job_id: JobId, tasks: Vec<TaskSpec>) -> Result<(), CellError> {
        let mut inner = self.inner.write();
        if !inner.jobs.contains_key(&job_id) {
            return Err(CellError::UnknownJob(job_id));
        }
        let mut new_ids = Vec::with_capacity(tasks.len());
        for spec in tasks {
            new_ids.push(spec.id);
            inner.tasks.insert(
                spec.id,
                Task::new(spec.id, spec.job_id, spec.requirement, spec.duration, spec.dependencies),
            );
        }
        inner.jobs.get_mut(&job_id).expect("checked above").tasks.extend(new_ids);
        Ok(())
    }

    /// Transitions a task from `scheduled` to `running` once its
    /// dependencies are satisfied and its start time has arrived (spec.md
    /// §3's task lifecycle). Distinct from the placement transition
    /// (`pending -> scheduled`, set by `commit`): a task can sit scheduled
    /// for a while if it is waiting on predecessors.
    pub fn start_task(&self, task_id: TaskId, at_time: f64) -> Result<(), CellError> {
        let mut inner = self.inner.write();
        let task = inner.tasks.get_mut(&task_id).ok_or(CellError::UnknownTask(task_id))?;
        task.state = TaskState::Running;
        task.start_time = Some(at_time);
        Ok(())
    }

    /// The job a task belongs to, for callers (the simulator) that need to
    /// route a task-level event back to job-level bookkeeping without
    /// duplicating the cell's own id maps.
    pub fn task_job_id(&self, task_id: TaskId) -> Option<JobId> {
        self.inner.read().tasks.get(&task_id).map(|t| t.job_id)
    }

    /// A detached copy of a task's cell-visible description, e.g. for the
    /// simulator to reconstruct a one-task re-placement job after a machine
    /// failure orphans it (spec.md §4.1 "Affected jobs are re-queued").
    pub fn task_spec(&self, task_id: TaskId) -> Option<TaskSpec> {
        self.inner.read().tasks.get(&task_id).map(|t| TaskSpec {
            id: t.id,
            job_id: t.job_id,
            requirement: t.requirement,
            duration: t.duration,
            dependencies: t.dependencies.clone(),
        })
    }

    /// Point-in-time copy of every machine, independent of later commits
    /// (spec.md §4.1). Concurrent with other reads and with commits.
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read();
        let machines = inner
            .machines
            .iter()
            .map(|(id, machine)| {
                (
                    *id,
                    MachineView {
                        capacity: machine.capacity,
                        allocated: machine.allocated,
                        version: machine.version,
                        state: machine.state,
                        failure_domain: machine.failure_domain.clone(),
                        tasks: machine.tasks.clone(),
                    },
                )
            })
            .collect();
        Snapshot {
            machines,
            cell_version: inner.cell_version,
        }
    }

    pub fn stats(&self) -> CellStats {
        self.inner.read().stats
    }

    pub fn cluster_utilization(&self) -> (f64, f64, f64) {
        self.snapshot().cluster_utilization()
    }

    /// Validates then applies a transaction atomically with respect to other
    /// commits (spec.md §4.1). One write-lock acquisition covers both
    /// phases, so conflicting commits never interleave.
    #[instrument(level = "debug", skip(self, txn), fields(scheduler = %txn.scheduler_id, mode = ?txn.mode, placements = txn.placements.len()))]
    pub fn commit(&self, txn: &Transaction) -> TransactionResult {
        let mut inner = self.inner.write();
        inner.stats.total_transactions += 1;

        // Per-machine tentative overlay: a duplicate-task or stale-version
        // rejection earlier in the list must not stop fine-grained detection
        // for independent placements later in the same transaction.
        let mut tentative_allocated: BTreeMap<MachineId, ResourceVector> = BTreeMap::new();
        let mut tentative_tasks: BTreeMap<MachineId, BTreeSet<TaskId>> = BTreeMap::new();
        let mut outcomes = Vec::with_capacity(txn.placements.len());

        for placement in &txn.placements {
            let outcome = Self::validate_placement(&inner, placement, &mut tentative_allocated, &mut tentative_tasks);
            outcomes.push((*placement, outcome));
        }

        let gang_failed = txn.mode == CommitMode::Gang
            && outcomes
                .iter()
                .any(|(_, outcome)| !matches!(outcome, PlacementOutcome::Accepted));

        let rejected_count = outcomes
            .iter()
            .filter(|(_, outcome)| !matches!(outcome, PlacementOutcome::Accepted))
            .count();
        inner.stats.total_conflicts += rejected_count as u64;

        if gang_failed {
            debug!("gang transaction rejected, no state mutated");
            return TransactionResult {
                outcomes,
                applied: false,
            };
        }

        let mut applied_any = false;
        for (placement, outcome) in &outcomes {
            if !matches!(outcome, PlacementOutcome::Accepted) {
                continue;
            }
            Self::apply_placement(&mut inner, placement);
            applied_any = true;
        }

        if applied_any {
            inner.cell_version += 1;
            inner.stats.total_commits += 1;
        }

        TransactionResult {
            outcomes,
            applied: applied_any,
        }
    }

    fn validate_placement(
        inner: &CellInner,
        placement: &Placement,
        tentative_allocated: &mut BTreeMap<MachineId, ResourceVector>,
        tentative_tasks: &mut BTreeMap<MachineId, BTreeSet<TaskId>>,
    ) -> PlacementOutcome {
        let Some(machine) = inner.machines.get(&placement.machine_id) else {
            return PlacementOutcome::Rejected(RejectReason::MachineFailed);
        };
        if !machine.is_healthy() {
            return PlacementOutcome::Rejected(RejectReason::MachineFailed);
        }
        if machine.version != placement.expected_machine_version {
            return PlacementOutcome::Rejected(RejectReason::VersionStale);
        }
        let Some(task) = inner.tasks.get(&placement.task_id) else {
            return PlacementOutcome::Rejected(RejectReason::DuplicateTask);
        };
        if task.machine_id.is_some() {
            return PlacementOutcome::Rejected(RejectReason::DuplicateTask);
        }

        let already_allocated = tentative_allocated
            .get(&placement.machine_id)
            .copied()
            .unwrap_or(machine.allocated);
        let remaining = machine.capacity.saturating_sub(&already_allocated);
        if !task.requirement.fits(&remaining) {
            return PlacementOutcome::Rejected(RejectReason::InsufficientResources);
        }

        tentative_allocated.insert(placement.machine_id, already_allocated + task.requirement);
        tentative_tasks
            .entry(placement.machine_id)
            .or_default()
            .insert(placement.task_id);
        PlacementOutcome::Accepted
    }

    fn apply_placement(inner: &mut CellInner, placement: &Placement) {
        let machine = inner
            .machines
            .get_mut(&placement.machine_id)
            .expect("validated placement references an existing machine");
        let task = inner
            .tasks
            .get_mut(&placement.task_id)
            .expect("validated placement references an existing task");

        machine.tasks.insert(placement.task_id);
        machine.allocated = machine.allocated + task.requirement;
        machine.version += 1;

        task.machine_id = Some(placement.machine_id);
        task.state = TaskState::Scheduled;
    }

    /// Releases a task's hold on its machine, idempotent per task id
    /// (spec.md §4.1). Called on completion (`failed = false`) or on
    /// machine failure (`failed = true`). Returns whether the task was
    /// actually still placed — `false` means this call was a no-op, which
    /// callers use to recognize a `task_completion` event that arrives for
    /// a task a machine failure already released.
    #[instrument(level = "debug", skip(self))]
    pub fn release(&self, task_id: TaskId, failed: bool, end_time: f64) -> Result<bool, CellError> {
        let mut inner = self.inner.write();
        let Some(task) = inner.tasks.get(&task_id) else {
            return Err(CellError::UnknownTask(task_id));
        };
        let Some(machine_id) = task.machine_id else {
            // Already released; idempotent no-op.
            return Ok(false);
        };

        {
            let machine = inner
                .machines
                .get_mut(&machine_id)
                .ok_or(CellError::UnknownMachine(machine_id))?;
            machine.tasks.remove(&task_id);
            let task = inner.tasks.get(&task_id).expect("checked above");
            machine.allocated = machine.allocated.saturating_sub(&task.requirement);
            machine.version += 1;
        }

        let task = inner.tasks.get_mut(&task_id).expect("checked above");
        task.machine_id = None;
        task.end_time = Some(end_time);
        task.state = if failed { TaskState::Failed } else { TaskState::Completed };
        inner.cell_version += 1;
        Ok(true)
    }

    /// Marks a machine failed, releasing every task it was running as
    /// `failed` rather than `completed` (spec.md §4.1). Returns the ids of
    /// tasks that were running, so the simulator can re-queue their jobs.
    #[instrument(level = "info", skip(self))]
    pub fn fail_machine(&self, machine_id: MachineId, at_time: f64) -> Result<Vec<TaskId>, CellError> {
        let running_tasks: Vec<TaskId> = {
            let mut inner = self.inner.write();
            let machine = inner
                .machines
                .get_mut(&machine_id)
                .ok_or(CellError::UnknownMachine(machine_id))?;
            machine.state = MachineState::Failed;
            machine.version += 1;
            let tasks: Vec<TaskId> = machine.tasks.iter().copied().collect();
            inner.cell_version += 1;
            tasks
        };

        for task_id in &running_tasks {
            self.release(*task_id, true, at_time)?;
        }
        warn!(machine = %machine_id, tasks_affected = running_tasks.len(), "machine failed");
        Ok(running_tasks)
    }

    /// Restores a failed machine to `healthy`, zeroing `allocated` and
    /// bumping its version (spec.md §4.5). Version is monotonic across
    /// failures, never reset (see DESIGN.md Open Question resolutions).
    #[instrument(level = "info", skip(self))]
    pub fn recover_machine(&self, machine_id: MachineId) -> Result<(), CellError> {
        let mut inner = self.inner.write();
        let machine = inner
            .machines
            .get_mut(&machine_id)
            .ok_or(CellError::UnknownMachine(machine_id))?;
        machine.state = MachineState::Healthy;
        machine.allocated = ResourceVector::ZERO;
        machine.tasks.clear();
        machine.version += 1;
        inner.cell_version += 1;
        info!(machine = %machine_id, "machine recovered");
        Ok(())
    }

    /// Checks the invariants of spec.md §8 across the whole cell. Intended
    /// for tests and for the simulator's fatal-abort path (spec.md §6's
    /// "invariant violation" exit condition), not for the commit hot path.
    pub fn verify_invariants(&self) -> Result<(), String> {
        let inner = self.inner.read();
        for machine in inner.machines.values() {
            if !machine.allocated.le_componentwise(&machine.capacity) {
                return Err(format!(
                    "machine {} over-allocated: {:?} > {:?}",
                    machine.id, machine.allocated, machine.capacity
                ));
            }
            let summed = machine
                .tasks
                .iter()
                .filter_map(|task_id| inner.tasks.get(task_id))
                .fold(ResourceVector::ZERO, |acc, task| acc + task.requirement);
            if summed != machine.allocated {
                return Err(format!(
                    "machine {} allocated {:?} does not match sum of task requirements {:?}",
                    machine.id, machine.allocated, summed
                ));
            }
        }

        let mut seen = BTreeSet::new();
        for machine in inner.machines.values() {
            for task_id in &machine.tasks {
                if !seen.insert(*task_id) {
                    return Err(format!("task {task_id} placed on more than one machine"));
                }
            }
        }

        for task in inner.tasks.values() {
            if task.state == TaskState::Completed {
                if task.machine_id.is_some() {
                    return Err(format!("task {} is completed but still holds a machine", task.id));
                }
                let (Some(start), Some(end)) = (task.start_time, task.end_time) else {
                    return Err(format!("task {} completed without start_time/end_time set", task.id));
                };
                if (end - (start + task.duration)).abs() > 1e-9 {
                    return Err(format!(
                        "task {} end_time {end} does not equal start_time {start} + duration {}",
                        task.id, task.duration
                    ));
                }
            }
        }
        Ok(())
    }
}
