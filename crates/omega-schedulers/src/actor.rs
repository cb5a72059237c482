use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use omega_cell::{CellState, CommitMode, Placement, PlacementOutcome, TaskSpec, Transaction};
use omega_resource_model::{JobId, JobType, MachineId, SchedulerId, TaskId};

use crate::job::PendingJob;
use crate::stats::SchedulerStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    Batch,
    Service,
    MapReduce,
    Priority,
    WeightedRoundRobin,
    FirstFit,
    Random,
}

/// What a policy wants done with one job's tasks, computed entirely from a
/// `Snapshot` — policies never touch the cell directly (spec.md §4.2
/// "Concurrency requirement").
pub struct PlanOutput {
    pub placements: Vec<Placement>,
    pub mode: CommitMode,
    /// Tasks the policy could not place this round (no feasible machine).
    pub infeasible: Vec<TaskId>,
    /// Placements whose rejection should not trigger a retry or count
    /// toward job failure — MapReduce's opportunistic clones (spec.md
    /// §4.2.3: "conflicts on the extras are tolerated without retry").
    pub best_effort: BTreeSet<TaskId>,
    /// `(duration, dependencies)` for every task named in `placements`,
    /// `infeasible`, or `best_effort` — covers tasks the policy invented
    /// (MapReduce clones) that don't appear in the job as submitted.
    pub task_info: BTreeMap<TaskId, (f64, BTreeSet<TaskId>)>,
    /// Specs for any task the policy invented this round (MapReduce's
    /// elastic clones) that the cell doesn't know about yet. A policy
    /// never touches the cell itself (spec.md §4.2's "Concurrency
    /// requirement" — only the commit call may); [`SchedulerActor::activate`]
    /// registers these via [`CellState::add_tasks`] before building the
    /// transaction that places them.
    pub new_tasks: Vec<TaskSpec>,
}

/// The placement logic specific to one scheduler variant. Everything else —
/// queueing, retry/backoff, stats — lives in [`SchedulerActor`], shared by
/// every variant (spec.md §4.2 "Common contract").
pub trait SchedulingPolicy: Send + Sync {
    fn accepts(&self, job_type: JobType) -> bool;
    fn decision_time_job(&self) -> f64;
    fn decision_time_task(&self) -> f64;
    fn plan(&mut self, scheduler_id: &SchedulerId, job: &PendingJob, snapshot: &omega_cell::Snapshot) -> PlanOutput;

    fn decision_time(&self, job: &PendingJob) -> f64 {
        self.decision_time_job() + self.decision_time_task() * job.task_count() as f64
    }

    /// Whether [`SchedulerActor::enqueue`] should keep the queue ordered by
    /// descending [`PendingJob::priority`] rather than plain FIFO. Only
    /// `PriorityPolicy` sets this.
    fn orders_by_priority(&self) -> bool {
        false
    }
}

/// A task this activation placed, for the simulator to schedule a
/// `task_completion` event against (spec.md §4.4).
#[derive(Debug, Clone)]
pub struct AcceptedPlacement {
    pub task_id: TaskId,
    pub machine_id: MachineId,
    pub duration: f64,
    pub dependencies: BTreeSet<TaskId>,
}

/// Terminal state an activation may leave a job in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    FullyScheduled,
    PartiallyScheduled,
    RetryScheduled,
    Failed,
}

/// What happened during one `scheduler_activation` (spec.md §4.4). The
/// simulator uses `decision_time` to advance virtual time for this
/// scheduler and `retry_after` to decide when to activate it again for the
/// same job.
pub struct ActivationReport {
    /// The job this activation worked on, so the simulator can update its
    /// own per-job bookkeeping without having to infer it back from
    /// `accepted` (which is empty whenever nothing could be placed).
    pub job_id: JobId,
    pub decision_time: f64,
    pub accepted: Vec<AcceptedPlacement>,
    pub job_outcome: Option<JobOutcome>,
    pub retry_after: Option<f64>,
    pub queue_nonempty: bool,
}

struct RetryState {
    job: PendingJob,
    attempts: u32,
    remaining_task_ids: BTreeSet<TaskId>,
}

/// Shared scaffolding for every scheduler variant: a job queue, the
/// plan-commit-retry loop of spec.md §4.2, and this scheduler's own
/// counters. Variants plug in only their [`SchedulingPolicy`].
pub struct SchedulerActor<P: SchedulingPolicy> {
    id: SchedulerId,
    kind: SchedulerKind,
    cell: Arc<CellState>,
    policy: P,
    queue: VecDeque<PendingJob>,
    retrying: Option<RetryState>,
    max_retries: u32,
    stats: SchedulerStats,
    /// `schedulers[].decision_time_job`/`decision_time_task` overrides
    /// (spec.md §6). `None` falls back to the policy's own spec.md-derived
    /// default.
    decision_time_job_override: Option<f64>,
    decision_time_task_override: Option<f64>,
}

const DEFAULT_MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_SECONDS: f64 = 1.0;

impl<P: SchedulingPolicy> SchedulerActor<P> {
    pub fn new(id: SchedulerId, kind: SchedulerKind, cell: Arc<CellState>, policy: P) -> Self {
        Self {
            id,
            kind,
            cell,
            policy,
            queue: VecDeque::new(),
            retrying: None,
            max_retries: DEFAULT_MAX_RETRIES,
            stats: SchedulerStats::default(),
            decision_time_job_override: None,
            decision_time_task_override: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_decision_time_overrides(mut self, job: Option<f64>, task: Option<f64>) -> Self {
        self.decision_time_job_override = job;
        self.decision_time_task_override = task;
        self
    }

    fn decision_time(&self, job: &PendingJob) -> f64 {
        let job_time = self.decision_time_job_override.unwrap_or_else(|| self.policy.decision_time_job());
        let task_time = self.decision_time_task_override.unwrap_or_else(|| self.policy.decision_time_task());
        job_time + task_time * job.task_count() as f64
    }

    pub fn id(&self) -> &SchedulerId {
        &self.id
    }

    pub fn kind(&self) -> SchedulerKind {
        self.kind
    }

    pub fn accepts(&self, job_type: JobType) -> bool {
        self.policy.accepts(job_type)
    }

    /// Appends `job` to the queue, or — for a policy with
    /// [`SchedulingPolicy::orders_by_priority`] set — inserts it ahead of
    /// every already-queued job of strictly lower priority (spec.md §9's
    /// `Priority` scheduler variant; ties keep FIFO order).
    pub fn enqueue(&mut self, job: PendingJob, now: f64) {
        self.stats.wait_time_sum += (now - job.submit_time).max(0.0);
        if self.policy.orders_by_priority() {
            let position = self
                .queue
                .iter()
                .position(|queued| queued.priority < job.priority)
                .unwrap_or(self.queue.len());
            self.queue.insert(position, job);
        } else {
            self.queue.push_back(job);
        }
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.retrying.is_none()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Runs one plan-commit cycle for one job, exactly as spec.md §4.2
    /// describes the common loop. A job either came fresh off the queue or
    /// is a retry of a job whose previous attempt left some tasks
    /// unplaced.
    #[instrument(level = "debug", skip(self), fields(scheduler = %self.id, kind = ?self.kind))]
    pub fn activate(&mut self, now: f64) -> Option<ActivationReport> {
        let (job, attempts, remaining_task_ids) = if let Some(state) = self.retrying.take() {
            (state.job, state.attempts, state.remaining_task_ids)
        } else {
            let job = self.queue.pop_front()?;
            let remaining: BTreeSet<TaskId> = job.tasks.iter().map(|t| t.id).collect();
            (job, 0, remaining)
        };

        let job_id = job.id;
        let decision_time = self.decision_time(&job);
        let snapshot = self.cell.snapshot();

        let restricted_job = restrict_to(&job, &remaining_task_ids);
        let plan = self.policy.plan(&self.id, &restricted_job, &snapshot);
        let mode = if job.require_gang { CommitMode::Gang } else { plan.mode };

        if plan.placements.is_empty() {
            return Some(self.conclude_no_placements(job, attempts, remaining_task_ids, plan.infeasible, decision_time, now));
        }

        // Tasks the policy invented this round (MapReduce's elastic clones)
        // must exist in the cell before any placement referencing them can
        // be validated; the policy only describes them, the actor — which
        // already owns the commit call — is what actually touches the cell.
        if !plan.new_tasks.is_empty() {
            let _ = self.cell.add_tasks(job_id, plan.new_tasks.clone());
        }

        let txn = Transaction::new(self.id.clone(), plan.placements.clone(), mode);
        let result = self.cell.commit(&txn);

        let mut accepted = Vec::new();
        let mut still_remaining = BTreeSet::new();
        let mut conflicts = 0u64;
        for (placement, outcome) in &result.outcomes {
            match outcome {
                PlacementOutcome::Accepted => {
                    let (duration, dependencies) = plan
                        .task_info
                        .get(&placement.task_id)
                        .cloned()
                        .unwrap_or((0.0, BTreeSet::new()));
                    accepted.push(AcceptedPlacement {
                        task_id: placement.task_id,
                        machine_id: placement.machine_id,
                        duration,
                        dependencies,
                    });
                }
                PlacementOutcome::Rejected(_) => {
                    if !plan.best_effort.contains(&placement.task_id) {
                        conflicts += 1;
                        still_remaining.insert(placement.task_id);
                    }
                }
            }
        }
        // Tasks the policy judged infeasible this round never reached the cell.
        still_remaining.extend(plan.infeasible.iter().copied());

        self.stats.conflicts += conflicts;
        self.stats.tasks_scheduled += accepted.len() as u64;
        self.stats.busy_time += decision_time;

        if still_remaining.is_empty() {
            self.stats.jobs_scheduled += 1;
            return Some(ActivationReport {
                job_id,
                decision_time,
                accepted,
                job_outcome: Some(JobOutcome::FullyScheduled),
                retry_after: None,
                queue_nonempty: !self.queue.is_empty(),
            });
        }

        if attempts + 1 >= self.max_retries {
            warn!(job = ?job.id, remaining = still_remaining.len(), "retries exhausted, abandoning remaining tasks");
            self.stats.jobs_failed += 1;
            return Some(ActivationReport {
                job_id,
                decision_time,
                accepted,
                job_outcome: Some(JobOutcome::PartiallyScheduled),
                retry_after: None,
                queue_nonempty: !self.queue.is_empty(),
            });
        }

        let backoff = BASE_BACKOFF_SECONDS * 2f64.powi(attempts as i32);
        debug!(job = ?job.id, attempts = attempts + 1, backoff, "retrying with fresh snapshot");
        self.retrying = Some(RetryState {
            job,
            attempts: attempts + 1,
            remaining_task_ids: still_remaining,
        });

        Some(ActivationReport {
            job_id,
            decision_time,
            accepted,
            job_outcome: Some(JobOutcome::RetryScheduled),
            retry_after: Some(backoff),
            queue_nonempty: !self.queue.is_empty(),
        })
    }

    fn conclude_no_placements(
        &mut self,
        job: PendingJob,
        attempts: u32,
        remaining_task_ids: BTreeSet<TaskId>,
        infeasible: Vec<TaskId>,
        decision_time: f64,
        _now: f64,
    ) -> ActivationReport {
        let job_id = job.id;
        self.stats.busy_time += decision_time;
        let nothing_feasible = infeasible.len() == remaining_task_ids.len();
        if nothing_feasible || attempts + 1 >= self.max_retries {
            self.stats.jobs_failed += 1;
            return ActivationReport {
                job_id,
                decision_time,
                accepted: Vec::new(),
                job_outcome: Some(JobOutcome::Failed),
                retry_after: None,
                queue_nonempty: !self.queue.is_empty(),
            };
        }
        let backoff = BASE_BACKOFF_SECONDS * 2f64.powi(attempts as i32);
        self.retrying = Some(RetryState {
            job,
            attempts: attempts + 1,
            remaining_task_ids,
        });
        ActivationReport {
            job_id,
            decision_time,
            accepted: Vec::new(),
            job_outcome: Some(JobOutcome::RetryScheduled),
            retry_after: Some(backoff),
            queue_nonempty: !self.queue.is_empty(),
        }
    }
}

fn restrict_to(job: &PendingJob, ids: &BTreeSet<TaskId>) -> PendingJob {
    let mut restricted = job.clone();
    restricted.tasks.retain(|t| ids.contains(&t.id));
    restricted
}
