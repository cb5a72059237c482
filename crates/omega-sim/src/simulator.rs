use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};

use omega_cell::{CellState, TaskSpec};
use omega_config::{CellStateSummary, Config, DistributionOverrides, JobTrace, Results, SchedulerSummary, Utilization, WorkloadConfig};
use omega_resource_model::{JobId, JobType, MachineId, TaskId};
use omega_schedulers::{AcceptedPlacement, JobOutcome, PendingJob};
use omega_workload::{WorkloadGenerator, WorkloadParams};

use crate::any_scheduler::AnyScheduler;
use crate::cluster::build_cluster;
use crate::error::SimulationError;
use crate::event::{EventKind, ScheduledEvent};
use crate::failure::{sample_recovery_downtime, schedule_failure_times};
use crate::scheduler_factory::build_scheduler;

/// Per-job bookkeeping the simulator keeps on top of the cell's own state
/// (spec.md §6's results record needs job-level outcomes the cell, which
/// only knows about tasks and machines, never tracks on its own). Scoped to
/// a job's *original* task set — a MapReduce scheduler's opportunistic
/// clones never enter `base_task_ids`, so they can neither block nor
/// spuriously complete a job.
struct JobRecord {
    job_type: JobType,
    scheduler_index: usize,
    submit_time: f64,
    base_task_ids: BTreeSet<TaskId>,
    done_task_ids: BTreeSet<TaskId>,
    failed: bool,
    completion_time: Option<f64>,
}

/// A task a scheduler already placed but which hasn't started running yet
/// because one or more predecessors are still in flight (spec.md §3:
/// `start_time = max(scheduling_time, max(predecessor.end_time))`).
struct WaitingTask {
    duration: f64,
    remaining_deps: BTreeSet<TaskId>,
    earliest_start: f64,
}

/// The discrete-event kernel (spec.md §4.4-§4.5): owns the cell, the
/// scheduler roster, and the virtual-time event queue, and is the only
/// place that knows how a `task_completion` fans out into job bookkeeping,
/// dependent-task starts, and retried scheduler activations.
pub struct Simulator {
    cell: Arc<CellState>,
    schedulers: Vec<AnyScheduler>,
    scheduler_ids: Vec<String>,
    require_gang: Vec<bool>,

    queue: BinaryHeap<Reverse<ScheduledEvent>>,
    next_seq: u64,
    now: f64,
    horizon: f64,

    experiment_name: String,
    trace_jobs: bool,

    jobs: HashMap<JobId, JobRecord>,
    waiting: HashMap<TaskId, WaitingTask>,
    dependents_of: HashMap<TaskId, Vec<TaskId>>,
    next_requeue_task_id: u64,

    failure_rng: StdRng,
    recovery_mean: f64,
}

/// Base of the id range minted for machine-failure replacement tasks (see
/// [`Simulator::take_requeue_task_id`]) — far past anything the workload
/// generator's sequential ids or MapReduce's `job_id * 1_000_000 + 500_000`
/// clone ids would ever reach.
const REQUEUE_TASK_ID_BASE: u64 = 1 << 40;

impl Simulator {
    /// Builds a simulator from an already-[`Config::validate`]d config.
    /// Validation is the caller's job — a config error is a different
    /// failure mode from the `SimulationError` this crate raises once the
    /// run is under way (spec.md §7).
    pub fn new(config: &Config) -> Self {
        let cell = build_cluster(&config.cluster, config.seed);
        let horizon = config.simulation.duration;

        let mut schedulers = Vec::with_capacity(config.schedulers.len());
        let mut scheduler_ids = Vec::with_capacity(config.schedulers.len());
        let mut require_gang = Vec::with_capacity(config.schedulers.len());
        for (index, scheduler_config) in config.schedulers.iter().enumerate() {
            // Derives one sub-seed per scheduler off the run's top-level
            // seed, so `Random`-policy schedulers stay reproducible without
            // sharing an RNG across actors (spec.md §9's "deterministic
            // parallelism": two runs of the same config always produce the
            // same schedule, independent of activation order).
            let seed = config.seed.wrapping_add(1 + index as u64);
            schedulers.push(build_scheduler(scheduler_config, &cell, seed));
            scheduler_ids.push(scheduler_config.id.clone());
            require_gang.push(scheduler_config.require_gang);
        }

        let mut simulator = Self {
            cell,
            schedulers,
            scheduler_ids,
            require_gang,
            queue: BinaryHeap::new(),
            next_seq: 0,
            now: 0.0,
            horizon,
            experiment_name: config.experiment_name.clone(),
            trace_jobs: config.trace_jobs,
            jobs: HashMap::new(),
            waiting: HashMap::new(),
            dependents_of: HashMap::new(),
            next_requeue_task_id: 0,
            failure_rng: StdRng::seed_from_u64(config.seed.wrapping_add(0xF41)),
            recovery_mean: config.failures.recovery_mean.unwrap_or(300.0),
        };

        simulator.seed_arrivals(config);
        simulator.seed_failures(config);
        simulator
    }

    fn seed_arrivals(&mut self, config: &Config) {
        let params = workload_params_from_config(&config.workload);
        let generator = WorkloadGenerator::new(config.seed, params, self.horizon);
        for (arrival_time, job) in generator {
            self.push_event(arrival_time, EventKind::JobArrival { job: Box::new(job) });
        }
    }

    fn seed_failures(&mut self, config: &Config) {
        if !config.failures.enabled {
            return;
        }
        let rate = config.failures.rate.unwrap_or(0.0);
        let num_machines = config.cluster.num_machines;
        let times = schedule_failure_times(&mut self.failure_rng, rate, num_machines, self.horizon);
        for time in times {
            let machine_id = MachineId(self.failure_rng.gen_range(0..num_machines as u64));
            self.push_event(time, EventKind::MachineFailure { machine_id });
        }
    }

    fn push_event(&mut self, time: f64, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(ScheduledEvent { time, seq, kind }));
    }

    /// Drains the event queue up to `horizon` and returns the results
    /// record (spec.md §6), or the invariant violation that aborted the run
    /// (spec.md §7's fatal exit condition) — checked once the queue is
    /// empty, since the cell itself already rejects any single commit that
    /// would violate a machine's capacity.
    #[instrument(level = "info", skip(self), fields(experiment = %self.experiment_name))]
    pub fn run(mut self) -> Result<Results, SimulationError> {
        while let Some(Reverse(event)) = self.queue.pop() {
            if event.time > self.horizon {
                break;
            }
            self.now = event.time;
            match event.kind {
                EventKind::JobArrival { job } => self.handle_job_arrival(*job),
                EventKind::SchedulerActivation { scheduler_index } => self.handle_scheduler_activation(scheduler_index),
                EventKind::TaskCompletion { task_id } => self.handle_task_completion(task_id),
                EventKind::MachineFailure { machine_id } => self.handle_machine_failure(machine_id),
                EventKind::MachineRecovery { machine_id } => self.handle_machine_recovery(machine_id),
            }
        }
        if let Err(detail) = self.cell.verify_invariants() {
            return Err(SimulationError::InvariantViolation { at_time: self.now, detail });
        }
        Ok(self.into_results())
    }

    fn handle_job_arrival(&mut self, mut job: PendingJob) {
        let Some(scheduler_index) = self.schedulers.iter().position(|s| s.accepts(job.job_type)) else {
            warn!(job = ?job.id, job_type = ?job.job_type, "no configured scheduler accepts this job type, dropping");
            return;
        };
        job.require_gang = self.require_gang[scheduler_index];

        self.cell.register_job(job.id, job.job_type, job.priority, job.submit_time, job.tasks.clone());
        self.jobs.insert(
            job.id,
            JobRecord {
                job_type: job.job_type,
                scheduler_index,
                submit_time: job.submit_time,
                base_task_ids: job.tasks.iter().map(|t| t.id).collect(),
                done_task_ids: BTreeSet::new(),
                failed: false,
                completion_time: None,
            },
        );

        let was_idle = self.schedulers[scheduler_index].is_idle();
        self.schedulers[scheduler_index].enqueue(job, self.now);
        if was_idle {
            self.push_event(self.now, EventKind::SchedulerActivation { scheduler_index });
        }
    }

    fn handle_scheduler_activation(&mut self, scheduler_index: usize) {
        let now = self.now;
        let Some(report) = self.schedulers[scheduler_index].activate(now) else {
            return;
        };
        let placed_at = now + report.decision_time;

        for placement in report.accepted {
            self.admit_placement(placement, placed_at);
        }

        match report.job_outcome {
            Some(JobOutcome::Failed) | Some(JobOutcome::PartiallyScheduled) => {
                if let Some(record) = self.jobs.get_mut(&report.job_id) {
                    record.failed = true;
                    record.completion_time = Some(placed_at);
                }
            }
            _ => {}
        }

        if let Some(backoff) = report.retry_after {
            self.push_event(placed_at + backoff, EventKind::SchedulerActivation { scheduler_index });
        } else if report.queue_nonempty {
            self.push_event(placed_at, EventKind::SchedulerActivation { scheduler_index });
        }
    }

    /// Starts a just-accepted placement immediately if its dependencies are
    /// already done, or parks it in `waiting` otherwise (spec.md §3).
    fn admit_placement(&mut self, placement: AcceptedPlacement, placed_at: f64) {
        let AcceptedPlacement {
            task_id,
            duration,
            dependencies,
            ..
        } = placement;

        let remaining_deps: BTreeSet<TaskId> = dependencies
            .into_iter()
            .filter(|dep| !self.is_task_done(*dep))
            .collect();

        if remaining_deps.is_empty() {
            self.start_task(task_id, duration, placed_at);
            return;
        }

        for dep in &remaining_deps {
            self.dependents_of.entry(*dep).or_default().push(task_id);
        }
        self.waiting.insert(
            task_id,
            WaitingTask {
                duration,
                remaining_deps,
                earliest_start: placed_at,
            },
        );
    }

    fn is_task_done(&self, task_id: TaskId) -> bool {
        self.jobs
            .values()
            .any(|record| record.done_task_ids.contains(&task_id))
    }

    fn start_task(&mut self, task_id: TaskId, duration: f64, at_time: f64) {
        if self.cell.start_task(task_id, at_time).is_err() {
            // Task was orphaned by a machine failure between being placed
            // and reaching the front of the dependency queue; nothing to
            // start, and its job was already re-queued by the failure
            // handler.
            return;
        }
        self.push_event(at_time + duration, EventKind::TaskCompletion { task_id });
    }

    fn handle_task_completion(&mut self, task_id: TaskId) {
        let now = self.now;
        let released = self.cell.release(task_id, false, now).unwrap_or(false);
        if !released {
            // Already released by a machine failure; this event is a stale
            // duplicate and carries no further bookkeeping to apply.
            return;
        }

        if let Some(job_id) = self.cell.task_job_id(task_id) {
            self.mark_task_done(job_id, task_id, now);
        }

        self.release_dependents(task_id, now);
    }

    fn mark_task_done(&mut self, job_id: JobId, task_id: TaskId, now: f64) {
        let Some(record) = self.jobs.get_mut(&job_id) else {
            return;
        };
        if !record.base_task_ids.contains(&task_id) {
            return;
        }
        record.done_task_ids.insert(task_id);
        if record.done_task_ids.len() == record.base_task_ids.len() && !record.failed {
            record.completion_time = Some(now);
            debug!(job = ?job_id, completion_time = now, "job completed");
        }
    }

    fn release_dependents(&mut self, task_id: TaskId, now: f64) {
        let Some(dependents) = self.dependents_of.remove(&task_id) else {
            return;
        };
        for dependent in dependents {
            let ready = if let Some(waiting) = self.waiting.get_mut(&dependent) {
                waiting.remaining_deps.remove(&task_id);
                waiting.earliest_start = waiting.earliest_start.max(now);
                waiting.remaining_deps.is_empty()
            } else {
                false
            };
            if ready {
                if let Some(waiting) = self.waiting.remove(&dependent) {
                    self.start_task(dependent, waiting.duration, waiting.earliest_start);
                }
            }
        }
    }

    fn handle_machine_failure(&mut self, machine_id: MachineId) {
        let now = self.now;
        if !self.cell.snapshot().machine(machine_id).map(|m| m.is_healthy()).unwrap_or(false) {
            debug!(machine = %machine_id, "failure drawn against an already-down machine, skipping");
            return;
        }

        let affected = match self.cell.fail_machine(machine_id, now) {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(machine = %machine_id, error = %err, "failed to fail a machine the snapshot said was healthy");
                return;
            }
        };

        for task_id in affected {
            self.requeue_orphaned_task(task_id, now);
        }

        if self.recovery_mean > 0.0 {
            let downtime = sample_recovery_downtime(&mut self.failure_rng, self.recovery_mean);
            self.push_event(now + downtime, EventKind::MachineRecovery { machine_id });
        }
    }

    /// Re-submits one task orphaned by a machine failure as a fresh
    /// one-task job back to the scheduler that originally placed it
    /// (spec.md §4.1 "Affected jobs are re-queued"). Reuses the original
    /// job id rather than minting a new one — this is the same logical job,
    /// just missing a task that needs replacing. The task itself gets a
    /// fresh id: the orphaned task's own `TaskCompletion` event (from its
    /// first, now-failed run) is still sitting in the queue, and if the
    /// replacement reused that id, the stale event would find the
    /// replacement's `machine_id` set and release it early instead of
    /// no-op'ing against the dead original.
    fn requeue_orphaned_task(&mut self, task_id: TaskId, now: f64) {
        let Some(spec) = self.cell.task_spec(task_id) else {
            return;
        };
        let Some(record) = self.jobs.get(&spec.job_id) else {
            return;
        };
        let scheduler_index = record.scheduler_index;
        let job_type = record.job_type;

        let replacement_id = self.take_requeue_task_id();
        let replacement_spec = TaskSpec {
            id: replacement_id,
            job_id: spec.job_id,
            requirement: spec.requirement,
            duration: spec.duration,
            dependencies: spec.dependencies,
        };
        if self.cell.add_tasks(spec.job_id, vec![replacement_spec.clone()]).is_err() {
            return;
        }

        // The job's completion bookkeeping tracks task ids from the job as
        // originally submitted; swap the failed id for the replacement's so
        // the job can still reach "all base tasks done".
        if let Some(record) = self.jobs.get_mut(&spec.job_id) {
            record.base_task_ids.remove(&task_id);
            record.base_task_ids.insert(replacement_id);
        }

        let replacement = PendingJob {
            id: spec.job_id,
            job_type,
            priority: 0,
            submit_time: now,
            tasks: vec![replacement_spec],
            require_gang: false,
        };

        let was_idle = self.schedulers[scheduler_index].is_idle();
        self.schedulers[scheduler_index].enqueue(replacement, now);
        if was_idle {
            self.push_event(now, EventKind::SchedulerActivation { scheduler_index });
        }
    }

    /// A task id namespace reserved for machine-failure replacements, well
    /// clear of the workload generator's own sequential ids and the
    /// MapReduce scheduler's `job_id`-derived clone ids.
    fn take_requeue_task_id(&mut self) -> TaskId {
        let id = TaskId(REQUEUE_TASK_ID_BASE + self.next_requeue_task_id);
        self.next_requeue_task_id += 1;
        id
    }

    fn handle_machine_recovery(&mut self, machine_id: MachineId) {
        if let Err(err) = self.cell.recover_machine(machine_id) {
            warn!(machine = %machine_id, error = %err, "recovery event for an unregistered machine");
        }
    }

    fn into_results(self) -> Results {
        let mut completed_jobs = 0u64;
        let mut failed_jobs = 0u64;
        let mut traces = Vec::new();

        for (job_id, record) in &self.jobs {
            let done = record.done_task_ids.len() == record.base_task_ids.len();
            if record.failed {
                failed_jobs += 1;
            } else if done {
                completed_jobs += 1;
            }
            if self.trace_jobs {
                traces.push(JobTrace {
                    job_id: job_id.0,
                    job_type: format!("{:?}", record.job_type),
                    submit_time: record.submit_time,
                    completion_time: record.completion_time,
                    failed: record.failed,
                    task_count: record.base_task_ids.len(),
                });
            }
        }
        traces.sort_by_key(|t| t.job_id);

        let mut schedulers = BTreeMap::new();
        for (id, actor) in self.scheduler_ids.iter().zip(self.schedulers.iter()) {
            let stats = actor.stats();
            schedulers.insert(
                id.clone(),
                SchedulerSummary {
                    jobs_scheduled: stats.jobs_scheduled,
                    tasks_scheduled: stats.tasks_scheduled,
                    jobs_failed: stats.jobs_failed,
                    conflicts: stats.conflicts,
                    conflict_rate: stats.conflict_rate(),
                    busy_time: stats.busy_time,
                    avg_wait_time: stats.avg_wait_time(),
                },
            );
        }

        let cell_stats = self.cell.stats();
        let (cpu, gpu, memory) = self.cell.cluster_utilization();

        info!(completed_jobs, failed_jobs, "simulation finished");

        Results {
            experiment_name: self.experiment_name,
            simulation_time: self.horizon,
            completed_jobs,
            failed_jobs,
            schedulers,
            cell_state: CellStateSummary {
                total_transactions: cell_stats.total_transactions,
                total_commits: cell_stats.total_commits,
                total_conflicts: cell_stats.total_conflicts,
                conflict_rate: cell_stats.conflict_rate(),
                utilization: Utilization { cpu, gpu, memory },
            },
            per_job_trace: self.trace_jobs.then_some(traces),
        }
    }
}

/// Bridges `workload.arrival_rate_*` and `workload.overrides` (spec.md §6)
/// into the generator's own parameter set. `workload.batch_ratio` has no
/// counterpart here: the generator runs one independent Poisson process per
/// job type (spec.md §4.3) off the two explicit rates rather than splitting
/// a single combined rate by ratio, so the ratio field is config-schema
/// compatibility only (see DESIGN.md).
fn workload_params_from_config(workload: &WorkloadConfig) -> WorkloadParams {
    let mut params = WorkloadParams::default();
    params.mean_interarrival_batch = 1.0 / workload.arrival_rate_batch;
    params.mean_interarrival_service = 1.0 / workload.arrival_rate_service;
    params.include_mapreduce = workload.include_mapreduce;

    if let Some(DistributionOverrides {
        task_count_log_mean,
        task_count_log_std,
        batch_duration_mean_seconds,
        service_duration_mean_seconds,
        resource_cpu_mean,
        resource_cpu_std,
        resource_memory_mean_gb,
        resource_memory_std_gb,
        batch_gpu_fraction,
        service_gpu_fraction,
    }) = &workload.overrides
    {
        if let Some(v) = task_count_log_mean {
            params.task_count_mean = *v;
        }
        if let Some(v) = task_count_log_std {
            params.task_count_std = *v;
        }
        if let Some(v) = batch_duration_mean_seconds {
            params.batch_duration_mean_seconds = *v;
        }
        if let Some(v) = service_duration_mean_seconds {
            params.service_duration_mean_seconds = *v;
        }
        if let Some(v) = resource_cpu_mean {
            params.resource_cpu_mean = *v;
        }
        if let Some(v) = resource_cpu_std {
            params.resource_cpu_std = *v;
        }
        if let Some(v) = resource_memory_mean_gb {
            params.resource_memory_mean_gb = *v;
        }
        if let Some(v) = resource_memory_std_gb {
            params.resource_memory_std_gb = *v;
        }
        if let Some(v) = batch_gpu_fraction {
            params.batch_gpu_fraction = *v;
        }
        if let Some(v) = service_gpu_fraction {
            params.service_gpu_fraction = *v;
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use omega_config::{ClusterConfig, FailuresConfig, SchedulerConfig, SchedulerType, SimulationConfig};

    fn minimal_config() -> Config {
        Config {
            experiment_name: "sim-test".into(),
            seed: 42,
            output_dir: "/tmp/omega".into(),
            cluster: ClusterConfig {
                num_machines: 8,
                heterogeneous: false,
            },
            schedulers: vec![
                SchedulerConfig {
                    id: "batch-0".into(),
                    scheduler_type: SchedulerType::Batch,
                    decision_time_job: None,
                    decision_time_task: None,
                    placement_strategy: None,
                    max_retries: 3,
                    require_gang: false,
                    policy: None,
                },
                SchedulerConfig {
                    id: "service-0".into(),
                    scheduler_type: SchedulerType::Service,
                    decision_time_job: None,
                    decision_time_task: None,
                    placement_strategy: None,
                    max_retries: 3,
                    require_gang: false,
                    policy: None,
                },
            ],
            simulation: SimulationConfig { duration: 2000.0 },
            workload: WorkloadConfig {
                batch_ratio: 0.8,
                arrival_rate_batch: 0.1,
                arrival_rate_service: 0.02,
                include_mapreduce: false,
                overrides: None,
            },
            failures: FailuresConfig {
                enabled: false,
                rate: None,
                recovery_mean: None,
            },
            trace_jobs: true,
        }
    }

    #[test]
    fn a_short_run_completes_without_panicking_and_produces_results() {
        let config = minimal_config();
        let simulator = Simulator::new(&config);
        let results = simulator.run().unwrap();
        assert_eq!(results.experiment_name, "sim-test");
        assert_eq!(results.simulation_time, 2000.0);
        assert!(results.schedulers.contains_key("batch-0"));
        assert!(results.schedulers.contains_key("service-0"));
    }

    #[test]
    fn completed_and_failed_jobs_never_exceed_total_arrivals() {
        let config = minimal_config();
        let simulator = Simulator::new(&config);
        let results = simulator.run().unwrap();
        let trace = results.per_job_trace.expect("trace_jobs was enabled");
        assert_eq!(results.completed_jobs + results.failed_jobs, trace.iter().filter(|t| t.completion_time.is_some() || t.failed).count() as u64);
    }

    #[test]
    fn failures_enabled_still_produces_a_consistent_run() {
        let mut config = minimal_config();
        config.failures = FailuresConfig {
            enabled: true,
            rate: Some(0.0005),
            recovery_mean: Some(50.0),
        };
        let simulator = Simulator::new(&config);
        let results = simulator.run().unwrap();
        assert!(results.cell_state.total_transactions >= results.cell_state.total_commits);
    }

    #[test]
    fn same_seed_produces_identical_results() {
        let config = minimal_config();
        let a = Simulator::new(&config).run().unwrap();
        let b = Simulator::new(&config).run().unwrap();
        assert_eq!(a.completed_jobs, b.completed_jobs);
        assert_eq!(a.failed_jobs, b.failed_jobs);
        assert_eq!(a.cell_state.total_transactions, b.cell_state.total_transactions);
    }

    /// spec.md §8 scenario 5, driven end to end: a two-task batch job lands
    /// one task per machine, machine 0 fails mid-run, and the orphaned
    /// task's job is re-queued and lands on the surviving machine.
    #[test]
    fn machine_failure_requeues_the_orphaned_task_onto_the_surviving_machine() {
        use omega_config::PlacementStrategyConfig;
        use omega_resource_model::ResourceVector;

        let config = Config {
            experiment_name: "failure-scenario".into(),
            seed: 42,
            output_dir: "/tmp/omega".into(),
            cluster: ClusterConfig {
                num_machines: 2,
                heterogeneous: false,
            },
            schedulers: vec![SchedulerConfig {
                id: "batch-0".into(),
                scheduler_type: SchedulerType::Batch,
                decision_time_job: None,
                decision_time_task: None,
                // Worst-fit spreads the job's two tasks one per machine
                // (each pick favors the machine with the most headroom)
                // while leaving each machine enough spare capacity to also
                // absorb the other's replacement task after a failure.
                placement_strategy: Some(PlacementStrategyConfig::WorstFit),
                max_retries: 3,
                require_gang: false,
                policy: None,
            }],
            simulation: SimulationConfig { duration: 500.0 },
            workload: WorkloadConfig {
                batch_ratio: 1.0,
                arrival_rate_batch: 0.0,
                arrival_rate_service: 0.0,
                include_mapreduce: false,
                overrides: None,
            },
            failures: FailuresConfig {
                enabled: false,
                rate: None,
                recovery_mean: None,
            },
            trace_jobs: true,
        };

        let mut simulator = Simulator::new(&config);

        // Both machines default to the homogeneous STANDARD capacity
        // (32, 0, 64.0); a small requirement leaves each machine enough
        // headroom to take on the other's orphaned replacement task.
        let requirement = ResourceVector::new(2, 0, 4.0);
        let job = PendingJob {
            id: JobId(0),
            job_type: JobType::Batch,
            priority: 0,
            submit_time: 0.0,
            tasks: vec![
                TaskSpec {
                    id: TaskId(0),
                    job_id: JobId(0),
                    requirement,
                    duration: 100.0,
                    dependencies: BTreeSet::new(),
                },
                TaskSpec {
                    id: TaskId(1),
                    job_id: JobId(0),
                    requirement,
                    duration: 100.0,
                    dependencies: BTreeSet::new(),
                },
            ],
            require_gang: false,
        };
        simulator.handle_job_arrival(job);
        simulator.push_event(50.0, EventKind::MachineFailure { machine_id: MachineId(0) });

        let results = simulator.run().unwrap();
        assert_eq!(results.failed_jobs, 0, "replacement task should find room on the surviving machine");
        assert_eq!(results.completed_jobs, 1);

        let trace = results.per_job_trace.expect("trace_jobs was enabled");
        assert_eq!(trace.len(), 1);
        assert!(!trace[0].failed);

        // The replacement task is placed around t=50 and runs the full
        // 100s duration; the job should complete near t=150, not near
        // t=100 (which would mean the replacement's completion event got
        // released early by the orphaned task's stale, never-cancelled
        // completion event from its first, failed run).
        let completion = trace[0].completion_time.expect("job should have completed");
        assert!(
            completion > 140.0,
            "job completed at {completion}, expected ~150 (end_time == start_time + duration for the replacement task)"
        );
    }
}
