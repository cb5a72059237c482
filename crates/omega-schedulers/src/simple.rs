use rand::Rng;

use omega_cell::{CommitMode, Placement, Snapshot};
use omega_resource_model::{JobType, SchedulerId};

use crate::actor::PlanOutput;
use crate::job::PendingJob;
use crate::policy::{select_machine, Overlay, PlacementStrategy};
use crate::SchedulingPolicy;

fn first_fit_plan(job: &PendingJob, snapshot: &Snapshot, strategy: PlacementStrategy) -> PlanOutput {
    let mut overlay = Overlay::new(snapshot);
    let mut placements = Vec::new();
    let mut infeasible = Vec::new();
    for task in &job.tasks {
        match select_machine(&overlay, task.requirement, strategy) {
            Some(machine_id) => {
                overlay.reserve(machine_id, task.requirement);
                let expected_version = snapshot.machine(machine_id).expect("selected from snapshot").version;
                placements.push(Placement {
                    task_id: task.id,
                    machine_id,
                    expected_machine_version: expected_version,
                });
            }
            None => infeasible.push(task.id),
        }
    }
    let task_info = job.tasks.iter().map(|t| (t.id, (t.duration, t.dependencies.clone()))).collect();
    PlanOutput {
        placements,
        mode: CommitMode::Incremental,
        infeasible,
        best_effort: Default::default(),
        task_info,
        new_tasks: Vec::new(),
    }
}

/// Accepts any job type and places with plain first-fit — the baseline
/// reference scheduler named in spec.md §9's polymorphic-scheduler list.
#[derive(Default)]
pub struct FirstFitPolicy;

impl SchedulingPolicy for FirstFitPolicy {
    fn accepts(&self, _job_type: JobType) -> bool {
        true
    }

    fn decision_time_job(&self) -> f64 {
        0.010
    }

    fn decision_time_task(&self) -> f64 {
        0.001
    }

    fn plan(&mut self, _scheduler_id: &SchedulerId, job: &PendingJob, snapshot: &Snapshot) -> PlanOutput {
        first_fit_plan(job, snapshot, PlacementStrategy::FirstFit)
    }
}

/// Orders its own queue by job priority (spec.md §9's `Priority` variant);
/// placement itself is first-fit. [`SchedulingPolicy::orders_by_priority`]
/// tells [`crate::SchedulerActor::enqueue`] to keep the queue sorted —
/// this policy's `plan` never sees the queue and has no ordering to apply
/// itself.
#[derive(Default)]
pub struct PriorityPolicy;

impl SchedulingPolicy for PriorityPolicy {
    fn accepts(&self, _job_type: JobType) -> bool {
        true
    }

    fn decision_time_job(&self) -> f64 {
        0.010
    }

    fn decision_time_task(&self) -> f64 {
        0.001
    }

    fn orders_by_priority(&self) -> bool {
        true
    }

    fn plan(&mut self, _scheduler_id: &SchedulerId, job: &PendingJob, snapshot: &Snapshot) -> PlanOutput {
        first_fit_plan(job, snapshot, PlacementStrategy::FirstFit)
    }
}

/// Cycles the target machine round-robin across its feasible set rather
/// than always picking the first fit, to spread load evenly without the
/// service scheduler's scoring overhead.
#[derive(Default)]
pub struct WeightedRoundRobinPolicy {
    cursor: usize,
}

impl SchedulingPolicy for WeightedRoundRobinPolicy {
    fn accepts(&self, _job_type: JobType) -> bool {
        true
    }

    fn decision_time_job(&self) -> f64 {
        0.010
    }

    fn decision_time_task(&self) -> f64 {
        0.001
    }

    fn plan(&mut self, _scheduler_id: &SchedulerId, job: &PendingJob, snapshot: &Snapshot) -> PlanOutput {
        let mut overlay = Overlay::new(snapshot);
        let mut placements = Vec::new();
        let mut infeasible = Vec::new();
        let machine_ids: Vec<_> = snapshot.machines().map(|(id, _)| *id).collect();

        for task in &job.tasks {
            let mut placed = false;
            if !machine_ids.is_empty() {
                for step in 0..machine_ids.len() {
                    let index = (self.cursor + step) % machine_ids.len();
                    let machine_id = machine_ids[index];
                    if let Some(remaining) = overlay.remaining(machine_id) {
                        if task.requirement.fits(&remaining) {
                            overlay.reserve(machine_id, task.requirement);
                            let expected_version = snapshot.machine(machine_id).expect("in snapshot").version;
                            placements.push(Placement {
                                task_id: task.id,
                                machine_id,
                                expected_machine_version: expected_version,
                            });
                            self.cursor = (index + 1) % machine_ids.len();
                            placed = true;
                            break;
                        }
                    }
                }
            }
            if !placed {
                infeasible.push(task.id);
            }
        }

        let task_info = job.tasks.iter().map(|t| (t.id, (t.duration, t.dependencies.clone()))).collect();
        PlanOutput {
            placements,
            mode: CommitMode::Incremental,
            infeasible,
            best_effort: Default::default(),
            task_info,
            new_tasks: Vec::new(),
        }
    }
}

/// Picks a uniformly random feasible machine per task, using the
/// scheduler's own seeded RNG so runs stay reproducible (spec.md §9
/// "deterministic parallelism").
pub struct RandomPolicy<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomPolicy<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send + Sync> SchedulingPolicy for RandomPolicy<R> {
    fn accepts(&self, _job_type: JobType) -> bool {
        true
    }

    fn decision_time_job(&self) -> f64 {
        0.010
    }

    fn decision_time_task(&self) -> f64 {
        0.001
    }

    fn plan(&mut self, _scheduler_id: &SchedulerId, job: &PendingJob, snapshot: &Snapshot) -> PlanOutput {
        let mut overlay = Overlay::new(snapshot);
        let mut placements = Vec::new();
        let mut infeasible = Vec::new();

        for task in &job.tasks {
            let feasible: Vec<_> = snapshot
                .machines()
                .filter_map(|(id, _)| {
                    let remaining = overlay.remaining(*id)?;
                    task.requirement.fits(&remaining).then_some(*id)
                })
                .collect();

            if feasible.is_empty() {
                infeasible.push(task.id);
                continue;
            }
            let index = self.rng.gen_range(0..feasible.len());
            let machine_id = feasible[index];
            overlay.reserve(machine_id, task.requirement);
            let expected_version = snapshot.machine(machine_id).expect("in snapshot").version;
            placements.push(Placement {
                task_id: task.id,
                machine_id,
                expected_machine_version: expected_version,
            });
        }

        let task_info = job.tasks.iter().map(|t| (t.id, (t.duration, t.dependencies.clone()))).collect();
        PlanOutput {
            placements,
            mode: CommitMode::Incremental,
            infeasible,
            best_effort: Default::default(),
            task_info,
            new_tasks: Vec::new(),
        }
    }
}
