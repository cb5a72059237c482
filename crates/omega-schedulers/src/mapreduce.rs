use std::collections::BTreeSet;

use omega_cell::{CommitMode, Placement, Snapshot, TaskSpec};
use omega_resource_model::{JobType, SchedulerId, TaskId};

use crate::actor::PlanOutput;
use crate::job::PendingJob;
use crate::policy::{select_machine, Overlay, PlacementStrategy};
use crate::SchedulingPolicy;

#[derive(Debug, Clone, Copy)]
pub enum ElasticPolicy {
    /// `N' = min(N + available_slots, hard_cap)`.
    MaxParallelism { hard_cap: usize },
    /// Scale up only while cluster utilization stays below `threshold`.
    GlobalCap { threshold: f64 },
    /// `N' <= relative_factor * N`.
    RelativeJobSize { relative_factor: usize },
}

/// Opportunistic MapReduce scaling (spec.md §4.2.3):
/// `decision_time_job ≈ 0.2s`, `decision_time_task ≈ 0.01s`. Extra clones of
/// the base task template are generated and returned via
/// `PlanOutput.new_tasks` for `SchedulerActor::activate` to register with
/// the cell before placing them in one incremental transaction — this
/// policy only describes them, never touches the cell itself (spec.md
/// §4.2's "Concurrency requirement"). Conflicts on the extras are
/// tolerated without retry, since the scaling itself is best-effort.
pub struct MapReducePolicy {
    pub elastic: ElasticPolicy,
    pub strategy: PlacementStrategy,
}

impl MapReducePolicy {
    pub fn new(elastic: ElasticPolicy) -> Self {
        Self {
            elastic,
            strategy: PlacementStrategy::FirstFit,
        }
    }

    /// Deterministic, collision-free ids for opportunistic clone tasks:
    /// derived from the job id and clone index rather than drawn from a
    /// shared counter, since this scheduler has no authority to mint ids
    /// the workload generator would also hand out.
    fn clone_task_id(job_id: omega_resource_model::JobId, index: usize) -> TaskId {
        TaskId(job_id.0 * 1_000_000 + 500_000 + index as u64)
    }

    fn elastic_target(&self, base_n: usize, snapshot: &Snapshot) -> usize {
        match self.elastic {
            ElasticPolicy::MaxParallelism { hard_cap } => {
                let available_slots = snapshot
                    .machines()
                    .filter(|(_, view)| view.is_healthy())
                    .count();
                (base_n + available_slots).min(hard_cap)
            }
            ElasticPolicy::GlobalCap { threshold } => {
                let (cpu_util, _, _) = snapshot.cluster_utilization();
                if cpu_util < threshold {
                    base_n * 2
                } else {
                    base_n
                }
            }
            ElasticPolicy::RelativeJobSize { relative_factor } => base_n * relative_factor,
        }
    }
}

impl SchedulingPolicy for MapReducePolicy {
    fn accepts(&self, job_type: JobType) -> bool {
        matches!(job_type, JobType::MapReduce)
    }

    fn decision_time_job(&self) -> f64 {
        0.2
    }

    fn decision_time_task(&self) -> f64 {
        0.01
    }

    fn plan(&mut self, _scheduler_id: &SchedulerId, job: &PendingJob, snapshot: &Snapshot) -> PlanOutput {
        let base_n = job.tasks.len();
        let target_n = self.elastic_target(base_n, snapshot).max(base_n);

        let mut all_tasks: Vec<TaskSpec> = job
            .tasks
            .iter()
            .map(|t| TaskSpec {
                id: t.id,
                job_id: t.job_id,
                requirement: t.requirement,
                duration: t.duration,
                dependencies: t.dependencies.clone(),
            })
            .collect();

        let mut new_tasks = Vec::new();
        if target_n > base_n {
            let template = job.tasks.first().cloned();
            if let Some(template) = template {
                let mut extras = Vec::with_capacity(target_n - base_n);
                for index in 0..(target_n - base_n) {
                    extras.push(TaskSpec {
                        id: Self::clone_task_id(job.id, index),
                        job_id: job.id,
                        requirement: template.requirement,
                        duration: template.duration,
                        dependencies: BTreeSet::new(),
                    });
                }
                all_tasks.extend(extras.iter().cloned());
                new_tasks = extras;
            }
        }

        let base_task_ids: BTreeSet<TaskId> = job.tasks.iter().map(|t| t.id).collect();
        let best_effort: BTreeSet<TaskId> = all_tasks
            .iter()
            .map(|t| t.id)
            .filter(|id| !base_task_ids.contains(id))
            .collect();
        let mut overlay = Overlay::new(snapshot);
        let mut placements = Vec::new();
        // Only a base task's infeasibility triggers the common retry loop;
        // an opportunistic clone that doesn't fit is simply dropped.
        let mut infeasible = Vec::new();
        for task in &all_tasks {
            match select_machine(&overlay, task.requirement, self.strategy) {
                Some(machine_id) => {
                    overlay.reserve(machine_id, task.requirement);
                    let expected_version = snapshot.machine(machine_id).expect("selected from snapshot").version;
                    placements.push(Placement {
                        task_id: task.id,
                        machine_id,
                        expected_machine_version: expected_version,
                    });
                }
                None if base_task_ids.contains(&task.id) => infeasible.push(task.id),
                None => {}
            }
        }

        let task_info = all_tasks
            .iter()
            .map(|t| (t.id, (t.duration, t.dependencies.clone())))
            .collect();

        PlanOutput {
            placements,
            mode: CommitMode::Incremental,
            infeasible,
            best_effort,
            task_info,
            new_tasks,
        }
    }
}
