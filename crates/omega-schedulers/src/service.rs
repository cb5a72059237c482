use std::collections::HashMap;

use omega_cell::{CommitMode, Placement, Snapshot};
use omega_resource_model::{FailureDomain, JobType, MachineId, SchedulerId};

use crate::actor::PlanOutput;
use crate::job::PendingJob;
use crate::policy::{service_score, Overlay};
use crate::SchedulingPolicy;

/// Scored service placement (spec.md §4.2.2): `decision_time_job ≈ 1.0s`,
/// `decision_time_task ≈ 0.05s`. Picks the maximum-scoring feasible machine
/// per task, ties broken by lowest machine id.
#[derive(Default)]
pub struct ServicePolicy;

impl SchedulingPolicy for ServicePolicy {
    fn accepts(&self, job_type: JobType) -> bool {
        matches!(job_type, JobType::Service)
    }

    fn decision_time_job(&self) -> f64 {
        1.0
    }

    fn decision_time_task(&self) -> f64 {
        0.05
    }

    fn plan(&mut self, _scheduler_id: &SchedulerId, job: &PendingJob, snapshot: &Snapshot) -> PlanOutput {
        let mut overlay = Overlay::new(snapshot);
        let mut placements = Vec::new();
        let mut infeasible = Vec::new();

        // Per-domain and per-machine counts of tasks *this plan* has placed
        // so far, used for the diversity and load-balancing score terms.
        let mut domain_counts: HashMap<FailureDomain, usize> = HashMap::new();
        let mut machine_task_counts: HashMap<MachineId, usize> = HashMap::new();
        let mut machines_used_by_job: std::collections::HashSet<MachineId> = std::collections::HashSet::new();

        for task in &job.tasks {
            let wants_gpu = task.requirement.gpu_count > 0;
            let mut best: Option<(MachineId, f64)> = None;

            for (machine_id, view) in snapshot.machines() {
                let Some(remaining) = overlay.remaining(*machine_id) else {
                    continue;
                };
                if !task.requirement.fits(&remaining) {
                    continue;
                }
                // Hard anti-affinity: this scheduler never double-packs a
                // job's own tasks onto one machine.
                let anti_affinity_violated = machines_used_by_job.contains(machine_id);

                let existing_on_machine = view.tasks.len() + machine_task_counts.get(machine_id).copied().unwrap_or(0);
                let already_on_domain = domain_counts.get(&view.failure_domain).copied().unwrap_or(0);
                let machine_has_gpu = view.capacity.gpu_count > 0;

                let score = service_score(
                    remaining.cpu_cores as f64,
                    view.capacity.cpu_cores as f64,
                    existing_on_machine,
                    already_on_domain,
                    wants_gpu,
                    machine_has_gpu,
                    anti_affinity_violated,
                );

                if score.is_finite() {
                    let better = match best {
                        None => true,
                        Some((best_id, best_score)) => score > best_score || (score == best_score && *machine_id < best_id),
                    };
                    if better {
                        best = Some((*machine_id, score));
                    }
                }
            }

            match best {
                Some((machine_id, _)) => {
                    overlay.reserve(machine_id, task.requirement);
                    *machine_task_counts.entry(machine_id).or_insert(0) += 1;
                    machines_used_by_job.insert(machine_id);
                    let domain = snapshot.machine(machine_id).expect("just selected").failure_domain.clone();
                    *domain_counts.entry(domain).or_insert(0) += 1;
                    let expected_version = snapshot.machine(machine_id).expect("just selected").version;
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
            mode: if job.require_gang { CommitMode::Gang } else { CommitMode::Incremental },
            infeasible,
            best_effort: Default::default(),
            task_info,
            new_tasks: Vec::new(),
        }
    }
}
