use std::collections::BTreeSet;

use omega_cell::{CellState, TaskSpec};
use omega_resource_model::{FailureDomain, JobId, JobType, MachineId, MachineType, ResourceVector, SchedulerId, TaskId};
use omega_schedulers::{
    BatchPolicy, ElasticPolicy, JobOutcome, MapReducePolicy, PendingJob, PriorityPolicy, SchedulerActor, SchedulerKind, ServicePolicy,
};

fn job(id: u64, job_type: JobType, tasks: Vec<TaskSpec>) -> PendingJob {
    PendingJob {
        id: JobId(id),
        job_type,
        priority: 0,
        submit_time: 0.0,
        tasks,
        require_gang: false,
    }
}

fn task(id: u64, job_id: u64, requirement: ResourceVector, duration: f64) -> TaskSpec {
    TaskSpec {
        id: TaskId(id),
        job_id: JobId(job_id),
        requirement,
        duration,
        dependencies: BTreeSet::new(),
    }
}

/// Scenario 1 reused at the scheduler layer: a batch job's two tasks both
/// land on the one machine that fits them, in a single activation.
#[test]
fn batch_scheduler_places_job_in_one_activation() {
    let cell = CellState::new();
    cell.register_machine(MachineId(0), MachineType::Medium, ResourceVector::new(4, 0, 8.0), FailureDomain::from("rack-0"))
        .unwrap();

    let tasks = vec![
        task(0, 0, ResourceVector::new(2, 0, 4.0), 10.0),
        task(1, 0, ResourceVector::new(2, 0, 4.0), 10.0),
    ];
    cell.register_job(
        JobId(0),
        JobType::Batch,
        0,
        0.0,
        tasks.clone(),
    );

    let mut scheduler = SchedulerActor::new(SchedulerId::from("batch-0"), SchedulerKind::Batch, cell.clone(), BatchPolicy::default());
    scheduler.enqueue(job(0, JobType::Batch, tasks), 0.0);

    let report = scheduler.activate(0.0).expect("one job queued");
    assert_eq!(report.job_outcome, Some(JobOutcome::FullyScheduled));
    assert_eq!(report.accepted.len(), 2);
    assert_eq!(scheduler.stats().jobs_scheduled, 1);
    assert_eq!(scheduler.stats().tasks_scheduled, 2);
}

/// Scenario 4: a service job's identical tasks spread across failure
/// domains rather than stacking on the first machine found.
#[test]
fn service_scheduler_spreads_across_failure_domains() {
    let cell = CellState::new();
    for i in 0..4u64 {
        let domain = if i < 2 { "rack-0" } else { "rack-1" };
        cell.register_machine(MachineId(i), MachineType::Medium, ResourceVector::new(8, 0, 16.0), FailureDomain::from(domain))
            .unwrap();
    }

    let tasks: Vec<TaskSpec> = (0..4).map(|i| task(i, 0, ResourceVector::new(2, 0, 4.0), 3600.0)).collect();
    cell.register_job(JobId(0), JobType::Service, 0, 0.0, tasks.clone());

    let mut scheduler = SchedulerActor::new(SchedulerId::from("service-0"), SchedulerKind::Service, cell.clone(), ServicePolicy);
    scheduler.enqueue(job(0, JobType::Service, tasks), 0.0);

    let report = scheduler.activate(0.0).expect("one job queued");
    assert_eq!(report.accepted.len(), 4);

    let snapshot = cell.snapshot();
    let mut per_domain: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for placement in &report.accepted {
        let domain = snapshot.machine(placement.machine_id).unwrap().failure_domain.0.clone();
        *per_domain.entry(domain).or_insert(0) += 1;
    }
    assert_eq!(per_domain.get("rack-0").copied().unwrap_or(0), 2);
    assert_eq!(per_domain.get("rack-1").copied().unwrap_or(0), 2);
}

/// Scenario 6: MapReduce scales a 4-task job up to the idle capacity of 10
/// slots under `max_parallelism`, all in one incremental commit.
#[test]
fn mapreduce_scales_opportunistically() {
    let cell = CellState::new();
    for i in 0..10u64 {
        cell.register_machine(MachineId(i), MachineType::Small, ResourceVector::new(1, 0, 2.0), FailureDomain::from("rack-0"))
            .unwrap();
    }

    let tasks: Vec<TaskSpec> = (0..4).map(|i| task(i, 0, ResourceVector::new(1, 0, 2.0), 60.0)).collect();
    cell.register_job(JobId(0), JobType::MapReduce, 0, 0.0, tasks.clone());

    let policy = MapReducePolicy::new(ElasticPolicy::MaxParallelism { hard_cap: 10 });
    let mut scheduler = SchedulerActor::new(SchedulerId::from("mapreduce-0"), SchedulerKind::MapReduce, cell.clone(), policy);
    scheduler.enqueue(job(0, JobType::MapReduce, tasks), 0.0);

    let report = scheduler.activate(0.0).expect("one job queued");
    assert_eq!(report.accepted.len(), 10, "elastic target should fill all 10 idle slots");
    assert!(
        report.accepted.iter().all(|p| p.duration == 60.0),
        "stage-1 duration is unchanged by elastic scaling"
    );
}

/// spec.md §9's `Priority` variant: a job queued after another but with
/// higher `PendingJob::priority` must still activate first.
#[test]
fn priority_scheduler_services_the_higher_priority_job_first() {
    let cell = CellState::new();
    cell.register_machine(MachineId(0), MachineType::Medium, ResourceVector::new(8, 0, 16.0), FailureDomain::from("rack-0"))
        .unwrap();

    let low_tasks = vec![task(0, 0, ResourceVector::new(1, 0, 1.0), 10.0)];
    let high_tasks = vec![task(1, 1, ResourceVector::new(1, 0, 1.0), 10.0)];
    cell.register_job(JobId(0), JobType::Batch, 0, 0.0, low_tasks.clone());
    cell.register_job(JobId(1), JobType::Batch, 10, 0.0, high_tasks.clone());

    let mut low_job = job(0, JobType::Batch, low_tasks);
    low_job.priority = 0;
    let mut high_job = job(1, JobType::Batch, high_tasks);
    high_job.priority = 10;

    let mut scheduler = SchedulerActor::new(SchedulerId::from("priority-0"), SchedulerKind::Priority, cell.clone(), PriorityPolicy);
    scheduler.enqueue(low_job, 0.0);
    scheduler.enqueue(high_job, 0.0);

    let report = scheduler.activate(0.0).expect("a job queued");
    assert_eq!(report.job_id, JobId(1), "higher-priority job enqueued second should still activate first");
}
