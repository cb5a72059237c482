//! Micro-benchmark for the commit hot path (spec.md §4.1), mirroring the
//! shape of `sslab-execution-optme`'s own benches: warm a cell, then time
//! repeated calls to the one function every scheduler actor calls on its
//! plan-commit-retry loop.

use std::collections::BTreeSet;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use omega_cell::{CellState, CommitMode, Placement, TaskSpec, Transaction};
use omega_resource_model::{FailureDomain, JobId, JobType, MachineId, MachineType, ResourceVector, SchedulerId, TaskId};

const NUM_MACHINES: u64 = 64;

fn warm_cell() -> std::sync::Arc<CellState> {
    let cell = CellState::new();
    for index in 0..NUM_MACHINES {
        cell.register_machine(
            MachineId(index),
            MachineType::Medium,
            ResourceVector::new(32, 0, 64.0),
            FailureDomain::from(format!("rack-{}", index % 8).as_str()),
        )
        .expect("fresh machine ids");
    }
    cell
}

fn commit_single_placement(c: &mut Criterion) {
    c.bench_function("commit/incremental/single_placement", |b| {
        b.iter_batched(
            || {
                let cell = warm_cell();
                let job_id = JobId(0);
                let task_id = TaskId(0);
                cell.register_job(
                    job_id,
                    JobType::Batch,
                    0,
                    0.0,
                    vec![TaskSpec {
                        id: task_id,
                        job_id,
                        requirement: ResourceVector::new(1, 0, 1.0),
                        duration: 10.0,
                        dependencies: BTreeSet::new(),
                    }],
                );
                let txn = Transaction::new(
                    SchedulerId::from("bench"),
                    vec![Placement {
                        task_id,
                        machine_id: MachineId(0),
                        expected_machine_version: 0,
                    }],
                    CommitMode::Incremental,
                );
                (cell, txn)
            },
            |(cell, txn)| black_box(cell.commit(&txn)),
            BatchSize::SmallInput,
        );
    });
}

fn commit_gang_of_eight(c: &mut Criterion) {
    c.bench_function("commit/gang/eight_placements", |b| {
        b.iter_batched(
            || {
                let cell = warm_cell();
                let mut placements = Vec::with_capacity(8);
                for slot in 0..8u64 {
                    let job_id = JobId(slot);
                    let task_id = TaskId(slot);
                    let machine_id = MachineId(slot);
                    cell.register_job(
                        job_id,
                        JobType::Service,
                        0,
                        0.0,
                        vec![TaskSpec {
                            id: task_id,
                            job_id,
                            requirement: ResourceVector::new(1, 0, 1.0),
                            duration: 10.0,
                            dependencies: BTreeSet::new(),
                        }],
                    );
                    placements.push(Placement {
                        task_id,
                        machine_id,
                        expected_machine_version: 0,
                    });
                }
                let txn = Transaction::new(SchedulerId::from("bench"), placements, CommitMode::Gang);
                (cell, txn)
            },
            |(cell, txn)| black_box(cell.commit(&txn)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, commit_single_placement, commit_gang_of_eight);
criterion_main!(benches);
