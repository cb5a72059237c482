#![cfg(feature = "fuzzing")]

//! Property-style fuzz checks for the resource-vector arithmetic and the
//! OCC commit protocol (spec.md §3/§4.1), gated behind the `fuzzing`
//! feature the way `sslab-execution-blockstm` gates its own proptest
//! dev-dependency.

use std::collections::BTreeSet;

use proptest::prelude::*;

use omega_cell::{CellState, CommitMode, Placement, TaskSpec, Transaction};
use omega_resource_model::{FailureDomain, JobId, JobType, MachineId, MachineType, ResourceVector, SchedulerId, TaskId};

fn single_task_job(job_id: JobId, task_id: TaskId, requirement: ResourceVector) -> Vec<TaskSpec> {
    vec![TaskSpec {
        id: task_id,
        job_id,
        requirement,
        duration: 10.0,
        dependencies: BTreeSet::new(),
    }]
}

proptest! {
    /// Adding a requirement then subtracting the same amount recovers the
    /// original vector, the arithmetic `release` and `commit` both rely on.
    #[test]
    fn add_then_saturating_sub_roundtrips(
        cpu_a in 0u32..64, gpu_a in 0u32..8, mem_a in 0.0f64..256.0,
        cpu_b in 0u32..64, gpu_b in 0u32..8, mem_b in 0.0f64..256.0,
    ) {
        let a = ResourceVector::new(cpu_a, gpu_a, mem_a);
        let b = ResourceVector::new(cpu_b, gpu_b, mem_b);
        let recovered = (a + b).saturating_sub(&b);
        prop_assert_eq!(recovered.cpu_cores, a.cpu_cores);
        prop_assert_eq!(recovered.gpu_count, a.gpu_count);
        prop_assert!((recovered.memory_gb - a.memory_gb).abs() < 1e-9);
    }

    /// `fits` is reflexive, and widening the capacity can never turn a fit
    /// into a non-fit.
    #[test]
    fn fits_is_reflexive_and_monotonic_in_capacity(
        cpu in 0u32..64, gpu in 0u32..8, mem in 0.0f64..256.0, slack_cpu in 0u32..16,
    ) {
        let req = ResourceVector::new(cpu, gpu, mem);
        prop_assert!(req.fits(&req));
        let widened = ResourceVector::new(cpu + slack_cpu, gpu, mem);
        prop_assert!(req.fits(&widened));
    }

    /// Committing an arbitrary sequence of single-task placements onto one
    /// machine never leaves it over-allocated, whatever the shuffled
    /// requirement sizes (spec.md §8's "no overcommit" invariant).
    #[test]
    fn committed_allocation_never_exceeds_machine_capacity(
        task_reqs in proptest::collection::vec((1u32..8, 0.0f64..8.0), 1..12),
    ) {
        let cell = CellState::new();
        let capacity = ResourceVector::new(16, 0, 32.0);
        cell.register_machine(MachineId(0), MachineType::Medium, capacity, FailureDomain::from("rack-0")).unwrap();

        let mut version = 0u64;
        for (index, (cpu, mem)) in task_reqs.iter().enumerate() {
            let task_id = TaskId(index as u64);
            let job_id = JobId(index as u64);
            cell.register_job(job_id, JobType::Batch, 0, 0.0, single_task_job(job_id, task_id, ResourceVector::new(*cpu, 0, *mem)));

            let txn = Transaction::new(
                SchedulerId::from("fuzz"),
                vec![Placement {
                    task_id,
                    machine_id: MachineId(0),
                    expected_machine_version: version,
                }],
                CommitMode::Incremental,
            );
            let result = cell.commit(&txn);
            if result.applied {
                version += 1;
            }
            prop_assert!(cell.verify_invariants().is_ok());
        }
    }

    /// A placement whose `expected_machine_version` doesn't match the
    /// machine's actual (freshly registered, version-0) version is always
    /// rejected as stale, never silently applied.
    #[test]
    fn stale_expected_version_is_always_rejected(bogus_version in 1u64..1000) {
        let cell = CellState::new();
        cell.register_machine(MachineId(0), MachineType::Medium, ResourceVector::new(8, 0, 16.0), FailureDomain::from("rack-0")).unwrap();
        cell.register_job(JobId(0), JobType::Batch, 0, 0.0, single_task_job(JobId(0), TaskId(0), ResourceVector::new(1, 0, 1.0)));

        let txn = Transaction::new(
            SchedulerId::from("fuzz"),
            vec![Placement {
                task_id: TaskId(0),
                machine_id: MachineId(0),
                expected_machine_version: bogus_version,
            }],
            CommitMode::Incremental,
        );
        let result = cell.commit(&txn);
        prop_assert!(!result.applied);
        prop_assert!(cell.verify_invariants().is_ok());
    }

    /// A gang transaction where any placement is rejected leaves the cell
    /// completely untouched — no partial application (spec.md §3's gang
    /// commit semantics).
    #[test]
    fn gang_commit_is_all_or_nothing(second_cpu in 1u32..32) {
        let cell = CellState::new();
        cell.register_machine(MachineId(0), MachineType::Medium, ResourceVector::new(4, 0, 8.0), FailureDomain::from("rack-0")).unwrap();
        cell.register_job(JobId(0), JobType::Batch, 0, 0.0, single_task_job(JobId(0), TaskId(0), ResourceVector::new(2, 0, 2.0)));
        cell.register_job(JobId(1), JobType::Batch, 0, 0.0, single_task_job(JobId(1), TaskId(1), ResourceVector::new(second_cpu, 0, 2.0)));

        let before = cell.snapshot();
        let txn = Transaction::new(
            SchedulerId::from("fuzz"),
            vec![
                Placement { task_id: TaskId(0), machine_id: MachineId(0), expected_machine_version: 0 },
                // Oversized relative to the 4-core machine whenever second_cpu > 2,
                // so the gang either commits both or (intentionally) neither.
                Placement { task_id: TaskId(1), machine_id: MachineId(0), expected_machine_version: 0 },
            ],
            CommitMode::Gang,
        );
        let result = cell.commit(&txn);
        let after = cell.snapshot();

        if second_cpu > 2 {
            prop_assert!(!result.applied);
            prop_assert_eq!(before.machines[&MachineId(0)].allocated.cpu_cores, after.machines[&MachineId(0)].allocated.cpu_cores);
        }
    }
}
