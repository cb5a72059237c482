use std::cmp::Ordering;

use omega_resource_model::{MachineId, TaskId};
use omega_schedulers::PendingJob;

/// The four event kinds spec.md §4.4 names, plus machine recovery (spec.md
/// §4.5), which this implementation ranks alongside failure since both are
/// machine-state changes the rest of the tick should observe before
/// anything else fires.
#[derive(Debug)]
pub(crate) enum EventKind {
    MachineFailure { machine_id: MachineId },
    MachineRecovery { machine_id: MachineId },
    TaskCompletion { task_id: TaskId },
    JobArrival { job: Box<PendingJob> },
    SchedulerActivation { scheduler_index: usize },
}

impl EventKind {
    /// Lower sorts first at equal timestamps (spec.md §4.4: "machine_failure
    /// < task_completion < job_arrival < scheduler_activation" — completions
    /// free resources before the next scheduler cycle runs; failures are
    /// observed before completions on the same machine).
    fn priority_rank(&self) -> u8 {
        match self {
            EventKind::MachineFailure { .. } => 0,
            EventKind::MachineRecovery { .. } => 1,
            EventKind::TaskCompletion { .. } => 2,
            EventKind::JobArrival { .. } => 3,
            EventKind::SchedulerActivation { .. } => 4,
        }
    }
}

/// One entry in the simulator's event queue. `seq` breaks ties within the
/// same `(time, kind)` pair deterministically, since `BinaryHeap` is not a
/// stable sort (spec.md §9 "deterministic parallelism" — real-thread
/// nondeterminism must never leak into results, and neither may insertion
/// order into a heap).
#[derive(Debug)]
pub(crate) struct ScheduledEvent {
    pub time: f64,
    pub seq: u64,
    pub kind: EventKind,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .partial_cmp(&other.time)
            .expect("event timestamps are never NaN")
            .then_with(|| self.kind.priority_rank().cmp(&other.kind.priority_rank()))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;

    fn event(time: f64, seq: u64, kind: EventKind) -> ScheduledEvent {
        ScheduledEvent { time, seq, kind }
    }

    #[test]
    fn equal_timestamps_order_by_event_kind_priority() {
        let mut heap = BinaryHeap::new();
        heap.push(Reverse(event(5.0, 0, EventKind::SchedulerActivation { scheduler_index: 0 })));
        heap.push(Reverse(event(5.0, 1, EventKind::JobArrival { job: Box::new(sample_job()) })));
        heap.push(Reverse(event(5.0, 2, EventKind::TaskCompletion { task_id: TaskId(0) })));
        heap.push(Reverse(event(5.0, 3, EventKind::MachineRecovery { machine_id: MachineId(0) })));
        heap.push(Reverse(event(5.0, 4, EventKind::MachineFailure { machine_id: MachineId(0) })));

        let order: Vec<u8> = std::iter::from_fn(|| heap.pop().map(|Reverse(e)| e.kind.priority_rank())).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn earlier_timestamp_always_wins_regardless_of_kind() {
        let mut heap = BinaryHeap::new();
        heap.push(Reverse(event(10.0, 0, EventKind::MachineFailure { machine_id: MachineId(0) })));
        heap.push(Reverse(event(1.0, 1, EventKind::SchedulerActivation { scheduler_index: 0 })));

        let Reverse(first) = heap.pop().unwrap();
        assert_eq!(first.time, 1.0);
    }

    fn sample_job() -> PendingJob {
        PendingJob {
            id: omega_resource_model::JobId(0),
            job_type: omega_resource_model::JobType::Batch,
            priority: 0,
            submit_time: 0.0,
            tasks: Vec::new(),
            require_gang: false,
        }
    }
}
