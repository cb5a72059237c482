use rand::rngs::StdRng;

use omega_resource_model::{JobType, SchedulerId};
use omega_schedulers::{
    ActivationReport, BatchPolicy, FirstFitPolicy, MapReducePolicy, PendingJob, PriorityPolicy, RandomPolicy,
    SchedulerActor, SchedulerKind, SchedulerStats, ServicePolicy, WeightedRoundRobinPolicy,
};

/// A scheduler actor of any configured variant. Dispatch is by this enum
/// tag, not `dyn SchedulingPolicy` downcasting (spec.md §9 "Polymorphic
/// schedulers": "Dispatch by tag... so the simulator can route and
/// introspect uniformly") — every variant wraps the same
/// `SchedulerActor<P>` plan-commit-retry loop, differing only in the
/// `SchedulingPolicy` plugged into it.
pub enum AnyScheduler {
    Batch(SchedulerActor<BatchPolicy>),
    Service(SchedulerActor<ServicePolicy>),
    MapReduce(SchedulerActor<MapReducePolicy>),
    Priority(SchedulerActor<PriorityPolicy>),
    WeightedRoundRobin(SchedulerActor<WeightedRoundRobinPolicy>),
    FirstFit(SchedulerActor<FirstFitPolicy>),
    Random(SchedulerActor<RandomPolicy<StdRng>>),
}

macro_rules! dispatch {
    ($self:expr, $actor:ident => $body:expr) => {
        match $self {
            AnyScheduler::Batch($actor) => $body,
            AnyScheduler::Service($actor) => $body,
            AnyScheduler::MapReduce($actor) => $body,
            AnyScheduler::Priority($actor) => $body,
            AnyScheduler::WeightedRoundRobin($actor) => $body,
            AnyScheduler::FirstFit($actor) => $body,
            AnyScheduler::Random($actor) => $body,
        }
    };
}

impl AnyScheduler {
    pub fn id(&self) -> &SchedulerId {
        dispatch!(self, actor => actor.id())
    }

    pub fn kind(&self) -> SchedulerKind {
        dispatch!(self, actor => actor.kind())
    }

    pub fn accepts(&self, job_type: JobType) -> bool {
        dispatch!(self, actor => actor.accepts(job_type))
    }

    pub fn enqueue(&mut self, job: PendingJob, now: f64) {
        dispatch!(self, actor => actor.enqueue(job, now))
    }

    pub fn is_idle(&self) -> bool {
        dispatch!(self, actor => actor.is_idle())
    }

    pub fn activate(&mut self, now: f64) -> Option<ActivationReport> {
        dispatch!(self, actor => actor.activate(now))
    }

    pub fn stats(&self) -> SchedulerStats {
        dispatch!(self, actor => actor.stats())
    }
}
