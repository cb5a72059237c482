use thiserror::Error;

/// The only way a simulation run aborts mid-flight (spec.md §6 "Exit
/// conditions", §7): an invariant violation, surfaced to the top level
/// instead of panicking so a CLI caller can print a diagnostic and exit
/// non-zero. Placement rejections, infeasible jobs, and exhausted retries
/// are all "expected" (spec.md §7) and are folded into `Results` instead of
/// ever reaching here.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invariant violation at t={at_time}: {detail}")]
    InvariantViolation { at_time: f64, detail: String },
}
