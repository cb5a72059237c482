//! The cell: the cluster scheduler's single authoritative record of
//! machines, jobs, and tasks. Exposes consistent snapshot reads and
//! transactional commits under optimistic concurrency control, and the
//! release/failure/recovery protocols that keep resource accounting honest.

mod cell;
mod error;
mod job;
mod machine;
mod snapshot;
mod task;
mod transaction;

pub use cell::{CellState, CellStats};
pub use error::CellError;
pub use snapshot::{MachineView, Snapshot};
pub use task::TaskSpec;
pub use transaction::{CommitMode, Placement, PlacementOutcome, RejectReason, Transaction, TransactionResult};
