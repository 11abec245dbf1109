//! Per-tenant sync state machine.

pub mod coordinator;

pub use coordinator::{SyncCoordinator, SyncOutcome, BATCH_KIND};
