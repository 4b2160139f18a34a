//! DSP Store - JSON snapshots and the operation journal

pub mod error;
pub mod journal;
pub mod snapshot;

pub use error::{StoreError, StoreResult};
pub use journal::{Journal, JournalRecord};
pub use snapshot::SnapshotStore;
