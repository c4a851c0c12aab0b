pub mod snapshot;

pub use snapshot::{refresh_snapshot, Snapshot, SnapshotEntry};
