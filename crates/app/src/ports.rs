//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the polling core and the outside world.
//! They are defined here (in `app`) so that both the core and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod host;
pub mod liveness_probe;
pub mod snapshot_fetcher;

pub use host::Host;
pub use liveness_probe::{LivenessProbe, PingReply, ProbeError};
pub use snapshot_fetcher::{FetchError, SnapshotFetcher};
