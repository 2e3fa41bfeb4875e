//! # atmolink-app
//!
//! Application layer: the polling core and the **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `SnapshotFetcher`: fetch one device snapshot from the vendor cloud
//!   - `LivenessProbe`: ping a camera endpoint
//!   - `Host`: properties, channel emission and status reporting
//! - Own the live equipment:
//!   - `DeviceTree`: id directory, parent/child relations, propagation
//!   - `DeviceNode` / `ModuleNode`: snapshots, channel reads, refreshes
//!   - `PollScheduler`: one fixed-delay poll task per device
//!   - `EndpointResolver`: relay vs local camera endpoint
//!   - `Bridge`: the account connection composing all of the above
//! - Map snapshots onto channels (`channel_registry`) and list undiscovered
//!   equipment (`discovery`)
//! - Provide an **in-process host** that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `atmolink-domain` only (plus `tokio` for tasks and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod bridge;
pub mod channel_registry;
pub mod device_node;
pub mod device_tree;
pub mod discovery;
pub mod endpoint_resolver;
pub mod host;
pub mod module_node;
pub mod poll_scheduler;
pub mod ports;
