//! # atmolink-domain
//!
//! Pure domain model for the atmolink cloud-device bridge.
//!
//! ## Responsibilities
//! - Foundational types: case-insensitive equipment identifiers, error conventions, timestamps
//! - Define **equipment kinds** (stations, plugs, homes and the modules they carry)
//! - Define **snapshots** (one complete, internally consistent fetch result for a device)
//! - Define the **channel catalogue** and the values a channel can take
//! - Calibration helpers (battery percentage, signal buckets) and media path templates
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod calibration;
pub mod channel;
pub mod equipment;
pub mod media;
pub mod snapshot;
pub mod status;
pub mod weather;
