//! # atmolinkd
//!
//! Composition root that wires the cloud adapter into the bridge core.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Construct the cloud client and liveness probe (adapters)
//! - Construct the bridge, injecting the adapters via port traits
//! - Register the configured things and connect
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

pub mod config;
pub mod daemon;
