//! # atmolink-adapter-cloud
//!
//! Driven adapter talking to the vendor cloud over HTTPS.
//!
//! - [`CloudClient`] implements the `SnapshotFetcher` port: OAuth2 password
//!   grant with refresh, then `getstationsdata`, `getthermostatsdata` and
//!   `gethomedata` depending on the device kind.
//! - [`HttpLivenessProbe`] implements the `LivenessProbe` port used to pick
//!   between a camera's relay and local URLs.
//!
//! ## Dependency rule
//! Depends on `atmolink-app` (ports) and `atmolink-domain` (snapshot types).

pub mod client;
pub mod config;
pub mod error;
pub mod probe;
mod wire;

pub use client::CloudClient;
pub use config::CloudConfig;
pub use error::CloudError;
pub use probe::HttpLivenessProbe;
