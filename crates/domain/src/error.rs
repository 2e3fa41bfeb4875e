//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors; these two are shared by all.

/// Invariant violations detected while building domain objects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("equipment id must not be empty")]
    EmptyId,

    #[error("unsupported equipment type {0:?}")]
    UnknownKind(String),

    #[error("unknown channel {0:?}")]
    UnknownChannel(String),

    #[error("module {0} must reference a parent device")]
    MissingParent(String),

    #[error("{0} is a module type and cannot be registered as a device")]
    NotADevice(String),

    #[error("{0} is a device type and cannot be registered as a module")]
    NotAModule(String),

    #[error("refresh interval must be greater than zero")]
    ZeroRefreshInterval,

    #[error("invalid integer {value:?} for property {property}")]
    InvalidProperty { property: String, value: String },
}

/// A lookup for a named item returned nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
