//! Node status as reported to the host.

use serde::{Deserialize, Serialize};

/// Reason attached to an offline status when the owning bridge is down.
pub const BRIDGE_OFFLINE: &str = "bridge offline";

/// Reachability of a device, module or bridge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum NodeStatus {
    /// Not yet initialised.
    #[default]
    Unknown,
    Online,
    /// Unreachable, with a human-readable reason.
    Offline(String),
}

impl NodeStatus {
    /// Build an offline status from anything displayable.
    #[must_use]
    pub fn offline(reason: impl std::fmt::Display) -> Self {
        Self::Offline(reason.to_string())
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Online => f.write_str("online"),
            Self::Offline(reason) => write!(f, "offline ({reason})"),
        }
    }
}
