//! Liveness probe port: `GET <base>/command/ping` on a camera.

use std::future::Future;
use std::sync::Arc;

/// Body of a successful ping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingReply {
    /// Address the camera believes it answers on inside the local network.
    pub local_url: String,
}

/// A ping did not produce a usable reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("ping timed out")]
    Timeout,

    #[error("ping failed: {0}")]
    Network(String),

    #[error("ping answered with status {0}")]
    Status(u16),

    #[error("ping answer is malformed: {0}")]
    Malformed(String),
}

/// Sends liveness requests to camera endpoints.
pub trait LivenessProbe: Send + Sync {
    /// Ping `base_url` and return the `local_url` it reports.
    fn ping(&self, base_url: &str) -> impl Future<Output = Result<PingReply, ProbeError>> + Send;
}

impl<T: LivenessProbe> LivenessProbe for Arc<T> {
    fn ping(&self, base_url: &str) -> impl Future<Output = Result<PingReply, ProbeError>> + Send {
        (**self).ping(base_url)
    }
}
