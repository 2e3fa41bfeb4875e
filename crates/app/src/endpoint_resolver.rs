//! Camera endpoint arbitration between the cloud relay and the local network.
//!
//! A camera always answers on its relay URL. It may also advertise a local
//! URL, which is only trusted once it confirms itself: pinging the local URL
//! must succeed and report the very same `local_url`. Every probing failure
//! falls back to the relay, so resolution never fails.

use std::time::Duration;

use atmolink_domain::media::MediaResource;

use crate::ports::{LivenessProbe, PingReply, ProbeError};

/// Resolves the base URL to use for a camera's media resources.
pub struct EndpointResolver<P> {
    probe: P,
    timeout: Duration,
}

impl<P: LivenessProbe> EndpointResolver<P> {
    /// Create a resolver bounding each ping by `timeout`.
    pub fn new(probe: P, timeout: Duration) -> Self {
        Self { probe, timeout }
    }

    /// Base URL for a camera advertising `relay_url`.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn resolve(&self, relay_url: &str) -> String {
        let advertised = match self.ping(relay_url).await {
            Ok(reply) => reply.local_url,
            Err(err) => {
                tracing::debug!(%err, "relay ping failed, keeping relay url");
                return relay_url.to_string();
            }
        };

        match self.ping(&advertised).await {
            Ok(reply) if reply.local_url == advertised => {
                tracing::debug!(local_url = %advertised, "local url confirmed");
                advertised
            }
            Ok(reply) => {
                tracing::debug!(
                    advertised = %advertised,
                    confirmed = %reply.local_url,
                    "local url answered inconsistently, keeping relay url"
                );
                relay_url.to_string()
            }
            Err(err) => {
                tracing::debug!(%err, local_url = %advertised, "local ping failed, keeping relay url");
                relay_url.to_string()
            }
        }
    }

    /// Full URL of `resource` on the camera advertising `relay_url`.
    pub async fn resource_url(&self, relay_url: &str, resource: &MediaResource) -> String {
        resource.url(&self.resolve(relay_url).await)
    }

    async fn ping(&self, base_url: &str) -> Result<PingReply, ProbeError> {
        tokio::time::timeout(self.timeout, self.probe.ping(base_url))
            .await
            .unwrap_or(Err(ProbeError::Timeout))
    }
}
