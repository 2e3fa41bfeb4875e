//! Camera liveness probe over HTTP.

use std::time::Duration;

use serde::Deserialize;

use atmolink_app::ports::{LivenessProbe, PingReply, ProbeError};
use atmolink_domain::media::PING_PATH;

#[derive(Debug, Deserialize)]
struct PingBody {
    local_url: Option<String>,
}

/// Sends `GET <base>/command/ping` with a plain `reqwest::Client`.
pub struct HttpLivenessProbe {
    http: reqwest::Client,
}

impl HttpLivenessProbe {
    /// # Errors
    ///
    /// Returns the [`reqwest::Error`] of a client that cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    #[must_use]
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl LivenessProbe for HttpLivenessProbe {
    async fn ping(&self, base_url: &str) -> Result<PingReply, ProbeError> {
        let url = format!("{}{PING_PATH}", base_url.trim_end_matches('/'));
        tracing::debug!(%url, "ping");

        let resp = self.http.get(&url).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }
        let body: PingBody = resp
            .json()
            .await
            .map_err(|err| ProbeError::Malformed(err.to_string()))?;
        body.local_url
            .filter(|url| !url.is_empty())
            .map(|local_url| PingReply { local_url })
            .ok_or_else(|| ProbeError::Malformed("missing local_url".into()))
    }
}

fn transport(err: reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        ProbeError::Timeout
    } else {
        ProbeError::Network(err.to_string())
    }
}
