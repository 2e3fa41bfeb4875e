//! Cloud adapter error types.

use atmolink_app::ports::FetchError;
use atmolink_domain::equipment::EquipmentKind;

/// Errors specific to the cloud adapter.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// Connection, TLS or timeout failure below HTTP.
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid api url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The token endpoint refused the credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Structured `{error: {code, message}}` answer of the data API.
    #[error("api error {code} (http {status}): {message}")]
    Api {
        code: i64,
        message: String,
        status: u16,
    },

    #[error("unexpected http status {0}")]
    Status(u16),

    /// The body could not be decoded, with the raw body for debugging.
    #[error("deserialization error: {message}")]
    Deserialization { message: String, body: String },

    #[error("{0} api is disabled by configuration")]
    Disabled(&'static str),

    #[error("equipment {0} not found in cloud answer")]
    MissingEquipment(String),

    #[error("{0} is not polled on its own")]
    NotPolled(EquipmentKind),
}

impl CloudError {
    /// Whether the access token was rejected and a new one may help.
    #[must_use]
    pub fn is_token_rejected(&self) -> bool {
        match self {
            // 1: missing, 2: invalid, 3: expired access token
            Self::Api { code, .. } => (1..=3).contains(code),
            Self::Status(status) => *status == 401,
            _ => false,
        }
    }
}

impl From<CloudError> for FetchError {
    fn from(err: CloudError) -> Self {
        match err {
            CloudError::Transport(err) if err.is_timeout() => Self::Timeout,
            CloudError::Transport(err) => Self::Network(err.to_string()),
            CloudError::Status(status) if status >= 500 => {
                Self::Network(format!("http status {status}"))
            }
            err if err.is_token_rejected() => Self::Authentication(err.to_string()),
            CloudError::Authentication(reason) => Self::Authentication(reason),
            CloudError::Disabled(api) => Self::Disabled(api),
            CloudError::MissingEquipment(id) => Self::MissingEquipment(id),
            CloudError::Deserialization { message, .. } => Self::Malformed(message),
            err @ (CloudError::InvalidUrl(_)
            | CloudError::Api { .. }
            | CloudError::Status(_)
            | CloudError::NotPolled(_)) => Self::Unavailable(err.to_string()),
        }
    }
}
