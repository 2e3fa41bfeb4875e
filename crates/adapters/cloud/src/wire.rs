//! JSON shapes of the vendor API answers.
//!
//! Only the envelopes live here; the payload structs are the domain
//! snapshot types, which already carry the vendor field names.

use serde::Deserialize;

use atmolink_domain::snapshot::{Administrative, DeviceData, HomeData, ModuleData};

/// `{"body": ..., "status": "ok"}` or `{"error": {"code", "message"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub body: Option<T>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Answer of the token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

/// Error answer of the token endpoint (`{"error": "invalid_grant"}`).
#[derive(Debug, Deserialize)]
pub(crate) struct TokenError {
    pub error: String,
    pub error_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct User {
    pub administrative: Option<Administrative>,
}

/// A station or plug with its modules inlined.
#[derive(Debug, Deserialize)]
pub(crate) struct DeviceEntry {
    #[serde(flatten)]
    pub device: DeviceData,
    #[serde(default)]
    pub modules: Vec<ModuleData>,
}

/// Body of `getstationsdata` and `getthermostatsdata`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct DevicesBody {
    pub devices: Vec<DeviceEntry>,
    pub user: User,
}

/// Body of `gethomedata`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct HomesBody {
    pub homes: Vec<HomeData>,
    pub user: User,
}
