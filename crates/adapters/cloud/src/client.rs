//! HTTP client of the vendor cloud.
//!
//! Wraps `reqwest::Client` with the OAuth2 password grant, envelope
//! unwrapping and the mapping of each device kind onto its data endpoint.
//! The account is assumed to be the only one served by this process: the
//! token is shared by every request.

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use url::Url;

use atmolink_app::ports::{FetchError, SnapshotFetcher};
use atmolink_domain::equipment::EquipmentKind;
use atmolink_domain::id::EquipmentId;
use atmolink_domain::snapshot::Snapshot;

use crate::config::CloudConfig;
use crate::error::CloudError;
use crate::wire::{DeviceEntry, DevicesBody, Envelope, HomesBody, TokenError, TokenResponse};

/// Tokens are renewed this long before they actually expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
/// Lifetime assumed when the token endpoint does not announce one.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3 * 3600);

const STATIONS_PATH: &str = "api/getstationsdata";
const THERMOSTATS_PATH: &str = "api/getthermostatsdata";
const HOMES_PATH: &str = "api/gethomedata";
const TOKEN_PATH: &str = "oauth2/token";

#[derive(Debug)]
struct Token {
    access: String,
    refresh: Option<String>,
    expires_at: Instant,
}

impl Token {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// Vendor cloud client implementing [`SnapshotFetcher`].
pub struct CloudClient {
    http: reqwest::Client,
    base_url: Url,
    config: CloudConfig,
    token: Mutex<Option<Token>>,
}

impl CloudClient {
    /// Create a client with its own `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::InvalidUrl`] for a bad `api_url` and
    /// [`CloudError::Transport`] when the HTTP client cannot be built.
    pub fn new(config: CloudConfig) -> Result<Self, CloudError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("atmolink/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(http, config)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::InvalidUrl`] for a bad `api_url`.
    pub fn with_client(http: reqwest::Client, config: CloudConfig) -> Result<Self, CloudError> {
        let mut base_url = Url::parse(&config.api_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http,
            base_url,
            config,
            token: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// Fetch one station with its modules.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Disabled`] when stations are not enabled, or
    /// any transport, authentication or decoding failure.
    pub async fn station(&self, id: &EquipmentId) -> Result<Snapshot, CloudError> {
        let body = self.devices(STATIONS_PATH, "station", Some(id)).await?;
        let administrative = body.user.administrative;
        let entry = select(body.devices, id)?;
        Ok(Snapshot::station(entry.device, entry.modules, administrative))
    }

    /// Fetch one relay plug with its thermostats.
    ///
    /// # Errors
    ///
    /// See [`CloudClient::station`].
    pub async fn plug(&self, id: &EquipmentId) -> Result<Snapshot, CloudError> {
        let body = self.devices(THERMOSTATS_PATH, "thermostat", Some(id)).await?;
        let administrative = body.user.administrative;
        let entry = select(body.devices, id)?;
        Ok(Snapshot::plug(entry.device, entry.modules, administrative))
    }

    /// Fetch one home with its cameras, persons and events.
    ///
    /// # Errors
    ///
    /// See [`CloudClient::station`].
    pub async fn home(&self, id: &EquipmentId) -> Result<Snapshot, CloudError> {
        let body = self.homes(Some(id)).await?;
        let administrative = body.user.administrative;
        let home = body
            .homes
            .into_iter()
            .find(|home| id.matches(&home.id))
            .ok_or_else(|| CloudError::MissingEquipment(id.to_string()))?;
        Ok(Snapshot::home(home, administrative))
    }

    /// Fetch every device of every enabled API.
    ///
    /// # Errors
    ///
    /// Returns the first failure of an enabled API.
    pub async fn all(&self) -> Result<Vec<Snapshot>, CloudError> {
        let mut snapshots = Vec::new();
        if self.config.read_station {
            let body = self.devices(STATIONS_PATH, "station", None).await?;
            let administrative = body.user.administrative;
            snapshots.extend(
                body.devices
                    .into_iter()
                    .map(|entry| Snapshot::station(entry.device, entry.modules, administrative)),
            );
        }
        if self.config.read_thermostat {
            let body = self.devices(THERMOSTATS_PATH, "thermostat", None).await?;
            let administrative = body.user.administrative;
            snapshots.extend(
                body.devices
                    .into_iter()
                    .map(|entry| Snapshot::plug(entry.device, entry.modules, administrative)),
            );
        }
        if self.config.read_welcome {
            let body = self.homes(None).await?;
            let administrative = body.user.administrative;
            snapshots.extend(
                body.homes
                    .into_iter()
                    .map(|home| Snapshot::home(home, administrative)),
            );
        }
        Ok(snapshots)
    }

    /// Obtain a valid access token, authenticating if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Authentication`] when the credentials are refused.
    pub async fn authenticate(&self) -> Result<String, CloudError> {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref()
            && current.is_fresh()
        {
            return Ok(current.access.clone());
        }

        let refreshed = match token.as_ref().and_then(|t| t.refresh.clone()) {
            Some(refresh_token) => match self.refresh_grant(&refresh_token).await {
                Ok(refreshed) => refreshed,
                Err(err) => {
                    tracing::warn!(%err, "token refresh failed, logging in again");
                    self.password_grant().await?
                }
            },
            None => self.password_grant().await?,
        };
        let access = refreshed.access.clone();
        *token = Some(refreshed);
        Ok(access)
    }

    async fn devices(
        &self,
        path: &str,
        api: &'static str,
        device_id: Option<&EquipmentId>,
    ) -> Result<DevicesBody, CloudError> {
        let enabled = match api {
            "station" => self.config.read_station,
            _ => self.config.read_thermostat,
        };
        if !enabled {
            return Err(CloudError::Disabled(api));
        }
        let query: Vec<(&str, &str)> = device_id
            .map(|id| vec![("device_id", id.as_str())])
            .unwrap_or_default();
        self.get(path, &query).await
    }

    async fn homes(&self, home_id: Option<&EquipmentId>) -> Result<HomesBody, CloudError> {
        if !self.config.read_welcome {
            return Err(CloudError::Disabled("welcome"));
        }
        let query: Vec<(&str, &str)> = home_id
            .map(|id| vec![("home_id", id.as_str())])
            .unwrap_or_default();
        self.get(HOMES_PATH, &query).await
    }

    /// Authenticated GET, unwrapping the `{body, error}` envelope.
    ///
    /// A rejected token is dropped so the next request logs in again.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CloudError> {
        let url = self.base_url.join(path)?;
        let access = self.authenticate().await?;
        tracing::debug!(%url, "GET");

        let resp = self
            .http
            .get(url)
            .bearer_auth(access)
            .query(query)
            .send()
            .await?;
        let result = parse_envelope(resp).await;
        if let Err(err) = &result
            && err.is_token_rejected()
        {
            tracing::warn!(%err, "access token rejected, dropping it");
            *self.token.lock().await = None;
        }
        result
    }

    async fn password_grant(&self) -> Result<Token, CloudError> {
        tracing::debug!(username = %self.config.username, "requesting access token");
        let scope = self.config.scope();
        self.request_token(&[
            ("grant_type", "password"),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
            ("username", &self.config.username),
            ("password", &self.config.password),
            ("scope", &scope),
        ])
        .await
    }

    async fn refresh_grant(&self, refresh_token: &str) -> Result<Token, CloudError> {
        tracing::debug!("refreshing access token");
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
        ])
        .await
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<Token, CloudError> {
        let url = self.base_url.join(TOKEN_PATH)?;
        let resp = self.http.post(url).form(form).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let reason = serde_json::from_str::<TokenError>(&body).map_or_else(
                |_| format!("http status {}", status.as_u16()),
                |err| err.error_description.unwrap_or(err.error),
            );
            return Err(CloudError::Authentication(reason));
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|err| CloudError::Deserialization {
                message: err.to_string(),
                body: body.clone(),
            })?;
        let lifetime = token
            .expires_in
            .map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs);
        tracing::info!(expires_in_secs = lifetime.as_secs(), "access token obtained");
        Ok(Token {
            access: token.access_token,
            refresh: token.refresh_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}

async fn parse_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, CloudError> {
    let status = resp.status();
    let body = resp.text().await?;

    let envelope: Envelope<T> = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => return Err(CloudError::Status(status.as_u16())),
        Err(err) => {
            return Err(CloudError::Deserialization {
                message: err.to_string(),
                body,
            });
        }
    };

    if let Some(error) = envelope.error {
        return Err(CloudError::Api {
            code: error.code,
            message: error.message,
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(CloudError::Status(status.as_u16()));
    }
    envelope.body.ok_or_else(|| CloudError::Deserialization {
        message: "answer has no body".into(),
        body,
    })
}

fn select(devices: Vec<DeviceEntry>, id: &EquipmentId) -> Result<DeviceEntry, CloudError> {
    devices
        .into_iter()
        .find(|entry| id.matches(&entry.device.id))
        .ok_or_else(|| CloudError::MissingEquipment(id.to_string()))
}

impl SnapshotFetcher for CloudClient {
    async fn fetch(&self, id: &EquipmentId, kind: EquipmentKind) -> Result<Snapshot, FetchError> {
        let snapshot = match kind {
            EquipmentKind::WeatherStation => self.station(id).await,
            EquipmentKind::Plug => self.plug(id).await,
            EquipmentKind::Home => self.home(id).await,
            other => Err(CloudError::NotPolled(other)),
        };
        Ok(snapshot?)
    }

    async fn fetch_all(&self) -> Result<Vec<Snapshot>, FetchError> {
        Ok(self.all().await?)
    }

    async fn check_connection(&self) -> Result<(), FetchError> {
        self.authenticate().await?;
        Ok(())
    }
}
