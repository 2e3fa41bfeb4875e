//! Cloud account configuration.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://api.netatmo.net";

/// Credentials and API toggles of the vendor account.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Base URL of the vendor API, hosting both `/oauth2` and `/api`.
    pub api_url: String,
    /// OAuth2 application id.
    pub client_id: String,
    /// OAuth2 application secret.
    pub client_secret: String,
    /// Account login.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Poll weather stations and their modules.
    pub read_station: bool,
    /// Poll relay plugs and their thermostats.
    pub read_thermostat: bool,
    /// Poll homes with their cameras, persons and events.
    pub read_welcome: bool,
    /// Upper bound of every HTTP request, in seconds.
    pub timeout_secs: u64,
}

impl CloudConfig {
    /// OAuth2 scope requested for the enabled APIs, space separated.
    #[must_use]
    pub fn scope(&self) -> String {
        let mut scopes = Vec::with_capacity(3);
        if self.read_station {
            scopes.push("read_station");
        }
        if self.read_thermostat {
            scopes.push("read_thermostat write_thermostat");
        }
        if self.read_welcome {
            scopes.push("read_camera write_camera access_camera");
        }
        scopes.join(" ")
    }

    #[must_use]
    pub fn any_api_enabled(&self) -> bool {
        self.read_station || self.read_thermostat || self.read_welcome
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            read_station: true,
            read_thermostat: false,
            read_welcome: false,
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudConfig")
            .field("api_url", &self.api_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("read_station", &self.read_station)
            .field("read_thermostat", &self.read_thermostat)
            .field("read_welcome", &self.read_welcome)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = CloudConfig::default();
        assert_eq!(config.api_url, "https://api.netatmo.net");
        assert!(config.read_station);
        assert!(!config.read_thermostat);
        assert!(!config.read_welcome);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn should_compose_scope_from_enabled_apis() {
        let config = CloudConfig {
            read_station: true,
            read_thermostat: true,
            read_welcome: true,
            ..CloudConfig::default()
        };
        assert_eq!(
            config.scope(),
            "read_station read_thermostat write_thermostat read_camera write_camera access_camera"
        );
    }

    #[test]
    fn should_request_empty_scope_when_everything_is_disabled() {
        let config = CloudConfig {
            read_station: false,
            ..CloudConfig::default()
        };
        assert_eq!(config.scope(), "");
        assert!(!config.any_api_enabled());
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let toml = r#"
            client_id = "app"
            read_welcome = true
        "#;
        let config: CloudConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.client_id, "app");
        assert!(config.read_station);
        assert!(config.read_welcome);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn should_redact_secrets_in_debug_output() {
        let config = CloudConfig {
            client_secret: "s3cr3t".into(),
            password: "hunter2".into(),
            ..CloudConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cr3t"));
        assert!(!debug.contains("hunter2"));
    }
}
