//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `atmolink.toml` in the working directory, or at the path named
//! by `ATMOLINK_CONFIG`. Every field has a default so the file is optional,
//! but the cloud credentials must come from somewhere. Environment variables
//! take precedence over file values.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use atmolink_adapter_cloud::CloudConfig;
use atmolink_app::bridge::BridgeConfig;
use atmolink_domain::equipment::EquipmentKind;
use atmolink_domain::error::ValidationError;
use atmolink_domain::id::EquipmentId;

const DEFAULT_PATH: &str = "atmolink.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    /// Vendor account.
    pub cloud: CloudConfig,
    pub bridge: BridgeSettings,
    /// Configured equipment, `[[things]]` tables.
    pub things: Vec<ThingConfig>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Bridge tunables as written in the file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Id under which the bridge reports its own status.
    pub id: String,
    pub startup_delay_ms: u64,
    pub default_refresh_interval_secs: u64,
    pub probe_timeout_secs: u64,
    pub welcome_event_things: usize,
    pub welcome_unknown_person_things: usize,
}

/// One `[[things]]` entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThingConfig {
    pub id: String,
    /// Vendor model tag, e.g. `NAMain` or `NAModule1`.
    pub kind: String,
    pub parent_id: Option<String>,
    pub refresh_interval_secs: Option<u64>,
    /// Free-form properties such as `batteryMin` or `signalLevels`.
    pub properties: BTreeMap<String, String>,
}

/// A validated `[[things]]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thing {
    pub id: EquipmentId,
    pub kind: EquipmentKind,
    pub parent_id: Option<EquipmentId>,
    pub refresh_interval: Duration,
    pub properties: BTreeMap<String, String>,
}

impl ThingConfig {
    /// Check the entry and resolve its types.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an empty id, an unknown kind, a
    /// module without parent or a zero refresh interval.
    pub fn to_thing(&self, default_interval: Duration) -> Result<Thing, ValidationError> {
        let id = EquipmentId::new(self.id.as_str())?;
        let kind: EquipmentKind = self.kind.parse()?;
        let parent_id = self
            .parent_id
            .as_deref()
            .map(EquipmentId::new)
            .transpose()?;
        if kind.is_module() && parent_id.is_none() {
            return Err(ValidationError::MissingParent(id.to_string()));
        }
        let refresh_interval = self
            .refresh_interval_secs
            .map_or(default_interval, Duration::from_secs);
        if refresh_interval.is_zero() {
            return Err(ValidationError::ZeroRefreshInterval);
        }
        Ok(Thing {
            id,
            kind,
            parent_id,
            refresh_interval,
            properties: self.properties.clone(),
        })
    }
}

impl BridgeSettings {
    #[must_use]
    pub fn to_bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            startup_delay: Duration::from_millis(self.startup_delay_ms),
            default_refresh_interval: Duration::from_secs(self.default_refresh_interval_secs),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            welcome_event_things: self.welcome_event_things,
            welcome_unknown_person_things: self.welcome_unknown_person_things,
        }
    }
}

impl Config {
    /// Load configuration from `atmolink.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration does not validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("ATMOLINK_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 5] = [
            ("ATMOLINK_CLIENT_ID", &mut self.cloud.client_id),
            ("ATMOLINK_CLIENT_SECRET", &mut self.cloud.client_secret),
            ("ATMOLINK_USERNAME", &mut self.cloud.username),
            ("ATMOLINK_PASSWORD", &mut self.cloud.password),
            ("ATMOLINK_API_URL", &mut self.cloud.api_url),
        ];
        for (name, field) in overrides {
            if let Ok(val) = std::env::var(name) {
                *field = val;
            }
        }
        if let Ok(val) = std::env::var("ATMOLINK_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cloud.any_api_enabled() {
            let missing: Vec<&str> = [
                ("client_id", &self.cloud.client_id),
                ("client_secret", &self.cloud.client_secret),
                ("username", &self.cloud.username),
                ("password", &self.cloud.password),
            ]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
            .collect();
            if !missing.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "missing cloud credentials: {}",
                    missing.join(", ")
                )));
            }
        }
        if self.bridge.default_refresh_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "default refresh interval must be greater than zero".to_string(),
            ));
        }
        EquipmentId::new(self.bridge.id.as_str())
            .map_err(|err| ConfigError::Validation(format!("bridge id: {err}")))?;
        self.things()?;
        Ok(())
    }

    /// Every `[[things]]` entry, validated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Thing`] naming the first invalid entry.
    pub fn things(&self) -> Result<Vec<Thing>, ConfigError> {
        let default_interval = Duration::from_secs(self.bridge.default_refresh_interval_secs);
        self.things
            .iter()
            .enumerate()
            .map(|(index, thing)| {
                thing
                    .to_thing(default_interval)
                    .map_err(|source| ConfigError::Thing { index, source })
            })
            .collect()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "atmolinkd=info,atmolink=info".to_string(),
        }
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        let defaults = BridgeConfig::default();
        Self {
            id: "atmolink".to_string(),
            startup_delay_ms: u64::try_from(defaults.startup_delay.as_millis()).unwrap_or(1),
            default_refresh_interval_secs: defaults.default_refresh_interval.as_secs(),
            probe_timeout_secs: defaults.probe_timeout.as_secs(),
            welcome_event_things: defaults.welcome_event_things,
            welcome_unknown_person_things: defaults.welcome_unknown_person_things,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    #[error("invalid thing #{index}")]
    Thing {
        index: usize,
        #[source]
        source: ValidationError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_credentials() -> Config {
        let mut config = Config::default();
        config.cloud.client_id = "app".to_string();
        config.cloud.client_secret = "secret".to_string();
        config.cloud.username = "me@example.com".to_string();
        config.cloud.password = "pw".to_string();
        config
    }

    fn thing(id: &str, kind: &str, parent_id: Option<&str>) -> ThingConfig {
        ThingConfig {
            id: id.to_string(),
            kind: kind.to_string(),
            parent_id: parent_id.map(str::to_string),
            ..ThingConfig::default()
        }
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.bridge.id, "atmolink");
        assert_eq!(config.bridge.default_refresh_interval_secs, 300);
        assert_eq!(config.bridge.welcome_event_things, 5);
        assert!(config.cloud.read_station);
        assert!(config.things.is_empty());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [logging]
            filter = 'debug'

            [cloud]
            api_url = 'http://localhost:9000'
            client_id = 'app'
            client_secret = 'secret'
            username = 'me@example.com'
            password = 'pw'
            read_welcome = true

            [bridge]
            default_refresh_interval_secs = 600
            welcome_unknown_person_things = 3

            [[things]]
            id = '70:ee:50:00:00:01'
            kind = 'NAMain'

            [[things]]
            id = '02:00:00:00:00:01'
            kind = 'NAModule1'
            parent_id = '70:ee:50:00:00:01'
            properties = { batteryMin = '3600', batteryMax = '6000' }
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.cloud.api_url, "http://localhost:9000");
        assert!(config.cloud.read_welcome);
        assert_eq!(config.bridge.welcome_unknown_person_things, 3);
        assert!(config.validate().is_ok());

        let things = config.things().unwrap();
        assert_eq!(things.len(), 2);
        assert_eq!(things[0].kind, EquipmentKind::WeatherStation);
        assert_eq!(things[0].refresh_interval, Duration::from_secs(600));
        assert_eq!(things[1].parent_id.as_ref().unwrap().as_str(), "70:ee:50:00:00:01");
        assert_eq!(things[1].properties["batteryMax"], "6000");
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let config: Config = toml::from_str("[bridge]\nstartup_delay_ms = 500").unwrap();
        assert_eq!(config.bridge.startup_delay_ms, 500);
        assert_eq!(config.bridge.probe_timeout_secs, 5);
        assert_eq!(config.cloud.timeout_secs, 30);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.bridge.id, "atmolink");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_require_credentials_when_an_api_is_enabled() {
        let err = Config::default().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: missing cloud credentials: client_id, client_secret, username, password"
        );
    }

    #[test]
    fn should_accept_missing_credentials_when_every_api_is_disabled() {
        let mut config = Config::default();
        config.cloud.read_station = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_accept_configuration_with_credentials() {
        assert!(with_credentials().validate().is_ok());
    }

    #[test]
    fn should_reject_zero_default_refresh_interval() {
        let mut config = with_credentials();
        config.bridge.default_refresh_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_module_without_parent() {
        let mut config = with_credentials();
        config.things.push(thing("02:00:00:00:00:01", "NAModule1", None));
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Thing {
                index: 0,
                source: ValidationError::MissingParent(_)
            }
        ));
    }

    #[test]
    fn should_reject_unknown_kind() {
        let mut config = with_credentials();
        config.things.push(thing("70:ee:50:00:00:01", "NAMain", None));
        config.things.push(thing("x", "NAToaster", None));
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Thing {
                index: 1,
                source: ValidationError::UnknownKind(_)
            }
        ));
    }

    #[test]
    fn should_reject_zero_thing_refresh_interval() {
        let mut entry = thing("70:ee:50:00:00:01", "NAMain", None);
        entry.refresh_interval_secs = Some(0);
        assert_eq!(
            entry.to_thing(Duration::from_secs(300)),
            Err(ValidationError::ZeroRefreshInterval)
        );
    }

    #[test]
    fn should_parse_kind_case_insensitively() {
        let thing = thing("5a01", "nawelcomehome", None)
            .to_thing(Duration::from_secs(300))
            .unwrap();
        assert_eq!(thing.kind, EquipmentKind::Home);
    }

    #[test]
    fn should_convert_bridge_settings() {
        let settings = BridgeSettings {
            startup_delay_ms: 250,
            probe_timeout_secs: 2,
            ..BridgeSettings::default()
        };
        let config = settings.to_bridge_config();
        assert_eq!(config.startup_delay, Duration::from_millis(250));
        assert_eq!(config.probe_timeout, Duration::from_secs(2));
        assert_eq!(config.default_refresh_interval, Duration::from_secs(300));
    }
}
