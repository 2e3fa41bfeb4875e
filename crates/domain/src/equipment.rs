//! Equipment kinds: the vendor model tags this bridge knows how to read.
//!
//! A kind is either a **device** (polled on its own, owns a snapshot) or a
//! **module** (fed exclusively from its parent device's snapshot).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Vendor model tag of a device or module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquipmentKind {
    /// Weather station main (indoor) unit.
    #[serde(rename = "NAMain")]
    WeatherStation,
    /// Outdoor module of a weather station.
    #[serde(rename = "NAModule1")]
    OutdoorModule,
    /// Wind gauge.
    #[serde(rename = "NAModule2")]
    WindGauge,
    /// Rain gauge.
    #[serde(rename = "NAModule3")]
    RainGauge,
    /// Additional indoor module.
    #[serde(rename = "NAModule4")]
    IndoorModule,
    /// Thermostat relay plug.
    #[serde(rename = "NAPlug")]
    Plug,
    /// Thermostat attached to a plug.
    #[serde(rename = "NATherm1")]
    Thermostat,
    /// Security home record grouping cameras, persons and events.
    #[serde(rename = "NAWelcomeHome")]
    Home,
    /// Indoor security camera.
    #[serde(rename = "NACamera")]
    Camera,
    /// Person known to (or seen by) a home.
    #[serde(rename = "NAWelcomePerson")]
    Person,
    /// Recorded home event.
    #[serde(rename = "NAWelcomeEvent")]
    Event,
}

impl EquipmentKind {
    /// Every supported kind.
    pub const ALL: [Self; 11] = [
        Self::WeatherStation,
        Self::OutdoorModule,
        Self::WindGauge,
        Self::RainGauge,
        Self::IndoorModule,
        Self::Plug,
        Self::Thermostat,
        Self::Home,
        Self::Camera,
        Self::Person,
        Self::Event,
    ];

    /// The vendor model tag (e.g. `"NAMain"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WeatherStation => "NAMain",
            Self::OutdoorModule => "NAModule1",
            Self::WindGauge => "NAModule2",
            Self::RainGauge => "NAModule3",
            Self::IndoorModule => "NAModule4",
            Self::Plug => "NAPlug",
            Self::Thermostat => "NATherm1",
            Self::Home => "NAWelcomeHome",
            Self::Camera => "NACamera",
            Self::Person => "NAWelcomePerson",
            Self::Event => "NAWelcomeEvent",
        }
    }

    /// Whether this kind is polled on its own.
    #[must_use]
    pub fn is_device(self) -> bool {
        matches!(self, Self::WeatherStation | Self::Plug | Self::Home)
    }

    /// Whether this kind only receives data through its parent.
    #[must_use]
    pub fn is_module(self) -> bool {
        !self.is_device()
    }

    /// Whether modules of this kind run on batteries and report a radio level.
    #[must_use]
    pub fn is_radio_module(self) -> bool {
        matches!(
            self,
            Self::OutdoorModule
                | Self::WindGauge
                | Self::RainGauge
                | Self::IndoorModule
                | Self::Thermostat
        )
    }

    /// The device kind a module of this kind hangs under.
    #[must_use]
    pub fn parent_kind(self) -> Option<Self> {
        match self {
            Self::OutdoorModule | Self::WindGauge | Self::RainGauge | Self::IndoorModule => {
                Some(Self::WeatherStation)
            }
            Self::Thermostat => Some(Self::Plug),
            Self::Camera | Self::Person | Self::Event => Some(Self::Home),
            Self::WeatherStation | Self::Plug | Self::Home => None,
        }
    }
}

impl fmt::Display for EquipmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownKind(s.to_string()))
    }
}
