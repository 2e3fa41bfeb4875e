//! Snapshots: one complete, internally consistent fetch result for a device.
//!
//! Payload structs mirror the vendor's JSON field names so they can be
//! deserialized directly. A [`Snapshot`] is immutable once built; nodes swap
//! whole snapshots, they never patch one in place.

use serde::{Deserialize, Serialize};

use crate::id::EquipmentId;
use crate::time::{Timestamp, now};

/// Geographic location attached to a device or home.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Place {
    pub city: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
    pub altitude: Option<f64>,
    /// `[longitude, latitude]`.
    pub location: Option<Vec<f64>>,
}

/// Measurement set reported by a station or one of its modules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dashboard {
    pub time_utc: Option<i64>,
    #[serde(rename = "Temperature")]
    pub temperature: Option<f64>,
    #[serde(rename = "Humidity")]
    pub humidity: Option<f64>,
    #[serde(rename = "CO2")]
    pub co2: Option<f64>,
    #[serde(rename = "Noise")]
    pub noise: Option<f64>,
    #[serde(rename = "Pressure")]
    pub pressure: Option<f64>,
    #[serde(rename = "AbsolutePressure")]
    pub absolute_pressure: Option<f64>,
    pub temp_trend: Option<String>,
    pub pressure_trend: Option<String>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub date_min_temp: Option<i64>,
    pub date_max_temp: Option<i64>,
    #[serde(rename = "Rain")]
    pub rain: Option<f64>,
    pub sum_rain_1: Option<f64>,
    pub sum_rain_24: Option<f64>,
    #[serde(rename = "WindAngle")]
    pub wind_angle: Option<f64>,
    #[serde(rename = "WindStrength")]
    pub wind_strength: Option<f64>,
    #[serde(rename = "GustAngle")]
    pub gust_angle: Option<f64>,
    #[serde(rename = "GustStrength")]
    pub gust_strength: Option<f64>,
}

/// Device-level part of a station or plug answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceData {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub station_name: Option<String>,
    pub module_name: Option<String>,
    pub wifi_status: Option<i64>,
    pub last_status_store: Option<i64>,
    pub place: Option<Place>,
    pub dashboard_data: Option<Box<Dashboard>>,
}

/// Thermostat setpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Setpoint {
    pub setpoint_mode: Option<String>,
    pub setpoint_endtime: Option<i64>,
}

/// Last thermostat measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Measured {
    pub time: Option<i64>,
    pub temperature: Option<f64>,
    pub setpoint_temp: Option<f64>,
}

/// Battery-powered radio module: station modules and thermostats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleData {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub module_name: Option<String>,
    pub battery_vp: Option<i64>,
    pub rf_status: Option<i64>,
    pub last_message: Option<i64>,
    pub dashboard_data: Option<Box<Dashboard>>,
    pub therm_relay_cmd: Option<i64>,
    pub therm_orientation: Option<i64>,
    pub setpoint: Option<Setpoint>,
    pub measured: Option<Measured>,
}

/// Picture reference (face or event snapshot).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub id: Option<String>,
    pub version: Option<i64>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraData {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub sd_status: Option<String>,
    pub alim_status: Option<String>,
    pub vpn_url: Option<String>,
    pub is_local: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonData {
    pub id: String,
    pub last_seen: Option<i64>,
    pub out_of_sight: Option<bool>,
    pub face: Option<Image>,
    pub pseudo: Option<String>,
}

impl PersonData {
    /// A person is known when the account gave them a name.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.pseudo.is_some()
    }

    #[must_use]
    pub fn is_in_sight(&self) -> bool {
        self.out_of_sight == Some(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventData {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub time: Option<i64>,
    pub camera_id: Option<String>,
    pub person_id: Option<String>,
    pub snapshot: Option<Image>,
    pub video_id: Option<String>,
    pub video_status: Option<String>,
    pub is_arrival: Option<bool>,
    pub message: Option<String>,
    pub sub_type: Option<i64>,
}

/// Security home record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeData {
    pub id: String,
    pub name: Option<String>,
    pub place: Option<Place>,
    pub cameras: Vec<CameraData>,
    pub persons: Vec<PersonData>,
    pub events: Vec<EventData>,
}

/// Presence summary derived from a home's person list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presence {
    pub known: usize,
    pub unknown: usize,
}

impl Presence {
    #[must_use]
    pub fn somebody_at_home(&self) -> bool {
        self.known > 0 || self.unknown > 0
    }
}

impl HomeData {
    /// Count distinct persons currently in sight, split by known/unknown.
    #[must_use]
    pub fn presence(&self) -> Presence {
        let mut seen: Vec<&str> = Vec::with_capacity(self.persons.len());
        let mut presence = Presence::default();
        for person in &self.persons {
            if seen.iter().any(|id| id.eq_ignore_ascii_case(&person.id)) {
                continue;
            }
            seen.push(&person.id);
            if !person.is_in_sight() {
                continue;
            }
            if person.is_known() {
                presence.known += 1;
            } else {
                presence.unknown += 1;
            }
        }
        presence
    }

    /// Newest events first, most recently seen persons first.
    fn sort(&mut self) {
        self.events
            .sort_by(|a, b| b.time.unwrap_or(i64::MIN).cmp(&a.time.unwrap_or(i64::MIN)));
        self.persons.sort_by(|a, b| {
            b.last_seen
                .unwrap_or(i64::MIN)
                .cmp(&a.last_seen.unwrap_or(i64::MIN))
        });
    }

    /// Most recent event referring to `person_id`. Assumes events are sorted.
    fn last_event_of(&self, person_id: &str) -> Option<&EventData> {
        self.events.iter().find(|event| {
            event
                .person_id
                .as_deref()
                .is_some_and(|id| id.eq_ignore_ascii_case(person_id))
        })
    }
}

/// Account-level unit preferences delivered alongside every device answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Administrative {
    pub unit: Option<i64>,
    pub windunit: Option<i64>,
    pub pressureunit: Option<i64>,
}

/// Device-level payload of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum DevicePayload {
    Station(DeviceData),
    Plug(DeviceData),
    Home(HomeData),
}

/// A person together with the latest event that mentions them.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonSlice {
    pub person: PersonData,
    pub last_event: Option<EventData>,
}

/// The slice of a device snapshot that belongs to one module.
#[derive(Debug, Clone, PartialEq)]
pub enum ModulePayload {
    Radio(ModuleData),
    Camera(CameraData),
    Person(PersonSlice),
    Event(EventData),
}

impl ModulePayload {
    /// Raw id of the module inside the parent answer.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Radio(module) => &module.id,
            Self::Camera(camera) => &camera.id,
            Self::Person(slice) => &slice.person.id,
            Self::Event(event) => &event.id,
        }
    }
}

/// One complete fetch result for a device.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub device: DevicePayload,
    pub modules: Vec<ModulePayload>,
    pub administrative: Option<Administrative>,
    pub fetched_at: Timestamp,
}

impl Snapshot {
    #[must_use]
    pub fn station(
        device: DeviceData,
        modules: Vec<ModuleData>,
        administrative: Option<Administrative>,
    ) -> Self {
        Self {
            device: DevicePayload::Station(device),
            modules: modules.into_iter().map(ModulePayload::Radio).collect(),
            administrative,
            fetched_at: now(),
        }
    }

    #[must_use]
    pub fn plug(
        device: DeviceData,
        thermostats: Vec<ModuleData>,
        administrative: Option<Administrative>,
    ) -> Self {
        Self {
            device: DevicePayload::Plug(device),
            modules: thermostats.into_iter().map(ModulePayload::Radio).collect(),
            administrative,
            fetched_at: now(),
        }
    }

    /// Build a home snapshot: cameras, persons and events become modules.
    ///
    /// Events are ordered newest first and persons most recently seen first;
    /// every person slice carries the latest event mentioning that person.
    #[must_use]
    pub fn home(mut home: HomeData, administrative: Option<Administrative>) -> Self {
        home.sort();
        let cameras = home.cameras.iter().cloned().map(ModulePayload::Camera);
        let persons = home.persons.iter().map(|person| {
            ModulePayload::Person(PersonSlice {
                person: person.clone(),
                last_event: home.last_event_of(&person.id).cloned(),
            })
        });
        let events = home.events.iter().cloned().map(ModulePayload::Event);
        let modules = cameras.chain(persons).chain(events).collect();
        Self {
            device: DevicePayload::Home(home),
            modules,
            administrative,
            fetched_at: now(),
        }
    }

    /// Slice for `id`, compared case-insensitively.
    #[must_use]
    pub fn module(&self, id: &EquipmentId) -> Option<&ModulePayload> {
        self.modules.iter().find(|module| id.matches(module.id()))
    }

    /// Raw id of the device this snapshot describes.
    #[must_use]
    pub fn device_id(&self) -> &str {
        match &self.device {
            DevicePayload::Station(device) | DevicePayload::Plug(device) => &device.id,
            DevicePayload::Home(home) => &home.id,
        }
    }
}
