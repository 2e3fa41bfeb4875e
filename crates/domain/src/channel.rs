//! Channel catalogue and typed channel values.
//!
//! Channel names are the stable public identifiers consumers subscribe to;
//! they never change once published.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::EquipmentId;
use crate::time::Timestamp;

macro_rules! define_channels {
    ($($(#[doc = $doc:expr])* $variant:ident => $name:literal,)+) => {
        /// A named logical value exposed by a device or module.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Channel {
            $($(#[doc = $doc])* $variant,)+
        }

        impl Channel {
            /// Every known channel.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// The public channel name.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl FromStr for Channel {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    other => Err(ValidationError::UnknownChannel(other.to_string())),
                }
            }
        }
    };
}

define_channels! {
    Temperature => "Temperature",
    TempTrend => "TempTrend",
    Humidity => "Humidity",
    Humidex => "Humidex",
    HeatIndex => "HeatIndex",
    Dewpoint => "Dewpoint",
    DewpointDepression => "DewpointDepression",
    Co2 => "Co2",
    Noise => "Noise",
    Pressure => "Pressure",
    AbsolutePressure => "AbsolutePressure",
    PressTrend => "PressTrend",
    /// Time of the measurement set.
    TimeStamp => "TimeStamp",
    Rain => "Rain",
    SumRain1 => "SumRain1",
    SumRain24 => "SumRain24",
    WindAngle => "WindAngle",
    WindStrength => "WindStrength",
    GustAngle => "GustAngle",
    GustStrength => "GustStrength",
    MinTemp => "min_temp",
    MaxTemp => "max_temp",
    DateMinTemp => "date_min_temp",
    DateMaxTemp => "date_max_temp",
    /// Last time the device reported to the cloud.
    LastStatusStore => "LastStatusStore",
    Location => "Location",
    /// Wifi signal bucket of a device.
    WifiStatus => "WifiStatus",
    /// Account temperature unit (0 metric, 1 imperial).
    Unit => "Unit",
    WindUnit => "WindUnit",
    PressureUnit => "PressureUnit",
    /// Last time the module reported to its device.
    LastMessage => "LastMessage",
    /// Battery level in percent.
    BatteryVp => "BatteryVP",
    LowBattery => "LowBattery",
    /// Radio signal bucket of a module.
    RfStatus => "RfStatus",
    SetpointMode => "SetpointMode",
    SetpointEndTime => "SetpointEndTime",
    SetpointTemperature => "Sp_Temperature",
    ThermRelayCmd => "ThermRelayCmd",
    ThermOrientation => "ThermOrientation",
    HomeCity => "welcomeHomeCity",
    HomeCountry => "welcomeHomeCountry",
    HomeTimezone => "welcomeHomeTimezone",
    HomeSomebodyAtHome => "welcomeHomeSomebodyAtHome",
    HomePersonCount => "welcomeHomePersonCount",
    HomeUnknownCount => "welcomeHomeUnknownCount",
    CameraStatus => "welcomeCameraStatus",
    CameraSdStatus => "welcomeCameraSdStatus",
    CameraAlimStatus => "welcomeCameraAlimStatus",
    CameraVpnUrl => "welcomeCameraVpnUrl",
    CameraIsLocal => "welcomeCameraIsLocal",
    CameraLivePictureUrl => "welcomeCameraLivePictureUrl",
    CameraLiveVideoPoorUrl => "welcomeCameraLiveVideoPoorUrl",
    CameraLiveVideoLowUrl => "welcomeCameraLiveVideoLowUrl",
    CameraLiveVideoMediumUrl => "welcomeCameraLiveVideoMediumUrl",
    CameraLiveVideoHighUrl => "welcomeCameraLiveVideoHighUrl",
    PersonId => "welcomePersonId",
    PersonLastSeen => "welcomePersonLastSeen",
    PersonOutOfSight => "welcomePersonOutOfSight",
    PersonFaceId => "welcomePersonFaceID",
    PersonFaceVersion => "welcomePersonFaceVersion",
    PersonFaceKey => "welcomePersonFaceKey",
    PersonPseudo => "welcomePersonPseudo",
    PersonAtHome => "welcomePersonAtHome",
    PersonLastEventId => "welcomePersonLastEventID",
    PersonLastEventMessage => "welcomePersonLastEventMessage",
    PersonLastEventTime => "welcomePersonLastEventTime",
    PersonAvatarPictureUrl => "welcomePersonAvatarPictureUrl",
    PersonLastEventPictureUrl => "welcomePersonLastEventPictureUrl",
    EventId => "welcomeEventId",
    EventType => "welcomeEventType",
    EventTime => "welcomeEventTime",
    EventCameraId => "welcomeEventCameraId",
    EventPersonId => "welcomeEventPersonId",
    EventSnapshotId => "welcomeEventSnapshotId",
    EventSnapshotVersion => "welcomeEventSnapshotVersion",
    EventSnapshotKey => "welcomeEventSnapshotKey",
    EventVideoId => "welcomeEventVideoID",
    EventVideoStatus => "welcomeEventVideoStatus",
    EventIsArrival => "welcomeEventIsArrival",
    EventMessage => "welcomeEventMessage",
    EventSubType => "welcomeEventSubType",
    EventPictureUrl => "welcomeEventPictureUrl",
    EventVideoPoorUrl => "welcomeEventVideoPoorUrl",
    EventVideoLowUrl => "welcomeEventVideoLowUrl",
    EventVideoMediumUrl => "welcomeEventVideoMediumUrl",
    EventVideoHighUrl => "welcomeEventVideoHighUrl",
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Channel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Value of a channel at a given instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelValue {
    /// No data backs the channel right now.
    Undefined,
    OnOff(bool),
    Decimal(f64),
    DateTime(Timestamp),
    Point {
        latitude: f64,
        longitude: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        altitude: Option<f64>,
    },
    Text(String),
}

impl ChannelValue {
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }
}

impl From<Option<ChannelValue>> for ChannelValue {
    fn from(value: Option<ChannelValue>) -> Self {
        value.unwrap_or(Self::Undefined)
    }
}

/// A channel value published for an equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelUpdate {
    pub equipment_id: EquipmentId,
    pub channel: Channel,
    pub value: ChannelValue,
    pub timestamp: Timestamp,
}
