//! Channel registry: the static channel catalogue per equipment kind and the
//! rules turning a snapshot (or a module slice) into channel values.
//!
//! Rules are plain functions over typed payloads, selected by kind and
//! channel. They never fetch anything: media URLs are returned as a
//! [`Resolution::Media`] request for the caller to resolve against a camera.

use atmolink_domain::calibration::{BatteryCalibration, SignalThresholds};
use atmolink_domain::channel::{Channel, ChannelValue};
use atmolink_domain::equipment::EquipmentKind;
use atmolink_domain::media::{MediaResource, VideoQuality, picture_url};
use atmolink_domain::snapshot::{
    Administrative, CameraData, Dashboard, DeviceData, DevicePayload, EventData, HomeData,
    ModuleData, ModulePayload, PersonSlice, Snapshot,
};
use atmolink_domain::time::from_epoch_secs;
use atmolink_domain::weather;

use Channel as C;

const DEVICE: &[Channel] = &[
    C::LastStatusStore,
    C::Location,
    C::WifiStatus,
    C::Unit,
    C::WindUnit,
    C::PressureUnit,
];

const STATION: &[Channel] = &[
    C::LastStatusStore,
    C::Location,
    C::WifiStatus,
    C::Unit,
    C::WindUnit,
    C::PressureUnit,
    C::Temperature,
    C::TempTrend,
    C::Humidity,
    C::Humidex,
    C::HeatIndex,
    C::Dewpoint,
    C::DewpointDepression,
    C::Co2,
    C::Noise,
    C::Pressure,
    C::AbsolutePressure,
    C::PressTrend,
    C::TimeStamp,
    C::MinTemp,
    C::MaxTemp,
    C::DateMinTemp,
    C::DateMaxTemp,
];

const OUTDOOR: &[Channel] = &[
    C::LastMessage,
    C::BatteryVp,
    C::LowBattery,
    C::RfStatus,
    C::Temperature,
    C::TempTrend,
    C::Humidity,
    C::Humidex,
    C::HeatIndex,
    C::Dewpoint,
    C::DewpointDepression,
    C::TimeStamp,
    C::MinTemp,
    C::MaxTemp,
    C::DateMinTemp,
    C::DateMaxTemp,
];

const WIND: &[Channel] = &[
    C::LastMessage,
    C::BatteryVp,
    C::LowBattery,
    C::RfStatus,
    C::WindAngle,
    C::WindStrength,
    C::GustAngle,
    C::GustStrength,
    C::TimeStamp,
];

const RAIN: &[Channel] = &[
    C::LastMessage,
    C::BatteryVp,
    C::LowBattery,
    C::RfStatus,
    C::Rain,
    C::SumRain1,
    C::SumRain24,
    C::TimeStamp,
];

const INDOOR: &[Channel] = &[
    C::LastMessage,
    C::BatteryVp,
    C::LowBattery,
    C::RfStatus,
    C::Temperature,
    C::TempTrend,
    C::Humidity,
    C::Humidex,
    C::HeatIndex,
    C::Dewpoint,
    C::DewpointDepression,
    C::Co2,
    C::TimeStamp,
    C::MinTemp,
    C::MaxTemp,
    C::DateMinTemp,
    C::DateMaxTemp,
];

const THERMOSTAT: &[Channel] = &[
    C::LastMessage,
    C::BatteryVp,
    C::LowBattery,
    C::RfStatus,
    C::Temperature,
    C::TimeStamp,
    C::SetpointMode,
    C::SetpointEndTime,
    C::SetpointTemperature,
    C::ThermRelayCmd,
    C::ThermOrientation,
];

const HOME: &[Channel] = &[
    C::HomeCity,
    C::HomeCountry,
    C::HomeTimezone,
    C::HomeSomebodyAtHome,
    C::HomePersonCount,
    C::HomeUnknownCount,
];

const CAMERA: &[Channel] = &[
    C::CameraStatus,
    C::CameraSdStatus,
    C::CameraAlimStatus,
    C::CameraVpnUrl,
    C::CameraIsLocal,
    C::CameraLivePictureUrl,
    C::CameraLiveVideoPoorUrl,
    C::CameraLiveVideoLowUrl,
    C::CameraLiveVideoMediumUrl,
    C::CameraLiveVideoHighUrl,
];

const PERSON: &[Channel] = &[
    C::PersonId,
    C::PersonLastSeen,
    C::PersonOutOfSight,
    C::PersonFaceId,
    C::PersonFaceVersion,
    C::PersonFaceKey,
    C::PersonPseudo,
    C::PersonAtHome,
    C::PersonLastEventId,
    C::PersonLastEventMessage,
    C::PersonLastEventTime,
    C::PersonAvatarPictureUrl,
    C::PersonLastEventPictureUrl,
];

const EVENT: &[Channel] = &[
    C::EventId,
    C::EventType,
    C::EventTime,
    C::EventCameraId,
    C::EventPersonId,
    C::EventSnapshotId,
    C::EventSnapshotVersion,
    C::EventSnapshotKey,
    C::EventVideoId,
    C::EventVideoStatus,
    C::EventIsArrival,
    C::EventMessage,
    C::EventSubType,
    C::EventPictureUrl,
    C::EventVideoPoorUrl,
    C::EventVideoLowUrl,
    C::EventVideoMediumUrl,
    C::EventVideoHighUrl,
];

/// Channels exposed by an equipment kind.
#[must_use]
pub fn catalogue(kind: EquipmentKind) -> &'static [Channel] {
    match kind {
        EquipmentKind::WeatherStation => STATION,
        EquipmentKind::Plug => DEVICE,
        EquipmentKind::Home => HOME,
        EquipmentKind::OutdoorModule => OUTDOOR,
        EquipmentKind::WindGauge => WIND,
        EquipmentKind::RainGauge => RAIN,
        EquipmentKind::IndoorModule => INDOOR,
        EquipmentKind::Thermostat => THERMOSTAT,
        EquipmentKind::Camera => CAMERA,
        EquipmentKind::Person => PERSON,
        EquipmentKind::Event => EVENT,
    }
}

/// Whether `kind` exposes `channel`.
#[must_use]
pub fn supports(kind: EquipmentKind, channel: Channel) -> bool {
    catalogue(kind).contains(&channel)
}

/// Per-node calibration a rule may need besides the payload.
#[derive(Debug, Clone, Copy)]
pub struct Calibration<'a> {
    pub battery: Option<&'a BatteryCalibration>,
    pub signal: &'a SignalThresholds,
}

/// Outcome of applying a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Value(ChannelValue),
    /// URL of a resource hosted by the camera with the given relay URL.
    Media {
        relay_url: String,
        resource: MediaResource,
    },
    /// URL of a resource hosted by another camera module, looked up by id.
    CameraMedia {
        camera_id: String,
        resource: MediaResource,
    },
}

impl Resolution {
    const UNDEFINED: Self = Self::Value(ChannelValue::Undefined);
}

impl From<ChannelValue> for Resolution {
    fn from(value: ChannelValue) -> Self {
        Self::Value(value)
    }
}

/// Resolve a device channel against a snapshot.
///
/// Channels outside the kind's catalogue and absent fields resolve to
/// [`ChannelValue::Undefined`].
#[must_use]
pub fn device_value(
    kind: EquipmentKind,
    channel: Channel,
    snapshot: &Snapshot,
    signal: &SignalThresholds,
) -> ChannelValue {
    if !supports(kind, channel) {
        return ChannelValue::Undefined;
    }
    match &snapshot.device {
        DevicePayload::Station(device) | DevicePayload::Plug(device) => station_value(
            channel,
            device,
            snapshot.administrative.as_ref(),
            signal,
        ),
        DevicePayload::Home(home) => home_value(channel, home),
    }
}

/// Resolve a module channel against the module's slice.
#[must_use]
pub fn module_value(
    kind: EquipmentKind,
    channel: Channel,
    payload: &ModulePayload,
    calibration: Calibration<'_>,
) -> Resolution {
    if !supports(kind, channel) {
        return Resolution::UNDEFINED;
    }
    match payload {
        ModulePayload::Radio(module) => radio_value(channel, module, calibration).into(),
        ModulePayload::Camera(camera) => camera_value(channel, camera),
        ModulePayload::Person(slice) => person_value(channel, slice).into(),
        ModulePayload::Event(event) => event_value(channel, event),
    }
}

fn station_value(
    channel: Channel,
    device: &DeviceData,
    administrative: Option<&Administrative>,
    signal: &SignalThresholds,
) -> ChannelValue {
    match channel {
        C::LastStatusStore => date(device.last_status_store),
        C::Location => device.place.as_ref().map_or(ChannelValue::Undefined, |place| {
            match place.location.as_deref() {
                Some([longitude, latitude, ..]) => ChannelValue::Point {
                    latitude: *latitude,
                    longitude: *longitude,
                    altitude: place.altitude,
                },
                _ => ChannelValue::Undefined,
            }
        }),
        C::WifiStatus => device
            .wifi_status
            .map_or(ChannelValue::Undefined, |raw| bucket(signal, raw)),
        C::Unit => integer(administrative.and_then(|a| a.unit)),
        C::WindUnit => integer(administrative.and_then(|a| a.windunit)),
        C::PressureUnit => integer(administrative.and_then(|a| a.pressureunit)),
        other => device
            .dashboard_data
            .as_deref()
            .map_or(ChannelValue::Undefined, |dashboard| {
                dashboard_value(other, dashboard)
            }),
    }
}

fn dashboard_value(channel: Channel, dashboard: &Dashboard) -> ChannelValue {
    let climate = dashboard.temperature.zip(dashboard.humidity);
    match channel {
        C::Temperature => decimal(dashboard.temperature),
        C::Humidity => decimal(dashboard.humidity),
        C::Humidex => decimal(climate.map(|(t, h)| weather::humidex(t, h))),
        C::HeatIndex => decimal(climate.map(|(t, h)| weather::heat_index(t, h))),
        C::Dewpoint => decimal(climate.map(|(t, h)| weather::dewpoint(t, h))),
        C::DewpointDepression => decimal(
            climate.map(|(t, h)| weather::dewpoint_depression(t, weather::dewpoint(t, h))),
        ),
        C::Co2 => decimal(dashboard.co2),
        C::Noise => decimal(dashboard.noise),
        C::Pressure => decimal(dashboard.pressure),
        C::AbsolutePressure => decimal(dashboard.absolute_pressure),
        C::TempTrend => text(dashboard.temp_trend.as_deref()),
        C::PressTrend => text(dashboard.pressure_trend.as_deref()),
        C::TimeStamp => date(dashboard.time_utc),
        C::MinTemp => decimal(dashboard.min_temp),
        C::MaxTemp => decimal(dashboard.max_temp),
        C::DateMinTemp => date(dashboard.date_min_temp),
        C::DateMaxTemp => date(dashboard.date_max_temp),
        C::Rain => decimal(dashboard.rain),
        C::SumRain1 => decimal(dashboard.sum_rain_1),
        C::SumRain24 => decimal(dashboard.sum_rain_24),
        C::WindAngle => decimal(dashboard.wind_angle),
        C::WindStrength => decimal(dashboard.wind_strength),
        C::GustAngle => decimal(dashboard.gust_angle),
        C::GustStrength => decimal(dashboard.gust_strength),
        _ => ChannelValue::Undefined,
    }
}

fn home_value(channel: Channel, home: &HomeData) -> ChannelValue {
    let place = home.place.as_ref();
    let presence = home.presence();
    match channel {
        C::HomeCity => text(place.and_then(|p| p.city.as_deref())),
        C::HomeCountry => text(place.and_then(|p| p.country.as_deref())),
        C::HomeTimezone => text(place.and_then(|p| p.timezone.as_deref())),
        C::HomeSomebodyAtHome => ChannelValue::OnOff(presence.somebody_at_home()),
        C::HomePersonCount => count(presence.known),
        C::HomeUnknownCount => count(presence.unknown),
        _ => ChannelValue::Undefined,
    }
}

fn radio_value(channel: Channel, module: &ModuleData, calibration: Calibration<'_>) -> ChannelValue {
    match channel {
        C::LastMessage => date(module.last_message),
        C::BatteryVp => match (calibration.battery, module.battery_vp) {
            (Some(battery), Some(raw)) => integer(battery.percent(raw)),
            _ => ChannelValue::Undefined,
        },
        C::LowBattery => match (calibration.battery, module.battery_vp) {
            (Some(battery), Some(raw)) => ChannelValue::OnOff(battery.is_low(raw)),
            _ => ChannelValue::Undefined,
        },
        C::RfStatus => module
            .rf_status
            .map_or(ChannelValue::Undefined, |raw| bucket(calibration.signal, raw)),
        C::SetpointMode => text(
            module
                .setpoint
                .as_ref()
                .and_then(|s| s.setpoint_mode.as_deref()),
        ),
        C::SetpointEndTime => date(module.setpoint.as_ref().and_then(|s| s.setpoint_endtime)),
        C::SetpointTemperature => decimal(module.measured.as_ref().and_then(|m| m.setpoint_temp)),
        C::ThermRelayCmd => integer(module.therm_relay_cmd),
        C::ThermOrientation => integer(module.therm_orientation),
        C::Temperature | C::TimeStamp if module.dashboard_data.is_none() => {
            let measured = module.measured.as_ref();
            if channel == C::Temperature {
                decimal(measured.and_then(|m| m.temperature))
            } else {
                date(measured.and_then(|m| m.time))
            }
        }
        other => module
            .dashboard_data
            .as_deref()
            .map_or(ChannelValue::Undefined, |dashboard| {
                dashboard_value(other, dashboard)
            }),
    }
}

fn camera_value(channel: Channel, camera: &CameraData) -> Resolution {
    let media = |resource: MediaResource| match camera.vpn_url.as_deref() {
        Some(relay) if !relay.is_empty() => Resolution::Media {
            relay_url: relay.to_string(),
            resource,
        },
        _ => Resolution::UNDEFINED,
    };
    match channel {
        C::CameraStatus => switch(camera.status.as_deref()).into(),
        C::CameraSdStatus => switch(camera.sd_status.as_deref()).into(),
        C::CameraAlimStatus => switch(camera.alim_status.as_deref()).into(),
        C::CameraVpnUrl => text(camera.vpn_url.as_deref()).into(),
        C::CameraIsLocal => on_off(camera.is_local).into(),
        C::CameraLivePictureUrl => media(MediaResource::LiveSnapshot),
        C::CameraLiveVideoPoorUrl => media(MediaResource::LiveVideo(VideoQuality::Poor)),
        C::CameraLiveVideoLowUrl => media(MediaResource::LiveVideo(VideoQuality::Low)),
        C::CameraLiveVideoMediumUrl => media(MediaResource::LiveVideo(VideoQuality::Medium)),
        C::CameraLiveVideoHighUrl => media(MediaResource::LiveVideo(VideoQuality::High)),
        _ => Resolution::UNDEFINED,
    }
}

fn person_value(channel: Channel, slice: &PersonSlice) -> ChannelValue {
    let person = &slice.person;
    let face = person.face.as_ref();
    let event = slice.last_event.as_ref();
    match channel {
        C::PersonId => ChannelValue::Text(person.id.clone()),
        C::PersonLastSeen => date(person.last_seen),
        C::PersonOutOfSight => on_off(person.out_of_sight),
        C::PersonAtHome => on_off(person.out_of_sight.map(|out| !out)),
        C::PersonFaceId => text(face.and_then(|f| f.id.as_deref())),
        C::PersonFaceVersion => integer(face.and_then(|f| f.version)),
        C::PersonFaceKey => text(face.and_then(|f| f.key.as_deref())),
        C::PersonPseudo => text(person.pseudo.as_deref()),
        C::PersonLastEventId => text(event.map(|e| e.id.as_str())),
        C::PersonLastEventMessage => text(event.and_then(|e| e.message.as_deref())),
        C::PersonLastEventTime => date(event.and_then(|e| e.time)),
        C::PersonAvatarPictureUrl => text(
            face.and_then(|f| picture_url(f.id.as_deref(), f.key.as_deref()))
                .as_deref(),
        ),
        C::PersonLastEventPictureUrl => text(
            event
                .and_then(|e| e.snapshot.as_ref())
                .and_then(|s| picture_url(s.id.as_deref(), s.key.as_deref()))
                .as_deref(),
        ),
        _ => ChannelValue::Undefined,
    }
}

fn event_value(channel: Channel, event: &EventData) -> Resolution {
    let image = event.snapshot.as_ref();
    let video = |quality: VideoQuality| match (event.camera_id.as_deref(), event.video_id.as_deref())
    {
        (Some(camera_id), Some(video_id)) => Resolution::CameraMedia {
            camera_id: camera_id.to_string(),
            resource: MediaResource::EventVideo {
                video_id: video_id.to_string(),
                quality,
            },
        },
        _ => Resolution::UNDEFINED,
    };
    match channel {
        C::EventId => ChannelValue::Text(event.id.clone()).into(),
        C::EventType => text(event.kind.as_deref()).into(),
        C::EventTime => date(event.time).into(),
        C::EventCameraId => text(event.camera_id.as_deref()).into(),
        C::EventPersonId => text(event.person_id.as_deref()).into(),
        C::EventSnapshotId => text(image.and_then(|i| i.id.as_deref())).into(),
        C::EventSnapshotVersion => integer(image.and_then(|i| i.version)).into(),
        C::EventSnapshotKey => text(image.and_then(|i| i.key.as_deref())).into(),
        C::EventVideoId => text(event.video_id.as_deref()).into(),
        C::EventVideoStatus => text(event.video_status.as_deref()).into(),
        C::EventIsArrival => on_off(event.is_arrival).into(),
        C::EventMessage => text(event.message.as_deref()).into(),
        C::EventSubType => integer(event.sub_type).into(),
        C::EventPictureUrl => text(
            image
                .and_then(|i| picture_url(i.id.as_deref(), i.key.as_deref()))
                .as_deref(),
        )
        .into(),
        C::EventVideoPoorUrl => video(VideoQuality::Poor),
        C::EventVideoLowUrl => video(VideoQuality::Low),
        C::EventVideoMediumUrl => video(VideoQuality::Medium),
        C::EventVideoHighUrl => video(VideoQuality::High),
        _ => Resolution::UNDEFINED,
    }
}

fn decimal(value: Option<f64>) -> ChannelValue {
    value.map_or(ChannelValue::Undefined, ChannelValue::Decimal)
}

#[allow(clippy::cast_precision_loss)]
fn integer(value: Option<i64>) -> ChannelValue {
    value.map_or(ChannelValue::Undefined, |v| ChannelValue::Decimal(v as f64))
}

#[allow(clippy::cast_precision_loss)]
fn count(value: usize) -> ChannelValue {
    ChannelValue::Decimal(value as f64)
}

fn bucket(signal: &SignalThresholds, raw: i64) -> ChannelValue {
    count(signal.bucket(raw))
}

fn text(value: Option<&str>) -> ChannelValue {
    value.map_or(ChannelValue::Undefined, |v| ChannelValue::Text(v.to_string()))
}

fn date(secs: Option<i64>) -> ChannelValue {
    secs.and_then(from_epoch_secs)
        .map_or(ChannelValue::Undefined, ChannelValue::DateTime)
}

fn on_off(value: Option<bool>) -> ChannelValue {
    value.map_or(ChannelValue::Undefined, ChannelValue::OnOff)
}

/// `"on"`/`"off"` status strings.
fn switch(value: Option<&str>) -> ChannelValue {
    value.map_or(ChannelValue::Undefined, |v| {
        ChannelValue::OnOff(v.eq_ignore_ascii_case("on"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use atmolink_domain::snapshot::{Image, Measured, PersonData, Place, Setpoint};

    fn no_signal() -> SignalThresholds {
        SignalThresholds::default()
    }

    fn station_snapshot() -> Snapshot {
        Snapshot::station(
            DeviceData {
                id: "70:ee:50:00:00:01".into(),
                wifi_status: Some(55),
                last_status_store: Some(1_500_000_000),
                place: Some(Place {
                    altitude: Some(35.0),
                    location: Some(vec![2.35, 48.85]),
                    ..Place::default()
                }),
                dashboard_data: Some(Box::new(Dashboard {
                    temperature: Some(20.0),
                    humidity: Some(50.0),
                    co2: Some(640.0),
                    pressure_trend: Some("stable".into()),
                    ..Dashboard::default()
                })),
                ..DeviceData::default()
            },
            vec![],
            Some(Administrative {
                unit: Some(0),
                windunit: Some(2),
                pressureunit: Some(1),
            }),
        )
    }

    fn radio(battery_vp: i64) -> ModulePayload {
        ModulePayload::Radio(ModuleData {
            id: "02:00:00:aa:bb:cc".into(),
            battery_vp: Some(battery_vp),
            rf_status: Some(75),
            dashboard_data: Some(Box::new(Dashboard {
                temperature: Some(12.5),
                ..Dashboard::default()
            })),
            ..ModuleData::default()
        })
    }

    #[test]
    fn should_expose_full_catalogue_per_kind() {
        assert!(supports(EquipmentKind::WeatherStation, C::Co2));
        assert!(supports(EquipmentKind::IndoorModule, C::Co2));
        assert!(!supports(EquipmentKind::OutdoorModule, C::Co2));
        assert!(supports(EquipmentKind::RainGauge, C::SumRain24));
        assert_eq!(catalogue(EquipmentKind::Camera).len(), 10);
    }

    #[test]
    fn should_list_every_channel_in_some_catalogue() {
        for channel in Channel::ALL {
            assert!(
                EquipmentKind::ALL
                    .into_iter()
                    .any(|kind| supports(kind, *channel)),
                "{channel} is not exposed"
            );
        }
    }

    #[test]
    fn should_read_station_dashboard() {
        let snapshot = station_snapshot();
        let value = device_value(EquipmentKind::WeatherStation, C::Co2, &snapshot, &no_signal());
        assert_eq!(value, ChannelValue::Decimal(640.0));
        let trend = device_value(
            EquipmentKind::WeatherStation,
            C::PressTrend,
            &snapshot,
            &no_signal(),
        );
        assert_eq!(trend, ChannelValue::Text("stable".into()));
    }

    #[test]
    fn should_derive_dewpoint_from_temperature_and_humidity() {
        let snapshot = station_snapshot();
        let ChannelValue::Decimal(dewpoint) = device_value(
            EquipmentKind::WeatherStation,
            C::Dewpoint,
            &snapshot,
            &no_signal(),
        ) else {
            panic!("expected decimal");
        };
        assert!((dewpoint - 9.25).abs() < 0.01);
    }

    #[test]
    fn should_return_undefined_for_absent_field() {
        let snapshot = station_snapshot();
        let value = device_value(EquipmentKind::WeatherStation, C::Noise, &snapshot, &no_signal());
        assert!(value.is_undefined());
    }

    #[test]
    fn should_return_undefined_for_channel_outside_catalogue() {
        let snapshot = station_snapshot();
        let value = device_value(EquipmentKind::Plug, C::Co2, &snapshot, &no_signal());
        assert!(value.is_undefined());
    }

    #[test]
    fn should_read_location_as_point() {
        let value = device_value(
            EquipmentKind::WeatherStation,
            C::Location,
            &station_snapshot(),
            &no_signal(),
        );
        assert_eq!(
            value,
            ChannelValue::Point {
                latitude: 48.85,
                longitude: 2.35,
                altitude: Some(35.0)
            }
        );
    }

    #[test]
    fn should_read_account_units_from_administrative_data() {
        let value = device_value(
            EquipmentKind::WeatherStation,
            C::WindUnit,
            &station_snapshot(),
            &no_signal(),
        );
        assert_eq!(value, ChannelValue::Decimal(2.0));
    }

    #[test]
    fn should_bucket_wifi_status() {
        let signal = SignalThresholds::new(vec![86, 71, 56]);
        let value = device_value(
            EquipmentKind::WeatherStation,
            C::WifiStatus,
            &station_snapshot(),
            &signal,
        );
        assert_eq!(value, ChannelValue::Decimal(3.0));
    }

    #[test]
    fn should_compute_battery_percent_and_low_flag() {
        let battery = BatteryCalibration {
            min: 50,
            max: 130,
            low: 60,
        };
        let signal = no_signal();
        let calibration = Calibration {
            battery: Some(&battery),
            signal: &signal,
        };
        assert_eq!(
            module_value(EquipmentKind::OutdoorModule, C::BatteryVp, &radio(150), calibration),
            Resolution::Value(ChannelValue::Decimal(100.0))
        );
        assert_eq!(
            module_value(EquipmentKind::OutdoorModule, C::LowBattery, &radio(55), calibration),
            Resolution::Value(ChannelValue::OnOff(true))
        );
    }

    #[test]
    fn should_leave_battery_undefined_without_calibration() {
        let signal = no_signal();
        let calibration = Calibration {
            battery: None,
            signal: &signal,
        };
        assert_eq!(
            module_value(EquipmentKind::OutdoorModule, C::BatteryVp, &radio(90), calibration),
            Resolution::UNDEFINED
        );
    }

    #[test]
    fn should_read_thermostat_from_measured_block() {
        let payload = ModulePayload::Radio(ModuleData {
            id: "04:00:00:00:00:01".into(),
            setpoint: Some(Setpoint {
                setpoint_mode: Some("program".into()),
                setpoint_endtime: None,
            }),
            measured: Some(Measured {
                time: Some(1_500_000_000),
                temperature: Some(19.5),
                setpoint_temp: Some(20.0),
            }),
            ..ModuleData::default()
        });
        let signal = no_signal();
        let calibration = Calibration {
            battery: None,
            signal: &signal,
        };
        assert_eq!(
            module_value(EquipmentKind::Thermostat, C::Temperature, &payload, calibration),
            Resolution::Value(ChannelValue::Decimal(19.5))
        );
        assert_eq!(
            module_value(
                EquipmentKind::Thermostat,
                C::SetpointTemperature,
                &payload,
                calibration
            ),
            Resolution::Value(ChannelValue::Decimal(20.0))
        );
        assert_eq!(
            module_value(EquipmentKind::Thermostat, C::SetpointMode, &payload, calibration),
            Resolution::Value(ChannelValue::Text("program".into()))
        );
    }

    #[test]
    fn should_request_media_resolution_for_camera_urls() {
        let payload = ModulePayload::Camera(CameraData {
            id: "70:ee:50:aa:00:01".into(),
            vpn_url: Some("https://relay.example/cam".into()),
            status: Some("on".into()),
            ..CameraData::default()
        });
        let signal = no_signal();
        let calibration = Calibration {
            battery: None,
            signal: &signal,
        };
        assert_eq!(
            module_value(
                EquipmentKind::Camera,
                C::CameraLiveVideoHighUrl,
                &payload,
                calibration
            ),
            Resolution::Media {
                relay_url: "https://relay.example/cam".into(),
                resource: MediaResource::LiveVideo(VideoQuality::High),
            }
        );
        assert_eq!(
            module_value(EquipmentKind::Camera, C::CameraStatus, &payload, calibration),
            Resolution::Value(ChannelValue::OnOff(true))
        );
    }

    #[test]
    fn should_request_camera_lookup_for_event_videos() {
        let payload = ModulePayload::Event(EventData {
            id: "e-1".into(),
            camera_id: Some("70:ee:50:aa:00:01".into()),
            video_id: Some("v-9".into()),
            snapshot: Some(Image {
                id: Some("img".into()),
                version: Some(1),
                key: Some("k".into()),
            }),
            ..EventData::default()
        });
        let signal = no_signal();
        let calibration = Calibration {
            battery: None,
            signal: &signal,
        };
        assert_eq!(
            module_value(EquipmentKind::Event, C::EventVideoLowUrl, &payload, calibration),
            Resolution::CameraMedia {
                camera_id: "70:ee:50:aa:00:01".into(),
                resource: MediaResource::EventVideo {
                    video_id: "v-9".into(),
                    quality: VideoQuality::Low,
                },
            }
        );
        assert_eq!(
            module_value(EquipmentKind::Event, C::EventPictureUrl, &payload, calibration),
            Resolution::Value(ChannelValue::Text(
                "https://api.netatmo.com/api/getcamerapicture?image_id=img&key=k".into()
            ))
        );
    }

    #[test]
    fn should_resolve_person_last_event_from_slice() {
        let payload = ModulePayload::Person(PersonSlice {
            person: PersonData {
                id: "p-1".into(),
                out_of_sight: Some(false),
                pseudo: Some("Alice".into()),
                ..PersonData::default()
            },
            last_event: Some(EventData {
                id: "e-7".into(),
                message: Some("Alice arrived".into()),
                ..EventData::default()
            }),
        });
        let signal = no_signal();
        let calibration = Calibration {
            battery: None,
            signal: &signal,
        };
        assert_eq!(
            module_value(
                EquipmentKind::Person,
                C::PersonLastEventMessage,
                &payload,
                calibration
            ),
            Resolution::Value(ChannelValue::Text("Alice arrived".into()))
        );
        assert_eq!(
            module_value(EquipmentKind::Person, C::PersonAtHome, &payload, calibration),
            Resolution::Value(ChannelValue::OnOff(true))
        );
        assert_eq!(
            module_value(
                EquipmentKind::Person,
                C::PersonAvatarPictureUrl,
                &payload,
                calibration
            ),
            Resolution::UNDEFINED
        );
    }

    #[test]
    fn should_count_home_presence() {
        let snapshot = Snapshot::home(
            HomeData {
                id: "home".into(),
                persons: vec![
                    PersonData {
                        id: "p-1".into(),
                        out_of_sight: Some(false),
                        pseudo: Some("Alice".into()),
                        ..PersonData::default()
                    },
                    PersonData {
                        id: "p-2".into(),
                        out_of_sight: Some(false),
                        ..PersonData::default()
                    },
                ],
                ..HomeData::default()
            },
            None,
        );
        let signal = no_signal();
        assert_eq!(
            device_value(EquipmentKind::Home, C::HomePersonCount, &snapshot, &signal),
            ChannelValue::Decimal(1.0)
        );
        assert_eq!(
            device_value(EquipmentKind::Home, C::HomeSomebodyAtHome, &snapshot, &signal),
            ChannelValue::OnOff(true)
        );
    }
}
