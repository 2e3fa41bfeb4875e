// Integration tests for `CloudClient` and `HttpLivenessProbe` using wiremock.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use atmolink_adapter_cloud::{CloudClient, CloudConfig, HttpLivenessProbe};
use atmolink_app::ports::{FetchError, LivenessProbe, ProbeError, SnapshotFetcher};
use atmolink_domain::equipment::EquipmentKind;
use atmolink_domain::id::EquipmentId;
use atmolink_domain::snapshot::{DevicePayload, ModulePayload};

// ── Helpers ─────────────────────────────────────────────────────────

const STATION: &str = "70:ee:50:00:00:01";

fn id(raw: &str) -> EquipmentId {
    EquipmentId::new(raw).unwrap()
}

fn config(server: &MockServer) -> CloudConfig {
    CloudConfig {
        api_url: server.uri(),
        client_id: "app".into(),
        client_secret: "secret".into(),
        username: "me@example.com".into(),
        password: "pw".into(),
        read_station: true,
        read_thermostat: true,
        read_welcome: true,
        timeout_secs: 5,
    }
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "refresh_token": "ref-1",
            "expires_in": 10800,
            "scope": ["read_station"]
        })))
        .mount(server)
        .await;
}

fn stations_body() -> serde_json::Value {
    json!({
        "status": "ok",
        "body": {
            "devices": [
                {
                    "_id": "70:ee:50:00:00:99",
                    "type": "NAMain",
                    "station_name": "Friend"
                },
                {
                    "_id": STATION,
                    "type": "NAMain",
                    "station_name": "Home",
                    "wifi_status": 45,
                    "dashboard_data": {"time_utc": 1_700_000_000, "Temperature": 21.5, "CO2": 612},
                    "modules": [{
                        "_id": "02:00:00:00:00:01",
                        "type": "NAModule1",
                        "module_name": "Garden",
                        "battery_vp": 5200,
                        "rf_status": 68,
                        "dashboard_data": {"Temperature": 7.1, "Humidity": 81}
                    }]
                }
            ],
            "user": {"administrative": {"unit": 0, "windunit": 0, "pressureunit": 0}}
        }
    })
}

async fn setup() -> (MockServer, CloudClient) {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let client = CloudClient::new(config(&server)).unwrap();
    (server, client)
}

// ── Snapshot fetching ───────────────────────────────────────────────

#[tokio::test]
async fn should_fetch_station_selected_by_id() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .and(query_param("device_id", STATION))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stations_body()))
        .mount(&server)
        .await;

    let snapshot = client
        .fetch(&id(STATION), EquipmentKind::WeatherStation)
        .await
        .unwrap();

    assert_eq!(snapshot.device_id(), STATION);
    assert!(matches!(
        &snapshot.device,
        DevicePayload::Station(device) if device.wifi_status == Some(45)
    ));
    assert_eq!(snapshot.modules.len(), 1);
    assert!(matches!(
        snapshot.module(&id("02:00:00:00:00:01")),
        Some(ModulePayload::Radio(module)) if module.battery_vp == Some(5200)
    ));
    assert_eq!(snapshot.administrative.unwrap().unit, Some(0));
}

#[tokio::test]
async fn should_report_station_missing_from_answer() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stations_body()))
        .mount(&server)
        .await;

    let err = client
        .fetch(&id("70:ee:50:00:00:42"), EquipmentKind::WeatherStation)
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::MissingEquipment("70:ee:50:00:00:42".into()));
}

#[tokio::test]
async fn should_fetch_home_with_cameras_persons_and_events() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/gethomedata"))
        .and(query_param("home_id", "5a01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "body": {
                "homes": [{
                    "id": "5a01",
                    "name": "Flat",
                    "cameras": [{"id": "70:ee:50:00:00:aa", "type": "NACamera", "vpn_url": "https://relay/abc"}],
                    "persons": [{"id": "p1", "last_seen": 100, "out_of_sight": false, "pseudo": "Alice"}],
                    "events": [
                        {"id": "e1", "type": "person", "time": 50, "person_id": "p1"},
                        {"id": "e2", "type": "person", "time": 90, "person_id": "p1"}
                    ]
                }]
            }
        })))
        .mount(&server)
        .await;

    let snapshot = client.fetch(&id("5a01"), EquipmentKind::Home).await.unwrap();

    assert_eq!(snapshot.modules.len(), 4);
    assert!(matches!(
        snapshot.module(&id("p1")),
        Some(ModulePayload::Person(slice))
            if slice.last_event.as_ref().map(|e| e.id.as_str()) == Some("e2")
    ));
}

#[tokio::test]
async fn should_list_every_enabled_api() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stations_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/getthermostatsdata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "body": {"devices": [{"_id": "70:ee:50:00:00:bb", "type": "NAPlug", "modules": [
                {"_id": "04:00:00:00:00:01", "type": "NATherm1", "setpoint": {"setpoint_mode": "program"}}
            ]}]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/gethomedata"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"body": {"homes": [{"id": "5a01"}]}})),
        )
        .mount(&server)
        .await;

    let snapshots = client.fetch_all().await.unwrap();

    let ids: Vec<_> = snapshots.iter().map(|s| s.device_id().to_string()).collect();
    assert_eq!(
        ids,
        vec!["70:ee:50:00:00:99", STATION, "70:ee:50:00:00:bb", "5a01"]
    );
}

#[tokio::test]
async fn should_refuse_disabled_api() {
    let server = MockServer::start().await;
    let client = CloudClient::new(CloudConfig {
        read_thermostat: false,
        ..config(&server)
    })
    .unwrap();

    let err = client
        .fetch(&id("70:ee:50:00:00:bb"), EquipmentKind::Plug)
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::Disabled("thermostat"));
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn should_authenticate_once_for_consecutive_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("scope=read_station"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": 10800
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stations_body()))
        .expect(2)
        .mount(&server)
        .await;
    let client = CloudClient::new(config(&server)).unwrap();

    client.check_connection().await.unwrap();
    client.fetch(&id(STATION), EquipmentKind::WeatherStation).await.unwrap();
    client.fetch(&id(STATION), EquipmentKind::WeatherStation).await.unwrap();
}

#[tokio::test]
async fn should_fail_connection_check_on_refused_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;
    let client = CloudClient::new(config(&server)).unwrap();

    let err = client.check_connection().await.unwrap_err();

    assert_eq!(err, FetchError::Authentication("invalid_grant".into()));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn should_log_in_again_after_rejected_token() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 3, "message": "Access token expired"}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stations_body()))
        .mount(&server)
        .await;

    let err = client
        .fetch(&id(STATION), EquipmentKind::WeatherStation)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Authentication(_)));

    client
        .fetch(&id(STATION), EquipmentKind::WeatherStation)
        .await
        .unwrap();
    let logins = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/oauth2/token")
        .count();
    assert_eq!(logins, 2);
}

#[tokio::test]
async fn should_classify_server_errors_as_transient() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
        .mount(&server)
        .await;

    let err = client
        .fetch(&id(STATION), EquipmentKind::WeatherStation)
        .await
        .unwrap_err();

    assert!(err.is_transient());
}

#[tokio::test]
async fn should_report_malformed_body() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"body\": 42}"))
        .mount(&server)
        .await;

    let err = client
        .fetch(&id(STATION), EquipmentKind::WeatherStation)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Malformed(_)));
}

// ── Liveness probe ──────────────────────────────────────────────────

#[tokio::test]
async fn should_return_local_url_reported_by_ping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/abc/command/ping"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"local_url": "http://192.168.1.20/abc"})),
        )
        .mount(&server)
        .await;
    let probe = HttpLivenessProbe::new(Duration::from_secs(2)).unwrap();

    let reply = probe.ping(&format!("{}/abc/", server.uri())).await.unwrap();

    assert_eq!(reply.local_url, "http://192.168.1.20/abc");
}

#[tokio::test]
async fn should_reject_ping_without_local_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/command/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;
    let probe = HttpLivenessProbe::new(Duration::from_secs(2)).unwrap();

    let err = probe.ping(&server.uri()).await.unwrap_err();

    assert_eq!(err, ProbeError::Malformed("missing local_url".into()));
}

#[tokio::test]
async fn should_report_ping_status_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/command/ping"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let probe = HttpLivenessProbe::new(Duration::from_secs(2)).unwrap();

    let err = probe.ping(&server.uri()).await.unwrap_err();

    assert_eq!(err, ProbeError::Status(404));
}

#[tokio::test]
async fn should_time_out_slow_ping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/command/ping"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"local_url": "http://192.168.1.20/abc"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    let probe = HttpLivenessProbe::new(Duration::from_millis(200)).unwrap();

    let err = probe.ping(&server.uri()).await.unwrap_err();

    assert_eq!(err, ProbeError::Timeout);
}
