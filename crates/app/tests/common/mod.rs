#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use atmolink_app::bridge::{Bridge, BridgeConfig};
use atmolink_app::host::InProcessHost;
use atmolink_app::ports::{FetchError, LivenessProbe, PingReply, ProbeError, SnapshotFetcher};
use atmolink_domain::equipment::EquipmentKind;
use atmolink_domain::id::EquipmentId;
use atmolink_domain::snapshot::{Dashboard, DeviceData, ModuleData, Snapshot};

pub type TestBridge = Bridge<Arc<ScriptedFetcher>, Arc<InProcessHost>, Arc<ScriptedProbe>>;

pub fn id(raw: &str) -> EquipmentId {
    EquipmentId::new(raw).unwrap()
}

/// Fetcher answering from per-device scripts. The last answer of a script
/// repeats forever.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<EquipmentId, VecDeque<Result<Snapshot, FetchError>>>>,
    listing: Mutex<Vec<Snapshot>>,
    connection: Mutex<Option<FetchError>>,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn push(&self, id: &EquipmentId, answer: Result<Snapshot, FetchError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(id.clone())
            .or_default()
            .push_back(answer);
    }

    pub fn set_listing(&self, snapshots: Vec<Snapshot>) {
        *self.listing.lock().unwrap() = snapshots;
    }

    pub fn refuse_connection(&self, err: FetchError) {
        *self.connection.lock().unwrap() = Some(err);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_answer(&self, id: &EquipmentId) -> Result<Snapshot, FetchError> {
        let mut scripts = self.scripts.lock().unwrap();
        let Some(script) = scripts.get_mut(id) else {
            return Err(FetchError::MissingEquipment(id.to_string()));
        };
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script
                .front()
                .cloned()
                .unwrap_or_else(|| Err(FetchError::MissingEquipment(id.to_string())))
        }
    }
}

impl SnapshotFetcher for ScriptedFetcher {
    async fn fetch(&self, id: &EquipmentId, _kind: EquipmentKind) -> Result<Snapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.next_answer(id)
    }

    async fn fetch_all(&self) -> Result<Vec<Snapshot>, FetchError> {
        Ok(self.listing.lock().unwrap().clone())
    }

    async fn check_connection(&self) -> Result<(), FetchError> {
        match self.connection.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Probe answering from a fixed table; unknown urls are unreachable.
#[derive(Default)]
pub struct ScriptedProbe {
    replies: Mutex<HashMap<String, String>>,
}

impl ScriptedProbe {
    pub fn answer(&self, base_url: &str, local_url: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(base_url.to_string(), local_url.to_string());
    }
}

impl LivenessProbe for ScriptedProbe {
    async fn ping(&self, base_url: &str) -> Result<PingReply, ProbeError> {
        let local_url = self.replies.lock().unwrap().get(base_url).cloned();
        local_url
            .map(|local_url| PingReply { local_url })
            .ok_or_else(|| ProbeError::Network("unreachable".into()))
    }
}

pub struct Harness {
    pub bridge: Arc<TestBridge>,
    pub fetcher: Arc<ScriptedFetcher>,
    pub host: Arc<InProcessHost>,
    pub probe: Arc<ScriptedProbe>,
}

pub fn harness(config: BridgeConfig) -> Harness {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let host = Arc::new(InProcessHost::new(1024));
    let probe = Arc::new(ScriptedProbe::default());
    let bridge = Bridge::new(
        id("bridge"),
        config,
        Arc::clone(&fetcher),
        Arc::clone(&host),
        Arc::clone(&probe),
    );
    Harness {
        bridge,
        fetcher,
        host,
        probe,
    }
}

pub fn station(device_id: &str, temperature: f64, modules: Vec<ModuleData>) -> Snapshot {
    Snapshot::station(
        DeviceData {
            id: device_id.into(),
            kind: Some("NAMain".into()),
            station_name: Some("Home".into()),
            wifi_status: Some(50),
            dashboard_data: Some(Box::new(Dashboard {
                temperature: Some(temperature),
                ..Dashboard::default()
            })),
            ..DeviceData::default()
        },
        modules,
        None,
    )
}

pub fn outdoor(module_id: &str, battery_vp: i64, temperature: f64) -> ModuleData {
    ModuleData {
        id: module_id.into(),
        kind: Some("NAModule1".into()),
        battery_vp: Some(battery_vp),
        rf_status: Some(70),
        dashboard_data: Some(Box::new(Dashboard {
            temperature: Some(temperature),
            ..Dashboard::default()
        })),
        ..ModuleData::default()
    }
}
