//! Polled top-level device.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::time::Duration;

use atmolink_domain::calibration::{PROPERTY_SIGNAL_LEVELS, SignalThresholds};
use atmolink_domain::channel::{Channel, ChannelUpdate, ChannelValue};
use atmolink_domain::equipment::EquipmentKind;
use atmolink_domain::error::ValidationError;
use atmolink_domain::id::EquipmentId;
use atmolink_domain::snapshot::Snapshot;
use atmolink_domain::status::{BRIDGE_OFFLINE, NodeStatus};
use atmolink_domain::time::now;

use crate::bridge::Bridge;
use crate::channel_registry;
use crate::ports::{FetchError, Host, LivenessProbe, SnapshotFetcher};

/// A device polled on its own schedule.
///
/// The last snapshot is swapped as a whole on every successful fetch, so a
/// reader sees either the previous answer or the new one, never a mix.
/// Refreshes are serialized per device: scheduled ticks and explicit refresh
/// commands queue on the same lock.
#[derive(Debug)]
pub struct DeviceNode {
    id: EquipmentId,
    kind: EquipmentKind,
    refresh_interval: Duration,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    status: RwLock<NodeStatus>,
    linked: RwLock<BTreeSet<Channel>>,
    signal: OnceLock<SignalThresholds>,
    refresh_lock: tokio::sync::Mutex<()>,
    retired: AtomicBool,
}

impl DeviceNode {
    /// Create a device node with every channel of its kind linked.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotADevice`] for module kinds and
    /// [`ValidationError::ZeroRefreshInterval`] for a zero interval.
    pub fn new(
        id: EquipmentId,
        kind: EquipmentKind,
        refresh_interval: Duration,
    ) -> Result<Self, ValidationError> {
        if !kind.is_device() {
            return Err(ValidationError::NotADevice(kind.to_string()));
        }
        if refresh_interval.is_zero() {
            return Err(ValidationError::ZeroRefreshInterval);
        }
        Ok(Self {
            id,
            kind,
            refresh_interval,
            snapshot: RwLock::new(None),
            status: RwLock::new(NodeStatus::Unknown),
            linked: RwLock::new(channel_registry::catalogue(kind).iter().copied().collect()),
            signal: OnceLock::new(),
            refresh_lock: tokio::sync::Mutex::new(()),
            retired: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn id(&self) -> &EquipmentId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> EquipmentKind {
        self.kind
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// The last successful fetch, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn status(&self) -> NodeStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_status(&self, status: NodeStatus, host: &impl Host) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status.clone();
        host.set_status(&self.id, status);
    }

    /// Channels values are emitted for after each refresh.
    #[must_use]
    pub fn linked_channels(&self) -> Vec<Channel> {
        self.linked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }

    /// Subscribe to `channel`. Returns `false` when the kind does not expose it.
    pub fn link(&self, channel: Channel) -> bool {
        if !channel_registry::supports(self.kind, channel) {
            return false;
        }
        self.linked
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel);
        true
    }

    pub fn unlink(&self, channel: Channel) -> bool {
        self.linked
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&channel)
    }

    /// Mark the node as removed; a fetch still in flight is discarded.
    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    /// Fetch, swap the snapshot, propagate to children and emit linked channels.
    ///
    /// Transient failures leave the status untouched; other failures take the
    /// device offline with the error as reason. In both cases the snapshot is
    /// cleared so channels read as undefined until the next success.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] of a failed fetch.
    #[tracing::instrument(skip_all, fields(equipment_id = %self.id, kind = %self.kind))]
    pub async fn refresh<F, H, P>(&self, bridge: &Bridge<F, H, P>) -> Result<(), FetchError>
    where
        F: SnapshotFetcher,
        H: Host,
        P: LivenessProbe,
    {
        let _cycle = self.refresh_lock.lock().await;
        if self.is_retired() {
            return Ok(());
        }

        let fetched = bridge.fetcher().fetch(&self.id, self.kind).await;
        if self.is_retired() {
            tracing::debug!("device unregistered during fetch, discarding answer");
            return Ok(());
        }
        if bridge.is_offline() {
            tracing::debug!("bridge went offline during fetch, discarding answer");
            return Ok(());
        }

        match fetched {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.replace_snapshot(Some(Arc::clone(&snapshot)));
                self.set_status(NodeStatus::Online, bridge.host());
                bridge
                    .tree()
                    .propagate(&self.id, &snapshot, bridge)
                    .await;
                if bridge.is_offline() {
                    // go_offline may have run between the check above and the status writes
                    self.restore_offline(bridge);
                }
                self.emit_linked(bridge.host());
                tracing::debug!("refresh completed");
                Ok(())
            }
            Err(err) => {
                self.replace_snapshot(None);
                if err.is_transient() {
                    tracing::warn!(%err, "transient fetch failure, retrying next tick");
                } else {
                    tracing::error!(%err, "fetch failed");
                    self.set_status(NodeStatus::offline(&err), bridge.host());
                }
                self.emit_linked(bridge.host());
                Err(err)
            }
        }
    }

    fn restore_offline<F, H, P>(&self, bridge: &Bridge<F, H, P>)
    where
        H: Host,
    {
        tracing::debug!("bridge went offline while applying answer");
        let offline = NodeStatus::offline(BRIDGE_OFFLINE);
        self.set_status(offline.clone(), bridge.host());
        for child in bridge.tree().children_of(&self.id) {
            child.set_status(offline.clone(), bridge.host());
        }
    }

    /// Explicit refresh request, waiting for any running cycle to finish first.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] of a failed fetch.
    pub async fn handle_refresh_command<F, H, P>(
        &self,
        bridge: &Bridge<F, H, P>,
    ) -> Result<(), FetchError>
    where
        F: SnapshotFetcher,
        H: Host,
        P: LivenessProbe,
    {
        tracing::debug!(equipment_id = %self.id, "refresh requested");
        self.refresh(bridge).await
    }

    /// Current value of `channel`, computed from the last snapshot.
    pub fn read_channel(&self, channel: Channel, host: &impl Host) -> ChannelValue {
        let Some(snapshot) = self.snapshot() else {
            return ChannelValue::Undefined;
        };
        channel_registry::device_value(self.kind, channel, &snapshot, self.signal(host))
    }

    pub(crate) fn emit_linked(&self, host: &impl Host) {
        let timestamp = now();
        for channel in self.linked_channels() {
            let value = self.read_channel(channel, host);
            host.emit_channel_value(ChannelUpdate {
                equipment_id: self.id.clone(),
                channel,
                value,
                timestamp,
            });
        }
    }

    fn replace_snapshot(&self, snapshot: Option<Arc<Snapshot>>) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    fn signal(&self, host: &impl Host) -> &SignalThresholds {
        self.signal.get_or_init(|| load_signal_thresholds(&self.id, host))
    }
}

/// Parse the `signalLevels` property of a thing, defaulting to no threshold.
pub(crate) fn load_signal_thresholds(id: &EquipmentId, host: &impl Host) -> SignalThresholds {
    let Some(raw) = host.property(id, PROPERTY_SIGNAL_LEVELS) else {
        return SignalThresholds::default();
    };
    SignalThresholds::parse(&raw).unwrap_or_else(|err| {
        tracing::warn!(equipment_id = %id, %err, "ignoring signal levels");
        SignalThresholds::default()
    })
}
