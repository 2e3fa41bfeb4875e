//! Child module fed from its parent device's snapshot.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use atmolink_domain::calibration::{
    BatteryCalibration, PROPERTY_BATTERY_LOW, PROPERTY_BATTERY_MAX, PROPERTY_BATTERY_MIN,
    SignalThresholds,
};
use atmolink_domain::channel::{Channel, ChannelUpdate, ChannelValue};
use atmolink_domain::equipment::EquipmentKind;
use atmolink_domain::error::ValidationError;
use atmolink_domain::id::EquipmentId;
use atmolink_domain::snapshot::ModulePayload;
use atmolink_domain::status::NodeStatus;
use atmolink_domain::time::now;

use crate::bridge::Bridge;
use crate::channel_registry::{self, Calibration, Resolution};
use crate::device_node::load_signal_thresholds;
use crate::ports::{FetchError, Host, LivenessProbe, SnapshotFetcher};

/// A module whose data only ever arrives through its parent's propagation.
#[derive(Debug)]
pub struct ModuleNode {
    id: EquipmentId,
    kind: EquipmentKind,
    parent_id: Option<EquipmentId>,
    data: RwLock<Option<Arc<ModulePayload>>>,
    status: RwLock<NodeStatus>,
    linked: RwLock<BTreeSet<Channel>>,
    battery: OnceLock<Option<BatteryCalibration>>,
    signal: OnceLock<SignalThresholds>,
}

impl ModuleNode {
    /// Create a module node with every channel of its kind linked.
    ///
    /// A module without parent is accepted but stays inert.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAModule`] for device kinds.
    pub fn new(
        id: EquipmentId,
        kind: EquipmentKind,
        parent_id: Option<EquipmentId>,
    ) -> Result<Self, ValidationError> {
        if !kind.is_module() {
            return Err(ValidationError::NotAModule(kind.to_string()));
        }
        Ok(Self {
            id,
            kind,
            parent_id,
            data: RwLock::new(None),
            status: RwLock::new(NodeStatus::Unknown),
            linked: RwLock::new(channel_registry::catalogue(kind).iter().copied().collect()),
            battery: OnceLock::new(),
            signal: OnceLock::new(),
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
    pub fn parent_id(&self) -> Option<&EquipmentId> {
        self.parent_id.as_ref()
    }

    /// The slice received with the last propagation.
    #[must_use]
    pub fn data(&self) -> Option<Arc<ModulePayload>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner).clone()
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

    /// Replace the module slice wholesale, then emit every linked channel.
    pub async fn apply_data<F, H, P>(&self, slice: ModulePayload, bridge: &Bridge<F, H, P>)
    where
        F: SnapshotFetcher,
        H: Host,
        P: LivenessProbe,
    {
        self.store(slice, bridge.host());
        self.emit_linked(bridge).await;
    }

    pub(crate) fn store(&self, slice: ModulePayload, host: &impl Host) {
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(slice));
        if !self.status().is_online() {
            self.set_status(NodeStatus::Online, host);
        }
    }

    /// Current value of `channel`.
    ///
    /// Media URL channels probe the camera endpoint on every read.
    pub async fn read_channel<F, H, P>(&self, channel: Channel, bridge: &Bridge<F, H, P>) -> ChannelValue
    where
        F: SnapshotFetcher,
        H: Host,
        P: LivenessProbe,
    {
        let parent_known = self
            .parent_id
            .as_ref()
            .is_some_and(|parent| bridge.tree().device(parent).is_some());
        if !parent_known {
            return ChannelValue::Undefined;
        }
        let Some(data) = self.data() else {
            return ChannelValue::Undefined;
        };

        let calibration = Calibration {
            battery: self.battery(bridge.host()),
            signal: self.signal(bridge.host()),
        };
        match channel_registry::module_value(self.kind, channel, &data, calibration) {
            Resolution::Value(value) => value,
            Resolution::Media {
                relay_url,
                resource,
            } => ChannelValue::Text(bridge.resolver().resource_url(&relay_url, &resource).await),
            Resolution::CameraMedia {
                camera_id,
                resource,
            } => {
                let Some(relay_url) = camera_relay_url(&camera_id, bridge) else {
                    tracing::debug!(equipment_id = %self.id, %camera_id, "camera of event is unknown");
                    return ChannelValue::Undefined;
                };
                ChannelValue::Text(bridge.resolver().resource_url(&relay_url, &resource).await)
            }
        }
    }

    /// Ask the parent device for an immediate refresh.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::MissingEquipment`] when the parent is not
    /// registered, or the parent's own refresh failure.
    pub async fn request_parent_refresh<F, H, P>(
        &self,
        bridge: &Bridge<F, H, P>,
    ) -> Result<(), FetchError>
    where
        F: SnapshotFetcher,
        H: Host,
        P: LivenessProbe,
    {
        let parent = self
            .parent_id
            .as_ref()
            .and_then(|parent| bridge.tree().device(parent))
            .ok_or_else(|| {
                FetchError::MissingEquipment(
                    self.parent_id
                        .as_ref()
                        .map_or_else(|| self.id.to_string(), ToString::to_string),
                )
            })?;
        parent.handle_refresh_command(bridge).await
    }

    pub(crate) async fn emit_linked<F, H, P>(&self, bridge: &Bridge<F, H, P>)
    where
        F: SnapshotFetcher,
        H: Host,
        P: LivenessProbe,
    {
        let timestamp = now();
        for channel in self.linked_channels() {
            let value = self.read_channel(channel, bridge).await;
            bridge.host().emit_channel_value(ChannelUpdate {
                equipment_id: self.id.clone(),
                channel,
                value,
                timestamp,
            });
        }
    }

    fn battery(&self, host: &impl Host) -> Option<&BatteryCalibration> {
        self.battery
            .get_or_init(|| {
                let props = [
                    PROPERTY_BATTERY_MIN,
                    PROPERTY_BATTERY_MAX,
                    PROPERTY_BATTERY_LOW,
                ]
                .map(|key| (key, host.property(&self.id, key)));
                BatteryCalibration::from_properties(|key| {
                    props
                        .iter()
                        .find(|(k, _)| *k == key)
                        .and_then(|(_, v)| v.as_deref())
                })
                .unwrap_or_else(|err| {
                    tracing::warn!(equipment_id = %self.id, %err, "ignoring battery calibration");
                    None
                })
            })
            .as_ref()
    }

    fn signal(&self, host: &impl Host) -> &SignalThresholds {
        self.signal
            .get_or_init(|| load_signal_thresholds(&self.id, host))
    }
}

fn camera_relay_url<F, H, P>(camera_id: &str, bridge: &Bridge<F, H, P>) -> Option<String>
where
    F: SnapshotFetcher,
    H: Host,
    P: LivenessProbe,
{
    let camera_id = EquipmentId::new(camera_id).ok()?;
    let camera = bridge.tree().module(&camera_id)?;
    match camera.data()?.as_ref() {
        ModulePayload::Camera(camera) => camera.vpn_url.clone().filter(|url| !url.is_empty()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> EquipmentId {
        EquipmentId::new(raw).unwrap()
    }

    #[test]
    fn should_reject_device_kind() {
        let err = ModuleNode::new(id("m"), EquipmentKind::WeatherStation, None).unwrap_err();
        assert_eq!(err, ValidationError::NotAModule("NAMain".into()));
    }

    #[test]
    fn should_start_without_data() {
        let node = ModuleNode::new(id("m"), EquipmentKind::RainGauge, Some(id("d"))).unwrap();
        assert!(node.data().is_none());
        assert_eq!(node.status(), NodeStatus::Unknown);
        assert_eq!(node.parent_id(), Some(&id("D")));
    }

    #[test]
    fn should_link_and_unlink_catalogue_channels() {
        let node = ModuleNode::new(id("m"), EquipmentKind::RainGauge, Some(id("d"))).unwrap();
        assert!(node.unlink(Channel::Rain));
        assert!(!node.unlink(Channel::Rain));
        assert!(!node.link(Channel::Co2));
        assert!(node.link(Channel::Rain));
    }
}
