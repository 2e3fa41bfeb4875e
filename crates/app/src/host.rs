//! In-process host backed by a tokio broadcast channel.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

use atmolink_domain::channel::ChannelUpdate;
use atmolink_domain::id::EquipmentId;
use atmolink_domain::status::NodeStatus;

use crate::ports::Host;

/// In-process host using a tokio [`broadcast`] channel for channel updates.
///
/// Emitting succeeds even when there are no active subscribers
/// (the update is simply dropped).
pub struct InProcessHost {
    sender: broadcast::Sender<ChannelUpdate>,
    properties: RwLock<HashMap<EquipmentId, HashMap<String, String>>>,
    statuses: RwLock<HashMap<EquipmentId, NodeStatus>>,
}

impl InProcessHost {
    /// Create a new host with the given update channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            properties: RwLock::default(),
            statuses: RwLock::default(),
        }
    }

    /// Subscribe to channel updates emitted *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChannelUpdate> {
        self.sender.subscribe()
    }

    /// Set a configuration property of a thing.
    pub fn set_property(&self, id: &EquipmentId, key: impl Into<String>, value: impl Into<String>) {
        self.properties
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.clone())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Last status reported for a thing.
    #[must_use]
    pub fn status(&self, id: &EquipmentId) -> NodeStatus {
        self.statuses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for InProcessHost {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Host for InProcessHost {
    fn property(&self, id: &EquipmentId, key: &str) -> Option<String> {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .and_then(|props| props.get(key))
            .cloned()
    }

    fn emit_channel_value(&self, update: ChannelUpdate) {
        // fails only when nobody listens
        let _ = self.sender.send(update);
    }

    fn set_status(&self, id: &EquipmentId, status: NodeStatus) {
        let previous = self
            .statuses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), status.clone());
        if previous.as_ref() != Some(&status) {
            tracing::info!(equipment_id = %id, %status, "status changed");
        }
    }
}
