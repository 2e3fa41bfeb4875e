//! Host port: the entity framework that owns things and channels.

use atmolink_domain::channel::ChannelUpdate;
use atmolink_domain::id::EquipmentId;
use atmolink_domain::status::NodeStatus;

/// Operations the core needs from the hosting framework.
///
/// Children are not enumerated through the host: the
/// [`DeviceTree`](crate::device_tree::DeviceTree) is the single source of
/// truth for parent/child relations.
pub trait Host: Send + Sync {
    /// Read a configuration property of a thing.
    fn property(&self, id: &EquipmentId, key: &str) -> Option<String>;

    /// Publish the current value of a channel.
    fn emit_channel_value(&self, update: ChannelUpdate);

    /// Report the reachability of a thing.
    fn set_status(&self, id: &EquipmentId, status: NodeStatus);
}

impl<T: Host> Host for std::sync::Arc<T> {
    fn property(&self, id: &EquipmentId, key: &str) -> Option<String> {
        (**self).property(id, key)
    }

    fn emit_channel_value(&self, update: ChannelUpdate) {
        (**self).emit_channel_value(update);
    }

    fn set_status(&self, id: &EquipmentId, status: NodeStatus) {
        (**self).set_status(id, status);
    }
}
