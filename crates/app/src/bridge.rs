//! The account-level connection owning every device and module.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use atmolink_domain::channel::{Channel, ChannelValue};
use atmolink_domain::error::NotFoundError;
use atmolink_domain::id::EquipmentId;
use atmolink_domain::status::{BRIDGE_OFFLINE, NodeStatus};

use crate::device_node::DeviceNode;
use crate::device_tree::{DeviceTree, Node};
use crate::discovery::{self, DiscoveryResult};
use crate::endpoint_resolver::EndpointResolver;
use crate::module_node::ModuleNode;
use crate::poll_scheduler::PollScheduler;
use crate::ports::{FetchError, Host, LivenessProbe, SnapshotFetcher};

/// Tunables of a bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Delay before the first poll of a newly scheduled device.
    pub startup_delay: Duration,
    /// Interval used for devices configured without one.
    pub default_refresh_interval: Duration,
    /// Upper bound of each camera ping.
    pub probe_timeout: Duration,
    /// Recent events listed per home by discovery.
    pub welcome_event_things: usize,
    /// Unknown persons listed per home by discovery.
    pub welcome_unknown_person_things: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_millis(1),
            default_refresh_interval: Duration::from_secs(300),
            probe_timeout: Duration::from_secs(5),
            welcome_event_things: 5,
            welcome_unknown_person_things: 10,
        }
    }
}

/// Composition of the fetcher, the host, the device tree and the scheduler.
///
/// Poll tasks only reach the bridge through weak references, so dropping the
/// last `Arc<Bridge>` ends them.
pub struct Bridge<F, H, P> {
    id: EquipmentId,
    config: BridgeConfig,
    fetcher: F,
    host: H,
    resolver: EndpointResolver<P>,
    tree: DeviceTree,
    scheduler: PollScheduler,
    status: RwLock<NodeStatus>,
}

impl<F, H, P> Bridge<F, H, P> {
    #[must_use]
    pub fn id(&self) -> &EquipmentId {
        &self.id
    }

    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn resolver(&self) -> &EndpointResolver<P> {
        &self.resolver
    }

    #[must_use]
    pub fn tree(&self) -> &DeviceTree {
        &self.tree
    }

    #[must_use]
    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn status(&self) -> NodeStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_offline(&self) -> bool {
        matches!(self.status(), NodeStatus::Offline(_))
    }
}

impl<F, H, P> Bridge<F, H, P>
where
    F: SnapshotFetcher + 'static,
    H: Host + 'static,
    P: LivenessProbe + 'static,
{
    pub fn new(id: EquipmentId, config: BridgeConfig, fetcher: F, host: H, probe: P) -> Arc<Self> {
        let resolver = EndpointResolver::new(probe, config.probe_timeout);
        let scheduler = PollScheduler::new(config.startup_delay);
        Arc::new(Self {
            id,
            config,
            fetcher,
            host,
            resolver,
            tree: DeviceTree::new(),
            scheduler,
            status: RwLock::new(NodeStatus::Unknown),
        })
    }

    /// Check the account and bring the bridge online or offline accordingly.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] of the failed check; the bridge is then
    /// offline with the error as reason.
    #[tracing::instrument(skip(self), fields(bridge_id = %self.id))]
    pub async fn connect(self: &Arc<Self>) -> Result<(), FetchError> {
        match self.fetcher.check_connection().await {
            Ok(()) => {
                self.go_online();
                Ok(())
            }
            Err(err) => {
                tracing::error!(%err, "account check failed");
                self.go_offline(&err);
                Err(err)
            }
        }
    }

    /// Mark the bridge reachable and schedule every registered device.
    pub fn go_online(self: &Arc<Self>) {
        self.set_status(NodeStatus::Online);
        for device in self.tree.devices() {
            self.scheduler.start(self, &device);
        }
        tracing::info!(bridge_id = %self.id, devices = self.scheduler.running(), "bridge online");
    }

    /// Mark the bridge unreachable: polling stops and every node goes offline.
    pub fn go_offline(&self, reason: impl std::fmt::Display) {
        self.set_status(NodeStatus::offline(reason));
        self.scheduler.stop_all();
        for device in self.tree.devices() {
            device.set_status(NodeStatus::offline(BRIDGE_OFFLINE), &self.host);
        }
        for module in self.tree.modules() {
            module.set_status(NodeStatus::offline(BRIDGE_OFFLINE), &self.host);
        }
        tracing::warn!(bridge_id = %self.id, "bridge offline");
    }

    /// Add a device. It is scheduled right away when the bridge is online.
    ///
    /// Registering an id twice replaces the previous node and its poll task.
    pub fn register_device(self: &Arc<Self>, device: DeviceNode) -> Arc<DeviceNode> {
        let device = Arc::new(device);
        if let Some(previous) = self.tree.register(Node::Device(Arc::clone(&device))) {
            self.retire(&previous);
        }
        tracing::debug!(equipment_id = %device.id(), kind = %device.kind(), "device registered");
        match self.status() {
            NodeStatus::Online => self.scheduler.start(self, &device),
            NodeStatus::Offline(_) => {
                device.set_status(NodeStatus::offline(BRIDGE_OFFLINE), &self.host);
            }
            NodeStatus::Unknown => {}
        }
        device
    }

    /// Add a module. It stays silent until its parent propagates data.
    pub fn register_module(&self, module: ModuleNode) -> Arc<ModuleNode> {
        let module = Arc::new(module);
        if let Some(previous) = self.tree.register(Node::Module(Arc::clone(&module))) {
            self.retire(&previous);
        }
        if module.parent_id().is_none() {
            tracing::warn!(equipment_id = %module.id(), "module without parent stays inert");
        }
        if self.is_offline() {
            module.set_status(NodeStatus::offline(BRIDGE_OFFLINE), &self.host);
        }
        module
    }

    /// Remove a node; a device's poll task is cancelled and any fetch still in
    /// flight is discarded.
    pub fn unregister(&self, id: &EquipmentId) -> Option<Node> {
        let removed = self.tree.unregister(id)?;
        self.retire(&removed);
        tracing::debug!(equipment_id = %id, "node unregistered");
        Some(removed)
    }

    /// Current value of `channel` on node `id`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when `id` is not registered.
    pub async fn read_channel(
        &self,
        id: &EquipmentId,
        channel: Channel,
    ) -> Result<ChannelValue, NotFoundError> {
        Ok(match self.tree.find_by_id(id)? {
            Node::Device(device) => device.read_channel(channel, &self.host),
            Node::Module(module) => module.read_channel(channel, self).await,
        })
    }

    /// Refresh a device now, or the parent of a module.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::MissingEquipment`] for an unknown id, or the
    /// failure of the refresh itself.
    pub async fn handle_refresh_command(&self, id: &EquipmentId) -> Result<(), FetchError> {
        let node = self
            .tree
            .find_by_id(id)
            .map_err(|_| FetchError::MissingEquipment(id.to_string()))?;
        match node {
            Node::Device(device) => device.handle_refresh_command(self).await,
            Node::Module(module) => module.request_parent_refresh(self).await,
        }
    }

    /// # Errors
    ///
    /// Returns [`NotFoundError`] when `id` is not registered.
    pub fn link(&self, id: &EquipmentId, channel: Channel) -> Result<bool, NotFoundError> {
        Ok(match self.tree.find_by_id(id)? {
            Node::Device(device) => device.link(channel),
            Node::Module(module) => module.link(channel),
        })
    }

    /// # Errors
    ///
    /// Returns [`NotFoundError`] when `id` is not registered.
    pub fn unlink(&self, id: &EquipmentId, channel: Channel) -> Result<bool, NotFoundError> {
        Ok(match self.tree.find_by_id(id)? {
            Node::Device(device) => device.unlink(channel),
            Node::Module(module) => module.unlink(channel),
        })
    }

    /// List the account's equipment that is not registered yet.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] of the account listing.
    pub async fn discover(&self) -> Result<Vec<DiscoveryResult>, FetchError> {
        let snapshots = self.fetcher.fetch_all().await?;
        let results = discovery::list(&snapshots, &self.tree, &self.config);
        tracing::info!(found = results.len(), "discovery complete");
        Ok(results)
    }

    /// Stop polling and wait for in-flight refreshes.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
        tracing::info!(bridge_id = %self.id, "bridge stopped");
    }

    fn set_status(&self, status: NodeStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status.clone();
        self.host.set_status(&self.id, status);
    }

    fn retire(&self, node: &Node) {
        if let Node::Device(device) = node {
            self.scheduler.stop(device.id());
            device.retire();
        }
    }
}
