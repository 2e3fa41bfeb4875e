//! Wiring of the cloud adapter, the in-process host and the bridge core.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use atmolink_adapter_cloud::{CloudClient, CloudError, HttpLivenessProbe};
use atmolink_app::bridge::Bridge;
use atmolink_app::device_node::DeviceNode;
use atmolink_app::host::InProcessHost;
use atmolink_app::module_node::ModuleNode;
use atmolink_app::ports::FetchError;
use atmolink_domain::error::ValidationError;
use atmolink_domain::id::EquipmentId;

use crate::config::{Config, ConfigError, Thing};

/// Capacity of the channel update broadcast.
const UPDATE_CAPACITY: usize = 256;

pub type CloudBridge = Bridge<CloudClient, Arc<InProcessHost>, HttpLivenessProbe>;

/// Failure while assembling the daemon.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot build cloud client")]
    Cloud(#[from] CloudError),
    #[error("cannot build liveness probe")]
    Probe(#[from] reqwest::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A fully wired bridge with its configured things registered.
pub struct Daemon {
    bridge: Arc<CloudBridge>,
    host: Arc<InProcessHost>,
}

impl Daemon {
    /// Build every component and register the configured things.
    ///
    /// Nothing is polled until [`Daemon::start`] connects the bridge.
    ///
    /// # Errors
    ///
    /// Returns a [`StartError`] when a component cannot be built or a thing
    /// is invalid.
    pub fn build(config: &Config) -> Result<Self, StartError> {
        let bridge_config = config.bridge.to_bridge_config();
        let client = CloudClient::new(config.cloud.clone())?;
        let probe = HttpLivenessProbe::new(bridge_config.probe_timeout)?;
        let host = Arc::new(InProcessHost::new(UPDATE_CAPACITY));
        let bridge = Bridge::new(
            EquipmentId::new(config.bridge.id.as_str())?,
            bridge_config,
            client,
            Arc::clone(&host),
            probe,
        );

        let mut things = config.things()?;
        // parents first so modules never wait on a missing device
        things.sort_by_key(|thing| thing.kind.is_module());
        let daemon = Self { bridge, host };
        for thing in things {
            daemon.register(thing)?;
        }
        Ok(daemon)
    }

    #[must_use]
    pub fn bridge(&self) -> &Arc<CloudBridge> {
        &self.bridge
    }

    #[must_use]
    pub fn host(&self) -> &Arc<InProcessHost> {
        &self.host
    }

    fn register(&self, thing: Thing) -> Result<(), ValidationError> {
        for (key, value) in &thing.properties {
            self.host.set_property(&thing.id, key.as_str(), value.as_str());
        }
        if thing.kind.is_device() {
            let node = DeviceNode::new(thing.id, thing.kind, thing.refresh_interval)?;
            self.bridge.register_device(node);
        } else {
            let node = ModuleNode::new(thing.id, thing.kind, thing.parent_id)?;
            self.bridge.register_module(node);
        }
        Ok(())
    }

    /// Connect the bridge, which starts polling, then log what the account
    /// holds that is not configured yet.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] of a failed connection check.
    pub async fn start(&self) -> Result<(), FetchError> {
        self.bridge.connect().await?;
        match self.bridge.discover().await {
            Ok(results) => {
                for result in results {
                    tracing::info!(
                        thing_uid = %result.thing_uid,
                        label = %result.label,
                        properties = ?result.properties,
                        "discovered unconfigured thing"
                    );
                }
            }
            Err(err) => tracing::warn!(%err, "discovery failed"),
        }
        Ok(())
    }

    /// Log every channel update published by the host.
    #[must_use]
    pub fn spawn_update_logger(&self) -> JoinHandle<()> {
        let mut updates = BroadcastStream::new(self.host.subscribe());
        tokio::spawn(async move {
            while let Some(item) = updates.next().await {
                match item {
                    Ok(update) => tracing::info!(
                        equipment_id = %update.equipment_id,
                        channel = %update.channel,
                        value = ?update.value,
                        "channel updated"
                    ),
                    Err(err) => tracing::warn!(%err, "update logger lagging behind"),
                }
            }
        })
    }

    /// Stop polling and wait for in-flight refreshes.
    pub async fn shutdown(&self) {
        self.bridge.shutdown().await;
    }
}
