//! One recurring poll task per device.
//!
//! Ticks use fixed-delay semantics: the next tick is scheduled a full refresh
//! interval after the previous refresh completed, so ticks of one device
//! never overlap. Stopping a task only cancels its pending sleep; a refresh
//! already in flight runs to completion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use atmolink_domain::id::EquipmentId;

use crate::bridge::Bridge;
use crate::device_node::DeviceNode;
use crate::ports::{Host, LivenessProbe, SnapshotFetcher};

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct PollScheduler {
    startup_delay: Duration,
    tasks: Mutex<HashMap<EquipmentId, PollTask>>,
}

impl PollScheduler {
    #[must_use]
    pub fn new(startup_delay: Duration) -> Self {
        Self {
            startup_delay,
            tasks: Mutex::default(),
        }
    }

    /// Start polling `device`. Does nothing when a live task already polls it.
    ///
    /// The task only holds a weak reference to the bridge and ends on its
    /// own once the bridge is dropped.
    pub fn start<F, H, P>(&self, bridge: &Arc<Bridge<F, H, P>>, device: &Arc<DeviceNode>)
    where
        F: SnapshotFetcher + 'static,
        H: Host + 'static,
        P: LivenessProbe + 'static,
    {
        let mut tasks = self.lock();
        if tasks
            .get(device.id())
            .is_some_and(|task| !task.handle.is_finished())
        {
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            Arc::downgrade(bridge),
            Arc::clone(device),
            self.startup_delay,
            cancel.clone(),
        ));
        tracing::debug!(
            equipment_id = %device.id(),
            interval_ms = u64::try_from(device.refresh_interval().as_millis()).unwrap_or(u64::MAX),
            "poll task started"
        );
        tasks.insert(device.id().clone(), PollTask { cancel, handle });
    }

    /// Stop polling `id`. Returns `false` when no task was running.
    pub fn stop(&self, id: &EquipmentId) -> bool {
        let Some(task) = self.lock().remove(id) else {
            return false;
        };
        task.cancel.cancel();
        tracing::debug!(equipment_id = %id, "poll task stopped");
        true
    }

    pub fn stop_all(&self) {
        for (id, task) in self.lock().drain() {
            task.cancel.cancel();
            tracing::debug!(equipment_id = %id, "poll task stopped");
        }
    }

    #[must_use]
    pub fn is_running(&self, id: &EquipmentId) -> bool {
        self.lock()
            .get(id)
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Number of live poll tasks.
    #[must_use]
    pub fn running(&self) -> usize {
        self.lock()
            .values()
            .filter(|task| !task.handle.is_finished())
            .count()
    }

    /// Cancel every task and wait for in-flight refreshes to finish.
    pub async fn shutdown(&self) {
        let tasks: Vec<_> = self.lock().drain().collect();
        for (_, task) in &tasks {
            task.cancel.cancel();
        }
        for (id, task) in tasks {
            if let Err(err) = task.handle.await {
                tracing::warn!(equipment_id = %id, %err, "poll task ended abnormally");
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<EquipmentId, PollTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(1))
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        for task in self
            .tasks
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
        {
            task.cancel.cancel();
        }
    }
}

async fn poll_loop<F, H, P>(
    bridge: Weak<Bridge<F, H, P>>,
    device: Arc<DeviceNode>,
    startup_delay: Duration,
    cancel: CancellationToken,
) where
    F: SnapshotFetcher,
    H: Host,
    P: LivenessProbe,
{
    tokio::select! {
        () = cancel.cancelled() => return,
        () = tokio::time::sleep(startup_delay) => {}
    }

    loop {
        let Some(bridge) = bridge.upgrade() else {
            break;
        };
        if let Err(err) = device.refresh(&bridge).await {
            tracing::debug!(equipment_id = %device.id(), %err, "scheduled refresh failed");
        }
        drop(bridge);

        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(device.refresh_interval()) => {}
        }
    }
}
