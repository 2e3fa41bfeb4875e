//! Directory of live device and module nodes.
//!
//! The tree is the single source of truth for parent/child relations. The
//! directory is read on every poll cycle and written only when things are
//! registered or removed, so it sits behind a reader-writer lock that is
//! never held across an await point.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use atmolink_domain::error::NotFoundError;
use atmolink_domain::id::EquipmentId;
use atmolink_domain::snapshot::Snapshot;
use atmolink_domain::time::{Timestamp, now};

use crate::bridge::Bridge;
use crate::device_node::DeviceNode;
use crate::module_node::ModuleNode;
use crate::ports::{Host, LivenessProbe, SnapshotFetcher};

const MAX_DIAGNOSTICS: usize = 128;

/// A registered node.
#[derive(Debug, Clone)]
pub enum Node {
    Device(Arc<DeviceNode>),
    Module(Arc<ModuleNode>),
}

impl Node {
    #[must_use]
    pub fn id(&self) -> &EquipmentId {
        match self {
            Self::Device(device) => device.id(),
            Self::Module(module) => module.id(),
        }
    }
}

/// Non-fatal anomaly noticed while routing data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A registered child was absent from its parent's answer and kept its
    /// previous data.
    MissingChild {
        parent_id: EquipmentId,
        child_id: EquipmentId,
        at: Timestamp,
    },
}

/// Outcome of one propagation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    pub updated: Vec<EquipmentId>,
    pub missing: Vec<EquipmentId>,
}

#[derive(Debug, Default)]
struct Directory {
    nodes: HashMap<EquipmentId, Node>,
    /// Keyed by parent id, whether or not the parent is registered yet.
    children: HashMap<EquipmentId, BTreeSet<EquipmentId>>,
}

#[derive(Debug, Default)]
pub struct DeviceTree {
    directory: RwLock<Directory>,
    diagnostics: Mutex<VecDeque<Diagnostic>>,
}

impl DeviceTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node. Returns the node previously registered
    /// under the same id.
    pub fn register(&self, node: Node) -> Option<Node> {
        let mut directory = self.write();
        let previous = directory.nodes.insert(node.id().clone(), node.clone());
        if let Some(Node::Module(old)) = &previous {
            detach(&mut directory, old);
        }
        if let Node::Module(module) = &node
            && let Some(parent_id) = module.parent_id()
        {
            directory
                .children
                .entry(parent_id.clone())
                .or_default()
                .insert(module.id().clone());
        }
        previous
    }

    /// Remove a node. Removing an unknown id is a no-op.
    pub fn unregister(&self, id: &EquipmentId) -> Option<Node> {
        let mut directory = self.write();
        let removed = directory.nodes.remove(id);
        if let Some(Node::Module(module)) = &removed {
            detach(&mut directory, module);
        }
        removed
    }

    /// # Errors
    ///
    /// Returns [`NotFoundError`] when no node carries `id`.
    pub fn find_by_id(&self, id: &EquipmentId) -> Result<Node, NotFoundError> {
        self.read()
            .nodes
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundError {
                entity: "Equipment",
                id: id.to_string(),
            })
    }

    #[must_use]
    pub fn device(&self, id: &EquipmentId) -> Option<Arc<DeviceNode>> {
        match self.read().nodes.get(id) {
            Some(Node::Device(device)) => Some(Arc::clone(device)),
            _ => None,
        }
    }

    #[must_use]
    pub fn module(&self, id: &EquipmentId) -> Option<Arc<ModuleNode>> {
        match self.read().nodes.get(id) {
            Some(Node::Module(module)) => Some(Arc::clone(module)),
            _ => None,
        }
    }

    #[must_use]
    pub fn contains(&self, id: &EquipmentId) -> bool {
        self.read().nodes.contains_key(id)
    }

    /// Registered children of `parent_id`, ordered by id.
    #[must_use]
    pub fn children_of(&self, parent_id: &EquipmentId) -> Vec<Arc<ModuleNode>> {
        let directory = self.read();
        let Some(ids) = directory.children.get(parent_id) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| match directory.nodes.get(id) {
                Some(Node::Module(module)) => Some(Arc::clone(module)),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn devices(&self) -> Vec<Arc<DeviceNode>> {
        self.read()
            .nodes
            .values()
            .filter_map(|node| match node {
                Node::Device(device) => Some(Arc::clone(device)),
                Node::Module(_) => None,
            })
            .collect()
    }

    #[must_use]
    pub fn modules(&self) -> Vec<Arc<ModuleNode>> {
        self.read()
            .nodes
            .values()
            .filter_map(|node| match node {
                Node::Module(module) => Some(Arc::clone(module)),
                Node::Device(_) => None,
            })
            .collect()
    }

    /// Hand every child of `device_id` its slice of `snapshot`.
    ///
    /// All slices are stored before any channel is emitted. Children absent
    /// from the snapshot keep their previous data and a
    /// [`Diagnostic::MissingChild`] is recorded.
    #[tracing::instrument(skip(self, snapshot, bridge), fields(device_id = %device_id))]
    pub async fn propagate<F, H, P>(
        &self,
        device_id: &EquipmentId,
        snapshot: &Snapshot,
        bridge: &Bridge<F, H, P>,
    ) -> PropagationReport
    where
        F: SnapshotFetcher,
        H: Host,
        P: LivenessProbe,
    {
        let mut report = PropagationReport::default();
        let mut updated = Vec::new();
        for child in self.children_of(device_id) {
            if let Some(slice) = snapshot.module(child.id()) {
                child.store(slice.clone(), bridge.host());
                report.updated.push(child.id().clone());
                updated.push(child);
            } else {
                tracing::warn!(child_id = %child.id(), "child expected in parent answer but missing");
                self.record(Diagnostic::MissingChild {
                    parent_id: device_id.clone(),
                    child_id: child.id().clone(),
                    at: now(),
                });
                report.missing.push(child.id().clone());
            }
        }
        for child in updated {
            child.emit_linked(bridge).await;
        }
        report
    }

    /// Recorded diagnostics, oldest first.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn record(&self, diagnostic: Diagnostic) {
        let mut diagnostics = self
            .diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if diagnostics.len() == MAX_DIAGNOSTICS {
            diagnostics.pop_front();
        }
        diagnostics.push_back(diagnostic);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Directory> {
        self.directory.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Directory> {
        self.directory.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn detach(directory: &mut Directory, module: &ModuleNode) {
    let Some(parent_id) = module.parent_id() else {
        return;
    };
    if let Some(siblings) = directory.children.get_mut(parent_id) {
        siblings.remove(module.id());
        if siblings.is_empty() {
            directory.children.remove(parent_id);
        }
    }
}
