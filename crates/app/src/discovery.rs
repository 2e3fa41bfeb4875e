//! Listing of account equipment not yet known to the tree.

use std::collections::BTreeMap;

use atmolink_domain::equipment::EquipmentKind;
use atmolink_domain::id::EquipmentId;
use atmolink_domain::snapshot::{DevicePayload, ModulePayload, Snapshot};

use crate::bridge::BridgeConfig;
use crate::device_tree::DeviceTree;

/// Property holding the vendor id of a discovered thing.
pub const PROPERTY_EQUIPMENT_ID: &str = "id";
/// Property holding the vendor id of a discovered module's parent.
pub const PROPERTY_PARENT_ID: &str = "parentId";

/// A thing the host may offer to add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryResult {
    /// `<kind>:<sanitized id>`.
    pub thing_uid: String,
    pub kind: EquipmentKind,
    pub label: String,
    pub properties: BTreeMap<String, String>,
}

impl DiscoveryResult {
    fn new(kind: EquipmentKind, id: &EquipmentId, label: String, parent: Option<&EquipmentId>) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(PROPERTY_EQUIPMENT_ID.to_string(), id.to_string());
        if let Some(parent) = parent {
            properties.insert(PROPERTY_PARENT_ID.to_string(), parent.to_string());
        }
        Self {
            thing_uid: format!("{kind}:{}", id.sanitized()),
            kind,
            label,
            properties,
        }
    }
}

/// List every device and module of `snapshots` that `tree` does not hold.
///
/// Persons come most recently seen first and unnamed ones are labelled
/// `Unknown Person N`; events come newest first.
pub fn list(snapshots: &[Snapshot], tree: &DeviceTree, config: &BridgeConfig) -> Vec<DiscoveryResult> {
    let mut listing = Listing {
        tree,
        results: Vec::new(),
    };
    for snapshot in snapshots {
        match &snapshot.device {
            DevicePayload::Station(device) | DevicePayload::Plug(device) => {
                let Some(parent) = listing.device(
                    device.kind.as_deref(),
                    &device.id,
                    device.station_name.clone(),
                ) else {
                    continue;
                };
                for module in &snapshot.modules {
                    if let ModulePayload::Radio(module) = module {
                        listing.module(
                            &parent,
                            module.kind.as_deref(),
                            &module.id,
                            module.module_name.clone(),
                        );
                    }
                }
            }
            DevicePayload::Home(home) => {
                let Some(parent) = listing.device(
                    Some(EquipmentKind::Home.as_str()),
                    &home.id,
                    home.name.clone(),
                ) else {
                    continue;
                };
                list_home_modules(&mut listing, &parent, &snapshot.modules, config);
            }
        }
    }
    listing.results
}

fn list_home_modules(
    listing: &mut Listing<'_>,
    parent: &EquipmentId,
    modules: &[ModulePayload],
    config: &BridgeConfig,
) {
    let mut unknown_persons = 0;
    let mut events = 0;
    for module in modules {
        match module {
            ModulePayload::Camera(camera) => {
                listing.module(parent, camera.kind.as_deref(), &camera.id, camera.name.clone());
            }
            ModulePayload::Person(slice) => {
                let label = if let Some(pseudo) = &slice.person.pseudo {
                    pseudo.clone()
                } else {
                    if unknown_persons >= config.welcome_unknown_person_things {
                        continue;
                    }
                    unknown_persons += 1;
                    format!("Unknown Person {unknown_persons}")
                };
                listing.module(
                    parent,
                    Some(EquipmentKind::Person.as_str()),
                    &slice.person.id,
                    Some(label),
                );
            }
            ModulePayload::Event(event) => {
                // TODO: `<=` lists one event more than `welcome_event_things`; switch to `<`
                // once the expected count is confirmed with users of existing setups.
                if events <= config.welcome_event_things {
                    events += 1;
                    listing.module(
                        parent,
                        Some(EquipmentKind::Event.as_str()),
                        &event.id,
                        Some(format!("Event {events}")),
                    );
                }
            }
            ModulePayload::Radio(_) => {}
        }
    }
}

struct Listing<'a> {
    tree: &'a DeviceTree,
    results: Vec<DiscoveryResult>,
}

impl Listing<'_> {
    /// Record a device; returns its id so modules can refer to it, even when
    /// the device itself is already known.
    fn device(&mut self, kind: Option<&str>, raw_id: &str, label: Option<String>) -> Option<EquipmentId> {
        let id = EquipmentId::new(raw_id).ok()?;
        let kind = parse_kind(kind, &id)?;
        if !self.tree.contains(&id) {
            let label = label.unwrap_or_else(|| id.to_string());
            self.results.push(DiscoveryResult::new(kind, &id, label, None));
        }
        Some(id)
    }

    fn module(&mut self, parent: &EquipmentId, kind: Option<&str>, raw_id: &str, label: Option<String>) {
        let Ok(id) = EquipmentId::new(raw_id) else {
            return;
        };
        let Some(kind) = parse_kind(kind, &id) else {
            return;
        };
        if self.tree.contains(&id) {
            return;
        }
        let label = label.unwrap_or_else(|| id.to_string());
        self.results
            .push(DiscoveryResult::new(kind, &id, label, Some(parent)));
    }
}

fn parse_kind(kind: Option<&str>, id: &EquipmentId) -> Option<EquipmentKind> {
    match kind.map(str::parse::<EquipmentKind>) {
        Some(Ok(kind)) => Some(kind),
        Some(Err(err)) => {
            tracing::debug!(equipment_id = %id, %err, "skipping unsupported equipment");
            None
        }
        None => {
            tracing::debug!(equipment_id = %id, "skipping equipment without type");
            None
        }
    }
}
