//! Asset registry
//!
//! Owns the scene side-table, the material library and the unit tags of
//! every attached model. Models are attached once per [`ModelSlot`]; the
//! registry places the root, adjusts materials, tags units and hides the
//! root until a floor selection makes it visible.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

use crate::layout::PlacementLayout;
use crate::material::MaterialLibrary;
use crate::scene::{MeshPart, ModelTree, NodeId, SceneChanges, SceneGraph};
use crate::unit::{Unit, UnitCategory};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{0} already has a model attached")]
    SlotOccupied(ModelSlot),
}

/// The three kinds of building model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Environment,
    Structure,
    Plan,
}

/// Where a model belongs: the single environment, or a per-level structure/plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelSlot {
    Environment,
    Structure(i32),
    Plan(i32),
}

impl ModelSlot {
    pub fn kind(self) -> ModelKind {
        match self {
            ModelSlot::Environment => ModelKind::Environment,
            ModelSlot::Structure(_) => ModelKind::Structure,
            ModelSlot::Plan(_) => ModelKind::Plan,
        }
    }

    pub fn level(self) -> Option<i32> {
        match self {
            ModelSlot::Environment => None,
            ModelSlot::Structure(level) | ModelSlot::Plan(level) => Some(level),
        }
    }

    fn unit_category(self) -> Option<UnitCategory> {
        match self {
            ModelSlot::Environment => None,
            ModelSlot::Structure(_) => Some(UnitCategory::Structure),
            ModelSlot::Plan(_) => Some(UnitCategory::Plan),
        }
    }
}

impl fmt::Display for ModelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSlot::Environment => write!(f, "environment"),
            ModelSlot::Structure(level) => write!(f, "structure of floor {}", level),
            ModelSlot::Plan(level) => write!(f, "plan of floor {}", level),
        }
    }
}

/// Attached model roots of one level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedFloorAssets {
    pub level: i32,
    pub structure: Option<NodeId>,
    pub plan: Option<NodeId>,
}

impl LoadedFloorAssets {
    fn new(level: i32) -> Self {
        Self {
            level,
            structure: None,
            plan: None,
        }
    }

    fn slot_mut(&mut self, kind: ModelKind) -> Option<&mut Option<NodeId>> {
        match kind {
            ModelKind::Structure => Some(&mut self.structure),
            ModelKind::Plan => Some(&mut self.plan),
            ModelKind::Environment => None,
        }
    }
}

/// Result of attaching a [`ModelTree`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedModel {
    pub slot: ModelSlot,
    pub root: NodeId,
    /// Scene node for each tree node, by tree index
    pub nodes: Vec<NodeId>,
    /// Nodes tagged as units, in tree order
    pub units: Vec<NodeId>,
}

#[derive(Debug, Default)]
pub struct AssetRegistry {
    scene: SceneGraph,
    materials: MaterialLibrary,
    units: BTreeMap<NodeId, Unit>,
    floors: BTreeMap<i32, LoadedFloorAssets>,
    environment: Option<NodeId>,
    layout: PlacementLayout,
    ready: bool,
}

impl AssetRegistry {
    pub fn new(layout: PlacementLayout) -> Self {
        Self {
            layout,
            ..Default::default()
        }
    }

    /// Graft a loaded model into the scene.
    ///
    /// The root starts hidden. Every node carrying meshes becomes a unit of
    /// the slot's level (environment meshes are not tagged).
    pub fn attach(&mut self, slot: ModelSlot, tree: ModelTree) -> Result<AttachedModel, RegistryError> {
        if self.slot_root(slot).is_some() {
            return Err(RegistryError::SlotOccupied(slot));
        }

        let kind = slot.kind();
        let mut nodes: Vec<NodeId> = Vec::with_capacity(tree.nodes().len());
        for (index, model_node) in tree.nodes().iter().enumerate() {
            let parent = model_node.parent.and_then(|p| nodes.get(p).copied());
            let local = if index == ModelTree::ROOT {
                self.layout.place(slot, model_node.local)
            } else {
                model_node.local
            };
            let parts = model_node
                .parts
                .iter()
                .map(|part| MeshPart {
                    geometry: part.geometry.clone(),
                    material: self.materials.add(part.material.normalized(kind)),
                })
                .collect();
            nodes.push(self.scene.add_node(parent, model_node.name.clone(), local, parts));
        }
        let root = nodes[ModelTree::ROOT];
        self.scene.set_visible(root, false);

        let mut units = Vec::new();
        if let (Some(category), Some(level)) = (slot.unit_category(), slot.level()) {
            for &node in &nodes {
                let Some(scene_node) = self.scene.node(node) else {
                    continue;
                };
                if !scene_node.has_mesh() {
                    continue;
                }
                let unit = Unit::new(node, scene_node.name.clone(), level, category);
                debug!(unit = %unit.name, level, hoverable = unit.hoverable, "Tagged unit");
                self.units.insert(node, unit);
                units.push(node);
            }
        }

        match slot {
            ModelSlot::Environment => self.environment = Some(root),
            ModelSlot::Structure(level) | ModelSlot::Plan(level) => {
                let assets = self
                    .floors
                    .entry(level)
                    .or_insert_with(|| LoadedFloorAssets::new(level));
                if let Some(entry) = assets.slot_mut(kind) {
                    *entry = Some(root);
                }
            }
        }

        info!(
            slot = %slot,
            nodes = nodes.len(),
            units = units.len(),
            "Attached model"
        );

        Ok(AttachedModel {
            slot,
            root,
            nodes,
            units,
        })
    }

    /// Root node occupying `slot`, if any
    pub fn slot_root(&self, slot: ModelSlot) -> Option<NodeId> {
        match slot {
            ModelSlot::Environment => self.environment,
            ModelSlot::Structure(level) => self.floors.get(&level).and_then(|f| f.structure),
            ModelSlot::Plan(level) => self.floors.get(&level).and_then(|f| f.plan),
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialLibrary {
        &mut self.materials
    }

    pub fn unit(&self, node: NodeId) -> Option<&Unit> {
        self.units.get(&node)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn unit_by_name(&self, name: &str) -> Option<&Unit> {
        self.units.values().find(|u| u.name == name)
    }

    pub fn environment(&self) -> Option<NodeId> {
        self.environment
    }

    pub fn floor(&self, level: i32) -> Option<&LoadedFloorAssets> {
        self.floors.get(&level)
    }

    /// Loaded floors in ascending level order
    pub fn floors(&self) -> impl Iterator<Item = &LoadedFloorAssets> {
        self.floors.values()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn mark_ready(&mut self) {
        if !self.ready {
            info!(floors = self.floors.len(), units = self.units.len(), "Building ready");
        }
        self.ready = true;
    }

    pub fn take_changes(&mut self) -> SceneChanges {
        self.scene.take_changes()
    }
}
