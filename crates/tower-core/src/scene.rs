//! Scene side-table
//!
//! An arena mirror of the loaded model hierarchies. Nodes are addressed by
//! [`NodeId`]; each node may carry several mesh parts (one per glTF
//! primitive). Engine adapters read [`SceneChanges`] to apply only the
//! visibility and material edits made since the last sync.

use glam::Mat4;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::geometry::{Aabb, MeshGeometry};
use crate::material::{MaterialId, MaterialProps};

/// Handle of a node in the [`SceneGraph`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One mesh primitive: a node plus the primitive index on that node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshKey {
    pub node: NodeId,
    pub part: usize,
}

impl MeshKey {
    pub fn new(node: NodeId, part: usize) -> Self {
        Self { node, part }
    }
}

/// Geometry and current material of one mesh primitive
#[derive(Debug, Clone)]
pub struct MeshPart {
    pub geometry: Arc<MeshGeometry>,
    pub material: MaterialId,
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub local: Mat4,
    pub world: Mat4,
    pub visible: bool,
    pub parts: Vec<MeshPart>,
}

impl SceneNode {
    pub fn has_mesh(&self) -> bool {
        !self.parts.is_empty()
    }
}

/// Edits recorded since the last [`SceneGraph::take_changes`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneChanges {
    pub visibility: BTreeSet<NodeId>,
    pub materials: BTreeSet<MeshKey>,
}

impl SceneChanges {
    pub fn is_empty(&self) -> bool {
        self.visibility.is_empty() && self.materials.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    changes: SceneChanges,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node under `parent`. New nodes are visible; the world
    /// matrix is derived from the parent's. Each part is recorded as a
    /// material change so adapters pick up its starting material.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        local: Mat4,
        parts: Vec<MeshPart>,
    ) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.changes
            .materials
            .extend((0..parts.len()).map(|part| MeshKey::new(id, part)));
        let world = match parent.and_then(|p| self.nodes.get(p.index())) {
            Some(parent_node) => parent_node.world * local,
            None => local,
        };
        self.nodes.push(SceneNode {
            name: name.into(),
            parent,
            children: Vec::new(),
            local,
            world,
            visible: true,
            parts,
        });
        if let Some(parent_node) = parent.and_then(|p| self.nodes.get_mut(p.index())) {
            parent_node.children.push(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Parents of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// `id` and everything below it, depth first
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.node(id).is_none() {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Set the visibility flag of a node; returns whether it changed.
    /// Only actual changes are recorded for sync.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> bool {
        let Some(node) = self.nodes.get_mut(id.index()) else {
            return false;
        };
        if node.visible == visible {
            return false;
        }
        node.visible = visible;
        self.changes.visibility.insert(id);
        true
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.visible)
    }

    /// Visible itself and through every ancestor
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        self.is_visible(id) && self.ancestors(id).all(|a| self.is_visible(a))
    }

    pub fn world(&self, id: NodeId) -> Mat4 {
        self.node(id).map(|n| n.world).unwrap_or(Mat4::IDENTITY)
    }

    pub fn part(&self, key: MeshKey) -> Option<&MeshPart> {
        self.node(key.node).and_then(|n| n.parts.get(key.part))
    }

    /// Keys of every mesh part on a single node
    pub fn node_mesh_keys(&self, id: NodeId) -> impl Iterator<Item = MeshKey> + '_ {
        let count = self.node(id).map(|n| n.parts.len()).unwrap_or(0);
        (0..count).map(move |part| MeshKey::new(id, part))
    }

    /// Keys of every mesh part in the subtree rooted at `id`
    pub fn mesh_keys(&self, id: NodeId) -> Vec<MeshKey> {
        self.descendants(id)
            .into_iter()
            .flat_map(|node| self.node_mesh_keys(node).collect::<Vec<_>>())
            .collect()
    }

    /// Swap a part's material; returns the previous one
    pub fn set_part_material(&mut self, key: MeshKey, material: MaterialId) -> Option<MaterialId> {
        let part = self
            .nodes
            .get_mut(key.node.index())
            .and_then(|n| n.parts.get_mut(key.part))?;
        let previous = std::mem::replace(&mut part.material, material);
        if previous != material {
            self.changes.materials.insert(key);
        }
        Some(previous)
    }

    /// World-space bounds of all meshes under `id`
    pub fn world_bounds(&self, id: NodeId) -> Option<Aabb> {
        self.descendants(id)
            .into_iter()
            .flat_map(|node_id| {
                let node = &self.nodes[node_id.index()];
                node.parts
                    .iter()
                    .filter_map(|p| p.geometry.bounds())
                    .map(|b| b.transformed(&node.world))
                    .collect::<Vec<_>>()
            })
            .reduce(|a, b| a.merge(&b))
    }

    /// Drain the recorded edits
    pub fn take_changes(&mut self) -> SceneChanges {
        std::mem::take(&mut self.changes)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::from_index(i), n))
    }
}

/// One primitive of a freshly loaded model
#[derive(Debug, Clone)]
pub struct ModelPart {
    pub geometry: Arc<MeshGeometry>,
    pub material: MaterialProps,
}

#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: String,
    /// Index of the parent within the tree; `None` only for the root
    pub parent: Option<usize>,
    pub local: Mat4,
    pub parts: Vec<ModelPart>,
}

/// A detached model hierarchy as produced by a loader.
/// Node 0 is the root; parents always precede their children.
#[derive(Debug, Clone)]
pub struct ModelTree {
    nodes: Vec<ModelNode>,
}

impl ModelTree {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![ModelNode {
                name: root_name.into(),
                parent: None,
                local: Mat4::IDENTITY,
                parts: Vec::new(),
            }],
        }
    }

    pub const ROOT: usize = 0;

    /// Add a child node; returns its index. Out-of-range parents attach to the root.
    pub fn add_node(&mut self, parent: usize, name: impl Into<String>, local: Mat4) -> usize {
        let parent = if parent < self.nodes.len() { parent } else { Self::ROOT };
        self.nodes.push(ModelNode {
            name: name.into(),
            parent: Some(parent),
            local,
            parts: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub fn add_part(&mut self, node: usize, geometry: Arc<MeshGeometry>, material: MaterialProps) {
        if let Some(target) = self.nodes.get_mut(node) {
            target.parts.push(ModelPart { geometry, material });
        }
    }

    /// Convenience: a named child holding a single mesh
    pub fn add_mesh(
        &mut self,
        parent: usize,
        name: impl Into<String>,
        geometry: MeshGeometry,
        material: MaterialProps,
    ) -> usize {
        let index = self.add_node(parent, name, Mat4::IDENTITY);
        self.add_part(index, Arc::new(geometry), material);
        index
    }

    pub fn nodes(&self) -> &[ModelNode] {
        &self.nodes
    }

    pub fn root_name(&self) -> &str {
        &self.nodes[Self::ROOT].name
    }

    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().map(|n| n.parts.len()).sum()
    }
}
