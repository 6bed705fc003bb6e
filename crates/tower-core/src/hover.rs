//! Hover highlighting and label placement

use glam::Vec2;
use std::collections::HashMap;
use tracing::debug;

use crate::data::UnitDirectory;
use crate::geometry::{ViewCamera, Viewport};
use crate::material::{MaterialId, MaterialProps};
use crate::registry::AssetRegistry;
use crate::scene::{MeshKey, NodeId};

/// A change of hovered unit, produced at most once per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverTransition {
    pub from: Option<NodeId>,
    pub to: Option<NodeId>,
}

/// Screen position of a label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelAnchor {
    /// Normalized device coordinates, y up
    pub ndc: Vec2,
    /// Viewport pixels, origin top-left
    pub pixels: Vec2,
}

/// What to draw next to the hovered unit
#[derive(Debug, Clone, PartialEq)]
pub struct HoverLabel {
    pub unit: NodeId,
    pub unit_name: String,
    pub unit_type: String,
    pub area: String,
    /// `None` when the unit is behind the camera
    pub anchor: Option<LabelAnchor>,
}

/// Swaps unit materials for a highlight and restores them.
///
/// Every overridden mesh has exactly one entry holding its original
/// material. Exit and enter happen in a single [`HoverPresenter::transition`]
/// so at most one unit is ever highlighted between ticks.
#[derive(Debug, Default)]
pub struct HoverPresenter {
    overrides: HashMap<MeshKey, MaterialId>,
    highlight_cache: HashMap<MaterialId, MaterialId>,
    insertions: usize,
    removals: usize,
}

impl HoverPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore everything overridden for `from`, then highlight `to`
    pub fn transition(&mut self, registry: &mut AssetRegistry, from: Option<NodeId>, to: Option<NodeId>) {
        self.restore_all(registry);
        if let Some(unit) = to {
            self.highlight(registry, unit);
        }
        debug!(?from, ?to, overrides = self.overrides.len(), "Hover transition");
    }

    fn highlight(&mut self, registry: &mut AssetRegistry, unit: NodeId) {
        for key in registry.scene().mesh_keys(unit) {
            if self.overrides.contains_key(&key) {
                continue;
            }
            let Some(original) = registry.scene().part(key).map(|p| p.material) else {
                continue;
            };
            let highlight = match self.highlight_cache.get(&original) {
                Some(&cached) => cached,
                None => {
                    let props = registry
                        .materials()
                        .get(original)
                        .map(MaterialProps::highlight)
                        .unwrap_or_else(|| MaterialProps::highlight(&MaterialProps::default()));
                    let id = registry.materials_mut().add(props);
                    self.highlight_cache.insert(original, id);
                    id
                }
            };
            registry.scene_mut().set_part_material(key, highlight);
            self.overrides.insert(key, original);
            self.insertions += 1;
        }
    }

    /// Put back every original material and empty the override map
    pub fn restore_all(&mut self, registry: &mut AssetRegistry) {
        for (key, original) in self.overrides.drain() {
            registry.scene_mut().set_part_material(key, original);
            self.removals += 1;
        }
    }

    /// Label for `unit` under the current camera
    pub fn label(
        &self,
        registry: &AssetRegistry,
        unit: NodeId,
        camera: &ViewCamera,
        viewport: &Viewport,
        directory: &dyn UnitDirectory,
    ) -> Option<HoverLabel> {
        let tagged = registry.unit(unit)?;
        let display = directory.describe(&tagged.name);
        let anchor = registry
            .scene()
            .world_bounds(unit)
            .and_then(|bounds| camera.project(bounds.center()))
            .map(|ndc| {
                let ndc = ndc.truncate();
                LabelAnchor {
                    ndc,
                    pixels: viewport.ndc_to_pixels(ndc),
                }
            });
        Some(HoverLabel {
            unit,
            unit_name: tagged.name.clone(),
            unit_type: display.unit_type,
            area: display.area,
            anchor,
        })
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_overridden(&self, key: MeshKey) -> bool {
        self.overrides.contains_key(&key)
    }

    pub fn insertions(&self) -> usize {
        self.insertions
    }

    pub fn removals(&self) -> usize {
        self.removals
    }
}
