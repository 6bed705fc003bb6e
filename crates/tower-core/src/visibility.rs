//! Floor visibility controller

use tracing::debug;

use crate::floor::FloorSelection;
use crate::registry::AssetRegistry;
use crate::scene::NodeId;
use crate::unit::UnitCategory;

/// Maps a floor selection onto model visibility and the active unit list
pub struct FloorVisibility;

impl FloorVisibility {
    /// Structures stay visible at and below the selected level (cutaway)
    pub fn structure_visible(selection: FloorSelection, level: i32) -> bool {
        match selection {
            FloorSelection::All => true,
            FloorSelection::Level(selected) => level <= selected,
        }
    }

    /// Only the selected level's plan is shown
    pub fn plan_visible(selection: FloorSelection, level: i32) -> bool {
        match selection {
            FloorSelection::All => true,
            FloorSelection::Level(selected) => level == selected,
        }
    }

    /// Plan units eligible for pointer interaction under `selection`,
    /// regardless of hoverability, in node order
    pub fn active_units(registry: &AssetRegistry, selection: FloorSelection) -> Vec<NodeId> {
        registry
            .units()
            .filter(|unit| unit.category == UnitCategory::Plan)
            .filter(|unit| Self::plan_visible(selection, unit.floor_level))
            .map(|unit| unit.node)
            .collect()
    }

    /// Apply `selection` to every loaded model root and return the new
    /// active unit list. Flags already at the requested value are untouched,
    /// so re-applying the same selection records no changes.
    pub fn apply(registry: &mut AssetRegistry, selection: FloorSelection) -> Vec<NodeId> {
        let roots: Vec<(NodeId, bool)> = registry
            .floors()
            .flat_map(|assets| {
                let structure = assets
                    .structure
                    .map(|root| (root, Self::structure_visible(selection, assets.level)));
                let plan = assets
                    .plan
                    .map(|root| (root, Self::plan_visible(selection, assets.level)));
                structure.into_iter().chain(plan)
            })
            .chain(registry.environment().map(|root| (root, true)))
            .collect();

        let mut changed = 0usize;
        let scene = registry.scene_mut();
        for (root, visible) in roots {
            if scene.set_visible(root, visible) {
                changed += 1;
            }
        }

        let active = Self::active_units(registry, selection);
        debug!(selection = %selection, changed, active = active.len(), "Applied floor visibility");
        active
    }
}
