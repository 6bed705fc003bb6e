//! Click resolution

use serde::Serialize;

use crate::floor::FloorSelection;
use crate::geometry::Ray;
use crate::picking::raycast_visible;
use crate::registry::AssetRegistry;
use crate::scene::NodeId;
use crate::selection::ActiveSelection;
use crate::unit::{Unit, UnitCategory};

/// Nodes the fallback search visits from a hit mesh upward, the hit node included
pub const MAX_ANCESTOR_DEPTH: usize = 10;

/// The unit a click opens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickTarget {
    pub node: NodeId,
    pub name: String,
    pub floor_level: i32,
}

impl From<&Unit> for ClickTarget {
    fn from(unit: &Unit) -> Self {
        Self {
            node: unit.node,
            name: unit.name.clone(),
            floor_level: unit.floor_level,
        }
    }
}

fn is_click_candidate(unit: &Unit, selected: FloorSelection) -> bool {
    unit.category == UnitCategory::Plan
        && unit.hoverable
        && selected.level() == Some(unit.floor_level)
}

/// Resolve a click.
///
/// A hovered unit is the target without casting. Otherwise every visible
/// mesh is hit-tested, nearest first, and each hit walks up through at
/// most [`MAX_ANCESTOR_DEPTH`] nodes, itself first, for a hoverable plan
/// unit on the selected level. Nothing resolves while a modal is open.
pub fn resolve_click(
    registry: &AssetRegistry,
    selection: &ActiveSelection,
    modal_open: bool,
    ray: Option<&Ray>,
) -> Option<ClickTarget> {
    if modal_open {
        return None;
    }
    if let Some(hovered) = selection.hovered {
        return registry.unit(hovered).map(ClickTarget::from);
    }

    let ray = ray?;
    let scene = registry.scene();
    raycast_visible(scene, ray).into_iter().find_map(|hit| {
        std::iter::once(hit.mesh.node)
            .chain(scene.ancestors(hit.mesh.node))
            .take(MAX_ANCESTOR_DEPTH)
            .filter_map(|node| registry.unit(node))
            .find(|unit| is_click_candidate(unit, selection.selected))
            .map(ClickTarget::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MeshGeometry;
    use crate::layout::PlacementLayout;
    use crate::material::MaterialProps;
    use crate::registry::tests::plan_tree;
    use crate::registry::ModelSlot;
    use crate::scene::ModelTree;
    use crate::visibility::FloorVisibility;
    use glam::{Mat4, Vec3};
    use std::sync::Arc;

    fn down_through(x: f32) -> Ray {
        Ray::new(Vec3::new(x, 10.0, 0.5), Vec3::NEG_Y)
    }

    fn building(selected: FloorSelection) -> (AssetRegistry, ActiveSelection) {
        let mut registry = AssetRegistry::new(PlacementLayout::identity());
        registry
            .attach(ModelSlot::Plan(1), plan_tree(&["STAIR_A", "UNIT_101"]))
            .unwrap();
        let mut selection = ActiveSelection::new(selected);
        selection.replace_active(FloorVisibility::apply(&mut registry, selected));
        (registry, selection)
    }

    #[test]
    fn test_hovered_unit_wins_without_ray() {
        let (registry, mut selection) = building(FloorSelection::Level(1));
        let unit = registry.unit_by_name("UNIT_101").unwrap().node;
        selection.hovered = Some(unit);

        let target = resolve_click(&registry, &selection, false, None).unwrap();
        assert_eq!(target.name, "UNIT_101");
        assert_eq!(target.floor_level, 1);
        assert_eq!(Some(target.node), selection.hovered);
    }

    #[test]
    fn test_modal_open_blocks_click() {
        let (registry, mut selection) = building(FloorSelection::Level(1));
        assert_eq!(resolve_click(&registry, &selection, true, Some(&down_through(2.5))), None);

        selection.hovered = registry.unit_by_name("UNIT_101").map(|u| u.node);
        assert_eq!(resolve_click(&registry, &selection, true, Some(&down_through(2.5))), None);
    }

    #[test]
    fn test_fallback_raycast_finds_unit() {
        let (registry, selection) = building(FloorSelection::Level(1));
        let target = resolve_click(&registry, &selection, false, Some(&down_through(2.5))).unwrap();
        assert_eq!(target.name, "UNIT_101");
    }

    #[test]
    fn test_fallback_ignores_common_areas_and_empty_space() {
        let (registry, selection) = building(FloorSelection::Level(1));
        assert_eq!(resolve_click(&registry, &selection, false, Some(&down_through(0.5))), None);
        assert_eq!(resolve_click(&registry, &selection, false, Some(&down_through(40.0))), None);
    }

    #[test]
    fn test_fallback_requires_selected_level() {
        let (registry, selection) = building(FloorSelection::All);
        assert_eq!(resolve_click(&registry, &selection, false, Some(&down_through(2.5))), None);
    }

    #[test]
    fn test_ancestor_walk_is_bounded() {
        // A unit whose only hittable mesh is a common-area part `depth` groups below it
        fn nested(depth: usize) -> ModelTree {
            let mut tree = ModelTree::new("Scene");
            let unit = tree.add_node(ModelTree::ROOT, "UNIT_900", Mat4::IDENTITY);
            tree.add_part(
                unit,
                Arc::new(MeshGeometry::cuboid(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(-4.0, 1.0, 1.0))),
                MaterialProps::default(),
            );
            let mut parent = unit;
            for i in 0..depth {
                parent = tree.add_node(parent, format!("group_{}", i), Mat4::IDENTITY);
            }
            tree.add_mesh(
                parent,
                "STAIR_CORE",
                MeshGeometry::cuboid(Vec3::new(5.0, 0.0, 0.0), Vec3::new(6.0, 1.0, 1.0)),
                MaterialProps::default(),
            );
            tree
        }

        for (depth, found) in [(0, true), (8, true), (9, false)] {
            let mut registry = AssetRegistry::new(PlacementLayout::identity());
            registry.attach(ModelSlot::Plan(9), nested(depth)).unwrap();
            let mut selection = ActiveSelection::new(FloorSelection::Level(9));
            selection.replace_active(FloorVisibility::apply(&mut registry, FloorSelection::Level(9)));

            let target = resolve_click(&registry, &selection, false, Some(&down_through(5.5)));
            assert_eq!(target.map(|t| t.name).as_deref() == Some("UNIT_900"), found, "depth {}", depth);
        }
    }
}
