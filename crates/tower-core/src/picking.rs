//! Pointer resolution: which active unit is under the pointer

use crate::geometry::Ray;
use crate::registry::AssetRegistry;
use crate::scene::{MeshKey, NodeId, SceneGraph};

/// A ray intersection with one mesh part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub mesh: MeshKey,
    pub distance: f32,
}

/// Nearest hit on the meshes of a single node, tested in its local space
pub fn raycast_node(scene: &SceneGraph, node: NodeId, ray: &Ray) -> Option<RayHit> {
    let scene_node = scene.node(node)?;
    if !scene_node.has_mesh() {
        return None;
    }
    let local_ray = ray.to_local(&scene_node.world.inverse());
    scene_node
        .parts
        .iter()
        .enumerate()
        .filter_map(|(part, mesh)| {
            mesh.geometry.intersect_ray(&local_ray).map(|distance| RayHit {
                mesh: MeshKey::new(node, part),
                distance,
            })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Nearest hit anywhere in the subtree rooted at `root`
pub fn raycast_subtree(scene: &SceneGraph, root: NodeId, ray: &Ray) -> Option<RayHit> {
    scene
        .descendants(root)
        .into_iter()
        .filter_map(|node| raycast_node(scene, node, ray))
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Every hit on effectively visible meshes in the scene, nearest first
pub fn raycast_visible(scene: &SceneGraph, ray: &Ray) -> Vec<RayHit> {
    let mut hits: Vec<RayHit> = scene
        .iter()
        .filter(|(_, node)| node.has_mesh())
        .filter(|(id, _)| scene.is_effectively_visible(*id))
        .filter_map(|(id, _)| raycast_node(scene, id, ray))
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Resolve the hovered unit among `active` units.
///
/// The nearest hit wins; if that unit is not hoverable the result is
/// `None` rather than the next unit behind it.
pub fn resolve_pointer(registry: &AssetRegistry, active: &[NodeId], ray: &Ray) -> Option<NodeId> {
    if active.is_empty() {
        return None;
    }
    let scene = registry.scene();
    let (unit, _) = active
        .iter()
        .filter_map(|&unit| raycast_subtree(scene, unit, ray).map(|hit| (unit, hit.distance)))
        .min_by(|a, b| a.1.total_cmp(&b.1))?;

    registry
        .unit(unit)
        .filter(|u| u.hoverable)
        .map(|u| u.node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floor::FloorSelection;
    use crate::layout::PlacementLayout;
    use crate::registry::tests::plan_tree;
    use crate::registry::ModelSlot;
    use crate::visibility::FloorVisibility;
    use glam::Vec3;

    /// Units at x = 0..1, 2..3, ... ; a ray straight down through unit `i`
    fn ray_through(i: usize) -> Ray {
        let x = i as f32 * 2.0 + 0.5;
        Ray::new(Vec3::new(x, 10.0, 0.5), Vec3::NEG_Y)
    }

    fn registry_with(names: &[&str]) -> (AssetRegistry, Vec<NodeId>) {
        let mut registry = AssetRegistry::new(PlacementLayout::identity());
        registry.attach(ModelSlot::Plan(1), plan_tree(names)).unwrap();
        let active = FloorVisibility::apply(&mut registry, FloorSelection::Level(1));
        (registry, active)
    }

    #[test]
    fn test_hover_hits_hoverable_unit() {
        let (registry, active) = registry_with(&["STAIR_A", "UNIT_101"]);
        let hovered = resolve_pointer(&registry, &active, &ray_through(1)).unwrap();
        assert_eq!(registry.unit(hovered).unwrap().name, "UNIT_101");
    }

    #[test]
    fn test_non_hoverable_unit_resolves_to_none() {
        let (registry, active) = registry_with(&["STAIR_A", "UNIT_101"]);
        assert_eq!(resolve_pointer(&registry, &active, &ray_through(0)), None);
    }

    #[test]
    fn test_nearest_non_hoverable_blocks() {
        let mut registry = AssetRegistry::new(PlacementLayout::identity());
        registry.attach(ModelSlot::Plan(1), plan_tree(&["HALL_1", "UNIT_102"])).unwrap();
        let active = FloorVisibility::apply(&mut registry, FloorSelection::Level(1));

        // Along +x from the left: HALL_1 (x 0..1) is in front of UNIT_102 (x 2..3)
        let ray = Ray::new(Vec3::new(-5.0, 0.5, 0.5), Vec3::X);
        assert_eq!(resolve_pointer(&registry, &active, &ray), None);

        // From the right the hoverable unit is nearest
        let ray = Ray::new(Vec3::new(10.0, 0.5, 0.5), Vec3::NEG_X);
        let hovered = resolve_pointer(&registry, &active, &ray).unwrap();
        assert_eq!(registry.unit(hovered).unwrap().name, "UNIT_102");
    }

    #[test]
    fn test_empty_active_list() {
        let (registry, _) = registry_with(&["UNIT_101"]);
        assert_eq!(resolve_pointer(&registry, &[], &ray_through(0)), None);
    }

    #[test]
    fn test_miss() {
        let (registry, active) = registry_with(&["UNIT_101"]);
        let ray = Ray::new(Vec3::new(50.0, 10.0, 0.5), Vec3::NEG_Y);
        assert_eq!(resolve_pointer(&registry, &active, &ray), None);
    }

    #[test]
    fn test_raycast_visible_skips_hidden_models() {
        let mut registry = AssetRegistry::new(PlacementLayout::identity());
        registry.attach(ModelSlot::Plan(1), plan_tree(&["UNIT_101"])).unwrap();
        assert!(raycast_visible(registry.scene(), &ray_through(0)).is_empty());

        FloorVisibility::apply(&mut registry, FloorSelection::Level(1));
        assert_eq!(raycast_visible(registry.scene(), &ray_through(0)).len(), 1);
    }
}
