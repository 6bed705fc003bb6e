//! Push core scene edits onto Bevy entities
//!
//! Visibility flags are copied onto the mirrored node entities. Material
//! swaps look up (or build) one `StandardMaterial` per core material and
//! insert it on the mesh entity.

use bevy::prelude::*;
use tower_core::{MaterialId, MeshKey};

use crate::convert::apply_props;
use crate::loading::SceneEntities;
use crate::{Tower, TowerSet};

pub struct SyncPlugin;

impl Plugin for SyncPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, sync_scene.in_set(TowerSet::Sync))
            .add_systems(Last, restore_on_exit);
    }
}

pub(crate) fn sync_scene(
    mut commands: Commands,
    mut tower: ResMut<Tower>,
    mut entities: ResMut<SceneEntities>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let changes = tower.take_changes();
    if changes.is_empty() {
        return;
    }

    let scene = tower.registry().scene();
    for node in &changes.visibility {
        let Some(&entity) = entities.nodes.get(node) else {
            continue;
        };
        let visibility = if scene.is_visible(*node) {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        commands.entity(entity).insert(visibility);
    }

    for key in &changes.materials {
        let Some(part) = scene.part(*key) else {
            continue;
        };
        let Some(&entity) = entities.meshes.get(key) else {
            continue;
        };
        let Some(handle) = material_handle(&mut entities, &mut materials, &tower, *key, part.material) else {
            continue;
        };
        commands.entity(entity).insert(MeshMaterial3d(handle));
    }
    tracing::trace!(
        nodes = changes.visibility.len(),
        meshes = changes.materials.len(),
        "Scene synced"
    );
}

/// Bevy material for a core material, built from the mesh's original on first use
fn material_handle(
    entities: &mut SceneEntities,
    materials: &mut Assets<StandardMaterial>,
    tower: &Tower,
    key: MeshKey,
    id: MaterialId,
) -> Option<Handle<StandardMaterial>> {
    if let Some(handle) = entities.materials.get(&id) {
        return Some(handle.clone());
    }
    let props = tower.registry().materials().get(id)?;
    let mut material = entities
        .originals
        .get(&key)
        .and_then(|original| materials.get(original))
        .cloned()
        .unwrap_or_default();
    apply_props(&mut material, props);
    let handle = materials.add(material);
    entities.materials.insert(id, handle.clone());
    Some(handle)
}

/// Restore highlighted materials when the app is closing
fn restore_on_exit(
    mut exit: bevy::ecs::message::MessageReader<AppExit>,
    mut tower: ResMut<Tower>,
) {
    if exit.read().next().is_some() {
        tower.teardown();
        tracing::info!("Viewer torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::tests::{spawn_plan, test_app};
    use tower_core::{FloorSelection, FrameInput, LoadError, ModelSlot, ViewCamera, Viewport};

    fn material_of(app: &App, entity: Entity) -> Handle<StandardMaterial> {
        app.world()
            .get::<MeshMaterial3d<StandardMaterial>>(entity)
            .unwrap()
            .0
            .clone()
    }

    /// Looking straight down onto UNIT_101 of the level 1 plan
    fn over_unit_101() -> FrameInput {
        FrameInput {
            pointer_ndc: Some(Vec2::ZERO),
            camera: ViewCamera::looking_at(
                Vec3::new(2.0, 20.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::NEG_Z,
                1.0,
                1.0,
            ),
            viewport: Viewport::new(800.0, 800.0),
            modal_open: false,
        }
    }

    #[test]
    fn test_visibility_follows_selection() {
        let mut app = test_app();
        let plan = spawn_plan(&mut app, ModelSlot::Plan(1));
        app.update();
        assert_eq!(app.world().get::<Visibility>(plan.root), Some(&Visibility::Inherited));

        app.world_mut()
            .resource_mut::<Tower>()
            .set_selected_floor(FloorSelection::Level(0));
        app.update();
        assert_eq!(app.world().get::<Visibility>(plan.root), Some(&Visibility::Hidden));
    }

    #[test]
    fn test_materials_cloned_from_original() {
        let mut app = test_app();
        let plan = spawn_plan(&mut app, ModelSlot::Plan(1));
        app.update();

        let normalized = material_of(&app, plan.unit_mesh);
        assert_ne!(normalized, plan.original);
        let materials = app.world().resource::<Assets<StandardMaterial>>();
        let material = materials.get(&normalized).unwrap();
        assert!(material.emissive.green.abs() < 1e-6);
        assert_eq!(app.world().resource::<SceneEntities>().materials.len(), 2);
    }

    #[test]
    fn test_highlight_swaps_material_handle() {
        let mut app = test_app();
        let plan = spawn_plan(&mut app, ModelSlot::Plan(1));
        app.update();
        let normalized = material_of(&app, plan.unit_mesh);
        let stair = material_of(&app, plan.stair_mesh);

        {
            let mut tower = app.world_mut().resource_mut::<Tower>();
            tower.record_failure(
                ModelSlot::Environment,
                &LoadError::NotFound("models/environment.glb".to_string()),
            );
            assert!(tower.is_ready());
            tower.tick(&over_unit_101());
            let unit = tower.registry().unit_by_name("UNIT_101").unwrap().node;
            assert_eq!(tower.hovered(), Some(unit));
        }
        app.update();

        let lit = material_of(&app, plan.unit_mesh);
        assert_ne!(lit, normalized);
        assert_ne!(lit, plan.original);
        let material = app
            .world()
            .resource::<Assets<StandardMaterial>>()
            .get(&lit)
            .unwrap();
        assert!(material.emissive.green > 0.0);
        assert_eq!(material_of(&app, plan.stair_mesh), stair);

        // Moving away restores the normalized handle
        {
            let mut tower = app.world_mut().resource_mut::<Tower>();
            let mut away = over_unit_101();
            away.pointer_ndc = None;
            tower.tick(&away);
        }
        app.update();
        assert_eq!(material_of(&app, plan.unit_mesh), normalized);
    }
}
