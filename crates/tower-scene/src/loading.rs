//! glTF loading and mirroring into the core registry
//!
//! Each model is loaded as a `Gltf` asset, spawned hidden under a
//! [`FloorModelRoot`], and once its scene instance has children the
//! hierarchy is copied into a [`ModelTree`] and attached to the viewer.
//! glTF node entities become tree nodes; their `Mesh3d` primitive children
//! become mesh parts of that node.

use bevy::gltf::Gltf;
use bevy::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tower_core::{LoadError, MaterialId, MeshKey, ModelSlot, ModelTree, NodeId};

use crate::convert::{material_props, mesh_geometry, transform_matrix};
use crate::{BuildingManifest, LoadingStatus, Tower, TowerSet};

/// Root entity of a spawned building model
#[derive(Component, Debug, Clone, Copy)]
pub struct FloorModelRoot {
    pub slot: ModelSlot,
}

/// Marks a model root already mirrored into the registry
#[derive(Component)]
pub struct Mirrored;

#[derive(Debug, Clone)]
struct PendingModel {
    slot: ModelSlot,
    path: String,
    handle: Handle<Gltf>,
}

/// glTF loads that have not settled yet
#[derive(Resource, Default)]
pub struct PendingModels {
    pending: Vec<PendingModel>,
}

/// Entity lookup for registry nodes, mesh parts and materials
#[derive(Resource, Default)]
pub struct SceneEntities {
    pub nodes: HashMap<NodeId, Entity>,
    pub meshes: HashMap<MeshKey, Entity>,
    /// Material each mesh was spawned with; cloned as the base for core materials
    pub originals: HashMap<MeshKey, Handle<StandardMaterial>>,
    /// Bevy material for each core material
    pub materials: HashMap<MaterialId, Handle<StandardMaterial>>,
}

pub struct LoadingPlugin;

impl Plugin for LoadingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingModels>()
            .init_resource::<SceneEntities>()
            .add_systems(Startup, request_models)
            .add_systems(
                Update,
                (poll_models, mirror_models, update_loading_status)
                    .chain()
                    .in_set(TowerSet::Load),
            );
    }
}

/// Queue every model named in the manifest
fn request_models(
    manifest: Res<BuildingManifest>,
    asset_server: Res<AssetServer>,
    mut tower: ResMut<Tower>,
    mut pending: ResMut<PendingModels>,
) {
    tower.expect_floors(manifest.floors.clone());

    let floor_slots = manifest
        .floors
        .iter()
        .flat_map(|floor| floor.asset_slots())
        .map(|(slot, path)| (slot, path.to_string()));
    let slots = std::iter::once((ModelSlot::Environment, manifest.environment.clone())).chain(floor_slots);

    for (slot, path) in slots {
        tracing::debug!(slot = %slot, path = %path, "Requesting model");
        let handle = asset_server.load::<Gltf>(path.clone());
        pending.pending.push(PendingModel { slot, path, handle });
    }
    tracing::info!(models = pending.pending.len(), "Building models requested");
}

/// Spawn loaded scenes hidden; record failures
fn poll_models(
    mut commands: Commands,
    mut pending: ResMut<PendingModels>,
    mut tower: ResMut<Tower>,
    asset_server: Res<AssetServer>,
    gltf_assets: Res<Assets<Gltf>>,
) {
    let mut remaining = Vec::new();
    for model in pending.pending.drain(..) {
        match asset_server.get_load_state(model.handle.id()) {
            Some(bevy::asset::LoadState::Loaded) => {
                let scene = gltf_assets
                    .get(&model.handle)
                    .and_then(|gltf| gltf.default_scene.clone().or_else(|| gltf.scenes.first().cloned()));
                match scene {
                    Some(scene) => {
                        tracing::info!(slot = %model.slot, path = %model.path, "Model loaded");
                        commands.spawn((
                            SceneRoot(scene),
                            Transform::default(),
                            Visibility::Hidden,
                            FloorModelRoot { slot: model.slot },
                            Name::new(model.slot.to_string()),
                        ));
                    }
                    None => {
                        let error = LoadError::Decode {
                            path: model.path.clone(),
                            message: "glTF has no scenes".to_string(),
                        };
                        tower.record_failure(model.slot, &error);
                    }
                }
            }
            Some(bevy::asset::LoadState::Failed(err)) => {
                tracing::error!(slot = %model.slot, path = %model.path, "Failed to load model: {}", err);
                let error = LoadError::Decode {
                    path: model.path.clone(),
                    message: err.to_string(),
                };
                tower.record_failure(model.slot, &error);
            }
            _ => remaining.push(model),
        }
    }
    pending.pending = remaining;
}

/// Bevy-side handles gathered while walking a spawned scene
#[derive(Default)]
struct MirrorBuild {
    /// Entity per tree node, by tree index
    node_entities: Vec<Entity>,
    /// (tree node index, part index within node, mesh entity, material)
    parts: Vec<(usize, usize, Entity, Option<Handle<StandardMaterial>>)>,
}

/// Copy spawned scenes into the registry once their hierarchy exists
#[allow(clippy::too_many_arguments)]
pub(crate) fn mirror_models(
    mut commands: Commands,
    roots: Query<(Entity, &FloorModelRoot), Without<Mirrored>>,
    children_query: Query<&Children>,
    names: Query<&Name>,
    transforms: Query<&Transform>,
    mesh_query: Query<(&Mesh3d, Option<&MeshMaterial3d<StandardMaterial>>)>,
    meshes: Res<Assets<Mesh>>,
    materials: Res<Assets<StandardMaterial>>,
    mut tower: ResMut<Tower>,
    mut entities: ResMut<SceneEntities>,
) {
    for (root_entity, root) in roots.iter() {
        // The scene instance has not been spawned under the root yet
        if children_query.get(root_entity).map_or(true, |c| c.is_empty()) {
            continue;
        }

        let mut tree = ModelTree::new(root.slot.to_string());
        let mut build = MirrorBuild {
            node_entities: vec![root_entity],
            parts: Vec::new(),
        };
        collect_children(
            root_entity,
            ModelTree::ROOT,
            &mut tree,
            &mut build,
            &children_query,
            &names,
            &transforms,
            &mesh_query,
            &meshes,
            &materials,
        );
        commands.entity(root_entity).insert(Mirrored);

        let attached = match tower.attach_model(root.slot, tree) {
            Ok(attached) => attached,
            Err(e) => {
                tracing::warn!(slot = %root.slot, "Discarding duplicate model: {}", e);
                commands.entity(root_entity).despawn();
                continue;
            }
        };

        for (index, node) in attached.nodes.iter().enumerate() {
            if let Some(&entity) = build.node_entities.get(index) {
                entities.nodes.insert(*node, entity);
            }
        }
        for (tree_index, part, entity, material) in build.parts {
            let Some(&node) = attached.nodes.get(tree_index) else {
                continue;
            };
            let key = MeshKey::new(node, part);
            entities.meshes.insert(key, entity);
            if let Some(material) = material {
                entities.originals.insert(key, material);
            }
        }

        // The registry placed the root; mirror that onto the entity
        let root_world = tower.registry().scene().world(attached.root);
        commands
            .entity(root_entity)
            .insert(Transform::from_matrix(root_world));

        tracing::info!(
            slot = %root.slot,
            nodes = attached.nodes.len(),
            units = attached.units.len(),
            "Model mirrored"
        );
    }
}

/// Walk `parent`'s children: mesh primitives become parts of `tree_parent`,
/// other entities become tree nodes and are walked in turn
#[allow(clippy::too_many_arguments)]
fn collect_children(
    parent: Entity,
    tree_parent: usize,
    tree: &mut ModelTree,
    build: &mut MirrorBuild,
    children_query: &Query<&Children>,
    names: &Query<&Name>,
    transforms: &Query<&Transform>,
    mesh_query: &Query<(&Mesh3d, Option<&MeshMaterial3d<StandardMaterial>>)>,
    meshes: &Assets<Mesh>,
    materials: &Assets<StandardMaterial>,
) {
    let Ok(children) = children_query.get(parent) else {
        return;
    };
    for child in children.iter() {
        let local = transforms
            .get(child)
            .map(transform_matrix)
            .unwrap_or(Mat4::IDENTITY);

        if let Ok((mesh3d, material)) = mesh_query.get(child) {
            let Some(geometry) = meshes.get(&mesh3d.0).and_then(|mesh| mesh_geometry(mesh, local)) else {
                tracing::debug!(entity = ?child, "Skipping mesh without triangle positions");
                continue;
            };
            let handle = material.map(|m| m.0.clone());
            let props = handle
                .as_ref()
                .and_then(|h| materials.get(h))
                .map(material_props)
                .unwrap_or_default();
            let part = tree.nodes()[tree_parent].parts.len();
            tree.add_part(tree_parent, Arc::new(geometry), props);
            build.parts.push((tree_parent, part, child, handle));
            continue;
        }

        let name = names
            .get(child)
            .map(|n| n.as_str().to_string())
            .unwrap_or_default();
        let index = tree.add_node(tree_parent, name, local);
        build.node_entities.push(child);
        collect_children(
            child,
            index,
            tree,
            build,
            children_query,
            names,
            transforms,
            mesh_query,
            meshes,
            materials,
        );
    }
}

fn update_loading_status(tower: Res<Tower>, mut status: ResMut<LoadingStatus>) {
    let state = tower.loading_state();
    if status.0 != state {
        status.0 = state;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sync::sync_scene;
    use tower_core::{Floor, FloorSelection, PlacementLayout, SpaceData, TowerViewer};

    /// Entities of a hand-built plan scene: STAIR_A and UNIT_101 nodes, one cube each
    pub(crate) struct PlanScene {
        pub root: Entity,
        pub unit: Entity,
        pub unit_mesh: Entity,
        pub stair_mesh: Entity,
        pub original: Handle<StandardMaterial>,
    }

    /// Headless app running mirroring then sync, expecting the environment and plan 1
    pub(crate) fn test_app() -> App {
        let mut viewer = TowerViewer::new(PlacementLayout::default(), Box::new(SpaceData::default()));
        viewer.expect_floors(vec![Floor::new(1, "First Floor").with_plan("plans/p1.glb")]);
        viewer.set_selected_floor(FloorSelection::Level(1));

        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .init_asset::<StandardMaterial>()
            .init_resource::<SceneEntities>()
            .insert_resource(Tower(viewer))
            .add_systems(Update, (mirror_models, sync_scene).chain());
        app
    }

    /// Spawn the hierarchy a glTF scene instance would leave under its root
    pub(crate) fn spawn_plan(app: &mut App, slot: ModelSlot) -> PlanScene {
        let world = app.world_mut();
        let mesh = world
            .resource_mut::<Assets<Mesh>>()
            .add(Mesh::from(Cuboid::new(1.0, 1.0, 1.0)));
        let original = world.resource_mut::<Assets<StandardMaterial>>().add(StandardMaterial {
            base_color: Color::srgb(0.2, 0.3, 0.4),
            ..default()
        });

        let root = world
            .spawn((FloorModelRoot { slot }, Transform::default(), Visibility::Hidden))
            .id();
        let stair = world
            .spawn((Name::new("STAIR_A"), Transform::default(), ChildOf(root)))
            .id();
        let stair_mesh = world
            .spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(original.clone()),
                Transform::default(),
                ChildOf(stair),
            ))
            .id();
        let unit = world
            .spawn((Name::new("UNIT_101"), Transform::from_xyz(2.0, 0.0, 0.0), ChildOf(root)))
            .id();
        let unit_mesh = world
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(original.clone()),
                Transform::from_xyz(0.0, 0.5, 0.0),
                ChildOf(unit),
            ))
            .id();

        PlanScene {
            root,
            unit,
            unit_mesh,
            stair_mesh,
            original,
        }
    }

    #[test]
    fn test_mirror_tags_units_and_fills_entity_maps() {
        let mut app = test_app();
        let plan = spawn_plan(&mut app, ModelSlot::Plan(1));
        app.update();

        let world = app.world();
        let registry = world.resource::<Tower>().registry();
        let unit = registry.unit_by_name("UNIT_101").unwrap();
        assert_eq!(unit.floor_level, 1);
        assert!(unit.hoverable);
        assert!(!registry.unit_by_name("STAIR_A").unwrap().hoverable);
        assert_eq!(registry.units().count(), 2);

        let entities = world.resource::<SceneEntities>();
        assert_eq!(entities.nodes.get(&unit.node), Some(&plan.unit));
        assert_eq!(entities.nodes.len(), 3);
        let key = MeshKey::new(unit.node, 0);
        assert_eq!(entities.meshes.get(&key), Some(&plan.unit_mesh));
        assert_eq!(entities.originals.get(&key), Some(&plan.original));
        assert_eq!(entities.meshes.len(), 2);

        // The primitive's offset is baked into the part geometry
        let bounds = registry.scene().part(key).unwrap().geometry.bounds().unwrap();
        assert!(bounds.min.y.abs() < 1e-5);
        assert!((bounds.max.y - 1.0).abs() < 1e-5);

        assert!(world.get::<Mirrored>(plan.root).is_some());
    }

    #[test]
    fn test_root_takes_placed_transform() {
        let mut app = test_app();
        let plan = spawn_plan(&mut app, ModelSlot::Plan(1));
        app.update();

        let transform = app.world().get::<Transform>(plan.root).unwrap();
        assert!((transform.translation.y - 1.08).abs() < 1e-5);
        assert!(transform.translation.x.abs() < 1e-5);
    }

    #[test]
    fn test_root_without_children_waits() {
        let mut app = test_app();
        let root = app
            .world_mut()
            .spawn((FloorModelRoot { slot: ModelSlot::Plan(1) }, Transform::default()))
            .id();
        app.update();

        assert!(app.world().get::<Mirrored>(root).is_none());
        assert_eq!(app.world().resource::<Tower>().registry().units().count(), 0);
    }

    #[test]
    fn test_duplicate_slot_is_despawned() {
        let mut app = test_app();
        let first = spawn_plan(&mut app, ModelSlot::Plan(1));
        app.update();
        let duplicate = spawn_plan(&mut app, ModelSlot::Plan(1));
        app.update();

        assert!(app.world().get_entity(duplicate.root).is_err());
        assert!(app.world().get_entity(first.root).is_ok());
        assert_eq!(app.world().resource::<Tower>().registry().units().count(), 2);
        assert_eq!(app.world().resource::<SceneEntities>().meshes.len(), 2);
    }
}
