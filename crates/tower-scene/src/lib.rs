//! Tower Scene - Bevy integration for the building viewer
//!
//! Loads the environment and floor models through the `AssetServer`,
//! mirrors each spawned glTF hierarchy into the `tower-core` registry, and
//! runs the per-frame interaction in a fixed order:
//! load → floor selection → hover/click resolution → scene sync.

pub mod camera;
pub mod convert;
pub mod interaction;
pub mod loading;
pub mod sync;

use bevy::prelude::*;
use tower_core::{ClickTarget, Floor, FloorSelection, HoverLabel, LoadingState, TowerViewer};

pub use camera::{CameraSettings, MainCamera};
pub use loading::{FloorModelRoot, SceneEntities};

/// The viewer core, owned by the ECS world
#[derive(Resource, Deref, DerefMut)]
pub struct Tower(pub TowerViewer);

/// Models to load at startup
#[derive(Resource, Debug, Clone, Default)]
pub struct BuildingManifest {
    /// Environment (site) model path, relative to the asset root
    pub environment: String,
    pub floors: Vec<Floor>,
}

/// Floor selection requested by the UI; applied before hover resolution
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectedFloor(pub FloorSelection);

/// Set while a unit detail view is open; suspends hover and click
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModalOpen(pub bool);

/// Set by the UI layer when the pointer is over an overlay
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerOverUi(pub bool);

/// Label of the hovered unit for the current frame
#[derive(Resource, Debug, Clone, Default)]
pub struct HoverLabelState(pub Option<HoverLabel>);

/// Unit clicked this frame, taken by the UI
#[derive(Resource, Debug, Clone, Default)]
pub struct ClickedUnit(pub Option<ClickTarget>);

/// Loading progress for the overlay
#[derive(Resource, Debug, Clone, Copy)]
pub struct LoadingStatus(pub LoadingState);

impl Default for LoadingStatus {
    fn default() -> Self {
        Self(LoadingState {
            loading: true,
            percent: 0,
        })
    }
}

/// Frame phases, chained in `Update`
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TowerSet {
    Load,
    Select,
    Resolve,
    Sync,
}

/// Plugin that wires the building viewer into a Bevy app.
///
/// Expects [`Tower`] and [`BuildingManifest`] to be inserted by the host.
pub struct TowerScenePlugin;

impl Plugin for TowerScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SelectedFloor>()
            .init_resource::<ModalOpen>()
            .init_resource::<PointerOverUi>()
            .init_resource::<HoverLabelState>()
            .init_resource::<ClickedUnit>()
            .init_resource::<LoadingStatus>()
            .configure_sets(
                Update,
                (TowerSet::Load, TowerSet::Select, TowerSet::Resolve, TowerSet::Sync).chain(),
            )
            .add_plugins(camera::CameraPlugin)
            .add_plugins(loading::LoadingPlugin)
            .add_plugins(interaction::InteractionPlugin)
            .add_plugins(sync::SyncPlugin);
    }
}
