//! Tower Core - Floor visibility and unit interaction engine
//!
//! This crate holds the engine-independent logic of the building viewer:
//! - Floor metadata and floor selection (single level or all floors)
//! - A scene side-table mirroring loaded models, with units tagged per floor
//! - Asset registry and async loading orchestration with progress reporting
//! - Floor visibility, pointer resolution, hover highlighting and click resolution
//!
//! Rendering engines (see `tower-scene`) mirror their scene graph into the
//! registry and apply the visibility and material changes it records.

pub mod click;
pub mod data;
pub mod floor;
pub mod geometry;
pub mod hover;
pub mod layout;
pub mod loader;
pub mod material;
pub mod picking;
pub mod registry;
pub mod scene;
pub mod selection;
pub mod unit;
pub mod viewer;
pub mod visibility;

pub use click::{resolve_click, ClickTarget, MAX_ANCESTOR_DEPTH};
pub use data::{
    load_floors, parse_floors, DataError, FloorRecord, RecordId, SpaceData, SpaceRecord, UnitDirectory,
    UnitDisplay, PLACEHOLDER,
};
pub use floor::{Floor, FloorSelection, ALL_FLOORS_SENTINEL};
pub use geometry::{Aabb, MeshGeometry, Ray, ViewCamera, Viewport};
pub use hover::{HoverLabel, HoverPresenter, HoverTransition, LabelAnchor};
pub use layout::{PlacementLayout, PlanHeight};
pub use loader::{
    BuildingLoader, LoadError, LoadFailure, LoadProgress, LoadReport, LoadTracker, LoadingState, ModelSource,
};
pub use material::{hex_color, MaterialId, MaterialLibrary, MaterialProps};
pub use picking::{raycast_visible, resolve_pointer, RayHit};
pub use registry::{AssetRegistry, AttachedModel, LoadedFloorAssets, ModelKind, ModelSlot, RegistryError};
pub use scene::{MeshKey, MeshPart, ModelNode, ModelPart, ModelTree, NodeId, SceneChanges, SceneGraph, SceneNode};
pub use selection::ActiveSelection;
pub use unit::{is_hoverable_name, Unit, UnitCategory, COMMON_AREA_KEYWORDS};
pub use viewer::{ClickCallback, FrameInput, FrameOutput, LoadingCallback, TowerViewer};
pub use visibility::FloorVisibility;
