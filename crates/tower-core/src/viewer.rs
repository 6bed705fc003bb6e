//! Frame driver tying the registry, floor selection and hover state together

use glam::Vec2;
use tracing::{debug, info, warn};

use crate::click::{resolve_click, ClickTarget};
use crate::data::UnitDirectory;
use crate::floor::{Floor, FloorSelection};
use crate::geometry::{Ray, ViewCamera, Viewport};
use crate::hover::{HoverLabel, HoverPresenter, HoverTransition};
use crate::layout::PlacementLayout;
use crate::loader::{LoadError, LoadTracker, LoadingState};
use crate::picking::resolve_pointer;
use crate::registry::{AssetRegistry, AttachedModel, ModelSlot, RegistryError};
use crate::scene::{ModelTree, NodeId, SceneChanges};
use crate::selection::ActiveSelection;
use crate::visibility::FloorVisibility;

pub type ClickCallback = Box<dyn FnMut(&ClickTarget) + Send + Sync>;
pub type LoadingCallback = Box<dyn FnMut(LoadingState) + Send + Sync>;

/// Per-frame input from the host
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    /// Pointer in normalized device coordinates; `None` when outside the view
    pub pointer_ndc: Option<Vec2>,
    pub camera: ViewCamera,
    pub viewport: Viewport,
    pub modal_open: bool,
}

impl FrameInput {
    pub fn pointer_ray(&self) -> Option<Ray> {
        self.pointer_ndc.map(|ndc| self.camera.ray_from_ndc(ndc))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutput {
    /// Set only on frames where the hovered unit changed
    pub transition: Option<HoverTransition>,
    /// Label of the hovered unit, recomputed every frame
    pub label: Option<HoverLabel>,
}

/// The interactive building viewer core
pub struct TowerViewer {
    registry: AssetRegistry,
    selection: ActiveSelection,
    presenter: HoverPresenter,
    directory: Box<dyn UnitDirectory + Send + Sync>,
    floors: Vec<Floor>,
    tracker: LoadTracker,
    on_click: Option<ClickCallback>,
    on_loading: Option<LoadingCallback>,
}

impl TowerViewer {
    pub fn new(layout: PlacementLayout, directory: Box<dyn UnitDirectory + Send + Sync>) -> Self {
        Self::from_registry(AssetRegistry::new(layout), directory)
    }

    /// Wrap a registry filled by [`crate::BuildingLoader`]
    pub fn from_registry(registry: AssetRegistry, directory: Box<dyn UnitDirectory + Send + Sync>) -> Self {
        let mut viewer = Self {
            registry,
            selection: ActiveSelection::default(),
            presenter: HoverPresenter::new(),
            directory,
            floors: Vec::new(),
            tracker: LoadTracker::default(),
            on_click: None,
            on_loading: None,
        };
        viewer.apply_selection();
        viewer
    }

    pub fn on_click(&mut self, callback: ClickCallback) {
        self.on_click = Some(callback);
    }

    pub fn on_loading(&mut self, callback: LoadingCallback) {
        self.on_loading = Some(callback);
    }

    /// Declare the building's floors; the loading total is derived from them
    pub fn expect_floors(&mut self, floors: Vec<Floor>) {
        self.tracker = LoadTracker::for_building(&floors);
        self.floors = floors;
        self.emit_loading();
    }

    pub fn floors(&self) -> &[Floor] {
        &self.floors
    }

    /// Known levels in ascending order
    pub fn levels(&self) -> Vec<i32> {
        let mut levels: Vec<i32> = self.floors.iter().map(|f| f.level).collect();
        levels.sort_unstable();
        levels.dedup();
        levels
    }

    /// Attach a model that finished loading and re-apply the current
    /// selection so it takes the right visibility at once
    pub fn attach_model(&mut self, slot: ModelSlot, tree: ModelTree) -> Result<AttachedModel, RegistryError> {
        let attached = self.registry.attach(slot, tree);
        self.tracker.settle(attached.is_ok());
        if let Err(e) = &attached {
            warn!(slot = %slot, "Model not attached: {}", e);
        }
        self.apply_selection();
        self.after_settle();
        attached
    }

    /// Count a model that failed to load
    pub fn record_failure(&mut self, slot: ModelSlot, error: &LoadError) {
        warn!(slot = %slot, "Model failed to load: {}", error);
        self.tracker.settle(false);
        self.after_settle();
    }

    fn after_settle(&mut self) {
        if self.tracker.is_complete() {
            self.registry.mark_ready();
        }
        self.emit_loading();
    }

    fn emit_loading(&mut self) {
        let state = self.loading_state();
        if let Some(callback) = self.on_loading.as_mut() {
            callback(state);
        }
    }

    pub fn loading_state(&self) -> LoadingState {
        LoadingState::from(self.tracker.progress())
    }

    pub fn is_ready(&self) -> bool {
        self.registry.is_ready()
    }

    pub fn selected_floor(&self) -> FloorSelection {
        self.selection.selected
    }

    pub fn set_selected_floor(&mut self, selected: FloorSelection) {
        if selected != self.selection.selected {
            info!(selection = %selected, "Floor selected");
        }
        self.selection.selected = selected;
        self.apply_selection();
    }

    pub fn step_up(&mut self) {
        let next = self.selection.selected.step_up(&self.levels());
        self.set_selected_floor(next);
    }

    pub fn step_down(&mut self) {
        let next = self.selection.selected.step_down(&self.levels());
        self.set_selected_floor(next);
    }

    /// Recompute visibility and the active list; a hovered unit that is no
    /// longer active is un-highlighted in the same call
    fn apply_selection(&mut self) {
        let active = FloorVisibility::apply(&mut self.registry, self.selection.selected);
        if let Some(stale) = self.selection.replace_active(active) {
            self.presenter.transition(&mut self.registry, Some(stale), None);
            self.selection.hovered = None;
        }
    }

    /// Resolve hover for one frame, then update materials, then the label
    pub fn tick(&mut self, input: &FrameInput) -> FrameOutput {
        let resolved = if !self.registry.is_ready() || input.modal_open {
            None
        } else {
            input
                .pointer_ray()
                .and_then(|ray| resolve_pointer(&self.registry, &self.selection.active_units, &ray))
        };

        let previous = self.selection.hovered;
        let transition = (resolved != previous).then(|| {
            self.presenter.transition(&mut self.registry, previous, resolved);
            self.selection.hovered = resolved;
            debug!(from = ?previous, to = ?resolved, "Hovered unit changed");
            HoverTransition {
                from: previous,
                to: resolved,
            }
        });

        let label = resolved.and_then(|unit| {
            self.presenter.label(
                &self.registry,
                unit,
                &input.camera,
                &input.viewport,
                self.directory.as_ref(),
            )
        });

        FrameOutput { transition, label }
    }

    /// Resolve a click and notify the click callback; nothing resolves
    /// until every model has settled
    pub fn click(&mut self, input: &FrameInput) -> Option<ClickTarget> {
        if !self.registry.is_ready() {
            return None;
        }
        let ray = input.pointer_ray();
        let target = resolve_click(&self.registry, &self.selection, input.modal_open, ray.as_ref())?;
        info!(unit = %target.name, level = target.floor_level, "Unit clicked");
        if let Some(callback) = self.on_click.as_mut() {
            callback(&target);
        }
        Some(target)
    }

    /// Restore every highlighted material
    pub fn teardown(&mut self) {
        self.presenter.restore_all(&mut self.registry);
        self.selection.hovered = None;
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.selection.hovered
    }

    pub fn active_units(&self) -> &[NodeId] {
        &self.selection.active_units
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn presenter(&self) -> &HoverPresenter {
        &self.presenter
    }

    /// Scene edits since the last call, for the rendering adapter
    pub fn take_changes(&mut self) -> SceneChanges {
        self.registry.take_changes()
    }
}
