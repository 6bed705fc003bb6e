//! Per-frame floor selection, hover and click handling

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use tower_core::{FrameInput, Viewport};

use crate::camera::MainCamera;
use crate::convert::view_camera;
use crate::{ClickedUnit, HoverLabelState, ModalOpen, PointerOverUi, SelectedFloor, Tower, TowerSet};

/// Movement beyond which a touch is a drag rather than a tap, in pixels
const TAP_SLOP: f32 = 10.0;

pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TouchState>()
            .add_systems(Update, apply_floor_selection.in_set(TowerSet::Select))
            .add_systems(
                Update,
                (hover_tick, handle_clicks).chain().in_set(TowerSet::Resolve),
            );
    }
}

/// Track touch state for tap detection
#[derive(Resource, Default, Debug)]
pub struct TouchState {
    /// Position where touch started
    start_position: Option<Vec2>,
    /// Whether this touch has moved far enough to be a drag
    is_dragging: bool,
}

impl TouchState {
    fn press(&mut self, position: Vec2) {
        self.start_position = Some(position);
        self.is_dragging = false;
    }

    fn moved(&mut self, position: Vec2) {
        if let Some(start) = self.start_position {
            if position.distance(start) > TAP_SLOP {
                self.is_dragging = true;
            }
        }
    }

    /// End the touch; returns the tap position unless it was a drag
    fn release(&mut self) -> Option<Vec2> {
        let tap = self.start_position.filter(|_| !self.is_dragging);
        self.start_position = None;
        self.is_dragging = false;
        tap
    }
}

/// Cursor position to NDC; `None` outside the viewport
pub fn pointer_ndc(cursor: Vec2, viewport: &Viewport) -> Option<Vec2> {
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return None;
    }
    let inside = (0.0..=viewport.width).contains(&cursor.x) && (0.0..=viewport.height).contains(&cursor.y);
    inside.then(|| viewport.pixels_to_ndc(cursor))
}

/// Build the core's frame input from the main camera and a cursor position
fn frame_input(
    camera: &Camera,
    transform: &GlobalTransform,
    cursor: Option<Vec2>,
    modal_open: bool,
) -> Option<FrameInput> {
    let size = camera.logical_viewport_size()?;
    let viewport = Viewport::new(size.x, size.y);
    Some(FrameInput {
        pointer_ndc: cursor.and_then(|c| pointer_ndc(c, &viewport)),
        camera: view_camera(camera, transform),
        viewport,
        modal_open,
    })
}

/// Push the UI's floor request into the core
fn apply_floor_selection(mut tower: ResMut<Tower>, selected: Res<SelectedFloor>) {
    if selected.is_changed() && tower.selected_floor() != selected.0 {
        tower.set_selected_floor(selected.0);
    }
}

fn hover_tick(
    mut tower: ResMut<Tower>,
    mut label: ResMut<HoverLabelState>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    modal: Res<ModalOpen>,
    pointer_over_ui: Res<PointerOverUi>,
) {
    let Ok((camera, transform)) = camera_query.single() else {
        return;
    };
    let cursor = windows
        .single()
        .ok()
        .and_then(|window| window.cursor_position())
        .filter(|_| !pointer_over_ui.0);
    let Some(input) = frame_input(camera, transform, cursor, modal.0) else {
        return;
    };

    let output = tower.tick(&input);
    if output.label != label.0 {
        label.0 = output.label;
    }
}

/// Resolve a mouse click or touch tap on a unit
#[allow(clippy::too_many_arguments)]
fn handle_clicks(
    mut tower: ResMut<Tower>,
    mut clicked: ResMut<ClickedUnit>,
    mut touch_state: ResMut<TouchState>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    modal: Res<ModalOpen>,
    pointer_over_ui: Res<PointerOverUi>,
) {
    let mut click_pos: Option<Vec2> = None;

    if let Some(touch) = touch_input.iter().next() {
        if touch_input.just_pressed(touch.id()) {
            touch_state.press(touch.position());
        } else {
            touch_state.moved(touch.position());
        }
    }
    if touch_input.iter_just_released().next().is_some() {
        click_pos = touch_state.release();
    }

    if mouse_button.just_pressed(MouseButton::Left) {
        if let Ok(window) = windows.single() {
            click_pos = window.cursor_position().or(click_pos);
        }
    }

    let Some(pos) = click_pos else {
        return;
    };
    if pointer_over_ui.0 {
        return;
    }
    let Ok((camera, transform)) = camera_query.single() else {
        return;
    };
    let Some(input) = frame_input(camera, transform, Some(pos), modal.0) else {
        return;
    };

    if let Some(target) = tower.click(&input) {
        clicked.0 = Some(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_ndc_inside_and_outside() {
        let viewport = Viewport::new(800.0, 600.0);
        assert_eq!(pointer_ndc(Vec2::new(400.0, 300.0), &viewport), Some(Vec2::ZERO));
        assert_eq!(pointer_ndc(Vec2::new(0.0, 0.0), &viewport), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(pointer_ndc(Vec2::new(900.0, 300.0), &viewport), None);
        assert_eq!(pointer_ndc(Vec2::ZERO, &Viewport::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_tap_fires_on_release() {
        let mut touch = TouchState::default();
        touch.press(Vec2::new(100.0, 100.0));
        touch.moved(Vec2::new(104.0, 103.0));
        assert_eq!(touch.release(), Some(Vec2::new(100.0, 100.0)));
        assert_eq!(touch.release(), None);
    }

    #[test]
    fn test_drag_is_not_a_tap() {
        let mut touch = TouchState::default();
        touch.press(Vec2::new(100.0, 100.0));
        touch.moved(Vec2::new(130.0, 100.0));
        touch.moved(Vec2::new(101.0, 100.0));
        assert_eq!(touch.release(), None);
    }
}
