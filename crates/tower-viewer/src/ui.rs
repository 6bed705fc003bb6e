//! UI overlays using bevy_egui

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use tower_core::{ClickTarget, FloorSelection, HoverLabel, SpaceData, SpaceRecord, PLACEHOLDER};
use tower_scene::{ClickedUnit, HoverLabelState, LoadingStatus, ModalOpen, PointerOverUi, SelectedFloor, Tower};

/// Unit records shown in the detail panel
#[derive(Resource, Debug, Clone, Default)]
pub struct UnitRecords(pub SpaceData);

#[derive(Resource, Debug, Clone)]
pub struct UiSettings {
    /// Distance from the unit's centre up to the bottom of its label, in pixels
    pub label_lift: f32,
}

/// Unit whose detail panel is open
#[derive(Resource, Debug, Clone, Default)]
pub struct UnitDetail(pub Option<ClickTarget>);

/// Grouped system parameters for the overlay system
#[derive(SystemParam)]
pub struct UiParams<'w, 's> {
    pub contexts: EguiContexts<'w, 's>,
    pub tower: Res<'w, Tower>,
    pub selected: ResMut<'w, SelectedFloor>,
    pub modal: ResMut<'w, ModalOpen>,
    pub pointer_over_ui: ResMut<'w, PointerOverUi>,
    pub label: Res<'w, HoverLabelState>,
    pub clicked: ResMut<'w, ClickedUnit>,
    pub detail: ResMut<'w, UnitDetail>,
    pub loading: Res<'w, LoadingStatus>,
    pub records: Res<'w, UnitRecords>,
    pub settings: Res<'w, UiSettings>,
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<UnitDetail>()
            .add_systems(Update, open_clicked_unit)
            .add_systems(EguiPrimaryContextPass, ui_system);
    }
}

/// A clicked unit opens its detail panel, which suspends hover and click
fn open_clicked_unit(
    mut clicked: ResMut<ClickedUnit>,
    mut detail: ResMut<UnitDetail>,
    mut modal: ResMut<ModalOpen>,
) {
    if let Some(target) = clicked.0.take() {
        tracing::info!(unit = %target.name, "Opening unit details");
        detail.0 = Some(target);
        modal.0 = true;
    }
}

fn ui_system(mut params: UiParams) {
    let Ok(ctx) = params.contexts.ctx_mut() else { return };

    floor_controls(ctx, &params.tower, &mut params.selected);

    if params.loading.0.loading {
        let percent = params.loading.0.percent;
        egui::Window::new("Loading")
            .title_bar(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -40.0))
            .show(ctx, |ui| {
                ui.label(format!("Loading building… {}%", percent));
                ui.add(egui::ProgressBar::new(percent as f32 / 100.0).desired_width(240.0));
            });
    }

    if let Some(label) = &params.label.0 {
        hover_label(ctx, label, params.settings.label_lift);
    }

    let mut close = false;
    if let Some(target) = &params.detail.0 {
        let rows = detail_rows(target, params.records.0.get(&target.name));
        egui::Window::new(target.name.clone())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                egui::Grid::new("unit_detail").num_columns(2).show(ui, |ui| {
                    for (key, value) in &rows {
                        ui.strong(key);
                        ui.label(value);
                        ui.end_row();
                    }
                });
                ui.separator();
                if ui.button("Close").clicked() {
                    close = true;
                }
            });
    }
    if close {
        params.detail.0 = None;
        params.modal.0 = false;
    }

    let over_ui = ctx.wants_pointer_input() || ctx.is_pointer_over_area();
    params.pointer_over_ui.set_if_neq(PointerOverUi(over_ui));
}

/// Up/down stepping, the floor indicator and the all-floors toggle
fn floor_controls(ctx: &egui::Context, tower: &Tower, selected: &mut SelectedFloor) {
    let levels = tower.levels();
    let current = selected.0;
    let (line1, line2) = current.indicator(tower.floors());

    egui::Area::new(egui::Id::new("floor_controls"))
        .anchor(egui::Align2::RIGHT_CENTER, egui::vec2(-16.0, 0.0))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    if ui
                        .add_enabled(current.can_step_up(&levels), egui::Button::new("▲"))
                        .clicked()
                    {
                        selected.0 = current.step_up(&levels);
                    }
                    ui.heading(line1);
                    ui.small(line2);
                    if ui
                        .add_enabled(current.can_step_down(&levels), egui::Button::new("▼"))
                        .clicked()
                    {
                        selected.0 = current.step_down(&levels);
                    }
                    ui.separator();
                    if ui
                        .selectable_label(current.is_all(), "All floors")
                        .clicked()
                    {
                        selected.0 = FloorSelection::All;
                    }
                });
            });
        });
}

fn hover_label(ctx: &egui::Context, label: &HoverLabel, lift: f32) {
    let Some(anchor) = label.anchor else {
        return;
    };
    egui::Area::new(egui::Id::new("hover_label"))
        .order(egui::Order::Tooltip)
        .interactable(false)
        .pivot(egui::Align2::CENTER_BOTTOM)
        .fixed_pos(egui::pos2(anchor.pixels.x, anchor.pixels.y - lift))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.strong(&label.unit_name);
                ui.label(format!("Type: {}", label.unit_type));
                ui.label(format!("Area: {}", label.area));
            });
        });
}

/// Key/value rows for the detail panel; missing values show the placeholder
fn detail_rows(target: &ClickTarget, record: Option<&SpaceRecord>) -> Vec<(String, String)> {
    let text = |value: Option<&String>| value.cloned().unwrap_or_else(|| PLACEHOLDER.to_string());

    let mut rows = vec![
        ("Unit".to_string(), target.name.clone()),
        ("Floor".to_string(), target.floor_level.to_string()),
        ("Type".to_string(), text(record.and_then(|r| r.unit_type.as_ref()))),
        ("Area".to_string(), text(record.and_then(|r| r.area.as_ref()))),
        ("Status".to_string(), text(record.and_then(|r| r.status.as_ref()))),
    ];
    if let Some(record) = record {
        for (key, value) in &record.extra {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => PLACEHOLDER.to_string(),
                other => other.to_string(),
            };
            rows.push((key.clone(), value));
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_core::NodeId;

    fn target() -> ClickTarget {
        ClickTarget {
            node: NodeId::from_index(4),
            name: "UNIT_101".to_string(),
            floor_level: 1,
        }
    }

    #[test]
    fn test_detail_rows_without_record() {
        let rows = detail_rows(&target(), None);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], ("Unit".to_string(), "UNIT_101".to_string()));
        assert_eq!(rows[1].1, "1");
        assert!(rows[2..].iter().all(|(_, value)| value == PLACEHOLDER));
    }

    #[test]
    fn test_detail_rows_include_extra_fields() {
        let data = SpaceData::parse(
            r#"{"UNIT_101": {"type": "Two Bedroom", "area": "92 m2", "status": "available", "price": 420000}}"#,
        )
        .unwrap();
        let rows = detail_rows(&target(), data.get("UNIT_101"));
        assert!(rows.contains(&("Type".to_string(), "Two Bedroom".to_string())));
        assert!(rows.contains(&("Status".to_string(), "available".to_string())));
        assert!(rows.contains(&("price".to_string(), "420000".to_string())));
    }
}
