//! Bevy application setup

use anyhow::Result;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::DefaultPickingPlugins;
use tower_core::{Floor, SpaceData, TowerViewer};
use tower_scene::{BuildingManifest, SelectedFloor, Tower, TowerScenePlugin};

use crate::config::Config;
use crate::ui::{UiPlugin, UiSettings, UnitRecords};

/// Build the viewer core and run the window until it closes
pub fn run(config: Config, floors: Vec<Floor>, spaces: SpaceData) -> Result<()> {
    let initial = config.viewer.initial_selection();

    let mut viewer = TowerViewer::new(config.layout.clone(), Box::new(spaces.clone()));
    viewer.on_loading(Box::new(|state| {
        tracing::debug!(percent = state.percent, loading = state.loading, "Loading progress");
    }));
    viewer.set_selected_floor(initial);

    let exit = App::new()
        .insert_resource(ClearColor(Color::srgb(0.72, 0.8, 0.88)))
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: config.viewer.title.clone(),
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    file_path: config.assets.root.to_string_lossy().into_owned(),
                    // Building models ship without .meta files
                    meta_check: bevy::asset::AssetMetaCheck::Never,
                    ..default()
                }),
        )
        // Must come before EguiPlugin so egui can block picking under its windows
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(EguiPlugin::default())
        .insert_resource(Tower(viewer))
        .insert_resource(BuildingManifest {
            environment: config.assets.environment.clone(),
            floors,
        })
        .insert_resource(SelectedFloor(initial))
        .insert_resource(UnitRecords(spaces))
        .insert_resource(UiSettings {
            label_lift: config.viewer.label_lift,
        })
        .add_plugins(TowerScenePlugin)
        .add_plugins(UiPlugin)
        .run();

    match exit {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => anyhow::bail!("Viewer exited with code {}", code),
    }
}
