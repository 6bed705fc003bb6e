//! Configuration loading

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tower_core::{FloorSelection, PlacementLayout, ALL_FLOORS_SENTINEL};
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub layout: PlacementLayout,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory the asset server reads models from
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Environment (site) model, relative to `root`
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Floor metadata JSON
    #[serde(default = "default_floors")]
    pub floors: PathBuf,
    /// Unit display data JSON; optional
    #[serde(default = "default_spaces")]
    pub spaces: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            environment: default_environment(),
            floors: default_floors(),
            spaces: default_spaces(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("assets")
}

fn default_environment() -> String {
    "models/environment.glb".to_string()
}

fn default_floors() -> PathBuf {
    PathBuf::from("assets/data/floors.json")
}

fn default_spaces() -> PathBuf {
    PathBuf::from("assets/data/spaces.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Window title
    #[serde(default = "default_title")]
    pub title: String,
    /// Floor shown at startup; -1 shows every floor
    #[serde(default = "default_initial_floor")]
    pub initial_floor: i32,
    /// How far the hover label sits above the unit, in pixels
    #[serde(default = "default_label_lift")]
    pub label_lift: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            initial_floor: default_initial_floor(),
            label_lift: default_label_lift(),
        }
    }
}

impl ViewerConfig {
    pub fn initial_selection(&self) -> FloorSelection {
        FloorSelection::from_sentinel(self.initial_floor)
    }
}

fn default_title() -> String {
    "Tower Viewer".to_string()
}

fn default_initial_floor() -> i32 {
    ALL_FLOORS_SENTINEL
}

fn default_label_lift() -> f32 {
    120.0
}

/// Load configuration from file; a missing file yields defaults
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}
