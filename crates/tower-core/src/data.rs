//! Floor metadata and unit display data
//!
//! Both sources are JSON documents produced by the building database:
//! - floors: an array of `{ id, name, level, floor_model_path, plan_model_path }`
//! - space data: an object keyed by unit name, `{ type, area, ... }`

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::floor::Floor;

/// Shown when a unit has no display data
pub const PLACEHOLDER: &str = "N/A";

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Database ids arrive as either strings or integers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

/// One row of the floor metadata source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub name: String,
    pub level: i32,
    #[serde(default)]
    pub floor_model_path: Option<String>,
    #[serde(default)]
    pub plan_model_path: Option<String>,
}

fn non_empty(path: Option<String>) -> Option<String> {
    path.filter(|p| !p.trim().is_empty())
}

impl From<FloorRecord> for Floor {
    fn from(record: FloorRecord) -> Self {
        Floor {
            level: record.level,
            name: record.name,
            structure_asset: non_empty(record.floor_model_path),
            plan_asset: non_empty(record.plan_model_path),
        }
    }
}

/// Parse floor records, ordered by level. Later duplicates of a level are dropped.
pub fn parse_floors(json: &str) -> Result<Vec<Floor>, DataError> {
    let records: Vec<FloorRecord> = serde_json::from_str(json)?;
    let mut floors: Vec<Floor> = records.into_iter().map(Floor::from).collect();
    floors.sort_by_key(|floor| floor.level);

    let before = floors.len();
    floors.dedup_by(|later, earlier| {
        let duplicate = later.level == earlier.level;
        if duplicate {
            warn!(level = later.level, name = %later.name, "Ignoring duplicate floor level");
        }
        duplicate
    });
    debug!(floors = floors.len(), dropped = before - floors.len(), "Parsed floor metadata");
    Ok(floors)
}

pub fn load_floors(path: &Path) -> Result<Vec<Floor>, DataError> {
    let json = std::fs::read_to_string(path)?;
    parse_floors(&json)
}

/// Display data of one unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default, rename = "type")]
    pub unit_type: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Remaining fields (room areas, images), kept for the detail view
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Unit display data keyed by unit name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceData {
    pub spaces: HashMap<String, SpaceRecord>,
}

impl SpaceData {
    pub fn parse(json: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, DataError> {
        let json = std::fs::read_to_string(path)?;
        Self::parse(&json)
    }

    pub fn get(&self, name: &str) -> Option<&SpaceRecord> {
        self.spaces.get(name)
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }
}

/// Label strings for a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDisplay {
    pub unit_type: String,
    pub area: String,
}

impl Default for UnitDisplay {
    fn default() -> Self {
        Self {
            unit_type: PLACEHOLDER.to_string(),
            area: PLACEHOLDER.to_string(),
        }
    }
}

/// Lookup of label data by unit name; missing data is never an error
pub trait UnitDirectory {
    fn describe(&self, name: &str) -> UnitDisplay;
}

fn or_placeholder(value: Option<&String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

impl UnitDirectory for SpaceData {
    fn describe(&self, name: &str) -> UnitDisplay {
        match self.get(name) {
            Some(record) => UnitDisplay {
                unit_type: or_placeholder(record.unit_type.as_ref()),
                area: or_placeholder(record.area.as_ref()),
            },
            None => UnitDisplay::default(),
        }
    }
}
