//! Units: the clickable and hoverable parts of floor models

use serde::{Deserialize, Serialize};

use crate::scene::NodeId;

/// Name fragments marking common areas (hallways, lobbies, utility rooms).
/// Matching is a case-sensitive substring test on the authored mesh name.
pub const COMMON_AREA_KEYWORDS: [&str; 10] = [
    "HALL",
    "LOBBY",
    "ENTRANCE",
    "ELECTRICAL",
    "GUARD",
    "GARBAGE",
    "TELECOM",
    "GROUND1",
    "STAIR",
    "CORRIDOR",
];

/// Whether a plan part with this name may be highlighted on hover
pub fn is_hoverable_name(name: &str) -> bool {
    !COMMON_AREA_KEYWORDS
        .iter()
        .any(|keyword| name.contains(keyword))
}

/// Which kind of floor model a unit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    Structure,
    Plan,
}

/// A leaf part of a floor model, tagged once at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// Scene node carrying the unit's meshes
    pub node: NodeId,
    /// Authored name; also the key into the unit display data
    pub name: String,
    pub floor_level: i32,
    pub category: UnitCategory,
    pub hoverable: bool,
}

impl Unit {
    pub fn new(node: NodeId, name: impl Into<String>, floor_level: i32, category: UnitCategory) -> Self {
        let name = name.into();
        let hoverable = category == UnitCategory::Plan && is_hoverable_name(&name);
        Self {
            node,
            name,
            floor_level,
            category,
            hoverable,
        }
    }

    /// Only plan units take part in pointer interaction
    pub fn is_clickable(&self) -> bool {
        self.category == UnitCategory::Plan
    }
}
