//! Building floors and floor selection

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::registry::ModelSlot;

/// Selection value meaning "every floor" in the integer wire form
pub const ALL_FLOORS_SENTINEL: i32 = -1;

/// One building level, as delivered by the floor metadata source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    /// Level number; the identity key for floors, models and units
    pub level: i32,
    /// Display name (e.g. "Ground Floor")
    pub name: String,
    /// Structure (building shell) model path
    pub structure_asset: Option<String>,
    /// Floor plan model path (contains the clickable units)
    pub plan_asset: Option<String>,
}

impl Floor {
    pub fn new(level: i32, name: impl Into<String>) -> Self {
        Self {
            level,
            name: name.into(),
            structure_asset: None,
            plan_asset: None,
        }
    }

    pub fn with_structure(mut self, path: impl Into<String>) -> Self {
        self.structure_asset = Some(path.into());
        self
    }

    pub fn with_plan(mut self, path: impl Into<String>) -> Self {
        self.plan_asset = Some(path.into());
        self
    }

    /// Asset slots this floor wants loaded, structure first
    pub fn asset_slots(&self) -> impl Iterator<Item = (ModelSlot, &str)> {
        let structure = self
            .structure_asset
            .as_deref()
            .map(|path| (ModelSlot::Structure(self.level), path));
        let plan = self
            .plan_asset
            .as_deref()
            .map(|path| (ModelSlot::Plan(self.level), path));
        structure.into_iter().chain(plan)
    }

    /// Number of model files this floor contributes to a load
    pub fn asset_count(&self) -> usize {
        self.asset_slots().count()
    }

    /// First word of the floor name, used by the compact floor indicator
    pub fn short_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }
}

/// The floor the user is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum FloorSelection {
    /// Every loaded floor is shown and interactive
    #[default]
    All,
    /// A single level, with the structure of lower levels kept as a cutaway
    Level(i32),
}

impl FloorSelection {
    pub fn from_sentinel(value: i32) -> Self {
        if value == ALL_FLOORS_SENTINEL {
            FloorSelection::All
        } else {
            FloorSelection::Level(value)
        }
    }

    pub fn to_sentinel(self) -> i32 {
        match self {
            FloorSelection::All => ALL_FLOORS_SENTINEL,
            FloorSelection::Level(level) => level,
        }
    }

    pub fn level(self) -> Option<i32> {
        match self {
            FloorSelection::All => None,
            FloorSelection::Level(level) => Some(level),
        }
    }

    pub fn is_all(self) -> bool {
        matches!(self, FloorSelection::All)
    }

    /// Move one level up through `levels` (ascending).
    ///
    /// From `All` (or a level not in the list) this selects the lowest level;
    /// at the top level the selection is unchanged.
    pub fn step_up(self, levels: &[i32]) -> Self {
        let Some(&lowest) = levels.first() else {
            return self;
        };
        match self.position_in(levels) {
            Some(index) => levels
                .get(index + 1)
                .map(|&level| FloorSelection::Level(level))
                .unwrap_or(self),
            None => FloorSelection::Level(lowest),
        }
    }

    /// Move one level down through `levels` (ascending).
    ///
    /// From `All` (or a level not in the list) this selects the lowest level;
    /// at the bottom level the selection is unchanged.
    pub fn step_down(self, levels: &[i32]) -> Self {
        let Some(&lowest) = levels.first() else {
            return self;
        };
        match self.position_in(levels) {
            Some(index) if index > 0 => FloorSelection::Level(levels[index - 1]),
            Some(_) => self,
            None => FloorSelection::Level(lowest),
        }
    }

    pub fn can_step_up(self, levels: &[i32]) -> bool {
        self.step_up(levels) != self
    }

    pub fn can_step_down(self, levels: &[i32]) -> bool {
        self.step_down(levels) != self
    }

    /// Two-line floor indicator text: ("ALL", "FLOORS") or (level, short name)
    pub fn indicator(self, floors: &[Floor]) -> (String, String) {
        match self {
            FloorSelection::All => ("ALL".to_string(), "FLOORS".to_string()),
            FloorSelection::Level(level) => {
                let name = floors
                    .iter()
                    .find(|f| f.level == level)
                    .map(|f| f.short_name().to_string())
                    .unwrap_or_default();
                (level.to_string(), name)
            }
        }
    }

    fn position_in(self, levels: &[i32]) -> Option<usize> {
        let level = self.level()?;
        levels.iter().position(|&l| l == level)
    }
}

impl From<i32> for FloorSelection {
    fn from(value: i32) -> Self {
        FloorSelection::from_sentinel(value)
    }
}

impl From<FloorSelection> for i32 {
    fn from(selection: FloorSelection) -> Self {
        selection.to_sentinel()
    }
}

impl fmt::Display for FloorSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloorSelection::All => write!(f, "all floors"),
            FloorSelection::Level(level) => write!(f, "floor {}", level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS: [i32; 4] = [0, 1, 2, 3];

    #[test]
    fn test_sentinel_round_trip() {
        assert_eq!(FloorSelection::from_sentinel(-1), FloorSelection::All);
        assert_eq!(FloorSelection::from_sentinel(2), FloorSelection::Level(2));
        assert_eq!(FloorSelection::All.to_sentinel(), ALL_FLOORS_SENTINEL);

        let parsed: FloorSelection = serde_json::from_str("-1").unwrap();
        assert!(parsed.is_all());
        assert_eq!(serde_json::to_string(&FloorSelection::Level(4)).unwrap(), "4");
    }

    #[test]
    fn test_step_up_through_levels() {
        let all = FloorSelection::All;
        assert_eq!(all.step_up(&LEVELS), FloorSelection::Level(0));
        assert_eq!(FloorSelection::Level(1).step_up(&LEVELS), FloorSelection::Level(2));
        assert_eq!(FloorSelection::Level(3).step_up(&LEVELS), FloorSelection::Level(3));
        assert!(!FloorSelection::Level(3).can_step_up(&LEVELS));
    }

    #[test]
    fn test_step_down_through_levels() {
        assert_eq!(FloorSelection::All.step_down(&LEVELS), FloorSelection::Level(0));
        assert_eq!(FloorSelection::Level(2).step_down(&LEVELS), FloorSelection::Level(1));
        assert_eq!(FloorSelection::Level(0).step_down(&LEVELS), FloorSelection::Level(0));
        assert!(!FloorSelection::Level(0).can_step_down(&LEVELS));
        assert!(FloorSelection::All.can_step_down(&LEVELS));
    }

    #[test]
    fn test_step_with_no_levels() {
        assert_eq!(FloorSelection::All.step_up(&[]), FloorSelection::All);
        assert!(!FloorSelection::All.can_step_down(&[]));
    }

    #[test]
    fn test_indicator_text() {
        let floors = vec![Floor::new(0, "Ground Floor"), Floor::new(6, "Penthouse")];
        assert_eq!(
            FloorSelection::All.indicator(&floors),
            ("ALL".to_string(), "FLOORS".to_string())
        );
        assert_eq!(
            FloorSelection::Level(0).indicator(&floors),
            ("0".to_string(), "Ground".to_string())
        );
        assert_eq!(
            FloorSelection::Level(9).indicator(&floors),
            ("9".to_string(), String::new())
        );
    }

    #[test]
    fn test_asset_slots() {
        let floor = Floor::new(2, "Second").with_plan("plans/2.glb");
        let slots: Vec<_> = floor.asset_slots().collect();
        assert_eq!(slots, vec![(ModelSlot::Plan(2), "plans/2.glb")]);
        assert_eq!(floor.with_structure("s/2.glb").asset_count(), 2);
    }
}
