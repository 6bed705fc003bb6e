//! Interaction state shared by the per-frame resolvers

use crate::floor::FloorSelection;
use crate::scene::NodeId;

/// Current floor selection, the units it activates, and the hovered unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSelection {
    pub selected: FloorSelection,
    /// Plan units eligible for pointer interaction, swapped in whole
    pub active_units: Vec<NodeId>,
    pub hovered: Option<NodeId>,
}

impl ActiveSelection {
    pub fn new(selected: FloorSelection) -> Self {
        Self {
            selected,
            ..Default::default()
        }
    }

    pub fn is_active(&self, node: NodeId) -> bool {
        self.active_units.contains(&node)
    }

    /// Replace the active list; returns the hovered unit if it dropped out
    pub fn replace_active(&mut self, active_units: Vec<NodeId>) -> Option<NodeId> {
        self.active_units = active_units;
        self.hovered.filter(|node| !self.active_units.contains(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_active_reports_stale_hover() {
        let mut selection = ActiveSelection::new(FloorSelection::Level(1));
        let unit = NodeId::from_index(4);
        selection.replace_active(vec![unit]);
        selection.hovered = Some(unit);

        assert_eq!(selection.replace_active(vec![unit, NodeId::from_index(5)]), None);
        assert_eq!(selection.replace_active(vec![]), Some(unit));
        assert!(!selection.is_active(unit));
    }
}
