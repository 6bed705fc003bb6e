//! World placement of loaded models

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::registry::ModelSlot;

/// Offsets applied to model roots as they are attached.
///
/// Plans are lifted to an absolute height per level; the environment and
/// structures are shifted relative to their authored position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementLayout {
    #[serde(default = "default_environment_offset")]
    pub environment_offset: Vec3,
    #[serde(default = "default_structure_offset")]
    pub structure_offset: Vec3,
    /// Plan height by level; levels missing here sit at 0
    #[serde(default = "default_plan_heights")]
    pub plan_heights: Vec<PlanHeight>,
}

/// Absolute height of one level's plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanHeight {
    pub level: i32,
    pub height: f32,
}

fn default_environment_offset() -> Vec3 {
    Vec3::new(0.0, 1.2, 0.0)
}

fn default_structure_offset() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

fn default_plan_heights() -> Vec<PlanHeight> {
    [
        (0, 1.0),
        (1, 1.08),
        (2, 2.36),
        (3, 3.63),
        (4, 4.84),
        (5, 6.1),
        (6, 7.3),
        (7, 1.06),
    ]
    .into_iter()
    .map(|(level, height)| PlanHeight { level, height })
    .collect()
}

impl Default for PlacementLayout {
    fn default() -> Self {
        Self {
            environment_offset: default_environment_offset(),
            structure_offset: default_structure_offset(),
            plan_heights: default_plan_heights(),
        }
    }
}

impl PlacementLayout {
    /// No offsets at all
    pub fn identity() -> Self {
        Self {
            environment_offset: Vec3::ZERO,
            structure_offset: Vec3::ZERO,
            plan_heights: Vec::new(),
        }
    }

    pub fn plan_height(&self, level: i32) -> f32 {
        self.plan_heights
            .iter()
            .find(|entry| entry.level == level)
            .map(|entry| entry.height)
            .unwrap_or(0.0)
    }

    /// Root transform for a model in `slot`, given its authored transform
    pub fn place(&self, slot: ModelSlot, local: Mat4) -> Mat4 {
        let (scale, rotation, mut translation) = local.to_scale_rotation_translation();
        match slot {
            ModelSlot::Environment => translation += self.environment_offset,
            ModelSlot::Structure(_) => translation += self.structure_offset,
            ModelSlot::Plan(level) => translation.y = self.plan_height(level),
        }
        Mat4::from_scale_rotation_translation(scale, rotation, translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_plan_heights() {
        let layout = PlacementLayout::default();
        assert_eq!(layout.plan_height(0), 1.0);
        assert_eq!(layout.plan_height(6), 7.3);
        assert_eq!(layout.plan_height(7), 1.06);
        assert_eq!(layout.plan_height(12), 0.0);
    }

    #[test]
    fn test_place_by_slot() {
        let layout = PlacementLayout::default();
        let authored = Mat4::from_translation(Vec3::new(2.0, 5.0, 0.0));

        let plan = layout.place(ModelSlot::Plan(2), authored);
        assert_relative_eq!(plan.w_axis.y, 2.36);
        assert_relative_eq!(plan.w_axis.x, 2.0);

        let structure = layout.place(ModelSlot::Structure(2), authored);
        assert_relative_eq!(structure.w_axis.y, 6.0);

        let environment = layout.place(ModelSlot::Environment, Mat4::IDENTITY);
        assert_relative_eq!(environment.w_axis.y, 1.2);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let layout: PlacementLayout = serde_json::from_str(r#"{"structure_offset":[0.0,0.0,0.0]}"#).unwrap();
        assert_eq!(layout.structure_offset, Vec3::ZERO);
        assert_eq!(layout.environment_offset, default_environment_offset());
        assert_eq!(layout.plan_heights.len(), 8);
    }
}
