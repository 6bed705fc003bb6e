//! Engine-neutral material description and the load-time tone adjustments

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::registry::ModelKind;

/// Highlight base colour for hovered units
pub const HIGHLIGHT_COLOR: u32 = 0x208720;
/// Highlight emissive colour for hovered units
pub const HIGHLIGHT_EMISSIVE: u32 = 0x8cedaf;
pub const HIGHLIGHT_EMISSIVE_INTENSITY: f32 = 0.5;

/// sRGB hex (0xRRGGBB) to a colour vector in 0..=1
pub fn hex_color(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Handle of a material in the [`MaterialLibrary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaterialId(u32);

impl MaterialId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// PBR parameters shared by the core and the rendering adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProps {
    pub base_color: Vec3,
    pub opacity: f32,
    pub emissive: Vec3,
    pub emissive_intensity: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub transparent: bool,
    pub depth_write: bool,
    pub double_sided: bool,
    /// Set once the load-time adjustment has run
    #[serde(default)]
    pub processed: bool,
}

impl Default for MaterialProps {
    fn default() -> Self {
        Self {
            base_color: Vec3::ONE,
            opacity: 1.0,
            emissive: Vec3::ZERO,
            emissive_intensity: 1.0,
            roughness: 1.0,
            metalness: 0.0,
            transparent: false,
            depth_write: true,
            double_sided: false,
            processed: false,
        }
    }
}

impl MaterialProps {
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.base_color = color;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.transparent = opacity < 1.0;
        self
    }

    /// Average of the colour channels
    pub fn luminance(&self) -> f32 {
        (self.base_color.x + self.base_color.y + self.base_color.z) / 3.0
    }

    /// Apply the per-kind tone adjustment exactly once
    pub fn normalized(&self, kind: ModelKind) -> MaterialProps {
        let mut out = self.clone();
        if out.processed {
            return out;
        }
        match kind {
            ModelKind::Plan => {
                let (target, amount) = if out.luminance() < 0.5 {
                    (hex_color(0x888888), 0.3)
                } else {
                    (hex_color(0xcccccc), 0.2)
                };
                out.base_color = out.base_color.lerp(target, amount);
                out.roughness = (out.roughness + 0.2).min(1.0);
            }
            ModelKind::Structure => {
                out.base_color *= 1.8;
                out.roughness = (out.roughness * 0.5).max(0.05);
                out.metalness = (out.metalness * 1.5).min(0.8);
                out.emissive = Vec3::ONE;
                out.emissive_intensity = 0.15;
            }
            ModelKind::Environment => {
                out.base_color *= 1.6;
                out.roughness = (out.roughness * 0.6).max(0.1);
                out.emissive = Vec3::ONE;
                out.emissive_intensity = 0.1;
            }
        }
        if out.transparent {
            out.depth_write = true;
        }
        out.processed = true;
        out
    }

    /// Hover highlight derived from an original, keeping its transparency
    pub fn highlight(original: &MaterialProps) -> MaterialProps {
        MaterialProps {
            base_color: hex_color(HIGHLIGHT_COLOR),
            opacity: original.opacity,
            emissive: hex_color(HIGHLIGHT_EMISSIVE),
            emissive_intensity: HIGHLIGHT_EMISSIVE_INTENSITY,
            roughness: original.roughness,
            metalness: original.metalness,
            transparent: original.transparent,
            depth_write: original.depth_write,
            double_sided: original.double_sided,
            processed: true,
        }
    }
}

/// Arena of materials; ids stay valid for the library's lifetime
#[derive(Debug, Default)]
pub struct MaterialLibrary {
    materials: Vec<MaterialProps>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, props: MaterialProps) -> MaterialId {
        self.materials.push(props);
        MaterialId((self.materials.len() - 1) as u32)
    }

    pub fn get(&self, id: MaterialId) -> Option<&MaterialProps> {
        self.materials.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color(0xff0000), Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(hex_color(0x888888).x, 136.0 / 255.0);
    }

    #[test]
    fn test_dark_plan_material_lifts_toward_grey() {
        let dark = MaterialProps::default().with_color(Vec3::ZERO);
        let out = dark.normalized(ModelKind::Plan);
        assert_relative_eq!(out.base_color.x, 0.3 * 136.0 / 255.0, epsilon = 1e-6);
        assert_eq!(out.roughness, 1.0);
        assert!(out.processed);
    }

    #[test]
    fn test_light_plan_material_lerps_toward_light_grey() {
        let mut light = MaterialProps::default();
        light.roughness = 0.5;
        let out = light.normalized(ModelKind::Plan);
        let expected = 1.0 + (204.0 / 255.0 - 1.0) * 0.2;
        assert_relative_eq!(out.base_color.y, expected, epsilon = 1e-6);
        assert_relative_eq!(out.roughness, 0.7, epsilon = 1e-6);
    }

    #[test]
    fn test_structure_and_environment_adjustments() {
        let mut base = MaterialProps::default().with_color(Vec3::splat(0.5));
        base.roughness = 0.05;
        base.metalness = 0.7;

        let structure = base.normalized(ModelKind::Structure);
        assert_relative_eq!(structure.base_color.x, 0.9, epsilon = 1e-6);
        assert_relative_eq!(structure.roughness, 0.05);
        assert_relative_eq!(structure.metalness, 0.8);
        assert_relative_eq!(structure.emissive_intensity, 0.15);

        let environment = base.normalized(ModelKind::Environment);
        assert_relative_eq!(environment.base_color.z, 0.8, epsilon = 1e-6);
        assert_relative_eq!(environment.roughness, 0.1);
        assert_relative_eq!(environment.emissive_intensity, 0.1);
    }

    #[test]
    fn test_normalization_runs_once() {
        let once = MaterialProps::default()
            .with_color(Vec3::splat(0.4))
            .normalized(ModelKind::Structure);
        let twice = once.normalized(ModelKind::Structure);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_transparent_materials_write_depth() {
        let mut glass = MaterialProps::default().with_opacity(0.4);
        glass.depth_write = false;
        assert!(glass.normalized(ModelKind::Plan).depth_write);
    }

    #[test]
    fn test_highlight_keeps_transparency() {
        let glass = MaterialProps::default().with_opacity(0.4);
        let lit = MaterialProps::highlight(&glass);
        assert_eq!(lit.base_color, hex_color(HIGHLIGHT_COLOR));
        assert_eq!(lit.emissive, hex_color(HIGHLIGHT_EMISSIVE));
        assert!(lit.transparent);
        assert_eq!(lit.opacity, 0.4);
    }

    #[test]
    fn test_library_ids() {
        let mut library = MaterialLibrary::new();
        let a = library.add(MaterialProps::default());
        let b = library.add(MaterialProps::default().with_opacity(0.5));
        assert_ne!(a, b);
        assert_eq!(library.get(b).map(|m| m.opacity), Some(0.5));
        assert_eq!(library.len(), 2);
    }
}
