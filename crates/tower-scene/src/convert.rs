//! Conversions between Bevy assets and the core's engine-neutral types

use bevy::mesh::{Indices, VertexAttributeValues};
use bevy::prelude::*;
use tower_core::{MaterialProps, MeshGeometry, ViewCamera};

/// Triangle geometry of a mesh, with `local` baked into the positions
pub fn mesh_geometry(mesh: &Mesh, local: Mat4) -> Option<MeshGeometry> {
    let Some(VertexAttributeValues::Float32x3(positions)) = mesh.attribute(Mesh::ATTRIBUTE_POSITION) else {
        return None;
    };
    let positions: Vec<Vec3> = positions
        .iter()
        .map(|p| local.transform_point3(Vec3::from_array(*p)))
        .collect();
    let indices: Vec<u32> = match mesh.indices() {
        Some(Indices::U16(values)) => values.iter().map(|&i| i as u32).collect(),
        Some(Indices::U32(values)) => values.clone(),
        None => Vec::new(),
    };
    Some(MeshGeometry::new(positions, indices))
}

/// Read the parameters the core adjusts from a PBR material
pub fn material_props(material: &StandardMaterial) -> MaterialProps {
    let color = material.base_color.to_srgba();
    let emissive = Color::from(material.emissive).to_srgba();
    let transparent = !matches!(material.alpha_mode, AlphaMode::Opaque | AlphaMode::Mask(_));
    MaterialProps {
        base_color: Vec3::new(color.red, color.green, color.blue),
        opacity: color.alpha,
        emissive: Vec3::new(emissive.red, emissive.green, emissive.blue),
        emissive_intensity: 1.0,
        roughness: material.perceptual_roughness,
        metalness: material.metallic,
        transparent,
        depth_write: !transparent,
        double_sided: material.double_sided,
        processed: false,
    }
}

/// Write core parameters onto a material, leaving textures untouched.
///
/// Blended materials never write depth in Bevy's transparent pass, so
/// `depth_write` has no counterpart here.
pub fn apply_props(material: &mut StandardMaterial, props: &MaterialProps) {
    material.base_color = Color::srgba(props.base_color.x, props.base_color.y, props.base_color.z, props.opacity);
    let emissive = Color::srgb(props.emissive.x, props.emissive.y, props.emissive.z).to_linear();
    material.emissive = LinearRgba::rgb(
        emissive.red * props.emissive_intensity,
        emissive.green * props.emissive_intensity,
        emissive.blue * props.emissive_intensity,
    );
    material.perceptual_roughness = props.roughness;
    material.metallic = props.metalness;
    material.double_sided = props.double_sided;
    material.cull_mode = if props.double_sided {
        None
    } else {
        Some(bevy::render::render_resource::Face::Back)
    };
    if props.transparent {
        material.alpha_mode = AlphaMode::Blend;
    }
}

/// Matrix form of an entity transform
pub fn transform_matrix(transform: &Transform) -> Mat4 {
    Mat4::from_scale_rotation_translation(transform.scale, transform.rotation, transform.translation)
}

/// Picking camera from a Bevy camera and its world transform
pub fn view_camera(camera: &Camera, transform: &GlobalTransform) -> ViewCamera {
    ViewCamera::new(camera.clip_from_view(), Mat4::from(transform.affine()))
}
