//! Ray casting primitives and camera projection

use glam::{Mat4, Vec2, Vec3, Vec4};

const EPSILON: f32 = 1e-7;

/// A ray with normalized direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Express the ray in the space `local_from_world` maps into.
    ///
    /// The direction is left unnormalized so parameters along the local ray
    /// are the same distances as along the world ray.
    pub fn to_local(&self, local_from_world: &Mat4) -> Ray {
        Ray {
            origin: local_from_world.transform_point3(self.origin),
            direction: local_from_world.transform_vector3(self.direction),
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut aabb = Aabb::new(first, first);
        for point in iter {
            aabb.min = aabb.min.min(*point);
            aabb.max = aabb.max.max(*point);
        }
        Some(aabb)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Bounds of this box after an affine transform (all eight corners)
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ]
        .map(|corner| matrix.transform_point3(corner));
        // Eight corners, never empty
        Aabb::from_points(corners.iter()).unwrap_or(*self)
    }

    /// Slab test; returns the entry parameter (0 when the origin is inside)
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vec3::ONE / ray.direction;
        let t1 = (self.min - ray.origin) * inv_dir;
        let t2 = (self.max - ray.origin) * inv_dir;

        let t_enter = t1.min(t2).max_element();
        let t_exit = t1.max(t2).min_element();

        if t_enter <= t_exit && t_exit >= 0.0 {
            Some(t_enter.max(0.0))
        } else {
            None
        }
    }
}

/// Triangle mesh in its node's local space
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    bounds: Option<Aabb>,
}

impl MeshGeometry {
    /// Build from vertex positions and a triangle list.
    /// An empty index list means the positions are a plain triangle list.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_points(positions.iter());
        Self {
            positions,
            indices,
            bounds,
        }
    }

    /// Closed box between two corners, 12 triangles
    pub fn cuboid(min: Vec3, max: Vec3) -> Self {
        let positions = vec![
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(min.x, max.y, max.z),
        ];
        let indices = vec![
            0, 2, 1, 0, 3, 2, // -z
            4, 5, 6, 4, 6, 7, // +z
            0, 1, 5, 0, 5, 4, // -y
            3, 7, 6, 3, 6, 2, // +y
            0, 4, 7, 0, 7, 3, // -x
            1, 2, 6, 1, 6, 5, // +x
        ];
        Self::new(positions, indices)
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.positions.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        (0..self.triangle_count()).filter_map(move |i| {
            let corner = |k: usize| -> Option<Vec3> {
                let index = if self.indices.is_empty() {
                    i * 3 + k
                } else {
                    self.indices[i * 3 + k] as usize
                };
                self.positions.get(index).copied()
            };
            Some([corner(0)?, corner(1)?, corner(2)?])
        })
    }

    /// Nearest hit along a local-space ray; both triangle faces count
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        self.bounds?.intersect_ray(ray)?;
        self.triangles()
            .filter_map(|[a, b, c]| intersect_triangle(ray, a, b, c))
            .min_by(|x, y| x.total_cmp(y))
    }
}

/// Möller-Trumbore ray/triangle test, double sided
pub fn intersect_triangle(ray: &Ray, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t > EPSILON).then_some(t)
}

/// Render target size in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// NDC (y up) to pixels (origin top-left, y down)
    pub fn ndc_to_pixels(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x * 0.5 + 0.5) * self.width,
            (-(ndc.y * 0.5) + 0.5) * self.height,
        )
    }

    /// Pixels (origin top-left) to NDC
    pub fn pixels_to_ndc(&self, pixels: Vec2) -> Vec2 {
        Vec2::new(
            pixels.x / self.width * 2.0 - 1.0,
            -(pixels.y / self.height * 2.0 - 1.0),
        )
    }
}

/// Perspective camera as seen by the picking code
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCamera {
    clip_from_world: Mat4,
    world_from_clip: Mat4,
    position: Vec3,
}

impl ViewCamera {
    /// `clip_from_view` is the projection; `world_from_view` the camera transform.
    /// Works with both standard and reversed-depth projections.
    pub fn new(clip_from_view: Mat4, world_from_view: Mat4) -> Self {
        let clip_from_world = clip_from_view * world_from_view.inverse();
        Self {
            clip_from_world,
            world_from_clip: clip_from_world.inverse(),
            position: world_from_view.w_axis.truncate(),
        }
    }

    /// Right-handed perspective camera looking from `eye` at `target`
    pub fn looking_at(eye: Vec3, target: Vec3, up: Vec3, fov_y: f32, aspect: f32) -> Self {
        let world_from_view = Mat4::look_at_rh(eye, target, up).inverse();
        let clip_from_view = Mat4::perspective_rh(fov_y, aspect, 0.1, 1000.0);
        Self::new(clip_from_view, world_from_view)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Ray from the camera through a point in normalized device coordinates
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        // Mid-depth is finite for both depth conventions
        let point = self.world_from_clip.project_point3(Vec3::new(ndc.x, ndc.y, 0.5));
        Ray::new(self.position, point - self.position)
    }

    /// World point to NDC; `None` when the point is behind the camera
    pub fn project(&self, world: Vec3) -> Option<Vec3> {
        let clip: Vec4 = self.clip_from_world * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        Some(clip.truncate() / clip.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_hits_cuboid_front_face() {
        let cube = MeshGeometry::cuboid(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let t = cube.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 9.0, epsilon = 1e-5);
    }

    #[test]
    fn test_ray_misses_cuboid() {
        let cube = MeshGeometry::cuboid(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(5.0, 0.0, 10.0), Vec3::NEG_Z);
        assert!(cube.intersect_ray(&ray).is_none());
        let behind = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert!(cube.intersect_ray(&behind).is_none());
    }

    #[test]
    fn test_local_ray_keeps_world_distance() {
        let cube = MeshGeometry::cuboid(Vec3::splat(-1.0), Vec3::splat(1.0));
        let world_from_local = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            glam::Quat::IDENTITY,
            Vec3::new(0.0, 0.0, -5.0),
        );
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let local = ray.to_local(&world_from_local.inverse());
        let t = cube.intersect_ray(&local).unwrap();
        // Scaled cube spans z in [-7, -3]
        assert_relative_eq!(t, 13.0, epsilon = 1e-4);
    }

    #[test]
    fn test_aabb_transformed() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let moved = aabb.transformed(&Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)));
        assert_eq!(moved.center(), Vec3::new(0.5, 2.5, 0.5));
    }

    #[test]
    fn test_viewport_conversions() {
        let viewport = Viewport::new(800.0, 600.0);
        assert_eq!(viewport.ndc_to_pixels(Vec2::ZERO), Vec2::new(400.0, 300.0));
        assert_eq!(viewport.ndc_to_pixels(Vec2::new(-1.0, 1.0)), Vec2::new(0.0, 0.0));
        assert_eq!(viewport.pixels_to_ndc(Vec2::new(800.0, 600.0)), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_camera_center_ray_and_projection() {
        let camera = ViewCamera::looking_at(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            Vec3::Y,
            std::f32::consts::FRAC_PI_4,
            1.0,
        );
        let ray = camera.ray_from_ndc(Vec2::ZERO);
        assert_relative_eq!(ray.origin.z, 10.0, epsilon = 1e-4);
        assert_relative_eq!(ray.direction.z, -1.0, epsilon = 1e-4);

        let ndc = camera.project(Vec3::ZERO).unwrap();
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-5);
        assert!(camera.project(Vec3::new(0.0, 0.0, 20.0)).is_none());
    }

    #[test]
    fn test_reverse_depth_projection_ray() {
        let world_from_view = Mat4::look_at_rh(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, Vec3::Z).inverse();
        let clip_from_view = Mat4::perspective_infinite_reverse_rh(1.0, 1.5, 0.1);
        let camera = ViewCamera::new(clip_from_view, world_from_view);
        let ray = camera.ray_from_ndc(Vec2::ZERO);
        assert_relative_eq!(ray.direction.y, -1.0, epsilon = 1e-4);
    }
}
