//! Orbit camera around the building
//!
//! Left drag orbits, right drag pans, the wheel or a pinch zooms. Input is
//! ignored while the pointer is over an overlay.

use bevy::ecs::message::MessageReader;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;

use crate::PointerOverUi;

/// Camera controller settings
#[derive(Debug, Clone, Resource)]
pub struct CameraSettings {
    pub distance: f32,
    pub target_distance: f32,
    pub azimuth: f32,
    pub elevation: f32,
    pub target: Vec3,
    pub target_focus: Vec3,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub smooth_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 28.0,
            target_distance: 28.0,
            azimuth: 0.8,
            elevation: 0.45,
            target: Vec3::new(0.0, 3.0, 0.0),
            target_focus: Vec3::new(0.0, 3.0, 0.0),
            sensitivity: 0.005,
            zoom_speed: 0.1,
            smooth_factor: 0.15,
            min_distance: 4.0,
            max_distance: 120.0,
        }
    }
}

impl CameraSettings {
    /// Eye position on the orbit sphere (Y up)
    pub fn eye(&self) -> Vec3 {
        let x = self.distance * self.azimuth.cos() * self.elevation.cos();
        let z = self.distance * self.azimuth.sin() * self.elevation.cos();
        let y = self.distance * self.elevation.sin();
        self.target + Vec3::new(x, y, z)
    }

    fn zoom(&mut self, factor: f32) {
        self.target_distance = (self.target_distance * factor).clamp(self.min_distance, self.max_distance);
    }

    /// Ease distance and target toward their goals
    fn smooth(&mut self, dt: f32) {
        let lerp_factor = 1.0 - (-self.smooth_factor * 60.0 * dt).exp();
        self.distance += (self.target_distance - self.distance) * lerp_factor;
        self.target += (self.target_focus - self.target) * lerp_factor;
    }
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Plugin for camera controls
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraSettings>()
            .add_systems(Startup, setup_camera)
            .add_systems(Update, update_camera);
    }
}

fn setup_camera(mut commands: Commands, settings: Res<CameraSettings>) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            near: 0.1,
            far: 2000.0,
            ..default()
        }),
        Transform::from_translation(settings.eye()).looking_at(settings.target, Vec3::Y),
        MainCamera,
    ));

    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.9, 0.95, 1.0),
        brightness: 300.0,
        ..default()
    });

    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(30.0, 50.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn update_camera(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    mut settings: ResMut<CameraSettings>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    pointer_over_ui: Res<PointerOverUi>,
    time: Res<Time>,
) {
    let blocked = pointer_over_ui.0;

    let total_motion: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();

    if mouse_button.pressed(MouseButton::Left) && !blocked {
        settings.azimuth += total_motion.x * settings.sensitivity;
        settings.elevation = (settings.elevation + total_motion.y * settings.sensitivity).clamp(0.05, 1.5);
    }

    if mouse_button.pressed(MouseButton::Right) && !blocked {
        // Pan in the camera's right/up plane
        let right = Vec3::new(-settings.azimuth.sin(), 0.0, settings.azimuth.cos());
        let pan_speed = settings.distance * 0.002;
        settings.target_focus -= right * total_motion.x * pan_speed;
        settings.target_focus += Vec3::Y * total_motion.y * pan_speed;
    }

    // Drain scroll events even when the overlay owns the pointer
    let scroll: f32 = mouse_wheel.read().map(|event| event.y).sum();
    if !blocked && scroll != 0.0 {
        let factor = 1.0 - scroll * settings.zoom_speed;
        settings.zoom(factor);
    }

    let touches: Vec<_> = touch_input.iter().collect();
    if !blocked {
        match touches.as_slice() {
            [touch] => {
                let delta = touch.delta();
                settings.azimuth += delta.x * settings.sensitivity;
                settings.elevation = (settings.elevation + delta.y * settings.sensitivity).clamp(0.05, 1.5);
            }
            [t1, t2] => {
                let curr_dist = t1.position().distance(t2.position());
                let prev_dist = (t1.position() - t1.delta()).distance(t2.position() - t2.delta());
                settings.zoom(prev_dist / curr_dist.max(1.0));
            }
            _ => {}
        }
    }

    settings.smooth(time.delta_secs());

    if let Ok(mut transform) = camera_query.single_mut() {
        transform.translation = settings.eye();
        transform.look_at(settings.target, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_is_distance_from_target() {
        let settings = CameraSettings::default();
        let offset = settings.eye() - settings.target;
        assert!((offset.length() - settings.distance).abs() < 1e-3);
        assert!(offset.y > 0.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut settings = CameraSettings::default();
        settings.zoom(100.0);
        assert_eq!(settings.target_distance, settings.max_distance);
        settings.zoom(0.0);
        assert_eq!(settings.target_distance, settings.min_distance);
    }

    #[test]
    fn test_smoothing_converges() {
        let mut settings = CameraSettings {
            target_distance: 50.0,
            ..Default::default()
        };
        for _ in 0..600 {
            settings.smooth(1.0 / 60.0);
        }
        assert!((settings.distance - 50.0).abs() < 1e-2);
    }
}
