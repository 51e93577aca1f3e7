//! Camera and pointer picking.
//!
//! The pointer arrives in normalized device coordinates. Each frame it is
//! unprojected into a world-space ray and intersected with the `z = 0` plane
//! the shapes live on; the hit point is the repulsion source for the
//! integrator.

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Perspective camera looking down -Z at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Distance of the camera from the origin along +Z.
    pub distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            distance: 700.0,
        }
    }
}

/// Camera state including the current viewport aspect ratio.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    config: CameraConfig,
    aspect: f32,
}

impl Camera {
    pub fn new(config: CameraConfig, width: u32, height: u32) -> Self {
        let mut camera = Self {
            config,
            aspect: 1.0,
        };
        camera.resize(width, height);
        camera
    }

    /// Update the aspect ratio. Zero-sized viewports are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.config.distance)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.config.fov_degrees.to_radians(),
            self.aspect,
            self.config.near,
            self.config.far,
        )
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space ray through `ndc`, as `(origin, unit direction)`.
    pub fn ray(&self, ndc: Vec2) -> (Vec3, Vec3) {
        let half_h = (self.config.fov_degrees.to_radians() * 0.5).tan();
        let half_w = half_h * self.aspect;
        let dir = Vec3::new(ndc.x * half_w, ndc.y * half_h, -1.0).normalize();
        (self.position(), dir)
    }
}

/// Intersect a ray with the plane `normal · p + offset = 0`.
///
/// Returns `None` when the ray is parallel to the plane or points away from it.
pub fn intersect_plane(origin: Vec3, dir: Vec3, normal: Vec3, offset: f32) -> Option<Vec3> {
    let denom = normal.dot(dir);
    if denom == 0.0 {
        return if normal.dot(origin) + offset == 0.0 {
            Some(origin)
        } else {
            None
        };
    }
    let t = -(origin.dot(normal) + offset) / denom;
    (t >= 0.0).then(|| origin + dir * t)
}

/// Pointer position and its projection onto the shape plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    ndc: Vec2,
    intersection: Vec3,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest pointer position in normalized device coordinates.
    pub fn set_ndc(&mut self, ndc: Vec2) {
        self.ndc = ndc;
    }

    pub fn ndc(&self) -> Vec2 {
        self.ndc
    }

    /// Recompute the plane intersection. A miss keeps the previous point.
    pub fn update(&mut self, camera: &Camera) -> Vec3 {
        let (origin, dir) = camera.ray(self.ndc);
        if let Some(hit) = intersect_plane(origin, dir, Vec3::Z, 0.0) {
            self.intersection = hit;
        }
        self.intersection
    }

    pub fn intersection(&self) -> Vec3 {
        self.intersection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(CameraConfig::default(), 800, 800)
    }

    #[test]
    fn test_centre_of_screen_hits_origin() {
        let mut pointer = PointerState::new();
        let hit = pointer.update(&camera());
        assert!(hit.length() < 1e-3);
    }

    #[test]
    fn test_screen_edge_matches_field_of_view() {
        let mut pointer = PointerState::new();
        pointer.set_ndc(Vec2::new(1.0, 0.0));
        let hit = pointer.update(&camera());

        let half_width = 700.0 * 37.5f32.to_radians().tan();
        assert!((hit.x - half_width).abs() < 0.5, "hit {hit:?}");
        assert!(hit.y.abs() < 1e-2);
        assert!(hit.z.abs() < 1e-2);
    }

    #[test]
    fn test_ndc_y_up_maps_to_world_y_up() {
        let mut pointer = PointerState::new();
        pointer.set_ndc(Vec2::new(0.0, 0.5));
        assert!(pointer.update(&camera()).y > 0.0);
    }

    #[test]
    fn test_parallel_ray_misses() {
        assert_eq!(intersect_plane(Vec3::Z, Vec3::X, Vec3::Z, 0.0), None);
        assert_eq!(intersect_plane(Vec3::Z, Vec3::Z, Vec3::Z, 0.0), None);
        assert_eq!(
            intersect_plane(Vec3::Z * 10.0, -Vec3::Z, Vec3::Z, 0.0),
            Some(Vec3::ZERO)
        );
    }

    #[test]
    fn test_resize_ignores_zero_area() {
        let mut cam = camera();
        cam.resize(0, 600);
        assert_eq!(cam.aspect(), 1.0);
        cam.resize(1600, 800);
        assert_eq!(cam.aspect(), 2.0);
    }
}
