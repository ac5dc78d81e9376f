//! Camera utilities for 3D visualization

use cloudframe_core::Aabb;
use nalgebra::{Matrix4, Perspective3, Point2, Point3, Vector3, Vector4};

/// Keeps the camera from flipping over the poles
const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;
const MIN_DISTANCE: f32 = 0.05;
const DEFAULT_YAW: f32 = -std::f32::consts::FRAC_PI_2;
const DEFAULT_PITCH: f32 = std::f32::consts::FRAC_PI_4;

/// A 3D orbit camera looking at `target`, with +Z up
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    home: Option<Aabb>,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
            home: None,
        }
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix, mapping depth to wgpu's `0..1` range
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        #[rustfmt::skip]
        let opengl_to_wgpu = Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.5, 0.5,
            0.0, 0.0, 0.0, 1.0,
        );
        opengl_to_wgpu * Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far).into_inner()
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).norm()
    }

    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect_ratio = width / height;
        }
    }

    /// Rotate the camera around the target by yaw and pitch deltas in radians
    pub fn orbit(&mut self, horizontal: f32, vertical: f32) {
        let offset = self.position - self.target;
        let radius = offset.norm().max(MIN_DISTANCE);
        let yaw = offset.y.atan2(offset.x) - horizontal;
        let pitch = ((offset.z / radius).clamp(-1.0, 1.0).asin() + vertical).clamp(-MAX_PITCH, MAX_PITCH);
        self.position = self.target + spherical(radius, yaw, pitch);
    }

    /// Move camera and target together by a screen-space drag of `dx`, `dy` pixels
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let forward = (self.target - self.position).normalize();
        let right = forward.cross(&self.up).normalize();
        let up = right.cross(&forward);
        let world_per_pixel = 2.0 * self.distance() * (self.fov / 2.0).tan() / viewport_height.max(1.0);
        let shift = (-right * dx + up * dy) * world_per_pixel;
        self.position += shift;
        self.target += shift;
    }

    /// Dolly towards the target; positive steps move closer
    pub fn zoom(&mut self, steps: f32) {
        let offset = self.position - self.target;
        let distance = (offset.norm() * 0.9f32.powf(steps)).max(MIN_DISTANCE);
        self.position = self.target + offset.normalize() * distance;
        self.update_clip_planes();
    }

    /// Frame `bounds` from the default viewing direction and remember them for [`Camera::reset`]
    pub fn fit(&mut self, bounds: Aabb) {
        self.home = Some(bounds);
        let radius = (bounds.diagonal() / 2.0).max(1.0);
        let distance = radius / (self.fov / 2.0).sin() * 1.1;
        self.target = bounds.center();
        self.position = self.target + spherical(distance, DEFAULT_YAW, DEFAULT_PITCH);
        self.update_clip_planes();
    }

    /// Return to the last fitted view
    pub fn reset(&mut self) {
        match self.home {
            Some(bounds) => self.fit(bounds),
            None => *self = Camera { aspect_ratio: self.aspect_ratio, ..Camera::default() },
        }
    }

    fn update_clip_planes(&mut self) {
        let distance = self.distance();
        let scene_radius = self.home.map(|b| b.diagonal()).unwrap_or(0.0);
        self.near = (distance * 0.001).max(0.001);
        self.far = (distance + scene_radius) * 4.0 + 10.0;
    }

    /// Window coordinates (origin top-left, pixels) and NDC depth of a world point,
    /// or `None` when it is behind the camera
    pub fn project(&self, point: &Point3<f32>, viewport: [f32; 2]) -> Option<(Point2<f32>, f32)> {
        let clip = self.view_projection() * Vector4::new(point.x, point.y, point.z, 1.0);
        project_clip(&clip, viewport)
    }
}

/// Perspective divide and viewport mapping of a clip-space position
pub(crate) fn project_clip(clip: &Vector4<f32>, viewport: [f32; 2]) -> Option<(Point2<f32>, f32)> {
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    let x = (ndc.x + 1.0) * 0.5 * viewport[0];
    let y = (1.0 - ndc.y) * 0.5 * viewport[1];
    Some((Point2::new(x, y), ndc.z))
}

fn spherical(radius: f32, yaw: f32, pitch: f32) -> Vector3<f32> {
    Vector3::new(
        radius * pitch.cos() * yaw.cos(),
        radius * pitch.cos() * yaw.sin(),
        radius * pitch.sin(),
    )
}

impl Default for Camera {
    fn default() -> Self {
        let target = Point3::origin();
        Self::new(
            target + spherical(40.0, DEFAULT_YAW, DEFAULT_PITCH),
            target,
            Vector3::z(),
            std::f32::consts::FRAC_PI_4,
            16.0 / 9.0,
            0.1,
            1000.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb {
        Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_orbit_keeps_distance_and_clamps_pitch() {
        let mut camera = Camera::default();
        let distance = camera.distance();

        camera.orbit(0.7, 0.2);
        assert_relative_eq!(camera.distance(), distance, epsilon = 1e-3);

        camera.orbit(0.0, 10.0);
        let offset = camera.position - camera.target;
        assert!((offset.z / offset.norm()).asin() <= MAX_PITCH + 1e-4);
    }

    #[test]
    fn test_zoom_moves_closer_but_not_through_target() {
        let mut camera = Camera::default();
        let before = camera.distance();
        camera.zoom(1.0);
        assert!(camera.distance() < before);

        camera.zoom(1000.0);
        assert_relative_eq!(camera.distance(), MIN_DISTANCE, epsilon = 1e-4);
    }

    #[test]
    fn test_pan_moves_target_with_camera() {
        let mut camera = Camera::default();
        let offset = camera.position - camera.target;
        camera.pan(25.0, -10.0, 600.0);
        assert_relative_eq!(camera.position - camera.target, offset, epsilon = 1e-4);
        assert!(camera.target != Point3::origin());
    }

    #[test]
    fn test_fit_centers_and_reset_returns() {
        let mut camera = Camera::default();
        let bounds = Aabb::new(Point3::new(9.0, 9.0, 9.0), Point3::new(11.0, 11.0, 11.0));
        camera.fit(bounds);
        assert_relative_eq!(camera.target, Point3::new(10.0, 10.0, 10.0));

        let fitted = camera.position;
        camera.orbit(1.0, 0.3);
        camera.pan(50.0, 50.0, 600.0);
        camera.reset();
        assert_relative_eq!(camera.position, fitted, epsilon = 1e-4);
    }

    #[test]
    fn test_project_center_of_view() {
        let mut camera = Camera::default();
        camera.fit(unit_box());
        let (pixel, depth) = camera.project(&Point3::origin(), [800.0, 600.0]).unwrap();

        assert_relative_eq!(pixel.x, 400.0, epsilon = 1e-2);
        assert_relative_eq!(pixel.y, 300.0, epsilon = 1e-2);
        assert!((0.0..=1.0).contains(&depth));
    }

    #[test]
    fn test_point_behind_camera_is_not_projected() {
        let mut camera = Camera::default();
        camera.fit(unit_box());
        let behind = camera.position + (camera.position - camera.target);
        assert!(camera.project(&behind, [800.0, 600.0]).is_none());
    }
}
