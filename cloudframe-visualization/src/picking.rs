//! Screen-space point picking

use crate::camera::{project_clip, Camera};
use crate::scene::{GeometryRole, Scene};
use cloudframe_core::Point3f;
use nalgebra::{Point2, Vector4};

/// Default pick radius in pixels
pub const PICK_RADIUS: f32 = 8.0;

/// Squared pixel distances closer than this count as the same distance
const TIE_EPSILON: f32 = 0.25;

/// A point under the cursor
#[derive(Debug, Clone, PartialEq)]
pub struct PickedPoint {
    /// Geometry the point belongs to
    pub name: String,
    pub role: GeometryRole,
    pub index: usize,
    pub position: Point3f,
    /// Number of points in the geometry
    pub cloud_len: usize,
}

/// Find the visible point closest to `cursor` on screen.
///
/// Only points projecting within `radius` pixels are considered; between
/// points at the same screen distance the one nearer the camera wins.
pub fn pick_point(
    scene: &Scene,
    camera: &Camera,
    cursor: Point2<f32>,
    viewport: [f32; 2],
    radius: f32,
) -> Option<PickedPoint> {
    let view_proj = camera.view_projection();
    let radius_sq = radius * radius;
    let mut best: Option<(f32, f32, PickedPoint)> = None;

    for geometry in scene.iter().filter(|g| g.visible) {
        let Some(cloud) = geometry.points() else {
            continue;
        };
        for (index, point) in cloud.iter().enumerate() {
            let p = point.position;
            let clip = view_proj * Vector4::new(p.x, p.y, p.z, 1.0);
            let Some((pixel, depth)) = project_clip(&clip, viewport) else {
                continue;
            };
            if !(0.0..=1.0).contains(&depth) {
                continue;
            }
            let dist_sq = (pixel - cursor).norm_squared();
            if dist_sq > radius_sq {
                continue;
            }
            let better = match &best {
                None => true,
                Some((best_dist, best_depth, _)) => {
                    dist_sq < *best_dist - TIE_EPSILON
                        || ((dist_sq - *best_dist).abs() <= TIE_EPSILON && depth < *best_depth)
                }
            };
            if better {
                best = Some((
                    dist_sq,
                    depth,
                    PickedPoint {
                        name: geometry.name.clone(),
                        role: geometry.role,
                        index,
                        position: p,
                        cloud_len: cloud.len(),
                    },
                ));
            }
        }
    }

    best.map(|(_, _, picked)| picked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{GeometryData, Layer};
    use cloudframe_core::{Aabb, ColoredPoint3f, PointCloud, Rgb};
    use cloudframe_io::AssetKind;

    fn scene_with(points: Vec<Point3f>) -> Scene {
        let mut scene = Scene::new();
        scene.add(
            "plane_1",
            GeometryRole::cloud(Layer::Frame, AssetKind::Plane, Some(1)),
            GeometryData::Points(PointCloud::from_points(
                points.into_iter().map(|p| ColoredPoint3f::new(p, Rgb::GREEN)).collect(),
            )),
        );
        scene
    }

    fn fitted_camera() -> Camera {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(800.0, 600.0);
        camera.fit(Aabb::new(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0)));
        camera
    }

    #[test]
    fn test_pick_point_at_screen_center() {
        let scene = scene_with(vec![Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 1.0, 1.0)]);
        let camera = fitted_camera();

        let picked = pick_point(&scene, &camera, Point2::new(400.0, 300.0), [800.0, 600.0], PICK_RADIUS).unwrap();
        assert_eq!(picked.name, "plane_1");
        assert_eq!(picked.index, 0);
        assert_eq!(picked.cloud_len, 2);
    }

    #[test]
    fn test_nothing_picked_far_from_points() {
        let scene = scene_with(vec![Point3f::new(0.0, 0.0, 0.0)]);
        let camera = fitted_camera();
        assert!(pick_point(&scene, &camera, Point2::new(5.0, 5.0), [800.0, 600.0], PICK_RADIUS).is_none());
    }

    #[test]
    fn test_hidden_geometries_are_not_picked() {
        let mut scene = scene_with(vec![Point3f::new(0.0, 0.0, 0.0)]);
        scene.hide("plane_1");
        let camera = fitted_camera();
        assert!(pick_point(&scene, &camera, Point2::new(400.0, 300.0), [800.0, 600.0], PICK_RADIUS).is_none());
    }

    #[test]
    fn test_nearer_point_wins_tie() {
        let camera = fitted_camera();
        let toward_camera = (camera.position - camera.target).normalize() * 0.5;
        let near = Point3f::origin() + toward_camera;
        let scene = scene_with(vec![Point3f::origin(), near]);

        let picked = pick_point(&scene, &camera, Point2::new(400.0, 300.0), [800.0, 600.0], PICK_RADIUS).unwrap();
        assert_eq!(picked.index, 1);
    }
}
