//! World coordinate axes

use crate::scene::LineSegment;
use cloudframe_core::{Aabb, Axis, Point3f, Rgb};

/// Fraction of the largest scene extent covered by each axis
const EXTENT_FRACTION: f32 = 0.15;

/// Length of the drawn axes for a scene with `bounds`.
///
/// Never shorter than `1.5 * minimum` so the axes stay readable on tiny scenes.
pub fn axis_length(bounds: Option<&Aabb>, minimum: f32) -> f32 {
    let from_scene = bounds.map_or(0.0, |b| b.max_extent() * EXTENT_FRACTION);
    from_scene.max(minimum).max(1.5 * minimum)
}

pub fn axis_color(axis: Axis) -> Rgb {
    match axis {
        Axis::X => Rgb::AXIS_X,
        Axis::Y => Rgb::AXIS_Y,
        Axis::Z => Rgb::AXIS_Z,
    }
}

/// One segment per axis starting at the origin
pub fn axis_segments(length: f32) -> Vec<LineSegment> {
    Axis::ALL
        .iter()
        .map(|&axis| {
            let mut end = Point3f::origin();
            end[axis.index()] = length;
            LineSegment {
                start: Point3f::origin(),
                end,
                color: axis_color(axis),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_scene_uses_minimum() {
        let bounds = Aabb::new(Point3f::origin(), Point3f::new(1.0, 2.0, 3.0));
        assert_eq!(axis_length(Some(&bounds), 8.0), 12.0);
        assert_eq!(axis_length(None, 8.0), 12.0);
    }

    #[test]
    fn test_large_scene_scales_axes() {
        let bounds = Aabb::new(Point3f::new(-500.0, 0.0, 0.0), Point3f::new(500.0, 10.0, 10.0));
        assert_eq!(axis_length(Some(&bounds), 8.0), 150.0);
    }

    #[test]
    fn test_segments_point_along_axes() {
        let segments = axis_segments(2.0);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].end, Point3f::new(2.0, 0.0, 0.0));
        assert_eq!(segments[2].end, Point3f::new(0.0, 0.0, 2.0));
        assert_eq!(segments[1].color, Rgb::AXIS_Y);
    }
}
