//! Axis-aligned bounds of drawable geometry

use crate::point::*;
use crate::point_cloud::PointCloud;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Point3f,
    pub max: Point3f,
}

impl Aabb {
    pub fn new(min: Point3f, max: Point3f) -> Self {
        Self { min, max }
    }

    /// Bounds of a set of points, `None` when the set is empty
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3f>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self::new(first, first);
        for p in iter {
            aabb.include(&p);
        }
        Some(aabb)
    }

    /// Grow the box so it contains `p`
    pub fn include(&mut self, p: &Point3f) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Smallest box containing both
    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    pub fn center(&self) -> Point3f {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Length of the longest side
    pub fn max_extent(&self) -> f32 {
        self.extent().max()
    }

    pub fn diagonal(&self) -> f32 {
        self.extent().norm()
    }
}

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the bounding box of the object, `None` when it has no points
    fn bounding_box(&self) -> Option<Aabb>;

    /// Get the center point of the object
    fn center(&self) -> Option<Point3f> {
        self.bounding_box().map(|b| b.center())
    }
}

impl<T> Drawable for PointCloud<T>
where
    T: Clone + Copy,
    Point3f: From<T>,
{
    fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.points.iter().map(|p| Point3f::from(*p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_cloud::PointCloud3f;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_cloud_has_no_bounds() {
        assert!(PointCloud3f::new().bounding_box().is_none());
    }

    #[test]
    fn test_cloud_bounds_and_center() {
        let cloud = PointCloud3f::from_points(vec![
            Point3f::new(-1.0, 0.0, 2.0),
            Point3f::new(3.0, 4.0, -2.0),
        ]);
        let bounds = cloud.bounding_box().unwrap();

        assert_relative_eq!(bounds.min, Point3f::new(-1.0, 0.0, -2.0));
        assert_relative_eq!(bounds.max, Point3f::new(3.0, 4.0, 2.0));
        assert_relative_eq!(cloud.center().unwrap(), Point3f::new(1.0, 2.0, 0.0));
        assert_relative_eq!(bounds.max_extent(), 4.0);
    }

    #[test]
    fn test_merge() {
        let a = Aabb::new(Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3f::new(-2.0, 0.5, 0.5), Point3f::new(0.5, 3.0, 0.5));
        let m = a.merge(&b);

        assert_relative_eq!(m.min, Point3f::new(-2.0, 0.0, 0.0));
        assert_relative_eq!(m.max, Point3f::new(1.0, 3.0, 1.0));
    }
}
