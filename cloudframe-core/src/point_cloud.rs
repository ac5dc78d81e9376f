//! Point cloud data structures and functionality

use crate::color::Rgb;
use crate::point::*;
use crate::transform::Transform3D;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Clouds at least this large are transformed on the rayon pool
const PARALLEL_THRESHOLD: usize = 16_384;

/// A generic point cloud container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

/// A point cloud with 3D points
pub type PointCloud3f = PointCloud<Point3f>;

/// A point cloud with colored points
pub type ColoredPointCloud3f = PointCloud<ColoredPoint3f>;

impl<T> PointCloud<T> {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: T) {
        self.points.push(point);
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<T> {
        self.points.iter()
    }

    /// Get the point at `index`, if any
    pub fn get(&self, index: usize) -> Option<&T> {
        self.points.get(index)
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<T> IntoIterator for PointCloud<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T> Extend<T> for PointCloud<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

impl<T> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

impl PointCloud<Point3f> {
    /// Apply a transformation to all points in the cloud
    pub fn transform(&mut self, transform: &Transform3D) {
        if self.points.len() >= PARALLEL_THRESHOLD {
            self.points
                .par_iter_mut()
                .for_each(|point| *point = transform.transform_point(point));
        } else {
            for point in &mut self.points {
                *point = transform.transform_point(point);
            }
        }
    }

    /// Return a transformed copy of the cloud
    pub fn transformed(&self, transform: &Transform3D) -> Self {
        let mut copy = self.clone();
        copy.transform(transform);
        copy
    }

    /// Pair every point with a single color
    pub fn paint_uniform(&self, color: Rgb) -> ColoredPointCloud3f {
        self.points
            .iter()
            .map(|p| ColoredPoint3f::new(*p, color))
            .collect()
    }

    /// Pair every point with its own color; missing colors fall back to `fallback`
    pub fn paint_each(&self, colors: &[Rgb], fallback: Rgb) -> ColoredPointCloud3f {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| ColoredPoint3f::new(*p, colors.get(i).copied().unwrap_or(fallback)))
            .collect()
    }
}

impl PointCloud<ColoredPoint3f> {
    /// Positions without their colors
    pub fn positions(&self) -> impl Iterator<Item = Point3f> + '_ {
        self.points.iter().map(|p| p.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_transform_translates_every_point() {
        let mut cloud = PointCloud3f::from_points(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 2.0, 3.0),
        ]);
        cloud.transform(&Transform3D::translation(Vector3::new(0.0, 0.0, 10.0)));

        assert_relative_eq!(cloud[0].z, 10.0);
        assert_relative_eq!(cloud[1].z, 13.0);
        assert_relative_eq!(cloud[1].x, 1.0);
    }

    #[test]
    fn test_large_cloud_uses_same_result_in_parallel() {
        let cloud: PointCloud3f = (0..PARALLEL_THRESHOLD + 5)
            .map(|i| Point3f::new(i as f32, 0.0, 0.0))
            .collect();
        let shifted = cloud.transformed(&Transform3D::translation(Vector3::new(1.0, 0.0, 0.0)));

        assert_eq!(shifted.len(), cloud.len());
        assert_relative_eq!(shifted[PARALLEL_THRESHOLD].x, PARALLEL_THRESHOLD as f32 + 1.0);
    }

    #[test]
    fn test_paint_each_falls_back_for_missing_colors() {
        let cloud = PointCloud3f::from_points(vec![Point3f::origin(), Point3f::origin()]);
        let painted = cloud.paint_each(&[Rgb::GREEN], Rgb::RED);

        assert_eq!(painted[0].color, Rgb::GREEN);
        assert_eq!(painted[1].color, Rgb::RED);
    }
}
