//! Reading frame-indexed point cloud datasets
//!
//! This crate knows the on-disk layout of a dataset (see [`dataset`]), decodes
//! the PLY clouds in it, and parses the two per-frame side files: the
//! optimizer log `debug.txt` and the correspondence file `match.json`.

pub mod config;
pub mod dataset;
pub mod debug_info;
pub mod error;
pub mod match_info;
pub mod ply;
pub mod report;

pub use config::*;
pub use dataset::*;
pub use debug_info::{DebugInfo, DebugParseError, Iteration, Pose};
pub use error::*;
pub use match_info::{pretty_json, CloudRef, MatchInfo, PlaneMatch};
pub use report::DenseMatchReport;

use cloudframe_core::{Point3f, PointCloud, Result};

/// Trait for reading point clouds from files
pub trait PointCloudReader {
    fn read_point_cloud<P: AsRef<std::path::Path>>(path: P) -> Result<PointCloud<Point3f>>;
}

/// Trait for writing point clouds to files
pub trait PointCloudWriter {
    fn write_point_cloud<P: AsRef<std::path::Path>>(cloud: &PointCloud<Point3f>, path: P) -> Result<()>;
}

/// Read a point cloud, picking the decoder from the file extension
pub fn read_point_cloud<P: AsRef<std::path::Path>>(path: P) -> Result<PointCloud<Point3f>> {
    let path = path.as_ref();
    match path.extension().and_then(|s| s.to_str()) {
        Some("ply") => ply::PlyReader::read_point_cloud(path),
        _ => Err(IoError::InvalidFormat {
            format: format!("{:?}", path.extension()),
        }
        .into()),
    }
}
