//! On-disk dataset layout
//!
//! ```text
//! <root>/
//!   0/
//!     map/    dense_cloud.ply ground_0.ply ground_0.json plane_3.ply ...
//!   1/
//!     frame/  dense_cloud.ply ground_0.ply plane_0.ply ...
//!     map/    ...
//!     debug.txt
//!     match.json
//! ```
//!
//! Frame directories are the sub-directories of the root whose names are all
//! digits. Everything else in the root is ignored.

use crate::debug_info::DebugInfo;
use crate::error::IoError;
use crate::match_info::MatchInfo;
use crate::ply::PlyReader;
use crate::PointCloudReader;
use cloudframe_core::{PointCloud3f, Result};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEBUG_FILE: &str = "debug.txt";
pub const MATCH_FILE: &str = "match.json";
pub const DENSE_CLOUD_STEM: &str = "dense_cloud";

/// Which half of a frame directory to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetType {
    Frame,
    Map,
}

impl DatasetType {
    pub fn dir_name(self) -> &'static str {
        match self {
            DatasetType::Frame => "frame",
            DatasetType::Map => "map",
        }
    }
}

impl std::fmt::Display for DatasetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Semantic subset a point cloud file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetKind {
    Ground,
    Plane,
    DenseCloud,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Ground, AssetKind::Plane, AssetKind::DenseCloud];

    /// File name prefix, also used in geometry names
    pub fn prefix(self) -> &'static str {
        match self {
            AssetKind::Ground => "ground",
            AssetKind::Plane => "plane",
            AssetKind::DenseCloud => DENSE_CLOUD_STEM,
        }
    }

    /// Human readable name for buttons and labels
    pub fn display_name(self) -> &'static str {
        match self {
            AssetKind::Ground => "Ground",
            AssetKind::Plane => "Plane",
            AssetKind::DenseCloud => "Dense Cloud",
        }
    }

    /// Type code used by `match.json`
    pub fn from_type_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(AssetKind::Plane),
            2 => Some(AssetKind::Ground),
            _ => None,
        }
    }

    /// Classify a `.ply` file stem
    pub fn from_stem(stem: &str) -> Option<Self> {
        if stem == DENSE_CLOUD_STEM {
            Some(AssetKind::DenseCloud)
        } else if stem.starts_with("ground_") {
            Some(AssetKind::Ground)
        } else if stem.starts_with("plane_") {
            Some(AssetKind::Plane)
        } else {
            None
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Identifier carried in a file name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileId {
    DenseCloud,
    Numeric(i64),
    Name(String),
}

impl FileId {
    /// `dense_cloud` -> DenseCloud, `plane_12` -> 12, anything else -> the stem itself
    pub fn from_stem(stem: &str) -> Self {
        if stem == DENSE_CLOUD_STEM {
            return FileId::DenseCloud;
        }
        stem.rsplit_once('_')
            .and_then(|(_, last)| last.parse().ok())
            .map(FileId::Numeric)
            .unwrap_or_else(|| FileId::Name(stem.to_string()))
    }

    pub fn numeric(&self) -> Option<i64> {
        match self {
            FileId::Numeric(id) => Some(*id),
            _ => None,
        }
    }
}

/// Files found in one `frame/` or `map/` directory, each list sorted by path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameFiles {
    pub dense_cloud: Option<PathBuf>,
    pub grounds: Vec<PathBuf>,
    pub planes: Vec<PathBuf>,
    pub json: Vec<PathBuf>,
}

impl FrameFiles {
    pub fn is_empty(&self) -> bool {
        self.dense_cloud.is_none() && self.grounds.is_empty() && self.planes.is_empty()
    }

    /// Every point cloud file, dense cloud first
    pub fn clouds(&self) -> impl Iterator<Item = &PathBuf> {
        self.dense_cloud
            .iter()
            .chain(self.grounds.iter())
            .chain(self.planes.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Abc {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// Plane equation `a*x + b*y + c*z + d = 0`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PlaneParam {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

/// Typed view of a ground/plane sidecar JSON
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct PlaneMetadata {
    #[serde(default)]
    pub center: Option<Abc>,
    #[serde(default)]
    pub plane_param: Option<PlaneParam>,
    #[serde(default)]
    pub radius: Option<f64>,
}

/// Sidecar JSON stored next to a `.ply` file
#[derive(Debug, Clone, PartialEq)]
pub struct Sidecar {
    pub raw: serde_json::Value,
    pub plane: Option<PlaneMetadata>,
}

/// A decoded point cloud file
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    /// File stem, e.g. `ground_2`
    pub stem: String,
    pub kind: AssetKind,
    /// Numeric id for grounds and planes, `None` for the dense cloud
    pub id: Option<i64>,
    pub path: PathBuf,
    pub cloud: PointCloud3f,
    pub sidecar: Option<Sidecar>,
}

/// All clouds of one `frame/` or `map/` directory
#[derive(Debug, Clone)]
pub struct FrameData {
    pub frame_id: u32,
    pub dataset_type: DatasetType,
    pub dense_cloud: Option<LoadedAsset>,
    pub grounds: Vec<LoadedAsset>,
    pub planes: Vec<LoadedAsset>,
}

impl FrameData {
    pub fn assets(&self) -> impl Iterator<Item = &LoadedAsset> {
        self.dense_cloud
            .iter()
            .chain(self.grounds.iter())
            .chain(self.planes.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.dense_cloud.is_none() && self.grounds.is_empty() && self.planes.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.assets().map(|a| a.cloud.len()).sum()
    }
}

/// Root of a frame-indexed dataset
#[derive(Debug, Clone)]
pub struct Dataset {
    root: PathBuf,
}

impl Dataset {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(IoError::NotADirectory {
                path: root.to_path_buf(),
            }
            .into());
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Numeric frame ids in ascending order
    pub fn frames(&self) -> Result<Vec<u32>> {
        let mut frames = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            match name.parse::<u32>() {
                Ok(id) => frames.push(id),
                Err(_) => warn!("Ignoring frame directory with out-of-range id: {}", name),
            }
        }
        frames.sort_unstable();
        frames.dedup();
        Ok(frames)
    }

    pub fn frame_dir(&self, frame_id: u32) -> PathBuf {
        self.root.join(frame_id.to_string())
    }

    pub fn type_dir(&self, frame_id: u32, dataset_type: DatasetType) -> PathBuf {
        self.frame_dir(frame_id).join(dataset_type.dir_name())
    }

    pub fn has_frame(&self, frame_id: u32) -> bool {
        self.frame_dir(frame_id).is_dir()
    }

    /// List the point cloud and JSON files of a frame. A missing directory yields no files.
    pub fn discover(&self, frame_id: u32, dataset_type: DatasetType) -> Result<FrameFiles> {
        let dir = self.type_dir(frame_id, dataset_type);
        let mut files = FrameFiles::default();
        if !dir.is_dir() {
            debug!("No {} directory for frame {}", dataset_type, frame_id);
            return Ok(files);
        }

        let entries: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;

        for path in entries.into_iter().filter(|p| p.is_file()).sorted() {
            let (Some(stem), Some(ext)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension().and_then(|s| s.to_str()),
            ) else {
                continue;
            };
            match ext {
                "ply" => match AssetKind::from_stem(stem) {
                    Some(AssetKind::DenseCloud) => files.dense_cloud = Some(path.clone()),
                    Some(AssetKind::Ground) => files.grounds.push(path.clone()),
                    Some(AssetKind::Plane) => files.planes.push(path.clone()),
                    None => debug!("Skipping unrecognised cloud {}", path.display()),
                },
                "json" => files.json.push(path.clone()),
                _ => {}
            }
        }

        Ok(files)
    }

    /// Decode every cloud of a frame. Unreadable or empty files are skipped.
    pub fn load_frame(&self, frame_id: u32, dataset_type: DatasetType) -> Result<FrameData> {
        let files = self.discover(frame_id, dataset_type)?;

        let mut assets: Vec<LoadedAsset> = files
            .clouds()
            .cloned()
            .collect::<Vec<_>>()
            .into_par_iter()
            .filter_map(|path| load_asset(&path))
            .collect();

        let dense_cloud = assets
            .iter()
            .position(|a| a.kind == AssetKind::DenseCloud)
            .map(|i| assets.remove(i));
        let (grounds, planes): (Vec<_>, Vec<_>) = assets
            .into_iter()
            .partition(|a| a.kind == AssetKind::Ground);

        let data = FrameData {
            frame_id,
            dataset_type,
            dense_cloud,
            grounds,
            planes,
        };
        info!(
            "Loaded frame {} ({}): {} grounds, {} planes, dense cloud {}, {} points",
            frame_id,
            dataset_type,
            data.grounds.len(),
            data.planes.len(),
            if data.dense_cloud.is_some() { "present" } else { "absent" },
            data.point_count()
        );
        Ok(data)
    }

    pub fn debug_path(&self, frame_id: u32) -> PathBuf {
        self.frame_dir(frame_id).join(DEBUG_FILE)
    }

    pub fn match_path(&self, frame_id: u32) -> PathBuf {
        self.frame_dir(frame_id).join(MATCH_FILE)
    }

    /// Raw `debug.txt`, `None` when the frame has none
    pub fn debug_text(&self, frame_id: u32) -> Result<Option<String>> {
        read_optional(&self.debug_path(frame_id))
    }

    /// Raw `match.json`, `None` when the frame has none
    pub fn match_text(&self, frame_id: u32) -> Result<Option<String>> {
        read_optional(&self.match_path(frame_id))
    }

    /// Parsed `debug.txt`. A log without both poses is reported as invalid data.
    pub fn debug_info(&self, frame_id: u32) -> Result<Option<DebugInfo>> {
        let Some(text) = self.debug_text(frame_id)? else {
            return Ok(None);
        };
        DebugInfo::parse(&text).map(Some).map_err(|e| {
            IoError::ParseError {
                path: self.debug_path(frame_id),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Parsed `match.json`
    pub fn match_info(&self, frame_id: u32) -> Result<Option<MatchInfo>> {
        let Some(text) = self.match_text(frame_id)? else {
            return Ok(None);
        };
        MatchInfo::from_json_str(&text).map(Some).map_err(|source| {
            IoError::Json {
                path: self.match_path(frame_id),
                source,
            }
            .into()
        })
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn load_asset(path: &Path) -> Option<LoadedAsset> {
    let stem = path.file_stem()?.to_str()?.to_string();
    let kind = AssetKind::from_stem(&stem)?;
    let id = match (kind, FileId::from_stem(&stem)) {
        (AssetKind::DenseCloud, _) => None,
        (_, FileId::Numeric(id)) => Some(id),
        (_, other) => {
            warn!("Skipping {}: no numeric id in {:?}", path.display(), other);
            return None;
        }
    };

    let cloud = match PlyReader::read_point_cloud(path) {
        Ok(cloud) if cloud.is_empty() => {
            warn!("Skipping {}: no points", path.display());
            return None;
        }
        Ok(cloud) => cloud,
        Err(e) => {
            warn!("Skipping {}: {}", path.display(), e);
            return None;
        }
    };

    Some(LoadedAsset {
        sidecar: load_sidecar(&path.with_extension("json")),
        stem,
        kind,
        id,
        path: path.to_path_buf(),
        cloud,
    })
}

fn load_sidecar(path: &Path) -> Option<Sidecar> {
    let text = std::fs::read_to_string(path).ok()?;
    let raw: serde_json::Value = match serde_json::from_str(&text) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Ignoring malformed sidecar {}: {}", path.display(), e);
            return None;
        }
    };
    let plane = serde_json::from_value::<PlaneMetadata>(raw.clone()).ok();
    Some(Sidecar { raw, plane })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_from_stem() {
        assert_eq!(FileId::from_stem("dense_cloud"), FileId::DenseCloud);
        assert_eq!(FileId::from_stem("ground_0"), FileId::Numeric(0));
        assert_eq!(FileId::from_stem("plane_x_12"), FileId::Numeric(12));
        assert_eq!(FileId::from_stem("plane_top"), FileId::Name("plane_top".into()));
        assert_eq!(FileId::from_stem("cloud"), FileId::Name("cloud".into()));
    }

    #[test]
    fn test_asset_kind_from_stem() {
        assert_eq!(AssetKind::from_stem("dense_cloud"), Some(AssetKind::DenseCloud));
        assert_eq!(AssetKind::from_stem("ground_3"), Some(AssetKind::Ground));
        assert_eq!(AssetKind::from_stem("plane_1"), Some(AssetKind::Plane));
        assert_eq!(AssetKind::from_stem("planes"), None);
        assert_eq!(AssetKind::from_stem("dense_cloud_2"), None);
    }

    #[test]
    fn test_type_codes() {
        assert_eq!(AssetKind::from_type_code(1), Some(AssetKind::Plane));
        assert_eq!(AssetKind::from_type_code(2), Some(AssetKind::Ground));
        assert_eq!(AssetKind::from_type_code(0), None);
    }

    #[test]
    fn test_open_rejects_missing_root() {
        assert!(Dataset::open("/no/such/data/root").is_err());
    }
}
