//! Viewer configuration
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change:
//!
//! ```toml
//! data_root = "/mnt/run42/data"
//! write_match_reports = true
//!
//! [render]
//! point_size = 4.0
//!
//! [offset]
//! default = [0.0, 0.0, 5.0]
//! ```

use crate::error::IoError;
use cloudframe_core::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Directory holding one numbered sub-directory per frame
    pub data_root: PathBuf,
    pub window: WindowSettings,
    pub render: RenderSettings,
    pub offset: OffsetSettings,
    /// Write matched/unmatched map dense point listings next to each frame
    pub write_match_reports: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Point sprite size in pixels
    pub point_size: f32,
    pub background: [f32; 3],
    pub show_axes: bool,
    /// Lower bound for the coordinate axis length
    pub axis_length: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetSettings {
    /// Offset applied to transformed frame clouds on startup
    pub default: [f32; 3],
    /// Increment of one spin step or wheel notch
    pub step: f32,
    /// Offsets are clamped to `-limit..=limit`
    pub limit: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            window: WindowSettings::default(),
            render: RenderSettings::default(),
            offset: OffsetSettings::default(),
            write_match_reports: false,
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Point Cloud Visualization Tool".to_string(),
            width: 1920,
            height: 1080,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            point_size: 3.0,
            background: [0.9, 0.9, 0.95],
            show_axes: true,
            axis_length: 8.0,
        }
    }
}

impl Default for OffsetSettings {
    fn default() -> Self {
        Self {
            default: [0.0, 0.0, 10.0],
            step: 0.1,
            limit: 1000.0,
        }
    }
}

impl ViewerConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(IoError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(IoError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        let err = |msg: &str| Err(cloudframe_core::Error::Config(msg.to_string()));
        if self.render.point_size <= 0.0 {
            return err("render.point_size must be positive");
        }
        if self.offset.step <= 0.0 {
            return err("offset.step must be positive");
        }
        if self.offset.limit < 0.0 {
            return err("offset.limit must not be negative");
        }
        if self.window.width == 0 || self.window.height == 0 {
            return err("window size must be non-zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.offset.default, [0.0, 0.0, 10.0]);
        assert!(!config.write_match_reports);
    }

    #[test]
    fn test_partial_override() {
        let config = ViewerConfig::from_toml_str(
            "data_root = \"/tmp/run\"\n[render]\npoint_size = 5.0\n[offset]\nstep = 0.5\n",
        )
        .unwrap();

        assert_eq!(config.data_root, PathBuf::from("/tmp/run"));
        assert_eq!(config.render.point_size, 5.0);
        assert_eq!(config.render.axis_length, 8.0);
        assert_eq!(config.offset.step, 0.5);
        assert_eq!(config.offset.limit, 1000.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(ViewerConfig::from_toml_str("[render]\npoint_size = 0.0\n").is_err());
        assert!(ViewerConfig::from_toml_str("[offset]\nstep = -1.0\n").is_err());
        assert!(ViewerConfig::from_toml_str("data_root = 3").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(ViewerConfig::load("/definitely/not/here.toml").is_err());
    }
}
