//! Text listings of matched and unmatched map dense points

use cloudframe_core::Result;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// Split of the map dense cloud into points that a frame point matched and the rest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DenseMatchReport {
    /// Map point id -> frame point id, for every map point that was matched
    pub matched: BTreeMap<usize, usize>,
    pub unmatched: Vec<usize>,
}

impl DenseMatchReport {
    /// Build the report for a map dense cloud of `map_len` points.
    ///
    /// `mapping` goes frame point -> map point. Map ids outside the cloud are
    /// ignored. When several frame points hit the same map point the smallest
    /// frame id is reported.
    pub fn new(map_len: usize, mapping: &BTreeMap<usize, usize>) -> Self {
        let mut matched = BTreeMap::new();
        for (&frame_id, &map_id) in mapping {
            if map_id < map_len {
                matched.entry(map_id).or_insert(frame_id);
            }
        }
        let unmatched = (0..map_len).filter(|id| !matched.contains_key(id)).collect();
        Self { matched, unmatched }
    }

    pub fn matched_listing(&self) -> String {
        let mut out = format!(
            "Matched map dense_cloud point ids ({} total, descending)\n{}\n",
            self.matched.len(),
            "=".repeat(50)
        );
        for (map_id, frame_id) in self.matched.iter().rev() {
            let _ = writeln!(out, "map_id: {map_id:6} -> frame_id: {frame_id}");
        }
        out
    }

    pub fn unmatched_listing(&self) -> String {
        let mut out = format!(
            "Unmatched map dense_cloud point ids ({} total, descending)\n{}\n",
            self.unmatched.len(),
            "=".repeat(50)
        );
        for id in self.unmatched.iter().rev() {
            let _ = writeln!(out, "{id}");
        }
        out
    }

    /// Write both listings into `dir`, returning the matched and unmatched paths
    pub fn write(&self, dir: &Path, frame_id: u32) -> Result<(PathBuf, PathBuf)> {
        let matched_path = dir.join(format!("matched_map_dense_cloud_points_{frame_id}.txt"));
        let unmatched_path = dir.join(format!("unmatched_map_dense_cloud_points_{frame_id}.txt"));
        std::fs::write(&matched_path, self.matched_listing())?;
        std::fs::write(&unmatched_path, self.unmatched_listing())?;
        info!(
            "Wrote dense match report for frame {}: {} matched, {} unmatched",
            frame_id,
            self.matched.len(),
            self.unmatched.len()
        );
        Ok((matched_path, unmatched_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> BTreeMap<usize, usize> {
        BTreeMap::from([(0, 3), (1, 1), (2, 9), (5, 3)])
    }

    #[test]
    fn test_split_ignores_out_of_range() {
        let report = DenseMatchReport::new(4, &mapping());
        assert_eq!(report.matched, BTreeMap::from([(1, 1), (3, 0)]));
        assert_eq!(report.unmatched, vec![0, 2]);
    }

    #[test]
    fn test_listings_are_descending() {
        let report = DenseMatchReport::new(4, &mapping());
        let matched = report.matched_listing();
        let lines: Vec<&str> = matched.lines().skip(2).collect();
        assert_eq!(lines, vec!["map_id:      3 -> frame_id: 0", "map_id:      1 -> frame_id: 1"]);

        let unmatched = report.unmatched_listing();
        assert_eq!(unmatched.lines().skip(2).collect::<Vec<_>>(), vec!["2", "0"]);
    }

    #[test]
    fn test_write_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let report = DenseMatchReport::new(2, &BTreeMap::from([(0, 1)]));
        let (matched, unmatched) = report.write(dir.path(), 7).unwrap();

        assert!(matched.ends_with("matched_map_dense_cloud_points_7.txt"));
        assert!(std::fs::read_to_string(unmatched).unwrap().ends_with("0\n"));
    }
}
