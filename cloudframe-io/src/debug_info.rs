//! Parser for the per-frame `debug.txt` optimizer log
//!
//! ```text
//! T_init_w_b = t(xyz) = 0 0 0, q(wxyz) = 1 0 0 0
//! T_opt_w_b = t(xyz) = 0.0008 0.0007 -0.0002, q(wxyz) = 1 -2.1e-05 -1.1e-04 -4.9e-05
//! 0iteration:
//! axis cost before 3.85690 1.70589 4.69210
//! axis cost after 3.83553 1.67809 4.67178
//! ```

use cloudframe_core::Transform3D;
use serde::Serialize;
use thiserror::Error;

const INIT_KEY: &str = "T_init_w_b";
const OPT_KEY: &str = "T_opt_w_b";
const COST_BEFORE: &str = "axis cost before";
const COST_AFTER: &str = "axis cost after";

/// A body pose in the world frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pose {
    pub translation: [f64; 3],
    /// `w, x, y, z`, not necessarily normalized
    pub quaternion: [f64; 4],
}

impl Pose {
    pub fn to_transform(&self) -> Transform3D {
        Transform3D::from_pose(self.translation, self.quaternion)
    }
}

/// Per-axis cost of one optimizer iteration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Iteration {
    pub index: u32,
    pub cost_before: Option<[f64; 3]>,
    pub cost_after: Option<[f64; 3]>,
}

/// Parsed contents of `debug.txt`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugInfo {
    /// Initial guess
    pub init: Pose,
    /// Optimized pose used to place the frame onto the map
    pub optimized: Pose,
    pub iterations: Vec<Iteration>,
}

/// Why a debug log could not be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DebugParseError {
    #[error("no valid {0} line")]
    MissingPose(&'static str),
}

impl DebugInfo {
    /// Parse a debug log. Both poses are required; iterations are optional.
    pub fn parse(text: &str) -> Result<Self, DebugParseError> {
        let mut init = None;
        let mut optimized = None;
        let mut iterations: Vec<Iteration> = Vec::new();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if line.starts_with(INIT_KEY) {
                init = parse_pose(line).or(init);
            } else if line.starts_with(OPT_KEY) {
                optimized = parse_pose(line).or(optimized);
            } else if let Some(index) = parse_iteration_header(line) {
                iterations.push(Iteration {
                    index,
                    cost_before: None,
                    cost_after: None,
                });
            } else if let Some(rest) = find_after(line, COST_BEFORE) {
                if let Some(current) = iterations.last_mut() {
                    current.cost_before = parse_fixed::<3>(rest);
                }
            } else if let Some(rest) = find_after(line, COST_AFTER) {
                if let Some(current) = iterations.last_mut() {
                    current.cost_after = parse_fixed::<3>(rest);
                }
            }
        }

        Ok(Self {
            init: init.ok_or(DebugParseError::MissingPose(INIT_KEY))?,
            optimized: optimized.ok_or(DebugParseError::MissingPose(OPT_KEY))?,
            iterations,
        })
    }

    pub fn optimized_transform(&self) -> Transform3D {
        self.optimized.to_transform()
    }
}

/// `<prefix> = t(xyz) = x y z, q(wxyz) = w x y z`
fn parse_pose(line: &str) -> Option<Pose> {
    let t = find_after(line, "t(xyz)")?;
    let q = find_after(line, "q(wxyz)")?;
    Some(Pose {
        translation: parse_fixed::<3>(strip_assignment(t))?,
        quaternion: parse_fixed::<4>(strip_assignment(q))?,
    })
}

/// Numbers following `= ` up to the next comma
fn strip_assignment(s: &str) -> &str {
    let s = s.trim_start();
    let s = s.strip_prefix('=').unwrap_or(s);
    s.split(',').next().unwrap_or(s)
}

/// `12iteration:` -> 12, ignoring anything after the colon
fn parse_iteration_header(line: &str) -> Option<u32> {
    let (digits, _) = line.split_once("iteration:")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn find_after<'a>(line: &'a str, needle: &str) -> Option<&'a str> {
    line.find(needle).map(|pos| &line[pos + needle.len()..])
}

/// Exactly `N` whitespace separated floats
fn parse_fixed<const N: usize>(s: &str) -> Option<[f64; N]> {
    let values: Vec<f64> = s
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    values.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cloudframe_core::Point3f;

    const SAMPLE: &str = "\
T_init_w_b = t(xyz) = 0 0 0, q(wxyz) = 1 0 0 0
T_opt_w_b = t(xyz) = 0.5 -1 2e-1, q(wxyz) = 1 0 0 0
axis cost before 9 9 9
0iteration:
axis cost before 3.85690 1.70589 4.69210
axis cost after 3.83553 1.67809 4.67178
1iteration:
axis cost before 1 2
";

    #[test]
    fn test_parse_poses_and_iterations() {
        let info = DebugInfo::parse(SAMPLE).unwrap();

        assert_eq!(info.init.quaternion, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(info.optimized.translation, [0.5, -1.0, 0.2]);
        assert_eq!(info.iterations.len(), 2);
        assert_eq!(info.iterations[0].index, 0);
        assert_eq!(info.iterations[0].cost_before, Some([3.8569, 1.70589, 4.6921]));
        assert_eq!(info.iterations[0].cost_after, Some([3.83553, 1.67809, 4.67178]));
        // wrong arity leaves the cost unset
        assert_eq!(info.iterations[1].cost_before, None);
    }

    #[test]
    fn test_missing_optimized_pose_fails() {
        let text = "T_init_w_b = t(xyz) = 0 0 0, q(wxyz) = 1 0 0 0\n0iteration:\n";
        assert_eq!(
            DebugInfo::parse(text),
            Err(DebugParseError::MissingPose("T_opt_w_b"))
        );
    }

    #[test]
    fn test_malformed_pose_counts_as_missing() {
        let text = "T_init_w_b = t(xyz) = 0 0 0, q(wxyz) = 1 0 0 0\nT_opt_w_b = t(xyz) = 0 0, q(wxyz) = 1 0 0 0\n";
        assert!(DebugInfo::parse(text).is_err());
    }

    #[test]
    fn test_optimized_transform_applies_translation() {
        let info = DebugInfo::parse(SAMPLE).unwrap();
        let p = info.optimized_transform().transform_point(&Point3f::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p, Point3f::new(1.5, 0.0, 1.2), epsilon = 1e-6);
    }

    #[test]
    fn test_header_with_trailing_text_starts_iteration() {
        let text = "\
T_init_w_b = t(xyz) = 0 0 0, q(wxyz) = 1 0 0 0
T_opt_w_b = t(xyz) = 0 0 0, q(wxyz) = 1 0 0 0
3iteration: lambda 0.01
axis cost after 1 2 3
";
        let info = DebugInfo::parse(text).unwrap();
        assert_eq!(info.iterations.len(), 1);
        assert_eq!(info.iterations[0].index, 3);
        assert_eq!(info.iterations[0].cost_after, Some([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_iteration_header() {
        assert_eq!(parse_iteration_header("12iteration:"), Some(12));
        assert_eq!(parse_iteration_header("iteration:"), None);
        assert_eq!(parse_iteration_header("x1iteration:"), None);
        assert_eq!(parse_iteration_header("7iteration: step 0.5"), Some(7));
    }
}
