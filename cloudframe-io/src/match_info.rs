//! Model of the per-frame `match.json`
//!
//! ```json
//! {
//!   "plane_match_infos": [
//!     { "cur_id": { "a": 2, "b": 0 }, "other_id": { "a": 2, "b": 3 }, "axis": 0 },
//!     { "cur_id": { "a": 1, "b": 4 }, "other_id": -1 }
//!   ],
//!   "dense_pt_match_infos": [ { "cur_id": 17, "other_id": 2048 } ]
//! }
//! ```
//!
//! `a` is the cloud type code (1 plane, 2 ground) and `b` the cloud id.
//! Negative `other_id`s mark entries that found no partner.

use crate::dataset::AssetKind;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Identifier as it appears in the file: a typed object, a bare index, or junk
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IdRef {
    Typed { a: i64, b: i64 },
    Index(i64),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaneMatchRecord {
    #[serde(default)]
    pub cur_id: Option<IdRef>,
    #[serde(default)]
    pub other_id: Option<IdRef>,
    #[serde(default)]
    pub axis: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DenseMatchRecord {
    #[serde(default)]
    pub cur_id: Option<IdRef>,
    #[serde(default)]
    pub other_id: Option<IdRef>,
}

/// Parsed `match.json`. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MatchInfo {
    #[serde(default)]
    pub plane_match_infos: Vec<PlaneMatchRecord>,
    #[serde(default)]
    pub dense_pt_match_infos: Vec<DenseMatchRecord>,
}

/// A ground or plane cloud addressed by kind and id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CloudRef {
    pub kind: AssetKind,
    pub id: i64,
}

impl CloudRef {
    pub fn new(kind: AssetKind, id: i64) -> Self {
        Self { kind, id }
    }

    /// File stem of the cloud, e.g. `ground_3`
    pub fn stem(&self) -> String {
        format!("{}_{}", self.kind.prefix(), self.id)
    }
}

impl std::fmt::Display for CloudRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.stem())
    }
}

/// One usable correspondence between a frame cloud and a map cloud
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneMatch {
    /// Position of the record in `plane_match_infos`
    pub index: usize,
    /// Cloud in the current frame
    pub current: CloudRef,
    /// Cloud in the map
    pub other: CloudRef,
    pub axis: Option<String>,
}

impl PlaneMatch {
    pub fn label(&self) -> String {
        format!(
            "Axis{}: Frame {} <-> Map {}",
            self.axis.as_deref().unwrap_or("-"),
            self.current,
            self.other
        )
    }
}

impl MatchInfo {
    /// Parse a `match.json` document
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Plane/ground correspondences whose type code is known and whose map id is valid
    pub fn plane_matches(&self) -> Vec<PlaneMatch> {
        self.plane_match_infos
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let (cur_code, cur_id) = match record.cur_id.as_ref()? {
                    IdRef::Typed { a, b } => (*a, *b),
                    _ => return None,
                };
                let current_kind = AssetKind::from_type_code(cur_code)?;
                let (other_kind, other_id) = match record.other_id.as_ref()? {
                    IdRef::Typed { a, b } => (AssetKind::from_type_code(*a)?, *b),
                    IdRef::Index(b) => (current_kind, *b),
                    IdRef::Other(_) => return None,
                };
                if other_id < 0 {
                    return None;
                }
                Some(PlaneMatch {
                    index,
                    current: CloudRef::new(current_kind, cur_id),
                    other: CloudRef::new(other_kind, other_id),
                    axis: record.axis.as_ref().map(axis_label),
                })
            })
            .collect()
    }

    /// Frame dense point index -> map dense point index, skipping unmatched points
    pub fn dense_mapping(&self) -> BTreeMap<usize, usize> {
        self.dense_pt_match_infos
            .iter()
            .filter_map(|record| {
                let cur = as_index(record.cur_id.as_ref()?)?;
                let other = as_index(record.other_id.as_ref()?)?;
                Some((cur, other))
            })
            .collect()
    }
}

fn as_index(id: &IdRef) -> Option<usize> {
    match id {
        IdRef::Index(i) if *i >= 0 => usize::try_from(*i).ok(),
        _ => None,
    }
}

fn axis_label(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Re-indent a JSON document for display, or return it unchanged if it does not parse
pub fn pretty_json(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "plane_match_infos": [
            { "cur_id": { "a": 2, "b": 0 }, "other_id": { "a": 2, "b": 3 }, "axis": 0 },
            { "cur_id": { "a": 1, "b": 4 }, "other_id": -1, "axis": 1 },
            { "cur_id": { "a": 1, "b": 5 }, "other_id": 7, "axis": "z" },
            { "cur_id": { "a": 9, "b": 5 }, "other_id": 7 },
            { "cur_id": 3, "other_id": 7 },
            { "cur_id": { "a": 1, "b": 6 }, "other_id": null }
        ],
        "dense_pt_match_infos": [
            { "cur_id": 0, "other_id": 10 },
            { "cur_id": 1, "other_id": -1 },
            { "cur_id": 2, "other_id": 0 },
            { "cur_id": "x", "other_id": 4 }
        ],
        "something_else": true
    }"#;

    #[test]
    fn test_plane_matches_keep_only_valid_pairs() {
        let info = MatchInfo::from_json_str(SAMPLE).unwrap();
        assert_eq!(info.plane_match_infos.len(), 6);

        let matches = info.plane_matches();
        assert_eq!(matches.len(), 2);

        assert_eq!(matches[0].index, 0);
        assert_eq!(matches[0].current, CloudRef::new(AssetKind::Ground, 0));
        assert_eq!(matches[0].other, CloudRef::new(AssetKind::Ground, 3));
        assert_eq!(matches[0].label(), "Axis0: Frame ground_0 <-> Map ground_3");

        // bare integer partner inherits the current kind
        assert_eq!(matches[1].index, 2);
        assert_eq!(matches[1].other, CloudRef::new(AssetKind::Plane, 7));
        assert_eq!(matches[1].axis.as_deref(), Some("z"));
    }

    #[test]
    fn test_dense_mapping_skips_negative_and_malformed() {
        let info = MatchInfo::from_json_str(SAMPLE).unwrap();
        let mapping = info.dense_mapping();

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get(&0), Some(&10));
        assert_eq!(mapping.get(&2), Some(&0));
        assert_eq!(mapping.get(&1), None);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let info = MatchInfo::from_json_str("{}").unwrap();
        assert!(info.plane_matches().is_empty());
        assert!(info.dense_mapping().is_empty());
    }

    #[test]
    fn test_pretty_json() {
        assert_eq!(pretty_json(r#"{"a":1}"#), "{\n  \"a\": 1\n}");
        assert_eq!(pretty_json("not json"), "not json");
    }
}
