//! On-disk dataset fixture shared by the integration tests
//!
//! ```text
//! 0/map     dense_cloud(4) ground_0(2) plane_1(3)
//! 1/frame   dense_cloud(3) ground_5(2) plane_7(2)
//! 1/map     dense_cloud(4) ground_0(2) plane_1(3) plane_2(2)
//! 1/debug.txt, 1/match.json
//! 2/frame   dense_cloud(2) ground_3(2)
//! 2/map     dense_cloud(2)
//! ```

use cloudframe_core::{Point3f, PointCloud};
use cloudframe_io::ply::PlyWriter;
use cloudframe_io::PointCloudWriter;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write `n` points along X starting at `x0`
pub fn write_cloud(path: &Path, x0: f32, n: usize) {
    let cloud: PointCloud<Point3f> = (0..n).map(|i| Point3f::new(x0 + i as f32, 0.0, 0.0)).collect();
    PlyWriter::write_point_cloud(&cloud, path).unwrap();
}

pub const DEBUG_TXT: &str = "\
T_init_w_b = t(xyz) = 0 0 0, q(wxyz) = 1 0 0 0
T_opt_w_b = t(xyz) = 1 0 0, q(wxyz) = 1 0 0 0
0iteration:
axis cost before 3.0 2.0 1.0
axis cost after 2.5 1.5 0.5
";

pub const MATCH_JSON: &str = r#"{
  "plane_match_infos": [
    { "cur_id": { "a": 2, "b": 5 }, "other_id": { "a": 2, "b": 0 }, "axis": 0 },
    { "cur_id": { "a": 1, "b": 7 }, "other_id": 1, "axis": 1 },
    { "cur_id": { "a": 1, "b": 7 }, "other_id": -1 }
  ],
  "dense_pt_match_infos": [
    { "cur_id": 0, "other_id": 3 },
    { "cur_id": 2, "other_id": 1 },
    { "cur_id": 1, "other_id": -1 },
    { "cur_id": 9, "other_id": 0 }
  ]
}"#;

pub fn create_dataset() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let r = root.path();
    for dir in ["0/map", "1/frame", "1/map", "2/frame", "2/map", "notes"] {
        fs::create_dir_all(r.join(dir)).unwrap();
    }

    write_cloud(&r.join("0/map/dense_cloud.ply"), 0.0, 4);
    write_cloud(&r.join("0/map/ground_0.ply"), 10.0, 2);
    write_cloud(&r.join("0/map/plane_1.ply"), 20.0, 3);

    write_cloud(&r.join("1/frame/dense_cloud.ply"), 0.0, 3);
    write_cloud(&r.join("1/frame/ground_5.ply"), 10.0, 2);
    write_cloud(&r.join("1/frame/plane_7.ply"), 20.0, 2);
    write_cloud(&r.join("1/map/dense_cloud.ply"), 0.0, 4);
    write_cloud(&r.join("1/map/ground_0.ply"), 10.0, 2);
    write_cloud(&r.join("1/map/plane_1.ply"), 20.0, 3);
    write_cloud(&r.join("1/map/plane_2.ply"), 30.0, 2);
    fs::write(r.join("1/debug.txt"), DEBUG_TXT).unwrap();
    fs::write(r.join("1/match.json"), MATCH_JSON).unwrap();

    write_cloud(&r.join("2/frame/dense_cloud.ply"), 0.0, 2);
    write_cloud(&r.join("2/frame/ground_3.ply"), 5.0, 2);
    write_cloud(&r.join("2/map/dense_cloud.ply"), 0.0, 2);

    root
}
