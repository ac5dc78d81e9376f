//! Scene composition against an on-disk dataset

mod common;

use approx::assert_relative_eq;
use cloudframe_core::{distinct_colors, Error, IdPalette, Point3f, Rgb, Vector3f};
use cloudframe_io::{AssetKind, Dataset};
use cloudframe_visualization::compose::{AXES, MATCH_LINES};
use cloudframe_visualization::{compose_frame, ComposeOptions, GeometryData, GeometryRole, Layer, Scene};

fn colors_of(scene: &Scene, name: &str) -> Vec<Rgb> {
    scene
        .get(name)
        .and_then(|g| g.points())
        .unwrap_or_else(|| panic!("no point geometry {name}"))
        .iter()
        .map(|p| p.color)
        .collect()
}

fn names(scene: &Scene) -> Vec<&str> {
    scene.iter().map(|g| g.name.as_str()).collect()
}

#[test]
fn test_first_frame_shows_map_only() {
    let root = common::create_dataset();
    let dataset = Dataset::open(root.path()).unwrap();
    let palette = IdPalette::default();

    let composed = compose_frame(&dataset, 0, &ComposeOptions::default(), &palette).unwrap();
    let scene = &composed.scene;

    assert_eq!(names(scene), vec!["map_dense_cloud", "map_ground_0", "map_plane_1", AXES]);
    assert!(colors_of(scene, "map_dense_cloud").iter().all(|&c| c == Rgb::DENSE_DEFAULT));
    assert!(colors_of(scene, "map_ground_0").iter().all(|&c| c == palette.color_for(0)));
    assert!(colors_of(scene, "map_plane_1").iter().all(|&c| c == palette.color_for(1)));
    assert!(!composed.is_transformed());
    assert!(composed.debug_text.is_none());
}

#[test]
fn test_tracked_frame_is_placed_on_map() {
    let root = common::create_dataset();
    let dataset = Dataset::open(root.path()).unwrap();
    let palette = IdPalette::default();
    let options = ComposeOptions {
        offset: Vector3f::new(0.0, 0.0, 10.0),
        ..ComposeOptions::default()
    };

    let composed = compose_frame(&dataset, 1, &options, &palette).unwrap();
    let scene = &composed.scene;
    assert!(composed.is_transformed());
    assert!(!scene.contains("dense_cloud"));

    let dense = scene.get("transformed_dense_cloud").unwrap();
    assert_eq!(
        dense.role,
        GeometryRole::cloud(Layer::Transformed, AssetKind::DenseCloud, None)
    );
    let dense_points = dense.points().unwrap();
    assert_relative_eq!(dense_points[0].position, Point3f::new(1.0, 0.0, 10.0), epsilon = 1e-5);
    assert_relative_eq!(dense_points[2].position, Point3f::new(3.0, 0.0, 10.0), epsilon = 1e-5);
    assert_eq!(colors_of(scene, "transformed_dense_cloud"), distinct_colors(3));

    assert!(colors_of(scene, "transformed_ground_5")
        .iter()
        .all(|&c| c == palette.color_for(5)));
}

#[test]
fn test_map_is_colored_by_matches() {
    let root = common::create_dataset();
    let dataset = Dataset::open(root.path()).unwrap();
    let palette = IdPalette::default();

    let composed = compose_frame(&dataset, 1, &ComposeOptions::default(), &palette).unwrap();
    let scene = &composed.scene;

    assert_eq!(composed.plane_matches.len(), 2);
    // matched map clouds share their frame partner's colour
    assert!(colors_of(scene, "map_ground_0").iter().all(|&c| c == palette.color_for(5)));
    assert!(colors_of(scene, "map_plane_1").iter().all(|&c| c == palette.color_for(7)));
    assert!(colors_of(scene, "map_plane_2").iter().all(|&c| c == Rgb::UNMATCHED));

    let frame_colors = distinct_colors(3);
    let map_dense = colors_of(scene, "map_dense_cloud");
    assert_eq!(map_dense[3], frame_colors[0]);
    assert_eq!(map_dense[1], frame_colors[2]);
    assert_eq!(map_dense[0], Rgb::UNMATCHED);
    assert_eq!(map_dense[2], Rgb::UNMATCHED);
}

#[test]
fn test_match_lines_join_dense_pairs() {
    let root = common::create_dataset();
    let dataset = Dataset::open(root.path()).unwrap();

    let composed = compose_frame(&dataset, 1, &ComposeOptions::default(), &IdPalette::default()).unwrap();
    assert_eq!(composed.dense_line_count, 2);

    let lines = composed.scene.get(MATCH_LINES).unwrap();
    assert_eq!(lines.role, GeometryRole::MatchLines);
    let GeometryData::Lines(segments) = &lines.data else {
        panic!("match lines are not a line set");
    };
    assert!(segments.iter().all(|s| s.color == Rgb::MATCH_LINE));
    // frame dense point 2 ends at map dense point 1
    assert_relative_eq!(segments[1].end, Point3f::new(1.0, 0.0, 0.0));
}

#[test]
fn test_frame_without_debug_shows_raw_clouds() {
    let root = common::create_dataset();
    let dataset = Dataset::open(root.path()).unwrap();
    let palette = IdPalette::default();

    let composed = compose_frame(&dataset, 2, &ComposeOptions::default(), &palette).unwrap();
    let scene = &composed.scene;

    assert!(!composed.is_transformed());
    assert!(scene.contains("dense_cloud"));
    assert!(scene.contains("ground_3"));
    assert!(!scene.contains(MATCH_LINES));
    assert!(colors_of(scene, "dense_cloud").iter().all(|&c| c == Rgb::DENSE_DEFAULT));
    assert!(colors_of(scene, "map_dense_cloud").iter().all(|&c| c == Rgb::DENSE_DEFAULT));

    let ground = scene.get("ground_3").unwrap().points().unwrap();
    assert_relative_eq!(ground[0].position, Point3f::new(5.0, 0.0, 0.0));
}

#[test]
fn test_reports_are_written_only_on_request() {
    let root = common::create_dataset();
    let dataset = Dataset::open(root.path()).unwrap();
    let report_path = root.path().join("1/matched_map_dense_cloud_points_1.txt");

    let composed = compose_frame(&dataset, 1, &ComposeOptions::default(), &IdPalette::default()).unwrap();
    assert!(composed.report.is_none());
    assert!(!report_path.exists());

    let options = ComposeOptions {
        write_match_reports: true,
        ..ComposeOptions::default()
    };
    let composed = compose_frame(&dataset, 1, &options, &IdPalette::default()).unwrap();
    let report = composed.report.unwrap();
    assert_eq!(report.matched.len(), 3);
    assert_eq!(report.unmatched, vec![2]);
    assert!(report_path.exists());
    assert!(root.path().join("1/unmatched_map_dense_cloud_points_1.txt").exists());
}

#[test]
fn test_axes_follow_options() {
    let root = common::create_dataset();
    let dataset = Dataset::open(root.path()).unwrap();
    let options = ComposeOptions {
        show_axes: false,
        ..ComposeOptions::default()
    };

    let composed = compose_frame(&dataset, 0, &options, &IdPalette::default()).unwrap();
    assert!(!composed.scene.contains(AXES));
}

#[test]
fn test_unknown_frame_is_rejected() {
    let root = common::create_dataset();
    let dataset = Dataset::open(root.path()).unwrap();
    let result = compose_frame(&dataset, 42, &ComposeOptions::default(), &IdPalette::default());
    assert!(matches!(result, Err(Error::UnknownFrame(42))));
}
