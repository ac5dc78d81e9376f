//! Builds the scene shown for one frame
//!
//! Frame 0 is the reference and only shows its map. Every later frame shows
//! its own clouds placed onto the map by the optimized pose from `debug.txt`
//! (plus a user offset), and colours the map by what matched:
//!
//! * a matched map ground/plane takes the colour of its frame partner,
//!   unmatched ones are red;
//! * matched map dense points take the colour of the frame point that hit
//!   them, the rest are red;
//! * yellow lines join every matched pair of dense points.

use crate::axes::{axis_length, axis_segments};
use crate::scene::{GeometryData, GeometryRole, Layer, LineSegment, Scene};
use cloudframe_core::{
    distinct_colors, ColoredPointCloud3f, Error, IdPalette, PointCloud3f, Result, Rgb, Vector3f,
};
use cloudframe_io::{
    AssetKind, CloudRef, Dataset, DatasetType, DebugInfo, DenseMatchReport, FrameData, LoadedAsset,
    MatchInfo, PlaneMatch, Sidecar,
};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Name of the yellow dense correspondence line set
pub const MATCH_LINES: &str = "match_lines";
/// Name of the coordinate axes line set
pub const AXES: &str = "axes";

/// Inputs of [`compose_frame`] that come from the UI and the config
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeOptions {
    /// Added to every transformed frame point after the optimized pose
    pub offset: Vector3f,
    pub write_match_reports: bool,
    pub show_axes: bool,
    pub min_axis_length: f32,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            offset: Vector3f::new(0.0, 0.0, 10.0),
            write_match_reports: false,
            show_axes: true,
            min_axis_length: 8.0,
        }
    }
}

/// Everything the viewer needs to show one frame
#[derive(Debug, Clone)]
pub struct ComposedFrame {
    pub frame_id: u32,
    pub scene: Scene,
    pub debug_text: Option<String>,
    pub match_text: Option<String>,
    /// `None` when `debug.txt` is missing or unusable
    pub debug_info: Option<DebugInfo>,
    pub match_info: Option<MatchInfo>,
    pub plane_matches: Vec<PlaneMatch>,
    /// Frame dense point -> map dense point pairs that were drawn
    pub dense_line_count: usize,
    pub report: Option<DenseMatchReport>,
    /// Sidecar JSON by geometry name
    pub sidecars: HashMap<String, Sidecar>,
}

impl ComposedFrame {
    /// True when the frame clouds were moved onto the map
    pub fn is_transformed(&self) -> bool {
        self.debug_info.is_some() && self.frame_id != 0
    }
}

/// Load a frame and build its scene
pub fn compose_frame(
    dataset: &Dataset,
    frame_id: u32,
    options: &ComposeOptions,
    palette: &IdPalette,
) -> Result<ComposedFrame> {
    if !dataset.has_frame(frame_id) {
        return Err(Error::UnknownFrame(frame_id));
    }

    let debug_text = dataset.debug_text(frame_id)?;
    let match_text = dataset.match_text(frame_id)?;
    let debug_info = debug_text.as_deref().and_then(|text| match DebugInfo::parse(text) {
        Ok(info) => Some(info),
        Err(e) => {
            warn!("Frame {}: ignoring debug.txt: {}", frame_id, e);
            None
        }
    });
    let match_info = match_text
        .as_deref()
        .and_then(|text| match MatchInfo::from_json_str(text) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("Frame {}: ignoring match.json: {}", frame_id, e);
                None
            }
        });

    let mut composed = ComposedFrame {
        frame_id,
        scene: Scene::new(),
        debug_text,
        match_text,
        debug_info,
        match_info,
        plane_matches: Vec::new(),
        dense_line_count: 0,
        report: None,
        sidecars: HashMap::new(),
    };

    let map = dataset.load_frame(frame_id, DatasetType::Map)?;
    if frame_id == 0 {
        for asset in map.assets() {
            let color = id_color(asset, palette);
            add_cloud(&mut composed, Layer::Map, asset, asset.cloud.paint_uniform(color));
        }
    } else {
        let frame = dataset.load_frame(frame_id, DatasetType::Frame)?;
        compose_tracked_frame(&mut composed, &frame, &map, options, palette);
        if options.write_match_reports {
            write_report(&mut composed, dataset, &map);
        }
    }

    if options.show_axes {
        let length = axis_length(composed.scene.all_cloud_bounds().as_ref(), options.min_axis_length);
        composed
            .scene
            .add(AXES, GeometryRole::Axes, GeometryData::Lines(axis_segments(length)));
    }

    info!(
        "Composed frame {}: {} geometries, {} plane matches, {} dense lines",
        frame_id,
        composed.scene.len(),
        composed.plane_matches.len(),
        composed.dense_line_count
    );
    Ok(composed)
}

fn compose_tracked_frame(
    composed: &mut ComposedFrame,
    frame: &FrameData,
    map: &FrameData,
    options: &ComposeOptions,
    palette: &IdPalette,
) {
    // Per-point colours of the transformed dense cloud, when there is one
    let mut dense_colors: Option<Vec<Rgb>> = None;
    let mut transformed_dense: Option<PointCloud3f> = None;

    match composed.debug_info.as_ref().map(DebugInfo::optimized_transform) {
        Some(pose) => {
            let transform = pose.then_translate(options.offset);
            let assets: Vec<&LoadedAsset> = frame.assets().collect();
            let moved: Vec<PointCloud3f> = assets
                .par_iter()
                .map(|asset| asset.cloud.transformed(&transform))
                .collect();

            for (asset, cloud) in assets.into_iter().zip(moved) {
                let colored = if asset.kind == AssetKind::DenseCloud {
                    let colors = distinct_colors(cloud.len());
                    let colored = cloud.paint_each(&colors, Rgb::DENSE_DEFAULT);
                    dense_colors = Some(colors);
                    transformed_dense = Some(cloud);
                    colored
                } else {
                    cloud.paint_uniform(id_color(asset, palette))
                };
                add_cloud(composed, Layer::Transformed, asset, colored);
            }
        }
        None => {
            debug!("Frame {}: no optimized pose, showing raw frame clouds", frame.frame_id);
            for asset in frame.assets() {
                let color = id_color(asset, palette);
                add_cloud(composed, Layer::Frame, asset, asset.cloud.paint_uniform(color));
            }
        }
    }

    // Frame ground/plane colours, looked up through the plane matches
    let frame_colors: HashMap<CloudRef, Rgb> = frame
        .grounds
        .iter()
        .chain(frame.planes.iter())
        .filter_map(|asset| Some((CloudRef::new(asset.kind, asset.id?), id_color(asset, palette))))
        .collect();

    composed.plane_matches = composed
        .match_info
        .as_ref()
        .map(MatchInfo::plane_matches)
        .unwrap_or_default();
    let map_colors: HashMap<CloudRef, Rgb> = composed
        .plane_matches
        .iter()
        .filter_map(|m| frame_colors.get(&m.current).map(|color| (m.other, *color)))
        .collect();

    let mapping = dense_mapping(composed);
    for asset in map.grounds.iter().chain(map.planes.iter()) {
        let color = asset
            .id
            .and_then(|id| map_colors.get(&CloudRef::new(asset.kind, id)).copied())
            .unwrap_or(Rgb::UNMATCHED);
        add_cloud(composed, Layer::Map, asset, asset.cloud.paint_uniform(color));
    }

    if let Some(map_dense) = &map.dense_cloud {
        let colored = match &dense_colors {
            Some(colors) if !mapping.is_empty() => color_map_dense(&map_dense.cloud, &mapping, colors),
            _ => map_dense.cloud.paint_uniform(Rgb::DENSE_DEFAULT),
        };
        add_cloud(composed, Layer::Map, map_dense, colored);

        if let Some(frame_dense) = &transformed_dense {
            let lines = match_lines(frame_dense, &map_dense.cloud, &mapping);
            composed.dense_line_count = lines.len();
            if !lines.is_empty() {
                composed
                    .scene
                    .add(MATCH_LINES, GeometryRole::MatchLines, GeometryData::Lines(lines));
            }
        }
    }
}

fn dense_mapping(composed: &ComposedFrame) -> BTreeMap<usize, usize> {
    composed
        .match_info
        .as_ref()
        .map(MatchInfo::dense_mapping)
        .unwrap_or_default()
}

/// Matched map points take the colour of their frame point, everything else is red
fn color_map_dense(map: &PointCloud3f, mapping: &BTreeMap<usize, usize>, frame_colors: &[Rgb]) -> ColoredPointCloud3f {
    let mut colors = vec![Rgb::UNMATCHED; map.len()];
    for (&cur, &other) in mapping {
        if let (Some(slot), Some(color)) = (colors.get_mut(other), frame_colors.get(cur)) {
            *slot = *color;
        }
    }
    map.paint_each(&colors, Rgb::UNMATCHED)
}

fn match_lines(frame: &PointCloud3f, map: &PointCloud3f, mapping: &BTreeMap<usize, usize>) -> Vec<LineSegment> {
    mapping
        .iter()
        .filter_map(|(&cur, &other)| {
            Some(LineSegment {
                start: *frame.get(cur)?,
                end: *map.get(other)?,
                color: Rgb::MATCH_LINE,
            })
        })
        .collect()
}

fn write_report(composed: &mut ComposedFrame, dataset: &Dataset, map: &FrameData) {
    let Some(map_dense) = &map.dense_cloud else {
        return;
    };
    let mapping = dense_mapping(composed);
    if mapping.is_empty() {
        return;
    }
    let report = DenseMatchReport::new(map_dense.cloud.len(), &mapping);
    if let Err(e) = report.write(&dataset.frame_dir(composed.frame_id), composed.frame_id) {
        warn!("Frame {}: could not write dense match report: {}", composed.frame_id, e);
    }
    composed.report = Some(report);
}

fn id_color(asset: &LoadedAsset, palette: &IdPalette) -> Rgb {
    match (asset.kind, asset.id) {
        (AssetKind::DenseCloud, _) => Rgb::DENSE_DEFAULT,
        (_, Some(id)) => palette.color_for(id),
        (_, None) => Rgb::GRAY,
    }
}

fn add_cloud(composed: &mut ComposedFrame, layer: Layer, asset: &LoadedAsset, cloud: ColoredPointCloud3f) {
    let name = layer.geometry_name(&asset.stem);
    if let Some(sidecar) = &asset.sidecar {
        composed.sidecars.insert(name.clone(), sidecar.clone());
    }
    composed.scene.add(
        name,
        GeometryRole::cloud(layer, asset.kind, asset.id),
        GeometryData::Points(cloud),
    );
}
