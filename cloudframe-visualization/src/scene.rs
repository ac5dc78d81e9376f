//! Named registry of everything drawn in the viewport
//!
//! Geometries keep their data while hidden, so showing them again restores
//! them exactly, colors included.

use cloudframe_core::{Aabb, ColoredPointCloud3f, Drawable, Point3f, Rgb};
use cloudframe_gpu::{LineVertex, PointInstance};
use cloudframe_io::{AssetKind, PlaneMatch};
use tracing::debug;

/// Which dataset a cloud geometry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// `map/` clouds
    Map,
    /// `frame/` clouds drawn as stored
    Frame,
    /// `frame/` clouds moved onto the map by the optimized pose and offset
    Transformed,
}

impl Layer {
    /// Geometry name of a cloud with file stem `stem` in this layer
    pub fn geometry_name(self, stem: &str) -> String {
        match self {
            Layer::Map => format!("map_{stem}"),
            Layer::Frame => stem.to_string(),
            Layer::Transformed => format!("transformed_{stem}"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Layer::Map => "map",
            Layer::Frame => "frame",
            Layer::Transformed => "transformed frame",
        }
    }
}

/// What a geometry represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryRole {
    Cloud {
        layer: Layer,
        kind: AssetKind,
        /// Ground/plane id, `None` for dense clouds
        id: Option<i64>,
    },
    MatchLines,
    Axes,
}

impl GeometryRole {
    pub fn cloud(layer: Layer, kind: AssetKind, id: Option<i64>) -> Self {
        GeometryRole::Cloud { layer, kind, id }
    }

    pub fn kind(&self) -> Option<AssetKind> {
        match self {
            GeometryRole::Cloud { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// A colored line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Point3f,
    pub end: Point3f,
    pub color: Rgb,
}

#[derive(Debug, Clone)]
pub enum GeometryData {
    Points(ColoredPointCloud3f),
    Lines(Vec<LineSegment>),
}

#[derive(Debug, Clone)]
pub struct Geometry {
    pub name: String,
    pub role: GeometryRole,
    pub data: GeometryData,
    pub visible: bool,
}

impl Geometry {
    pub fn points(&self) -> Option<&ColoredPointCloud3f> {
        match &self.data {
            GeometryData::Points(cloud) => Some(cloud),
            GeometryData::Lines(_) => None,
        }
    }

    pub fn bounding_box(&self) -> Option<Aabb> {
        match &self.data {
            GeometryData::Points(cloud) => cloud.bounding_box(),
            GeometryData::Lines(lines) => {
                Aabb::from_points(lines.iter().flat_map(|l| [l.start, l.end]))
            }
        }
    }
}

/// Ordered collection of named geometries with visibility state
#[derive(Debug, Clone, Default)]
pub struct Scene {
    geometries: Vec<Geometry>,
    revision: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumped on every change that affects what is drawn
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Add a visible geometry, replacing any geometry of the same name
    pub fn add(&mut self, name: impl Into<String>, role: GeometryRole, data: GeometryData) {
        let geometry = Geometry {
            name: name.into(),
            role,
            data,
            visible: true,
        };
        match self.geometries.iter_mut().find(|g| g.name == geometry.name) {
            Some(existing) => *existing = geometry,
            None => self.geometries.push(geometry),
        }
        self.touch();
    }

    pub fn get(&self, name: &str) -> Option<&Geometry> {
        self.geometries.iter().find(|g| g.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Geometry> {
        self.geometries.iter()
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Drop every geometry except the coordinate axes
    pub fn clear_clouds(&mut self) {
        self.geometries.retain(|g| g.role == GeometryRole::Axes);
        self.touch();
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.get(name).is_some_and(|g| g.visible)
    }

    /// Hide or show a geometry. Returns false when no geometry has that name.
    pub fn set_visible(&mut self, name: &str, visible: bool) -> bool {
        let Some(geometry) = self.geometries.iter_mut().find(|g| g.name == name) else {
            return false;
        };
        if geometry.visible != visible {
            geometry.visible = visible;
            self.revision = self.revision.wrapping_add(1);
        }
        true
    }

    pub fn hide(&mut self, name: &str) -> bool {
        self.set_visible(name, false)
    }

    pub fn show(&mut self, name: &str) -> bool {
        self.set_visible(name, true)
    }

    fn of_kind(&self, kind: AssetKind) -> impl Iterator<Item = &Geometry> {
        self.geometries
            .iter()
            .filter(move |g| g.role.kind() == Some(kind))
    }

    /// True when any cloud of `kind` is shown
    pub fn is_kind_visible(&self, kind: AssetKind) -> bool {
        self.of_kind(kind).any(|g| g.visible)
    }

    pub fn has_kind(&self, kind: AssetKind) -> bool {
        self.of_kind(kind).next().is_some()
    }

    /// Show or hide every map, frame and transformed cloud of `kind`
    pub fn set_kind_visible(&mut self, kind: AssetKind, visible: bool) {
        let mut changed = false;
        for geometry in self.geometries.iter_mut().filter(|g| g.role.kind() == Some(kind)) {
            changed |= geometry.visible != visible;
            geometry.visible = visible;
        }
        if changed {
            self.touch();
        }
    }

    /// Hide all clouds of `kind` if any is visible, otherwise show them all.
    ///
    /// Returns the new visibility; false when the scene has no cloud of that kind.
    pub fn toggle_kind(&mut self, kind: AssetKind) -> bool {
        if !self.has_kind(kind) {
            return false;
        }
        let visible = !self.is_kind_visible(kind);
        self.set_kind_visible(kind, visible);
        debug!("Toggled {} clouds to {}", kind, if visible { "visible" } else { "hidden" });
        visible
    }

    /// Show or hide the frame, transformed and map clouds joined by one plane match
    pub fn set_pair_visible(&mut self, pair: &PlaneMatch, visible: bool) {
        let mut changed = false;
        for geometry in &mut self.geometries {
            let GeometryRole::Cloud { layer, kind, id } = geometry.role else {
                continue;
            };
            let side = match layer {
                Layer::Frame | Layer::Transformed => &pair.current,
                Layer::Map => &pair.other,
            };
            if kind == side.kind && id == Some(side.id) && geometry.visible != visible {
                geometry.visible = visible;
                changed = true;
            }
        }
        if changed {
            self.touch();
        }
    }

    /// Bounds of all visible clouds, ignoring axes and match lines
    pub fn cloud_bounds(&self) -> Option<Aabb> {
        self.geometries
            .iter()
            .filter(|g| g.visible && g.role.kind().is_some())
            .filter_map(Geometry::bounding_box)
            .reduce(|a, b| a.merge(&b))
    }

    /// Bounds of every cloud, visible or not
    pub fn all_cloud_bounds(&self) -> Option<Aabb> {
        self.geometries
            .iter()
            .filter(|g| g.role.kind().is_some())
            .filter_map(Geometry::bounding_box)
            .reduce(|a, b| a.merge(&b))
    }

    /// Point sprites of all visible point geometries
    pub fn point_instances(&self) -> Vec<PointInstance> {
        self.geometries
            .iter()
            .filter(|g| g.visible)
            .filter_map(Geometry::points)
            .flat_map(|cloud| cloud.iter().map(|p| PointInstance::new(&p.position, p.color)))
            .collect()
    }

    /// Segment end points of all visible line geometries
    pub fn line_vertices(&self) -> Vec<LineVertex> {
        self.geometries
            .iter()
            .filter(|g| g.visible)
            .filter_map(|g| match &g.data {
                GeometryData::Lines(lines) => Some(lines),
                GeometryData::Points(_) => None,
            })
            .flatten()
            .flat_map(|l| [LineVertex::new(&l.start, l.color), LineVertex::new(&l.end, l.color)])
            .collect()
    }
}
