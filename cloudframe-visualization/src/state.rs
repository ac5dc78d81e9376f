//! Viewer state that does not depend on the window or the GPU
//!
//! Holds the dataset, the active frame and everything the user can change:
//! per-kind visibility, plane match selections and the offset of the
//! transformed frame clouds. Every mutation goes through here so the panels
//! and keyboard shortcuts stay consistent.

use crate::compose::{compose_frame, ComposeOptions, ComposedFrame};
use crate::picking::PickedPoint;
use crate::scene::Scene;
use cloudframe_core::{Axis, Error, IdPalette, Result, Vector3f};
use cloudframe_io::{pretty_json, AssetKind, Dataset, PlaneMatch, Sidecar, ViewerConfig};
use std::collections::BTreeSet;
use tracing::{info, warn};

pub struct ViewerState {
    dataset: Dataset,
    config: ViewerConfig,
    palette: IdPalette,
    frames: Vec<u32>,
    current: usize,
    offset: Vector3f,
    composed: ComposedFrame,
    hidden_kinds: BTreeSet<AssetKind>,
    match_selection: Vec<bool>,
    picked: Option<PickedPoint>,
    /// Bumped every time the scene is rebuilt
    generation: u64,
}

impl ViewerState {
    /// Open the dataset and load `start_frame`, or the first frame when it is
    /// `None` or does not exist
    pub fn new(dataset: Dataset, config: ViewerConfig, start_frame: Option<u32>) -> Result<Self> {
        let frames = dataset.frames()?;
        if frames.is_empty() {
            return Err(Error::InvalidData(format!(
                "no frame directories found in {}",
                dataset.root().display()
            )));
        }

        let current = match start_frame {
            None => 0,
            Some(id) => frames.iter().position(|&f| f == id).unwrap_or_else(|| {
                warn!("Frame {} does not exist, starting at frame {}", id, frames[0]);
                0
            }),
        };

        let offset = Vector3f::from(config.offset.default);
        let palette = IdPalette::default();
        let options = compose_options(&config, offset);
        let composed = compose_frame(&dataset, frames[current], &options, &palette)?;
        let match_selection = vec![true; composed.plane_matches.len()];
        info!("Found {} frames in {}", frames.len(), dataset.root().display());

        Ok(Self {
            dataset,
            config,
            palette,
            frames,
            current,
            offset,
            composed,
            hidden_kinds: BTreeSet::new(),
            match_selection,
            picked: None,
            generation: 0,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn frames(&self) -> &[u32] {
        &self.frames
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn frame_id(&self) -> u32 {
        self.frames[self.current]
    }

    pub fn composed(&self) -> &ComposedFrame {
        &self.composed
    }

    pub fn scene(&self) -> &Scene {
        &self.composed.scene
    }

    /// Changes whenever what should be drawn changes
    pub fn scene_version(&self) -> (u64, u64) {
        (self.generation, self.composed.scene.revision())
    }

    /// Switch to another frame. Visibility and match selections start fresh.
    pub fn load_frame(&mut self, frame_id: u32) -> Result<()> {
        let index = self
            .frames
            .iter()
            .position(|&f| f == frame_id)
            .ok_or(Error::UnknownFrame(frame_id))?;
        let composed = compose_frame(&self.dataset, frame_id, &self.compose_options(), &self.palette)?;

        self.current = index;
        self.match_selection = vec![true; composed.plane_matches.len()];
        self.composed = composed;
        self.hidden_kinds.clear();
        self.picked = None;
        self.generation += 1;
        Ok(())
    }

    /// Load the next frame, wrapping to the first
    pub fn next(&mut self) -> Result<()> {
        let index = (self.current + 1) % self.frames.len();
        self.load_frame(self.frames[index])
    }

    /// Load the previous frame, wrapping to the last
    pub fn previous(&mut self) -> Result<()> {
        let index = (self.current + self.frames.len() - 1) % self.frames.len();
        self.load_frame(self.frames[index])
    }

    /// Rebuild the current frame, keeping the user's visibility choices
    pub fn reload(&mut self) -> Result<()> {
        let composed = compose_frame(&self.dataset, self.frame_id(), &self.compose_options(), &self.palette)?;
        if composed.plane_matches.len() != self.match_selection.len() {
            self.match_selection = vec![true; composed.plane_matches.len()];
        }
        self.composed = composed;
        self.picked = None;
        self.generation += 1;
        self.apply_visibility();
        Ok(())
    }

    pub fn offset(&self) -> Vector3f {
        self.offset
    }

    /// Set one offset component, clamped to the configured limit.
    ///
    /// Transformed clouds are rebuilt when the value actually changes.
    pub fn set_offset(&mut self, axis: Axis, value: f32) -> Result<()> {
        let limit = self.config.offset.limit;
        let value = if value.is_finite() { value.clamp(-limit, limit) } else { 0.0 };
        if self.offset[axis.index()] == value {
            return Ok(());
        }
        self.offset[axis.index()] = value;
        if self.composed.is_transformed() {
            self.reload()?;
        }
        Ok(())
    }

    /// Move one offset component by `steps` configured increments
    pub fn nudge(&mut self, axis: Axis, steps: f32) -> Result<()> {
        let value = self.offset[axis.index()] + steps * self.config.offset.step;
        self.set_offset(axis, value)
    }

    pub fn offset_step(&self) -> f32 {
        self.config.offset.step
    }

    pub fn offset_limit(&self) -> f32 {
        self.config.offset.limit
    }

    /// Flip the visibility of every cloud of `kind`; returns the new visibility.
    ///
    /// Showing a kind also re-selects the plane matches that involve it, so
    /// its clouds actually appear.
    pub fn toggle(&mut self, kind: AssetKind) -> bool {
        if !self.has_kind(kind) {
            return false;
        }
        let visible = self.hidden_kinds.remove(&kind);
        if visible {
            for (pair, selected) in self.composed.plane_matches.iter().zip(&mut self.match_selection) {
                if pair.current.kind == kind || pair.other.kind == kind {
                    *selected = true;
                }
            }
        } else {
            self.hidden_kinds.insert(kind);
        }
        self.apply_visibility();
        visible
    }

    /// Whether the user has left `kind` switched on
    pub fn is_kind_visible(&self, kind: AssetKind) -> bool {
        !self.hidden_kinds.contains(&kind)
    }

    pub fn has_kind(&self, kind: AssetKind) -> bool {
        self.scene().has_kind(kind)
    }

    /// Text of the visibility button for `kind`
    pub fn button_label(&self, kind: AssetKind) -> String {
        if self.is_kind_visible(kind) {
            format!("Hide {}", kind.display_name())
        } else {
            format!("Show {}", kind.display_name())
        }
    }

    pub fn plane_matches(&self) -> &[PlaneMatch] {
        &self.composed.plane_matches
    }

    pub fn is_match_selected(&self, index: usize) -> bool {
        self.match_selection.get(index).copied().unwrap_or(false)
    }

    /// Show or hide the clouds of one plane match
    pub fn set_match(&mut self, index: usize, selected: bool) {
        if let Some(slot) = self.match_selection.get_mut(index) {
            *slot = selected;
            self.apply_visibility();
        }
    }

    pub fn select_all(&mut self) {
        self.match_selection.iter_mut().for_each(|s| *s = true);
        self.apply_visibility();
    }

    pub fn deselect_all(&mut self) {
        self.match_selection.iter_mut().for_each(|s| *s = false);
        self.apply_visibility();
    }

    /// Recompute cloud visibility from the hidden kinds and deselected matches
    fn apply_visibility(&mut self) {
        let scene = &mut self.composed.scene;
        for kind in AssetKind::ALL {
            scene.set_kind_visible(kind, !self.hidden_kinds.contains(&kind));
        }
        for (pair, _) in self
            .composed
            .plane_matches
            .iter()
            .zip(&self.match_selection)
            .filter(|(_, selected)| !**selected)
        {
            scene.set_pair_visible(pair, false);
        }
    }

    pub fn picked(&self) -> Option<&PickedPoint> {
        self.picked.as_ref()
    }

    pub fn set_picked(&mut self, picked: Option<PickedPoint>) {
        self.picked = picked;
    }

    /// Sidecar JSON of the cloud the picked point belongs to
    pub fn picked_sidecar(&self) -> Option<&Sidecar> {
        self.composed.sidecars.get(&self.picked.as_ref()?.name)
    }

    /// `Frame i / n`, counting from one
    pub fn frame_status(&self) -> String {
        format!("Frame {} / {}", self.current + 1, self.frames.len())
    }

    pub fn type_status(&self) -> &'static str {
        if self.frame_id() == 0 {
            "Type: map"
        } else if self.composed.is_transformed() {
            "Type: transformed frame + map"
        } else {
            "Type: frame + map"
        }
    }

    pub fn debug_status(&self) -> String {
        format!("debug.txt: {}", presence(self.composed.debug_text.is_some()))
    }

    pub fn match_status(&self) -> String {
        format!("match.json: {}", presence(self.composed.match_text.is_some()))
    }

    pub fn debug_text(&self) -> Option<&str> {
        self.composed.debug_text.as_deref()
    }

    /// `match.json` re-indented for display
    pub fn match_text_pretty(&self) -> Option<String> {
        self.composed.match_text.as_deref().map(pretty_json)
    }

    fn compose_options(&self) -> ComposeOptions {
        compose_options(&self.config, self.offset)
    }
}

fn compose_options(config: &ViewerConfig, offset: Vector3f) -> ComposeOptions {
    ComposeOptions {
        offset,
        write_match_reports: config.write_match_reports,
        show_axes: config.render.show_axes,
        min_axis_length: config.render.axis_length,
    }
}

fn presence(present: bool) -> &'static str {
    if present {
        "present"
    } else {
        "absent"
    }
}
