//! Visualization for frame-indexed point cloud datasets
//!
//! This crate turns the clouds of one frame into a [`Scene`] and shows it
//! in an interactive window:
//! - Frame composition: placing frame clouds on the map and colouring matches
//! - Visibility by cloud kind and by plane match
//! - Orbit camera and point picking
//! - egui control and info panels

pub mod axes;
pub mod camera;
pub mod compose;
pub mod picking;
pub mod scene;
pub mod state;
pub mod ui;
pub mod viewer;

pub use camera::Camera;
pub use compose::{compose_frame, ComposeOptions, ComposedFrame};
pub use picking::{pick_point, PickedPoint};
pub use scene::{Geometry, GeometryData, GeometryRole, Layer, LineSegment, Scene};
pub use state::ViewerState;
pub use ui::Action;
pub use viewer::Viewer;

use cloudframe_core::Result;
use cloudframe_io::{Dataset, ViewerConfig};

/// Open `config.data_root` and browse it, starting at `start_frame`
pub fn run_viewer(config: ViewerConfig, start_frame: Option<u32>) -> Result<()> {
    let dataset = Dataset::open(&config.data_root)?;
    let state = ViewerState::new(dataset, config, start_frame)?;
    Viewer::new(state).run()
}
