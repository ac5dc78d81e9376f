//! Core data structures for cloudframe
//!
//! This crate provides the fundamental types shared by the loader, the renderer
//! and the viewer: points and point clouds, rigid transforms built from
//! recorded poses, axis-aligned bounds and the color schemes used to tell
//! matched and unmatched geometry apart.

pub mod bounds;
pub mod color;
pub mod error;
pub mod point;
pub mod point_cloud;
pub mod transform;

pub use bounds::*;
pub use color::*;
pub use error::*;
pub use point::*;
pub use point_cloud::*;
pub use transform::*;

