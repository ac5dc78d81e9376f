//! # cloudframe GPU
//!
//! wgpu rendering for cloudframe: device and window surface setup plus a
//! renderer that draws colored point sprites and line segments.
//!
//! ```rust,no_run
//! use cloudframe_gpu::{GpuContext, RenderConfig, SceneRenderer, WindowSurface};
//! use std::sync::Arc;
//!
//! async fn example(window: Arc<winit::window::Window>) -> cloudframe_core::Result<()> {
//!     let size = window.inner_size();
//!     let (context, surface) = GpuContext::for_window(window).await?;
//!     let surface = WindowSurface::new(&context, surface, size)?;
//!     let renderer = SceneRenderer::new(
//!         &context,
//!         surface.format(),
//!         size.width,
//!         size.height,
//!         RenderConfig::default(),
//!     );
//!     # let _ = renderer;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod renderer;

// Re-export commonly used items
pub use device::{GpuContext, WindowSurface};
pub use renderer::{CameraUniform, LineVertex, PointInstance, RenderConfig, SceneRenderer};
