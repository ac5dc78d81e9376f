//! Interactive viewer window
//!
//! One winit window: the scene is drawn with wgpu over the whole window and
//! the egui control and info panels are drawn on top of it.

use crate::camera::Camera;
use crate::picking::{pick_point, PICK_RADIUS};
use crate::state::ViewerState;
use crate::ui::{draw_panels, Action, PanelState};
use cloudframe_core::{Error, Result};
use cloudframe_gpu::{GpuContext, RenderConfig, SceneRenderer, WindowSurface};
use nalgebra::Point2;
use std::sync::Arc;
use tracing::{debug, info, warn};
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowBuilder},
};

/// Radians of orbit per dragged pixel
const ORBIT_SPEED: f32 = 0.01;
/// A left press-release moving less than this many pixels is a click
const CLICK_SLOP: f64 = 3.0;

/// Mouse state of the 3D viewport
#[derive(Debug, Default)]
struct ViewportInput {
    cursor: Option<PhysicalPosition<f64>>,
    orbiting: bool,
    panning: bool,
    /// Pixels moved since the left button went down
    drag_distance: f64,
}

/// GPU resources, created once the window exists
struct Graphics {
    gpu: GpuContext,
    surface: WindowSurface,
    renderer: SceneRenderer,
    egui_renderer: egui_wgpu::Renderer,
    /// Scene version currently held in the GPU buffers
    uploaded: Option<(u64, u64)>,
}

impl Graphics {
    fn sync_scene(&mut self, state: &ViewerState) {
        let version = state.scene_version();
        if self.uploaded == Some(version) {
            return;
        }
        let scene = state.scene();
        self.renderer.set_points(&self.gpu, &scene.point_instances());
        self.renderer.set_lines(&self.gpu, &scene.line_vertices());
        self.uploaded = Some(version);
    }

    fn viewport(&self) -> [f32; 2] {
        let size = self.surface.size();
        [size.width as f32, size.height as f32]
    }
}

/// Frame browser window driving a [`ViewerState`]
pub struct Viewer {
    state: ViewerState,
    camera: Camera,
    panels: PanelState,
    input: ViewportInput,
}

impl Viewer {
    pub fn new(state: ViewerState) -> Self {
        let mut viewer = Self {
            state,
            camera: Camera::default(),
            panels: PanelState::default(),
            input: ViewportInput::default(),
        };
        viewer.fit_camera();
        viewer
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Frame every cloud of the current scene
    pub fn fit_camera(&mut self) {
        match self.state.scene().all_cloud_bounds() {
            Some(bounds) => self.camera.fit(bounds),
            None => self.camera.reset(),
        }
    }

    /// Apply one user request. Returns false when the viewer should close.
    pub fn handle_action(&mut self, action: Action) -> bool {
        debug!("Action: {:?}", action);
        let result = match action {
            Action::Quit => return false,
            Action::ResetView => {
                self.fit_camera();
                Ok(())
            }
            Action::PreviousFrame => self.state.previous().map(|_| self.fit_camera()),
            Action::NextFrame => self.state.next().map(|_| self.fit_camera()),
            Action::Toggle(kind) => {
                let visible = self.state.toggle(kind);
                info!("{} clouds {}", kind, if visible { "shown" } else { "hidden" });
                Ok(())
            }
            Action::SetOffset(axis, value) => self.state.set_offset(axis, value),
            Action::SetMatch(index, selected) => {
                self.state.set_match(index, selected);
                Ok(())
            }
            Action::SelectAllMatches => {
                self.state.select_all();
                Ok(())
            }
            Action::DeselectAllMatches => {
                self.state.deselect_all();
                Ok(())
            }
        };

        match result {
            Ok(()) => self.panels.error = None,
            Err(e) => {
                warn!("{:?} failed: {}", action, e);
                self.panels.error = Some(e.to_string());
            }
        }
        true
    }

    /// Viewport mouse and keyboard handling for events egui did not take
    fn handle_input(&mut self, event: &WindowEvent, consumed: bool, viewport: [f32; 2]) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(last) = self.input.cursor {
                    let dx = (position.x - last.x) as f32;
                    let dy = (position.y - last.y) as f32;
                    if self.input.orbiting {
                        self.camera.orbit(dx * ORBIT_SPEED, dy * ORBIT_SPEED);
                        self.input.drag_distance += f64::from(dx.hypot(dy));
                    } else if self.input.panning {
                        self.camera.pan(dx, dy, viewport[1]);
                    }
                }
                self.input.cursor = Some(*position);
            }
            WindowEvent::MouseInput { state, button, .. } => match (state, button) {
                (ElementState::Pressed, MouseButton::Left) if !consumed => {
                    self.input.orbiting = true;
                    self.input.drag_distance = 0.0;
                }
                (ElementState::Pressed, MouseButton::Right | MouseButton::Middle) if !consumed => {
                    self.input.panning = true;
                }
                (ElementState::Released, MouseButton::Left) => {
                    if self.input.orbiting && self.input.drag_distance < CLICK_SLOP {
                        self.pick(viewport);
                    }
                    self.input.orbiting = false;
                }
                (ElementState::Released, MouseButton::Right | MouseButton::Middle) => {
                    self.input.panning = false;
                }
                _ => {}
            },
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.camera.zoom(steps);
            }
            WindowEvent::KeyboardInput { event, .. } if !consumed && event.state == ElementState::Pressed => {
                let action = match &event.logical_key {
                    Key::Named(NamedKey::ArrowLeft) => Some(Action::PreviousFrame),
                    Key::Named(NamedKey::ArrowRight) => Some(Action::NextFrame),
                    Key::Named(NamedKey::Escape) => Some(Action::Quit),
                    Key::Character(c) if c.eq_ignore_ascii_case("r") => Some(Action::ResetView),
                    _ => None,
                };
                if let Some(action) = action {
                    return self.handle_action(action);
                }
            }
            _ => {}
        }
        true
    }

    fn pick(&mut self, viewport: [f32; 2]) {
        let Some(cursor) = self.input.cursor else {
            return;
        };
        let cursor = Point2::new(cursor.x as f32, cursor.y as f32);
        let picked = pick_point(self.state.scene(), &self.camera, cursor, viewport, PICK_RADIUS);
        match &picked {
            Some(p) => info!(
                "Picked {}[{}] at ({:.4}, {:.4}, {:.4})",
                p.name, p.index, p.position.x, p.position.y, p.position.z
            ),
            None => debug!("No point under the cursor"),
        }
        self.state.set_picked(picked);
    }

    /// Build the UI, apply its actions and draw one frame. Returns false on quit.
    fn redraw(
        &mut self,
        gfx: &mut Graphics,
        window: &Window,
        egui_ctx: &egui::Context,
        egui_state: &mut egui_winit::State,
    ) -> Result<bool> {
        let raw_input = egui_state.take_egui_input(window);
        let mut actions = Vec::new();
        let full_output = egui_ctx.run(raw_input, |ctx| {
            actions = draw_panels(ctx, &self.state, &mut self.panels);
        });
        egui_state.handle_platform_output(window, full_output.platform_output);

        for action in actions {
            if !self.handle_action(action) {
                return Ok(false);
            }
        }

        gfx.sync_scene(&self.state);
        gfx.renderer
            .update_camera(&gfx.gpu, self.camera.view_matrix(), self.camera.projection_matrix());

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let size = gfx.surface.size();
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let frame = gfx.surface.acquire(&gfx.gpu)?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gfx
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        gfx.renderer.render(&mut encoder, &view);

        for (id, delta) in &full_output.textures_delta.set {
            gfx.egui_renderer
                .update_texture(&gfx.gpu.device, &gfx.gpu.queue, *id, delta);
        }
        let ui_commands = gfx.egui_renderer.update_buffers(
            &gfx.gpu.device,
            &gfx.gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen,
        );
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("UI Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            gfx.egui_renderer.render(&mut render_pass, &paint_jobs, &screen);
        }

        gfx.gpu
            .queue
            .submit(ui_commands.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();

        for id in &full_output.textures_delta.free {
            gfx.egui_renderer.free_texture(id);
        }

        let repaint_now = full_output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .is_some_and(|v| v.repaint_delay.is_zero());
        if repaint_now {
            window.request_redraw();
        }
        Ok(true)
    }

    /// Open the window and run until it is closed
    pub fn run(mut self) -> Result<()> {
        let event_loop =
            EventLoop::new().map_err(|e| Error::Visualization(format!("Failed to create event loop: {}", e)))?;
        let settings = self.state.config().window.clone();
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(settings.title)
                .with_inner_size(LogicalSize::new(settings.width, settings.height))
                .build(&event_loop)
                .map_err(|e| Error::Visualization(format!("Failed to create window: {}", e)))?,
        );

        let size = window.inner_size();
        let (gpu, surface) = pollster::block_on(GpuContext::for_window(window.clone()))?;
        let surface = WindowSurface::new(&gpu, surface, size)?;
        let render = &self.state.config().render;
        let [r, g, b] = render.background;
        let renderer = SceneRenderer::new(
            &gpu,
            surface.format(),
            size.width,
            size.height,
            RenderConfig {
                point_size: render.point_size,
                background_color: [f64::from(r), f64::from(g), f64::from(b), 1.0],
                enable_depth_test: true,
            },
        );
        let egui_renderer = egui_wgpu::Renderer::new(&gpu.device, surface.format(), None, 1);
        let mut gfx = Graphics {
            gpu,
            surface,
            renderer,
            egui_renderer,
            uploaded: None,
        };

        let egui_ctx = egui::Context::default();
        let mut egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &*window,
            Some(window.scale_factor() as f32),
            None,
        );

        self.camera.set_aspect_ratio(size.width as f32, size.height as f32);
        info!("Viewer window open ({}x{})", size.width, size.height);

        event_loop
            .run(move |event, elwt| {
                elwt.set_control_flow(ControlFlow::Wait);
                let Event::WindowEvent { event, window_id } = event else {
                    return;
                };
                if window_id != window.id() {
                    return;
                }

                let response = egui_state.on_window_event(&window, &event);
                if response.repaint {
                    window.request_redraw();
                }

                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(new_size) => {
                        if gfx.surface.resize(&gfx.gpu, new_size) {
                            gfx.renderer.resize(&gfx.gpu, new_size.width, new_size.height);
                            self.camera
                                .set_aspect_ratio(new_size.width as f32, new_size.height as f32);
                        }
                        window.request_redraw();
                    }
                    WindowEvent::RedrawRequested => {
                        match self.redraw(&mut gfx, &window, &egui_ctx, &mut egui_state) {
                            Ok(true) => {}
                            Ok(false) => elwt.exit(),
                            Err(e) => warn!("Failed to draw frame: {}", e),
                        }
                    }
                    other => {
                        if !self.handle_input(&other, response.consumed, gfx.viewport()) {
                            elwt.exit();
                        }
                        window.request_redraw();
                    }
                }
            })
            .map_err(|e| Error::Visualization(format!("Event loop error: {}", e)))?;

        info!("Viewer closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_input_is_idle() {
        let input = ViewportInput::default();
        assert!(!input.orbiting && !input.panning);
        assert!(input.cursor.is_none());
    }
}
