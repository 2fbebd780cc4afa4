//! Interactive preview window with winit
//!
//! The window hosts a [`Visualizer`]: it initializes it against the window
//! surface, forwards size changes, runs one scheduler tick per redraw and
//! publishes parameter snapshots produced by mouse and keyboard input.

// Raw strings are clearer without unnecessary hashes
#![allow(clippy::needless_raw_string_hashes)]

use crate::device::SurfaceMetrics;
use crate::gpu::WgpuProvider;
use crate::manager::InitOutcome;
use crate::scheduler::TickOutcome;
use crate::visualizer::Visualizer;
use accretion_core::SimulationParameters;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

/// Radians of orbit per pixel dragged
const ORBIT_SENSITIVITY: f32 = 0.005;

/// Configuration for the preview window
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Draw the HUD overlay
    pub hud: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Accretion".to_string(),
            width: 1280,
            height: 720,
            hud: true,
        }
    }
}

/// Parameters as edited by the user, plus the pause toggle
#[derive(Debug, Clone, Copy)]
struct Controls {
    params: SimulationParameters,
    paused: bool,
}

impl Controls {
    /// Snapshot handed to the scheduler; pausing freezes simulated time
    fn snapshot(&self) -> SimulationParameters {
        let mut snapshot = self.params;
        if self.paused {
            snapshot.time_speed = 0.0;
        }
        snapshot
    }

    /// Apply a key press; returns whether anything changed
    fn handle_key(&mut self, key: &str) -> bool {
        match key.to_ascii_lowercase().as_str() {
            "v" => self.params.view_mode = self.params.view_mode.next(),
            "b" => self.params.wavelength_band = self.params.wavelength_band.next(),
            "j" => self.params.show_jets = !self.params.show_jets,
            "m" => self.params.show_milky_way = !self.params.show_milky_way,
            " " => self.paused = !self.paused,
            "p" => {
                self.params = SimulationParameters {
                    view_mode: self.params.view_mode,
                    wavelength_band: self.params.wavelength_band,
                    time_speed: self.params.time_speed,
                    ..SimulationParameters::backdrop_preset()
                };
            }
            _ => return false,
        }
        true
    }
}

fn surface_metrics(window: &Window) -> SurfaceMetrics {
    let scale_factor = window.scale_factor();
    let logical = window.inner_size().to_logical::<f64>(scale_factor);
    SurfaceMetrics::new(logical.width, logical.height, scale_factor)
}

struct PreviewApp {
    config: WindowConfig,
    controls: Controls,
    window: Option<Arc<Window>>,
    visualizer: Option<Visualizer<WgpuProvider>>,
    dragging: bool,
    last_mouse_pos: Option<PhysicalPosition<f64>>,
    failure: Option<anyhow::Error>,
}

impl PreviewApp {
    fn new(config: WindowConfig, params: SimulationParameters) -> Self {
        Self {
            config,
            controls: Controls {
                params: params.clamped(),
                paused: false,
            },
            window: None,
            visualizer: None,
            dragging: false,
            last_mouse_pos: None,
            failure: None,
        }
    }

    fn publish(&self) {
        if let Some(visualizer) = &self.visualizer {
            visualizer.set_parameters(self.controls.snapshot());
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.failure = Some(error);
        self.shutdown(event_loop);
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(visualizer) = self.visualizer.as_mut() {
            visualizer.destroy();
        }
        event_loop.exit();
    }

    fn handle_resize(&mut self) {
        if let (Some(window), Some(visualizer)) = (&self.window, self.visualizer.as_mut()) {
            visualizer.resize(surface_metrics(window));
        }
    }

    fn handle_mouse_motion(&mut self, position: PhysicalPosition<f64>) {
        if let Some(last_pos) = self.last_mouse_pos {
            if self.dragging {
                #[allow(clippy::cast_possible_truncation)]
                let (dx, dy) = (
                    (position.x - last_pos.x) as f32 * ORBIT_SENSITIVITY,
                    (position.y - last_pos.y) as f32 * ORBIT_SENSITIVITY,
                );
                self.controls.params.orbit(dx, dy);
                self.publish();
            }
        }
        self.last_mouse_pos = Some(position);
    }

    fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        #[allow(clippy::cast_possible_truncation)]
        let scroll = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.01,
        };
        self.controls.params.zoom(scroll);
        self.publish();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(visualizer) = self.visualizer.as_mut() else {
            return;
        };
        match visualizer.tick() {
            TickOutcome::Continue => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            TickOutcome::Stopped => event_loop.exit(),
            TickOutcome::DeviceLost => {
                self.fail(event_loop, anyhow::anyhow!("the graphics device was lost"));
            }
        }
    }
}

impl ApplicationHandler for PreviewApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("Failed to create window"));
                return;
            }
        };

        let provider = WgpuProvider::for_window(Arc::clone(&window)).with_hud(self.config.hud);
        let mut visualizer =
            Visualizer::new(provider, surface_metrics(&window), self.controls.snapshot());

        match pollster::block_on(visualizer.initialize()) {
            Ok(InitOutcome::Ready) => {}
            Ok(InitOutcome::Aborted) => {
                event_loop.exit();
                return;
            }
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("Failed to initialize GPU"));
                return;
            }
        }

        window.request_redraw();
        self.window = Some(window);
        self.visualizer = Some(visualizer);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.handle_resize();
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => self.handle_mouse_motion(position),
            WindowEvent::MouseWheel { delta, .. } => self.handle_scroll(delta),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.logical_key {
                    Key::Named(NamedKey::Escape) => self.shutdown(event_loop),
                    Key::Named(NamedKey::Space) => {
                        self.controls.handle_key(" ");
                        self.publish();
                    }
                    Key::Character(ref c) => {
                        if self.controls.handle_key(c) {
                            tracing::debug!(key = %c, "Parameters changed");
                            self.publish();
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

/// Open the preview window and run until it is closed
pub fn run_preview(config: WindowConfig, params: SimulationParameters) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    // Redraws are requested by the scheduler outcome; vsync paces them
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = PreviewApp::new(config, params);
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Preview controls help text
pub fn controls_help() -> &'static str {
    r#"
Preview Controls:
  Left Mouse Drag   - Orbit camera around the black hole
  Scroll Wheel      - Zoom camera
  V                 - Cycle view mode
  B                 - Cycle wavelength band
  J                 - Toggle polar jets
  M                 - Toggle galaxy backdrop
  P                 - Backdrop-scale camera preset
  Space             - Pause / resume simulated time
  Escape            - Close preview
"#
}
