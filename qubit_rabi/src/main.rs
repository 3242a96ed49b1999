//! Rabi-Driven Qubit Visualizer
//!
//! Drives each qubit with the brightness reported by the camera analysis
//! process and shows the states on a shared Bloch sphere.
//!
//! Controls:
//! - Left mouse drag: Rotate the view
//! - Mouse wheel: Zoom
//! - M: Measure every qubit
//! - 1-9: Measure a single qubit
//! - Esc: Quit
//!
//! Environment: QUBIT_SEED, QUBIT_SIGNAL_CMD, QUBIT_CONSTANT_AMPLITUDE,
//! QUBIT_MAX_FREQ, QUBIT_DT, RUST_LOG

use common::{Camera3D, GraphicsContext, MouseOrbit};
use qubit_rabi::bloch::{sphere_wireframe, BlochScene, Line};
use qubit_rabi::equations_ui::{draw_basis_labels, draw_telemetry_sidebar};
use qubit_rabi::renderer::BlochRenderer;
use qubit_rabi::{
    AmplitudeSource, ConstantSignal, ProcessSignal, Session, SignalConfig, SignalError,
    SimulationConfig,
};
use std::cell::Cell;
use std::rc::Rc;
use winit::{
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ControlFlow,
    keyboard::{KeyCode, PhysicalKey},
};

const MAX_POINTS: usize = 64;
const MAX_LINES: usize = 1024;

struct EguiState {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

struct App {
    ctx: GraphicsContext,
    renderer: BlochRenderer,
    session: Session,
    signal: Box<dyn AmplitudeSource>,
    brightness: f64,
    wireframe: Vec<Line>,
    camera: Camera3D,
    orbit: MouseOrbit,
    egui: EguiState,
}

impl App {
    fn new(ctx: GraphicsContext, session: Session, signal: Box<dyn AmplitudeSource>) -> Self {
        let renderer = BlochRenderer::new(&ctx, MAX_POINTS, MAX_LINES);
        let camera = Camera3D::new(ctx.aspect_ratio());

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &ctx.window,
            Some(ctx.window.scale_factor() as f32),
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&ctx.device, ctx.config.format, None, 1);

        Self {
            ctx,
            renderer,
            session,
            signal,
            brightness: qubit_rabi::signal::DEFAULT_AMPLITUDE,
            wireframe: sphere_wireframe(7, 8, 48),
            camera,
            orbit: MouseOrbit::default(),
            egui: EguiState {
                ctx: egui_ctx,
                state: egui_state,
                renderer: egui_renderer,
            },
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.ctx.resize(new_size);
        self.camera.update_aspect_ratio(self.ctx.aspect_ratio());
    }

    /// One tick: next amplitude, then advance every channel
    fn update(&mut self) -> Result<(), SignalError> {
        self.brightness = self.signal.next_amplitude()?;
        self.session.tick(self.brightness);
        Ok(())
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.update_camera(&self.ctx.queue, &self.camera);

        let telemetry = self.session.telemetry();
        let scene = BlochScene::build(&self.wireframe, &telemetry);
        let num_lines = self.renderer.update_lines(&self.ctx.queue, &scene.lines);
        let num_points = self.renderer.update_points(&self.ctx.queue, &scene.markers);

        let brightness = self.brightness;
        let view_proj = self.camera.view_projection();
        let raw_input = self.egui.state.take_egui_input(&self.ctx.window);
        let full_output = self.egui.ctx.run(raw_input, |ctx| {
            draw_basis_labels(ctx, view_proj);
            draw_telemetry_sidebar(ctx, "Rabi Qubit Simulator", brightness, &telemetry);
        });

        self.egui
            .state
            .handle_platform_output(&self.ctx.window, full_output.platform_output);
        let tris = self
            .egui
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui
                .renderer
                .update_texture(&self.ctx.device, &self.ctx.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.ctx.size.width, self.ctx.size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.renderer.render_lines(&mut encoder, &view, num_lines);
        self.renderer.render_points(&mut encoder, &view, num_points);

        self.egui.renderer.update_buffers(
            &self.ctx.device,
            &self.ctx.queue,
            &mut encoder,
            &tris,
            &screen_descriptor,
        );
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
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
            self.egui
                .renderer
                .render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui.renderer.free_texture(id);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, state: ElementState) -> bool {
        if state != ElementState::Pressed {
            return true;
        }

        match key {
            KeyCode::Escape => return false,
            KeyCode::KeyM => {
                self.session.measure_all();
            }
            _ => {
                if let Some(channel) = digit_channel(key) {
                    if let Err(e) = self.session.measure(channel) {
                        log::warn!("{}", e);
                    }
                }
            }
        }
        true
    }

    fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.orbit.set_dragging(state == ElementState::Pressed);
        }
    }

    fn handle_cursor(&mut self, x: f64, y: f64) {
        if let Some((yaw, pitch)) = self.orbit.cursor_moved(x, y) {
            self.camera.orbit(yaw, pitch);
        }
    }

    fn handle_scroll(&mut self, delta: f32) {
        self.camera.zoom(delta * 0.2, 1.5);
    }

    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.egui.state.on_window_event(&self.ctx.window, event).consumed
    }
}

fn digit_channel(key: KeyCode) -> Option<usize> {
    let channel = match key {
        KeyCode::Digit1 => 0,
        KeyCode::Digit2 => 1,
        KeyCode::Digit3 => 2,
        KeyCode::Digit4 => 3,
        KeyCode::Digit5 => 4,
        KeyCode::Digit6 => 5,
        KeyCode::Digit7 => 6,
        KeyCode::Digit8 => 7,
        KeyCode::Digit9 => 8,
        _ => return None,
    };
    Some(channel)
}

fn open_signal(config: &SignalConfig) -> Result<Box<dyn AmplitudeSource>, SignalError> {
    match config {
        SignalConfig::Process(command) => {
            let mut process = ProcessSignal::spawn(command)?;
            process.wait_ready()?;
            Ok(Box::new(process))
        }
        SignalConfig::Constant(amplitude) => {
            log::info!("Using constant drive amplitude {:.3}", amplitude);
            Ok(Box::new(ConstantSignal(*amplitude)))
        }
    }
}

fn main() {
    common::init_logging();

    let config = match SimulationConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };

    let session = match Session::from_config(&config) {
        Ok(session) => session,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };

    let signal = match open_signal(&config.signal) {
        Ok(signal) => signal,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    log::info!("Initializing 3D visualizer...");
    let (ctx, event_loop) =
        match pollster::block_on(GraphicsContext::new("AI Qubit Rabi Simulator", 800, 800)) {
            Ok(pair) => pair,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        };

    log::info!("Rotate the view with the mouse. Press M to measure.");

    let mut app = App::new(ctx, session, signal);
    let failed = Rc::new(Cell::new(false));
    let failed_in_loop = failed.clone();

    let result = event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { ref event, .. } => {
                let consumed = app.handle_window_event(event);

                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(size) => app.resize(*size),
                    WindowEvent::RedrawRequested => {
                        if let Err(e) = app.update() {
                            log::error!("{}. Shutting down.", e);
                            failed_in_loop.set(true);
                            elwt.exit();
                            return;
                        }
                        match app.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => app.resize(app.ctx.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                            Err(e) => log::warn!("Render error: {:?}", e),
                        }
                    }
                    _ if consumed => {}
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                physical_key: PhysicalKey::Code(key),
                                state,
                                ..
                            },
                        ..
                    } => {
                        if !app.handle_key(*key, *state) {
                            elwt.exit();
                        }
                    }
                    WindowEvent::MouseInput { button, state, .. } => {
                        app.handle_mouse_button(*button, *state)
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        app.handle_cursor(position.x, position.y)
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => *y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                        };
                        app.handle_scroll(scroll);
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                app.ctx.window.request_redraw();
            }
            _ => {}
        }
    });

    if let Err(e) = result {
        log::error!("Event loop error: {}", e);
        std::process::exit(1);
    }
    if failed.get() {
        std::process::exit(1);
    }
}
