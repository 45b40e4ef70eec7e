//! Interactive particle experiments
//!
//! A spiral galaxy generator, scalar-field animations over a random cube and
//! a pointer-reactive screen field, all drawn as GPU point clouds.

mod gui;

use anyhow::{bail, Context as _};
use glam::{Mat4, Vec3};
use gui::{Gui, PanelRequest, UiState};
use particle_field::{Experiment, FieldFunction, FrameChange, SceneSession, Viewport};
use particle_renderer::{Camera, PointRenderer, RenderError};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalPosition, LogicalSize, PhysicalPosition, PhysicalSize},
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Where the orbiting camera starts for each perspective experiment
const GALAXY_EYE: Vec3 = Vec3::new(-4.0, 2.0, 7.0);
const ANIMATION_EYE: Vec3 = Vec3::new(4.0, 0.0, 7.0);

/// Command-line options: `[galaxy|animation|field] [--seed N] [--function NAME]`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Options {
    experiment: Experiment,
    seed: Option<u64>,
    /// Starting function for the animation experiment
    function: Option<FieldFunction>,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Options> {
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let value = args.next().context("--seed needs a value")?;
                let seed = value
                    .parse()
                    .with_context(|| format!("invalid seed `{value}`"))?;
                options.seed = Some(seed);
            }
            "--function" => {
                let value = args.next().context("--function needs a name")?;
                options.function = Some(FieldFunction::resolve(&value));
            }
            flag if flag.starts_with("--") => bail!("unknown option `{flag}`"),
            name => options.experiment = name.parse()?,
        }
    }

    Ok(options)
}

/// Particle space is measured in logical pixels so the screen field keeps its
/// look on high-DPI displays.
fn logical_viewport(size: PhysicalSize<u32>, scale_factor: f64) -> Viewport {
    let logical: LogicalSize<f32> = size.to_logical(scale_factor);
    Viewport::new(logical.width.max(1.0), logical.height.max(1.0))
}

fn camera_for(experiment: Experiment, viewport: Viewport) -> Camera {
    let Viewport { width, height } = viewport;
    match experiment {
        Experiment::Galaxy => Camera::perspective(width, height, GALAXY_EYE),
        Experiment::Animation => Camera::perspective(width, height, ANIMATION_EYE),
        Experiment::Field => Camera::orthographic(width, height),
    }
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    scale_factor: f64,

    renderer: PointRenderer,
    camera: Camera,
    session: SceneSession,
    /// Session generation currently uploaded to the GPU
    installed_generation: u64,

    gui: Gui,
    ui_state: UiState,

    start_time: Instant,
    frame_times: VecDeque<f32>,
    last_frame_time: Instant,
}

impl GpuState {
    async fn new(window: Arc<Window>, options: Options) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let surface = instance
            .create_surface(window.clone())
            .map_err(RenderError::from)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(RenderError::from)?;

        log::info!("✓ Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(RenderError::from)?;

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&fallback_format) = surface_caps.formats.first() else {
            bail!("surface reports no supported formats");
        };
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(fallback_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let scale_factor = window.scale_factor();
        let viewport = logical_viewport(PhysicalSize::new(width, height), scale_factor);
        let mut session = SceneSession::new(options.experiment, viewport, options.seed)?;
        if let Some(function) = options.function {
            session.animation.function = function;
        }
        log::info!(
            "✓ {} initialized with {} particles",
            session.experiment().title(),
            session.particle_count()
        );

        let mut renderer = PointRenderer::new(&device, &config);
        if let Some(field) = session.field() {
            renderer.install(&device, &field.buffer);
        }
        log::info!("✓ Renderer initialized");

        let camera = camera_for(session.experiment(), viewport);

        let gui = Gui::new(&device, config.format, &window);
        let ui_state = UiState::new(&session);

        let now = Instant::now();
        Ok(Self {
            surface,
            device,
            queue,
            config,
            scale_factor,
            renderer,
            camera,
            installed_generation: session.generation(),
            session,
            gui,
            ui_state,
            start_time: now,
            frame_times: VecDeque::with_capacity(100),
            last_frame_time: now,
        })
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.renderer.resize(&self.device, &self.config);

            let viewport = logical_viewport(new_size, self.scale_factor);
            self.camera.resize(viewport.width, viewport.height);
            self.session.resize(viewport, Instant::now());
        }
    }

    fn viewport(&self) -> Viewport {
        logical_viewport(
            PhysicalSize::new(self.config.width, self.config.height),
            self.scale_factor,
        )
    }

    /// Upload the session's field if it was rebuilt since the last upload.
    fn sync_field(&mut self) {
        if self.session.generation() == self.installed_generation {
            return;
        }
        if let Some(field) = self.session.field() {
            self.renderer.install(&self.device, &field.buffer);
        }
        self.installed_generation = self.session.generation();
    }

    fn regenerate(&mut self) {
        if let Err(e) = self.session.regenerate() {
            log::error!("regeneration failed, keeping the current field: {e}");
            return;
        }
        self.sync_field();
    }

    fn switch_experiment(&mut self, experiment: Experiment) {
        if let Err(e) = self.session.set_experiment(experiment) {
            log::error!("could not switch to {experiment}: {e}");
            return;
        }
        self.camera = camera_for(experiment, self.viewport());
        self.ui_state.sync_from(&self.session);
        self.sync_field();
    }

    fn handle_requests(&mut self) {
        let requests = std::mem::take(&mut self.ui_state.requests);
        for request in requests {
            match request {
                PanelRequest::SwitchExperiment(experiment) => self.switch_experiment(experiment),
                PanelRequest::Regenerate => self.regenerate(),
            }
        }
    }

    fn set_cursor(&mut self, position: Option<PhysicalPosition<f64>>) {
        let pointer = position.map(|p| {
            let logical: LogicalPosition<f32> = p.to_logical(self.scale_factor);
            self.session.pointer_from_window(logical.x, logical.y)
        });
        self.session.set_pointer(pointer);
    }

    fn release(&mut self) {
        self.renderer.release();
        self.session.release();
    }

    fn render(&mut self, window: &Window) -> Result<(f32, f32), wgpu::SurfaceError> {
        // Track frame time
        let now = Instant::now();
        let frame_time = (now - self.last_frame_time).as_secs_f32() * 1000.0;
        self.last_frame_time = now;

        self.frame_times.push_back(frame_time);
        if self.frame_times.len() > 100 {
            self.frame_times.pop_front();
        }

        let avg_frame_time = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        let fps = 1000.0 / avg_frame_time.max(f32::EPSILON);

        let elapsed = (now - self.start_time).as_secs_f32();
        if self.session.tick(elapsed, now) == FrameChange::PositionsUpdated {
            if let Some(field) = self.session.field() {
                self.renderer.write_positions(&self.queue, &field.buffer);
            }
        }
        // Rebuilt fields (debounced resize) are uploaded whole.
        self.sync_field();

        self.ui_state.fps = fps;
        self.ui_state.frame_time = avg_frame_time;

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let model = Mat4::from_quat(self.session.model_rotation(elapsed));
        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            &self.camera,
            model,
            &self.session.point_style(),
        );

        {
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("GUI Encoder"),
                });

            self.gui.render(
                &self.device,
                &self.queue,
                &mut encoder,
                window,
                &view,
                &mut self.ui_state,
                &mut self.session,
            );

            self.queue.submit(std::iter::once(encoder.finish()));
        }

        output.present();

        self.handle_requests();

        Ok((fps, avg_frame_time))
    }
}

struct App {
    options: Options,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
}

impl App {
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(gpu_state) = &mut self.gpu_state {
            gpu_state.release();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("Particle Experiments")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("could not create window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        match pollster::block_on(GpuState::new(window, self.options)) {
            Ok(gpu_state) => self.gpu_state = Some(gpu_state),
            Err(e) => {
                log::error!("GPU initialization failed: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Handle GUI events
        if let (Some(gpu_state), Some(window)) = (&mut self.gpu_state, &self.window) {
            if gpu_state.gui.handle_event(window, &event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => self.shutdown(event_loop),

            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let (Some(gpu_state), Some(window)) = (&mut self.gpu_state, &self.window) {
                    gpu_state.scale_factor = scale_factor;
                    gpu_state.resize(window.inner_size());
                }
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    match key_code {
                        KeyCode::Digit1 => gpu_state.switch_experiment(Experiment::Galaxy),
                        KeyCode::Digit2 => gpu_state.switch_experiment(Experiment::Animation),
                        KeyCode::Digit3 => gpu_state.switch_experiment(Experiment::Field),
                        KeyCode::KeyR => gpu_state.regenerate(),
                        KeyCode::KeyC => gpu_state.camera.reset(),
                        _ => {}
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Right {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    if gpu_state.gui.wants_pointer() {
                        gpu_state.set_cursor(None);
                    } else {
                        gpu_state.set_cursor(Some(position));
                    }

                    if self.mouse_pressed {
                        if let Some(last_pos) = self.last_mouse_pos {
                            let delta_x = (position.x - last_pos.0) as f32;
                            let delta_y = (position.y - last_pos.1) as f32;
                            gpu_state.camera.rotate(-delta_x * 0.005, delta_y * 0.005);
                        }
                        self.last_mouse_pos = Some((position.x, position.y));
                    }
                }
            }

            WindowEvent::CursorLeft { .. } => {
                self.last_mouse_pos = None;
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.set_cursor(None);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_x, y) => y * 10.0,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };

                if let Some(gpu_state) = &mut self.gpu_state {
                    let distance = gpu_state.camera.distance;
                    gpu_state.camera.zoom(-scroll * distance / 100.0);
                }
            }

            WindowEvent::RedrawRequested => {
                let mut out_of_memory = false;
                if let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) {
                    match gpu_state.render(window) {
                        Ok((fps, frame_time)) => {
                            window.set_title(&format!(
                                "{} - {:.0} FPS ({:.2}ms) - {} particles",
                                gpu_state.session.experiment().title(),
                                fps,
                                frame_time,
                                gpu_state.session.particle_count()
                            ));
                        }
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            gpu_state.resize(window.inner_size())
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => out_of_memory = true,
                        Err(e) => log::error!("render error: {}", RenderError::from(e)),
                    }
                }
                if out_of_memory {
                    log::error!("out of GPU memory, exiting");
                    self.shutdown(event_loop);
                }
            }

            _ => {}
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = parse_args(std::env::args().skip(1))?;
    log::info!("Starting particle experiments ({})", options.experiment);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        options,
        window: None,
        gpu_state: None,
        mouse_pressed: false,
        last_mouse_pos: None,
    };

    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_defaults() {
        assert_eq!(parse_args(args(&[])).unwrap(), Options::default());
    }

    #[test]
    fn test_parse_args_experiment_and_seed() {
        let options = parse_args(args(&["field", "--seed", "42"])).unwrap();
        assert_eq!(options.experiment, Experiment::Field);
        assert_eq!(options.seed, Some(42));
    }

    #[test]
    fn test_parse_args_rejects_bad_input() {
        assert!(parse_args(args(&["text"])).is_err());
        assert!(parse_args(args(&["--seed"])).is_err());
        assert!(parse_args(args(&["--seed", "abc"])).is_err());
        assert!(parse_args(args(&["--fast"])).is_err());
        assert!(parse_args(args(&["--function"])).is_err());
    }

    #[test]
    fn test_parse_args_function() {
        let options = parse_args(args(&["animation", "--function", "ripple"])).unwrap();
        assert_eq!(options.experiment, Experiment::Animation);
        assert_eq!(options.function, Some(FieldFunction::Ripple));
    }

    #[test]
    fn test_parse_args_unknown_function_falls_back() {
        let options = parse_args(args(&["--function", "nope"])).unwrap();
        assert_eq!(options.function, Some(FieldFunction::None));
    }

    #[test]
    fn test_viewport_is_logical() {
        let viewport = logical_viewport(PhysicalSize::new(1600, 1200), 2.0);
        assert_eq!(viewport, Viewport::new(800.0, 600.0));

        let camera = camera_for(Experiment::Field, viewport);
        assert_eq!((camera.width, camera.height), (800.0, 600.0));
    }

    #[test]
    fn test_camera_matches_experiment() {
        let viewport = Viewport::new(800.0, 600.0);
        assert!(camera_for(Experiment::Galaxy, viewport).is_orbiting());
        assert!(!camera_for(Experiment::Field, viewport).is_orbiting());
    }
}
