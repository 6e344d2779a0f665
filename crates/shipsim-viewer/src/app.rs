use std::rc::Rc;

use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use shipsim_render::api::WgpuApi;
use shipsim_render::device::Gpu;
use shipsim_render::{render_scene, RenderContext, Vec2};

use crate::config::ViewerConfig;
use crate::demo::DemoScene;
use crate::time::{FpsCounter, FrameClock};

/// Pixels of a precise scroll counted as one wheel line.
const PIXELS_PER_LINE: f32 = 40.0;

#[self_referencing]
struct ViewerWindow {
    window: Window,

    #[borrows(window)]
    #[not_covariant]
    renderer: RenderContext<WgpuApi<'this>>,
}

/// Toggles and pointer state driven by input.
#[derive(Debug, Clone)]
struct ViewState {
    transparent_water: bool,
    points_only: bool,
    ambient_light_intensity: f32,
    panning: bool,
    cursor: Option<Vec2>,
}

pub struct Viewer {
    config: ViewerConfig,
    window: Option<ViewerWindow>,
    demo: DemoScene,
    view: ViewState,
    clock: FrameClock,
    fps: FpsCounter,
    exit_requested: bool,
    error: Option<anyhow::Error>,
}

impl Viewer {
    /// Opens the window and runs until it is closed.
    pub fn run(config: ViewerConfig) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut viewer = Viewer::new(config);

        event_loop
            .run_app(&mut viewer)
            .context("winit event loop terminated with error")?;

        match viewer.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn new(config: ViewerConfig) -> Self {
        let view = ViewState {
            transparent_water: true,
            points_only: false,
            ambient_light_intensity: config.render.initial_ambient_light_intensity,
            panning: false,
            cursor: None,
        };

        Self {
            demo: DemoScene::new(config.demo.clone()),
            fps: FpsCounter::new(config.stats_interval),
            clock: FrameClock::default(),
            window: None,
            view,
            exit_requested: false,
            error: None,
            config,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_options = self.config.gpu.clone();
        let settings = self.config.render.clone();

        let entry = ViewerWindowTryBuilder {
            window,
            renderer_builder: |window| {
                let gpu = pollster::block_on(Gpu::new(window, gpu_options))
                    .context("GPU initialization failed")?;
                let mut renderer = RenderContext::new(Rc::new(WgpuApi::new(gpu)), settings)
                    .context("failed to build the scene renderer")?;

                let size = window.inner_size();
                renderer.set_canvas_size(size.width, size.height);
                Ok::<_, anyhow::Error>(renderer)
            },
        }
        .try_build()?;

        self.window = Some(entry);
        self.clock.reset();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.error = Some(err);
        self.exit_requested = true;
        event_loop.exit();
    }

    fn with_renderer(&mut self, f: impl FnOnce(&mut RenderContext<WgpuApi<'_>>)) {
        if let Some(window) = self.window.as_mut() {
            window.with_renderer_mut(|renderer| f(renderer));
        }
    }

    fn on_key(&mut self, code: KeyCode) {
        let view = &mut self.view;
        match code {
            KeyCode::KeyT => {
                view.transparent_water = !view.transparent_water;
                log::info!("transparent water: {}", view.transparent_water);
            }
            KeyCode::KeyP => {
                view.points_only = !view.points_only;
                log::info!("points only: {}", view.points_only);
            }
            KeyCode::Equal | KeyCode::NumpadAdd => {
                view.ambient_light_intensity =
                    (view.ambient_light_intensity + self.config.ambient_step).min(1.0);
                log::info!("ambient light: {:.1}", view.ambient_light_intensity);
            }
            KeyCode::Minus | KeyCode::NumpadSubtract => {
                view.ambient_light_intensity =
                    (view.ambient_light_intensity - self.config.ambient_step).max(0.0);
                log::info!("ambient light: {:.1}", view.ambient_light_intensity);
            }
            KeyCode::Escape => self.exit_requested = true,
            _ => {}
        }
    }

    fn on_wheel(&mut self, delta: MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
        };
        let factor = self.config.zoom_step.powf(lines);
        self.with_renderer(|r| {
            let zoom = r.zoom() * factor;
            r.set_zoom(zoom);
        });
    }

    fn on_cursor(&mut self, position: Vec2) {
        let last = self.view.cursor.replace(position);
        if !self.view.panning {
            return;
        }
        let Some(last) = last else { return };

        self.with_renderer(|r| {
            let offset = r.screen_offset_to_world_offset(position - last);
            let camera = r.camera_world_position() - offset;
            r.set_camera_world_position(camera);
        });
    }

    fn redraw(&mut self) {
        let dt = self.clock.tick();
        self.demo.advance(dt);

        let Some(window) = self.window.as_mut() else { return };

        let frame = self.demo.frame(
            self.view.ambient_light_intensity,
            self.view.transparent_water,
            self.view.points_only,
        );
        let surface_lost = window.with_renderer_mut(|r| {
            render_scene(r, &frame);
            r.api().surface_lost()
        });

        if surface_lost {
            log::error!("rendering surface lost; shutting down");
            self.exit_requested = true;
        }

        if let Some(fps) = self.fps.frame() {
            let title = format!("{} - {fps:.1} fps", self.config.title);
            window.with_window(|w| w.set_title(&title));
            log::debug!("{fps:.1} fps");
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.create_window(event_loop) {
            self.fail(event_loop, err);
            return;
        }

        if let Some(window) = &self.window {
            window.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: the scene animates every frame.
        if let Some(window) = &self.window {
            window.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.exit_requested = true,

            WindowEvent::Resized(size) => {
                self.with_renderer(|r| r.set_canvas_size(size.width, size.height));
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.on_key(code),

            WindowEvent::MouseWheel { delta, .. } => self.on_wheel(delta),

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Right,
                ..
            } => self.view.panning = state == ElementState::Pressed,

            WindowEvent::CursorMoved { position, .. } => {
                self.on_cursor(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::CursorLeft { .. } => self.view.cursor = None,

            WindowEvent::RedrawRequested => self.redraw(),

            _ => {}
        }

        if self.exit_requested {
            self.window = None;
            event_loop.exit();
        }
    }
}
