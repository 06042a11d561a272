use std::num::NonZeroU32;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use log::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window, WindowId};

use tilecaster::assets::AssetRegistry;
use tilecaster::config::EngineConfig;
use tilecaster::entity::Entity;
use tilecaster::game::Game;
use tilecaster::input::InputState;
use tilecaster::renderer;
use tilecaster::scaler::{ScaleLut, blit_nearest, build_scale_lut};
use tilecaster::world::Grid;

#[derive(Debug, Parser)]
#[command(name = "tilecaster", about = "Tile-grid raycaster")]
struct Cli {
    /// JSON engine settings; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// ASCII map ('.' empty, '#' or 1-9 walls) instead of the demo level
    #[arg(long)]
    map: Option<PathBuf>,

    /// Number of rays in the fan
    #[arg(long)]
    rays: Option<usize>,
}

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    window_size: LogicalSize<f64>,
    game: Game,
    assets: AssetRegistry,
    input: InputState,

    // HUD
    frame_counter: u32,
    last_fps_print: Instant,

    // Internal fixed-height buffer
    fb_small: Vec<u32>,
    fb_w: usize,
    fb_h: usize,
    scale_lut: ScaleLut,

    last_tick: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(game: Game, config: &EngineConfig) -> Self {
        let fb_h = config.internal_height;
        Self {
            window: None,
            surface: None,
            window_size: LogicalSize::new(config.window_width as f64, config.window_height as f64),
            game,
            assets: AssetRegistry::procedural(),
            input: InputState::new(),

            frame_counter: 0,
            last_fps_print: Instant::now(),

            fb_small: Vec::new(),
            fb_w: 0,
            fb_h,
            scale_lut: ScaleLut::empty(),

            last_tick: Instant::now(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.error = Some(err);
        event_loop.exit();
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title("tilecaster")
            .with_inner_size(self.window_size);

        let window = Rc::new(
            event_loop
                .create_window(attributes)
                .context("create window")?,
        );
        let context = softbuffer::Context::new(window.clone())
            .map_err(|e| anyhow::anyhow!("softbuffer context: {e}"))?;
        let surface = softbuffer::Surface::new(&context, window.clone())
            .map_err(|e| anyhow::anyhow!("softbuffer surface: {e}"))?;

        let size = window.inner_size();
        self.rebuild_internal_fb_and_lut(size.width as usize, size.height as usize);
        info!(
            "window {}x{}, internal buffer {}x{}",
            size.width, size.height, self.fb_w, self.fb_h
        );

        window.request_redraw();
        self.surface = Some(surface);
        self.window = Some(window);
        self.last_tick = Instant::now();
        Ok(())
    }

    fn redraw(&mut self, id: WindowId) -> Result<()> {
        self.tick();

        let (window, surface) = match (&self.window, &mut self.surface) {
            (Some(w), Some(s)) if w.id() == id => (w, s),
            _ => return Ok(()),
        };

        let size = window.inner_size();
        // minimised windows report a zero size
        let (Some(nw), Some(nh)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return Ok(());
        };
        let dw = size.width as usize;
        surface
            .resize(nw, nh)
            .map_err(|e| anyhow::anyhow!("resize surface: {e}"))?;

        renderer::render_frame(
            &mut self.fb_small,
            self.fb_w,
            self.fb_h,
            &self.game.scene(),
            &self.assets,
        );

        let mut buf = surface
            .buffer_mut()
            .map_err(|e| anyhow::anyhow!("surface buffer: {e}"))?;
        blit_nearest(&mut buf, dw, &self.fb_small, self.fb_w, &self.scale_lut);
        buf.present()
            .map_err(|e| anyhow::anyhow!("present frame: {e}"))?;

        self.frame_counter += 1;
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_print).as_secs_f32();
        if elapsed >= 1.0 {
            info!(
                "fps {:.1}, {} projectiles",
                self.frame_counter as f32 / elapsed,
                self.game.projectiles().len()
            );
            self.frame_counter = 0;
            self.last_fps_print = now;
        }

        window.request_redraw();
        Ok(())
    }

    fn tick(&mut self) {
        // Cap dt so a stalled frame does not tunnel through walls
        let now = Instant::now();
        let dt = now
            .duration_since(self.last_tick)
            .min(Duration::from_millis(100));
        self.last_tick = now;

        let intent = self.input.take_intent();
        self.game.tick(&intent, dt.as_secs_f32());
    }

    fn apply_capture(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let captured = self.input.captured();
        let result = if captured {
            window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            window.set_cursor_grab(CursorGrabMode::None)
        };
        match result {
            Ok(()) => {
                window.set_cursor_visible(!captured);
                debug!("mouse capture {}", if captured { "on" } else { "off" });
            }
            Err(e) => {
                warn!("cursor grab failed: {e}");
                window.set_cursor_visible(true);
                self.input.set_captured(false);
            }
        }
    }

    fn rebuild_internal_fb_and_lut(&mut self, dst_w: usize, dst_h: usize) {
        // Internal height is fixed; width follows the window aspect
        let target_h = self.fb_h;
        let aspect = if dst_h > 0 {
            dst_w as f32 / dst_h as f32
        } else {
            1.0
        };

        let mut target_w = (target_h as f32 * aspect).round() as usize;
        if target_w < 160 {
            target_w = 160;
        }
        if target_w % 2 != 0 {
            target_w += 1;
        }

        if target_w != self.fb_w || self.fb_small.len() != target_w * target_h {
            self.fb_w = target_w;
            self.fb_small = vec![0u32; self.fb_w * self.fb_h];
        }
        self.scale_lut = build_scale_lut(dst_w, dst_h, self.fb_w, self.fb_h);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("close requested, stopping");
                event_loop.exit();
            }

            WindowEvent::Focused(false) => {
                self.input.release_all();
                if self.input.captured() {
                    self.input.set_captured(false);
                    self.apply_capture();
                }
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if self.input.key(code, state == ElementState::Pressed) {
                    self.apply_capture();
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw(id) {
                    self.fail(event_loop, e);
                }
            }

            WindowEvent::Resized(new_size) => {
                self.rebuild_internal_fb_and_lut(new_size.width as usize, new_size.height as usize);
            }
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, _) } = event {
            self.input.mouse_motion(dx);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn load_grid(cli: &Cli, config: &EngineConfig) -> Result<Grid> {
    let Some(path) = &cli.map else {
        return Ok(Grid::demo(config.cell_size));
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read map: {}", path.display()))?;
    Grid::parse(&text, config.cell_size).with_context(|| format!("parse map: {}", path.display()))
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(rays) = cli.rays {
        config.ray_count = rays;
        config.validate().context("--rays")?;
    }
    debug!("{config:?}");

    let grid = load_grid(&cli, &config)?;
    info!(
        "map {}x{} cells, {} rays over {} degrees",
        grid.cols(),
        grid.rows(),
        config.ray_count,
        config.fov_degrees
    );

    let mut game = Game::new(grid, &config);
    if !game.add_object(Entity::ghost(Vec2::new(300.0, 300.0))) {
        debug!("no free cell for the ghost at (300, 300)");
    }

    let event_loop = EventLoop::new().context("create event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(game, &config);
    event_loop.run_app(&mut app).context("event loop")?;
    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() {
    let cli = Cli::parse();
    // info by default, RUST_LOG overrides
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();

    if let Err(e) = run(cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}
