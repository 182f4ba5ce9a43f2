use std::collections::HashSet;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use glam::Vec3;
use hum_common::{EntityId, Transform};
use hum_ecs::{BodyHandle, ComponentStore, Kinematic};
use hum_kernel::{FixedTimestep, Plugins, World};
use hum_render::{Camera, Color, FrameContext, RenderConfig, RenderPlugin};
use hum_render_gl::{GlContext, GlWindow, Rectangle, WindowConfig};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

const RECT_SIZE: f32 = 40.0;
const PAN_SPEED: f32 = 200.0;
/// Render-space depth range the space mapping spreads screen rows over.
const DEPTH_RANGE: f32 = 400.0;

#[derive(Parser)]
#[command(name = "hum-playground", about = "Bouncing rectangles on the OpenGL render plugin")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Window width
    #[arg(long, default_value = "512")]
    width: u32,

    /// Window height
    #[arg(long, default_value = "512")]
    height: u32,

    /// Number of rectangles
    #[arg(short, long, default_value = "12")]
    rectangles: usize,

    /// Close the game after this many seconds
    #[arg(long)]
    seconds: Option<f32>,

    /// Present without waiting for vsync
    #[arg(long)]
    no_vsync: bool,
}

const PALETTE: [Color; 6] = [
    Color::rgb(0xff, 0x55, 0x55),
    Color::rgb(0xff, 0xb8, 0x6c),
    Color::rgb(0xf1, 0xfa, 0x8c),
    Color::rgb(0x50, 0xfa, 0x7b),
    Color::rgb(0x8b, 0xe9, 0xfd),
    Color::new(0xbd, 0x93, 0xf9, 0xc0),
];

/// Camera showing `width x height` world units, y growing downwards.
fn screen_camera(width: f32, height: f32) -> Camera {
    let mut camera = Camera::default();
    camera.set_orthogonal(0.0, -width, height, 0.0);
    camera
}

/// Screen rows further down are closer to the camera, so they paint last.
fn row_depth(y: f32, height: f32) -> f32 {
    ((height - y) / height).clamp(0.0, 1.0) * DEPTH_RANGE
}

struct Body {
    entity: EntityId,
    handle: BodyHandle,
}

struct Playground {
    world: World,
    components: ComponentStore,
    clock: FixedTimestep,
    bodies: Vec<Body>,
    bounds: (f32, f32),
    keys_held: HashSet<KeyCode>,
    started: Instant,
    last_frame: Instant,
    max_seconds: Option<f32>,
    plugin: RenderPlugin<GlWindow>,
}

impl Playground {
    fn new(event_loop: &ActiveEventLoop, cli: &Cli) -> Result<Self> {
        let window = GlWindow::new(
            event_loop,
            &WindowConfig {
                title: "Playground".to_owned(),
                width: cli.width,
                height: cli.height,
                vsync: !cli.no_vsync,
            },
        )?;
        let (width, height) = window.physical_size();
        let (width, height) = (width as f32, height as f32);
        let context = GlContext::new(Rc::clone(window.gl()));

        let mut plugins = Plugins::new();
        plugins.insert(window);
        let mut plugin = RenderPlugin::new(RenderConfig {
            clear_color: Color::rgb(0x28, 0x2a, 0x36),
            camera: screen_camera(width, height),
        });
        plugin.game_start(&mut plugins)?;
        plugin.set_space_mapping(move |_, transform| {
            transform.position.z = row_depth(transform.position.y, height);
        });

        let mut world = World::new();
        let mut components = ComponentStore::new();
        let mut bodies = Vec::with_capacity(cli.rectangles);
        for i in 0..cli.rectangles {
            let t = i as f32 / cli.rectangles.max(1) as f32;
            let angle = t * std::f32::consts::TAU;
            let entity = world.spawn(Transform::from_position(Vec3::new(
                width * (0.2 + 0.6 * t),
                height * (0.5 + 0.3 * angle.sin()),
                0.0,
            )));
            let kinematic = Kinematic {
                velocity: Vec3::new(angle.cos(), angle.sin(), 0.0) * 120.0,
                angular_velocity: Vec3::new(0.0, 0.0, if i % 2 == 0 { 45.0 } else { 0.0 }),
                acceleration: Vec3::ZERO,
            };
            let handle = components.attach_kinematic(entity, kinematic);
            bodies.push(Body { entity, handle });

            let rectangle = Rectangle::new(&context, PALETTE[i % PALETTE.len()])?
                .with_transform(Transform {
                    scale: Vec3::new(RECT_SIZE, RECT_SIZE, 1.0),
                    ..Transform::default()
                })
                .with_origin(Vec3::new(0.5, 0.5, 0.0));
            plugin.spawn_drawable(entity, rectangle, &components);
        }
        tracing::info!(
            rectangles = bodies.len(),
            programs = plugin.tracker().tracked_len(),
            "playground ready"
        );

        let now = Instant::now();
        Ok(Self {
            world,
            components,
            clock: FixedTimestep::default(),
            bodies,
            bounds: (width, height),
            keys_held: HashSet::new(),
            started: now,
            last_frame: now,
            max_seconds: cli.seconds,
            plugin,
        })
    }

    fn fixed_update(&mut self, dt: f32) {
        self.components.integrate(&mut self.world, dt);
        self.world.step();

        let (width, height) = self.bounds;
        for body in &self.bodies {
            let Some(position) = self.world.transform(body.entity).map(|t| t.position) else {
                continue;
            };
            let Some(kinematic) = self.components.kinematic_mut(body.handle) else {
                continue;
            };
            if (position.x < 0.0 && kinematic.velocity.x < 0.0)
                || (position.x > width && kinematic.velocity.x > 0.0)
            {
                kinematic.velocity.x = -kinematic.velocity.x;
            }
            if (position.y < 0.0 && kinematic.velocity.y < 0.0)
                || (position.y > height && kinematic.velocity.y > 0.0)
            {
                kinematic.velocity.y = -kinematic.velocity.y;
            }
        }
    }

    fn pan_camera(&mut self, dt: f32) {
        let mut delta = Vec3::ZERO;
        if self.keys_held.contains(&KeyCode::ArrowLeft) {
            delta.x -= 1.0;
        }
        if self.keys_held.contains(&KeyCode::ArrowRight) {
            delta.x += 1.0;
        }
        if self.keys_held.contains(&KeyCode::ArrowUp) {
            delta.y -= 1.0;
        }
        if self.keys_held.contains(&KeyCode::ArrowDown) {
            delta.y += 1.0;
        }
        if delta == Vec3::ZERO {
            return;
        }
        let delta = delta * PAN_SPEED * dt;
        let camera = self.plugin.camera_mut();
        let (position, center) = (camera.position(), camera.center());
        camera.set_position(position + delta);
        camera.set_center(center + delta);
    }

    /// Advance the simulation and draw one frame. Returns false once the
    /// game should end.
    fn frame(&mut self) -> Result<bool> {
        let now = Instant::now();
        let dt = (now - self.last_frame).min(Duration::from_millis(250));
        self.last_frame = now;

        let steps = self.clock.advance(dt);
        let step = self.clock.step().as_secs_f32();
        for _ in 0..steps {
            self.fixed_update(step);
        }
        self.pan_camera(dt.as_secs_f32());

        let frame = FrameContext::new(&self.world, &self.components)
            .with_lag(self.clock.lag(), self.clock.step());
        let stats = self.plugin.post_update(&frame)?;
        tracing::trace!(?stats, steps, "frame");

        let elapsed = self.started.elapsed().as_secs_f32();
        Ok(self.max_seconds.is_none_or(|max| elapsed < max))
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        if let Some(window) = self.plugin.surface() {
            window.resize(size);
        }
        let (width, height) = (size.width as f32, size.height as f32);
        self.bounds = (width, height);
        self.plugin
            .camera_mut()
            .set_orthogonal(0.0, -width, height, 0.0);
        self.plugin.set_space_mapping(move |_, transform| {
            transform.position.z = row_depth(transform.position.y, height);
        });
    }

    fn request_redraw(&self) {
        if let Some(window) = self.plugin.surface() {
            window.request_redraw();
        }
    }

    /// Drop every drawable while the GL context is still alive.
    fn shutdown(mut self) {
        let window = self.plugin.game_end();
        drop(self);
        drop(window);
        tracing::info!("Bye!");
    }
}

struct App {
    cli: Cli,
    state: Option<Playground>,
    error: Option<anyhow::Error>,
}

impl App {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        if let Some(state) = self.state.take() {
            state.shutdown();
        }
        self.error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match Playground::new(event_loop, &self.cli) {
            Ok(state) => self.state = Some(state),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if matches!(event, WindowEvent::CloseRequested) {
            if let Some(state) = self.state.take() {
                state.shutdown();
            }
            event_loop.exit();
            return;
        }

        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => match key_state {
                ElementState::Pressed if key == KeyCode::Escape => {
                    if let Some(state) = self.state.take() {
                        state.shutdown();
                    }
                    event_loop.exit();
                }
                ElementState::Pressed => {
                    state.keys_held.insert(key);
                }
                ElementState::Released => {
                    state.keys_held.remove(&key);
                }
            },
            WindowEvent::RedrawRequested => match state.frame() {
                Ok(true) => state.request_redraw(),
                Ok(false) => {
                    if let Some(state) = self.state.take() {
                        state.shutdown();
                    }
                    event_loop.exit();
                }
                Err(err) => self.fail(event_loop, err),
            },
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.as_ref() {
            state.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("hum-playground starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        cli,
        state: None,
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_rows_are_nearer() {
        assert!(row_depth(400.0, 512.0) < row_depth(100.0, 512.0));
        assert_eq!(row_depth(512.0, 512.0), 0.0);
        assert_eq!(row_depth(-10.0, 512.0), DEPTH_RANGE);
    }

    #[test]
    fn screen_camera_sees_the_window() {
        let mut camera = screen_camera(512.0, 512.0);
        let clip = camera.projection() * camera.view();
        let top_left = clip.project_point3(Vec3::new(0.0, 0.0, 10.0));
        let bottom_right = clip.project_point3(Vec3::new(512.0, 512.0, 10.0));
        assert!((top_left.x + 1.0).abs() < 1e-4 && (top_left.y - 1.0).abs() < 1e-4);
        assert!((bottom_right.x - 1.0).abs() < 1e-4 && (bottom_right.y + 1.0).abs() < 1e-4);
    }
}
