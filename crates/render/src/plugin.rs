use hum_common::{EntityId, Transform};
use hum_ecs::ComponentStore;
use hum_kernel::{Plugins, World};

use crate::camera::Camera;
use crate::color::Color;
use crate::composer::{FrameContext, TransformComposer};
use crate::drawable::{Drawable, DrawableId};
use crate::error::RenderError;
use crate::registry::DrawableRegistry;
use crate::scheduler::{DrawOrderScheduler, FrameStats};
use crate::shader::SharedProgram;
use crate::surface::RenderSurface;
use crate::tracker::ShaderUsageTracker;

/// Startup settings for a [`RenderPlugin`].
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    pub clear_color: Color,
    pub camera: Camera,
}

/// Host-facing render plugin.
///
/// Lifecycle: [`game_start`](Self::game_start) takes the surface out of the
/// host plugin registry, [`post_update`](Self::post_update) renders one frame
/// after the fixed updates, [`game_end`](Self::game_end) gives the surface
/// back.
pub struct RenderPlugin<S> {
    clear_color: Color,
    camera: Camera,
    registry: DrawableRegistry,
    tracker: ShaderUsageTracker,
    composer: TransformComposer,
    scheduler: DrawOrderScheduler,
    // Dropped last: drawables may release GPU objects of this surface.
    surface: Option<S>,
}

impl<S: RenderSurface + 'static> RenderPlugin<S> {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            clear_color: config.clear_color,
            camera: config.camera,
            registry: DrawableRegistry::new(),
            tracker: ShaderUsageTracker::new(),
            composer: TransformComposer::new(),
            scheduler: DrawOrderScheduler::new(),
            surface: None,
        }
    }

    /// Take the surface from `plugins` and prepare it.
    ///
    /// A missing surface aborts the start. There is no fallback mode.
    pub fn game_start(&mut self, plugins: &mut Plugins) -> Result<(), RenderError> {
        let mut surface = plugins.take::<S>().map_err(|err| {
            tracing::error!(%err, "render plugin cannot start");
            RenderError::MissingPlugin(err)
        })?;
        surface.prepare()?;
        surface.set_clear_color(self.clear_color);
        self.surface = Some(surface);
        tracing::debug!("render plugin started");
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.surface.is_some()
    }

    /// Render one frame: clear, refresh camera uniforms, draw in order,
    /// present.
    pub fn post_update(&mut self, frame: &FrameContext<'_>) -> Result<FrameStats, RenderError> {
        let surface = self.surface.as_mut().ok_or(RenderError::NotStarted)?;
        surface.clear();
        let stats = self.scheduler.frame(
            &self.registry,
            &self.composer,
            &mut self.tracker,
            &mut self.camera,
            frame,
        );
        surface.present()?;
        Ok(stats)
    }

    /// Stop rendering and hand the surface back.
    pub fn game_end(&mut self) -> Option<S> {
        let surface = self.surface.take();
        if surface.is_some() {
            tracing::debug!("render plugin stopped");
        }
        surface
    }

    /// Applied immediately when started, otherwise at start.
    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
        if let Some(surface) = self.surface.as_mut() {
            surface.set_clear_color(color);
        }
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    /// Replace the camera. Both matrices are pushed again on the next frame.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
        self.camera.invalidate();
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn set_space_mapping(&mut self, mapping: impl Fn(&World, &mut Transform) + 'static) {
        self.composer.set_space_mapping(mapping);
    }

    /// Register a detached drawable.
    pub fn add_drawable(&mut self, owner: EntityId, drawable: impl Drawable + 'static) -> DrawableId {
        self.registry.insert(owner, Box::new(drawable))
    }

    /// Register and enable a drawable in one go.
    pub fn spawn_drawable(
        &mut self,
        owner: EntityId,
        drawable: impl Drawable + 'static,
        components: &ComponentStore,
    ) -> DrawableId {
        let id = self.add_drawable(owner, drawable);
        self.enable(id, components);
        id
    }

    pub fn enable(&mut self, id: DrawableId, components: &ComponentStore) -> bool {
        self.registry
            .activate(id, components, &mut self.tracker, &self.camera)
    }

    pub fn disable(&mut self, id: DrawableId) -> bool {
        self.registry.deactivate(id, &mut self.tracker)
    }

    pub fn destroy(&mut self, id: DrawableId) -> Option<Box<dyn Drawable>> {
        self.registry.remove(id, &mut self.tracker)
    }

    pub fn set_shader_program(&mut self, id: DrawableId, program: Option<SharedProgram>) -> bool {
        self.registry
            .set_shader_program(id, program, &mut self.tracker, &self.camera)
    }

    pub fn drawable(&self, id: DrawableId) -> Option<&dyn Drawable> {
        self.registry.get(id)
    }

    pub fn drawable_mut(&mut self, id: DrawableId) -> Option<&mut dyn Drawable> {
        self.registry.get_mut(id)
    }

    pub fn registry(&self) -> &DrawableRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &ShaderUsageTracker {
        &self.tracker
    }

    /// Draw list of the last rendered frame, farthest first.
    pub fn scheduler(&self) -> &DrawOrderScheduler {
        &self.scheduler
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }
}
