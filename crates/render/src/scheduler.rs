//! Per-frame draw ordering.
//!
//! Every active drawable is resolved into world space, measured against the
//! camera plane, culled to `[near, far]` and drawn farthest first.

use glam::{Mat4, Vec3, Vec4};
use hum_common::Transform;
use serde::Serialize;

use crate::camera::Camera;
use crate::composer::{FrameContext, TransformComposer};
use crate::drawable::DrawableId;
use crate::registry::DrawableRegistry;
use crate::shader::MODEL_UNIFORM;
use crate::tracker::ShaderUsageTracker;

/// One visible drawable for the current frame.
#[derive(Debug, Clone, Copy)]
pub struct DrawOrder {
    /// Signed distance from the camera plane.
    pub order: f32,
    pub transform: Transform,
    pub drawable: DrawableId,
}

/// Counters for one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub projection_pushes: usize,
    pub view_pushes: usize,
    pub candidates: usize,
    pub culled: usize,
    pub drawn: usize,
}

/// Signed distance of `point` from `plane`, given as `(normal, d)`.
pub fn signed_distance(plane: Vec4, point: Vec3) -> f32 {
    plane.dot(point.extend(1.0))
}

/// Model matrix of a resolved transform with its pivot at `origin`.
pub fn model_matrix(transform: &Transform, origin: Vec3) -> Mat4 {
    transform.matrix() * Mat4::from_translation(-origin)
}

/// Builds and executes the back-to-front draw list.
#[derive(Debug, Default)]
pub struct DrawOrderScheduler {
    entries: Vec<DrawOrder>,
    candidates: usize,
    culled: usize,
}

impl DrawOrderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve, cull and sort the active drawables. The list is kept until
    /// the next call.
    pub fn schedule(
        &mut self,
        registry: &DrawableRegistry,
        composer: &TransformComposer,
        camera: &Camera,
        frame: &FrameContext<'_>,
    ) -> &[DrawOrder] {
        self.entries.clear();
        self.candidates = 0;
        self.culled = 0;

        let plane = camera.view_plane();
        let (near, far) = (camera.z_near(), camera.z_far());
        for active in registry.active() {
            let Some(transform) =
                composer.resolve(active.drawable.transform(), active.owner, active.body, frame)
            else {
                tracing::trace!(drawable = active.id.0, "owner gone, skipping");
                continue;
            };
            self.candidates += 1;
            let order = signed_distance(plane, transform.position);
            if (near..=far).contains(&order) {
                self.entries.push(DrawOrder {
                    order,
                    transform,
                    drawable: active.id,
                });
            } else {
                self.culled += 1;
            }
        }

        self.entries
            .sort_unstable_by(|a, b| b.order.total_cmp(&a.order));
        &self.entries
    }

    /// Draw the scheduled entries in order.
    ///
    /// # Panics
    /// If an entry names a drawable that is gone or has no shader program.
    /// Both mean the registry was mutated between scheduling and drawing or
    /// a drawable was activated without a program.
    pub fn execute(&self, registry: &DrawableRegistry) -> usize {
        for entry in &self.entries {
            let Some(drawable) = registry.get(entry.drawable) else {
                panic!("draw entry for unknown drawable {:?}", entry.drawable);
            };
            let Some(program) = drawable.shader_program() else {
                panic!("drawable {:?} has no shader program", entry.drawable);
            };
            let model = model_matrix(&entry.transform, drawable.origin());
            program.use_program();
            program.set_uniform_mat4(MODEL_UNIFORM, &model);
            drawable.draw();
        }
        self.entries.len()
    }

    /// Full frame: camera refresh, scheduling, drawing.
    pub fn frame(
        &mut self,
        registry: &DrawableRegistry,
        composer: &TransformComposer,
        tracker: &mut ShaderUsageTracker,
        camera: &mut Camera,
        frame: &FrameContext<'_>,
    ) -> FrameStats {
        let _span = tracing::info_span!("draw_frame", tick = frame.world.tick()).entered();
        let pushed = tracker.refresh(camera);
        self.schedule(registry, composer, camera, frame);
        let drawn = self.execute(registry);
        let stats = FrameStats {
            projection_pushes: pushed.projection,
            view_pushes: pushed.view,
            candidates: self.candidates,
            culled: self.culled,
            drawn,
        };
        tracing::trace!(?stats, "frame drawn");
        stats
    }

    /// Entries of the last scheduled frame, farthest first.
    pub fn entries(&self) -> &[DrawOrder] {
        &self.entries
    }
}
