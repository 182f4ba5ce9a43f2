use serde::Serialize;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::camera::Camera;
use crate::shader::{PROJECTION_UNIFORM, ProgramKey, SharedProgram, VIEW_UNIFORM};

struct Usage {
    program: SharedProgram,
    count: usize,
}

/// Camera uniform pushes performed by one [`ShaderUsageTracker::refresh`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CameraPush {
    pub projection: usize,
    pub view: usize,
}

/// Reference counts of the shader programs used by active drawables.
///
/// Camera matrices are uploaded per program, not per drawable. A program
/// receives the full camera state once when its count goes from zero to one
/// and afterwards only when the camera reports a pending change.
#[derive(Default)]
pub struct ShaderUsageTracker {
    programs: BTreeMap<ProgramKey, Usage>,
}

impl ShaderUsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more active drawable on `program`.
    ///
    /// Returns true when the program was not tracked before and received the
    /// current camera matrices. Pending camera changes are left for the next
    /// [`refresh`](Self::refresh).
    pub fn on_activated(&mut self, program: Option<&SharedProgram>, camera: &Camera) -> bool {
        let Some(program) = program else {
            return false;
        };
        let key = ProgramKey::of(program);
        if let Some(usage) = self.programs.get_mut(&key) {
            usage.count += 1;
            return false;
        }

        program.use_program();
        program.set_uniform_mat4(PROJECTION_UNIFORM, &camera.peek_projection());
        program.set_uniform_mat4(VIEW_UNIFORM, &camera.peek_view());
        self.programs.insert(
            key,
            Usage {
                program: Rc::clone(program),
                count: 1,
            },
        );
        tracing::debug!(programs = self.programs.len(), "shader program tracked");
        true
    }

    /// Count one less active drawable on `program`.
    ///
    /// Returns true when this released the last user and the program is no
    /// longer tracked.
    pub fn on_deactivated(&mut self, program: Option<&SharedProgram>) -> bool {
        let Some(program) = program else {
            return false;
        };
        let key = ProgramKey::of(program);
        let Some(usage) = self.programs.get_mut(&key) else {
            tracing::warn!("deactivated drawable with an untracked shader program");
            return false;
        };
        usage.count -= 1;
        if usage.count > 0 {
            return false;
        }
        self.programs.remove(&key);
        tracing::debug!(programs = self.programs.len(), "shader program released");
        true
    }

    /// Forward pending camera changes to every tracked program, once each.
    ///
    /// The camera's dirty flags are consumed even when nothing is tracked.
    pub fn refresh(&mut self, camera: &mut Camera) -> CameraPush {
        let mut pushed = CameraPush::default();
        if let Some(projection) = camera.take_projection_update() {
            for usage in self.programs.values() {
                usage.program.use_program();
                usage
                    .program
                    .set_uniform_mat4(PROJECTION_UNIFORM, &projection);
            }
            pushed.projection = self.programs.len();
        }
        if let Some(view) = camera.take_view_update() {
            for usage in self.programs.values() {
                usage.program.use_program();
                usage.program.set_uniform_mat4(VIEW_UNIFORM, &view);
            }
            pushed.view = self.programs.len();
        }
        pushed
    }

    /// Number of active drawables using `program`; zero when untracked.
    pub fn usage(&self, program: &SharedProgram) -> usize {
        self.programs
            .get(&ProgramKey::of(program))
            .map_or(0, |usage| usage.count)
    }

    pub fn is_tracked(&self, program: &SharedProgram) -> bool {
        self.programs.contains_key(&ProgramKey::of(program))
    }

    /// Number of distinct tracked programs.
    pub fn tracked_len(&self) -> usize {
        self.programs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::RecordingProgram;
    use glam::Vec3;

    fn programs() -> (Rc<RecordingProgram>, SharedProgram) {
        let recording = Rc::new(RecordingProgram::new("plain"));
        let shared: SharedProgram = recording.clone();
        (recording, shared)
    }

    #[test]
    fn none_program_is_ignored() {
        let mut tracker = ShaderUsageTracker::new();
        let camera = Camera::default();
        assert!(!tracker.on_activated(None, &camera));
        assert!(!tracker.on_deactivated(None));
        assert_eq!(tracker.tracked_len(), 0);
    }

    #[test]
    fn shared_program_is_pushed_once() {
        let (recording, program) = programs();
        let mut tracker = ShaderUsageTracker::new();
        let mut camera = Camera::default();

        for _ in 0..3 {
            tracker.on_activated(Some(&program), &camera);
        }
        assert_eq!(recording.uniform_sets(PROJECTION_UNIFORM), 1);
        assert_eq!(recording.uniform_sets(VIEW_UNIFORM), 1);
        assert_eq!(tracker.usage(&program), 3);

        for _ in 0..3 {
            tracker.on_deactivated(Some(&program));
        }
        assert!(!tracker.is_tracked(&program));

        camera.projection();
        camera.view();
        recording.reset();
        assert!(tracker.on_activated(Some(&program), &camera));
        assert_eq!(recording.uniform_sets(PROJECTION_UNIFORM), 1);
        assert_eq!(recording.uniform_sets(VIEW_UNIFORM), 1);
    }

    #[test]
    fn activation_does_not_consume_camera_change() {
        let (recording, program) = programs();
        let mut tracker = ShaderUsageTracker::new();
        let mut camera = Camera::default();
        tracker.on_activated(Some(&program), &camera);
        assert!(camera.projection_changed());
        assert!(camera.view_changed());

        let pushed = tracker.refresh(&mut camera);
        assert_eq!(pushed, CameraPush { projection: 1, view: 1 });
        assert_eq!(
            recording.last_mat4(PROJECTION_UNIFORM),
            Some(camera.projection())
        );
    }

    #[test]
    fn refresh_pushes_once_per_program() {
        let (first, a) = programs();
        let (second, b) = programs();
        let mut tracker = ShaderUsageTracker::new();
        let mut camera = Camera::default();
        tracker.on_activated(Some(&a), &camera);
        tracker.on_activated(Some(&a), &camera);
        tracker.on_activated(Some(&b), &camera);
        tracker.refresh(&mut camera);
        first.reset();
        second.reset();

        assert_eq!(tracker.refresh(&mut camera), CameraPush::default());
        assert!(first.calls().is_empty());

        camera.set_position(Vec3::new(0.0, 0.0, -5.0));
        let pushed = tracker.refresh(&mut camera);
        assert_eq!(pushed, CameraPush { projection: 0, view: 2 });
        assert_eq!(first.uniform_sets(VIEW_UNIFORM), 1);
        assert_eq!(second.uniform_sets(VIEW_UNIFORM), 1);
        assert_eq!(first.uniform_sets(PROJECTION_UNIFORM), 0);
    }

    #[test]
    fn refresh_clears_flags_without_programs() {
        let mut tracker = ShaderUsageTracker::new();
        let mut camera = Camera::default();
        tracker.refresh(&mut camera);
        assert!(!camera.projection_changed());
        assert!(!camera.view_changed());
    }
}
