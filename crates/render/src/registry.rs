use std::collections::{BTreeMap, BTreeSet};

use hum_common::EntityId;
use hum_ecs::{BodyHandle, ComponentStore};

use crate::camera::Camera;
use crate::drawable::{Drawable, DrawableId};
use crate::shader::SharedProgram;
use crate::tracker::ShaderUsageTracker;

struct Slot {
    owner: EntityId,
    drawable: Box<dyn Drawable>,
    enabled: bool,
    /// Program counted with the tracker while enabled. Released on
    /// deactivation even if the drawable swapped programs in between.
    counted: Option<SharedProgram>,
}

/// An active drawable as seen by the frame driver.
pub struct ActiveDrawable<'a> {
    pub id: DrawableId,
    pub owner: EntityId,
    pub body: Option<BodyHandle>,
    pub drawable: &'a dyn Drawable,
}

/// Owns every drawable and tracks which ones are active.
///
/// A drawable is registered detached. [`activate`](Self::activate) makes it
/// active, resolves its body link once and counts its program with the
/// [`ShaderUsageTracker`]. Activation and deactivation are idempotent.
#[derive(Default)]
pub struct DrawableRegistry {
    slots: BTreeMap<DrawableId, Slot>,
    active: BTreeSet<DrawableId>,
    bodies: BTreeMap<DrawableId, BodyHandle>,
    next_id: u64,
}

impl DrawableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a detached drawable owned by `owner`.
    pub fn insert(&mut self, owner: EntityId, drawable: Box<dyn Drawable>) -> DrawableId {
        let id = DrawableId(self.next_id);
        self.next_id += 1;
        self.slots.insert(
            id,
            Slot {
                owner,
                drawable,
                enabled: false,
                counted: None,
            },
        );
        tracing::debug!(drawable = id.0, entity = %owner.0, "drawable registered");
        id
    }

    /// Enable and activate a drawable.
    ///
    /// Returns false for unknown ids and for drawables that are already
    /// active.
    pub fn activate(
        &mut self,
        id: DrawableId,
        components: &ComponentStore,
        tracker: &mut ShaderUsageTracker,
        camera: &Camera,
    ) -> bool {
        let Some(slot) = self.slots.get_mut(&id) else {
            return false;
        };
        if slot.enabled {
            return false;
        }
        slot.enabled = true;
        self.active.insert(id);
        if let Some(body) = components.body_of(slot.owner) {
            self.bodies.insert(id, body);
        }
        let program = slot.drawable.shader_program().cloned();
        if program.is_none() {
            tracing::warn!(drawable = id.0, "activated drawable has no shader program");
        }
        tracker.on_activated(program.as_ref(), camera);
        slot.counted = program;
        true
    }

    /// Disable and deactivate a drawable. Returns false if it was not active.
    pub fn deactivate(&mut self, id: DrawableId, tracker: &mut ShaderUsageTracker) -> bool {
        let Some(slot) = self.slots.get_mut(&id) else {
            return false;
        };
        if !slot.enabled {
            return false;
        }
        slot.enabled = false;
        self.active.remove(&id);
        self.bodies.remove(&id);
        tracker.on_deactivated(slot.counted.take().as_ref());
        true
    }

    /// Deactivate and drop a drawable.
    pub fn remove(
        &mut self,
        id: DrawableId,
        tracker: &mut ShaderUsageTracker,
    ) -> Option<Box<dyn Drawable>> {
        self.deactivate(id, tracker);
        let slot = self.slots.remove(&id)?;
        tracing::debug!(drawable = id.0, "drawable removed");
        Some(slot.drawable)
    }

    /// Swap the program of a drawable, keeping usage counts balanced when
    /// it is active.
    pub fn set_shader_program(
        &mut self,
        id: DrawableId,
        program: Option<SharedProgram>,
        tracker: &mut ShaderUsageTracker,
        camera: &Camera,
    ) -> bool {
        let Some(slot) = self.slots.get_mut(&id) else {
            return false;
        };
        if slot.enabled {
            tracker.on_deactivated(slot.counted.take().as_ref());
            tracker.on_activated(program.as_ref(), camera);
            slot.counted = program.clone();
        }
        slot.drawable.set_shader_program(program);
        true
    }

    pub fn get(&self, id: DrawableId) -> Option<&dyn Drawable> {
        let slot = self.slots.get(&id)?;
        Some(slot.drawable.as_ref())
    }

    /// Mutable access for transform edits. A program swapped through this
    /// reference is counted at the next activation; use
    /// [`set_shader_program`](Self::set_shader_program) to move the count
    /// immediately.
    pub fn get_mut(&mut self, id: DrawableId) -> Option<&mut dyn Drawable> {
        let slot = self.slots.get_mut(&id)?;
        Some(slot.drawable.as_mut())
    }

    pub fn owner(&self, id: DrawableId) -> Option<EntityId> {
        self.slots.get(&id).map(|slot| slot.owner)
    }

    pub fn is_enabled(&self, id: DrawableId) -> bool {
        self.slots.get(&id).is_some_and(|slot| slot.enabled)
    }

    /// Body link cached at activation.
    pub fn body(&self, id: DrawableId) -> Option<BodyHandle> {
        self.bodies.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Active drawables in id order.
    pub fn active(&self) -> impl Iterator<Item = ActiveDrawable<'_>> + '_ {
        self.active.iter().filter_map(|&id| {
            let slot = self.slots.get(&id)?;
            Some(ActiveDrawable {
                id,
                owner: slot.owner,
                body: self.body(id),
                drawable: slot.drawable.as_ref(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{DrawLog, Marker, RecordingProgram};
    use crate::shader::{PROJECTION_UNIFORM, VIEW_UNIFORM};
    use glam::Vec3;
    use hum_common::Transform;
    use hum_ecs::Kinematic;
    use hum_kernel::World;
    use std::rc::Rc;

    struct Fixture {
        world: World,
        components: ComponentStore,
        tracker: ShaderUsageTracker,
        camera: Camera,
        registry: DrawableRegistry,
        log: DrawLog,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                world: World::new(),
                components: ComponentStore::new(),
                tracker: ShaderUsageTracker::new(),
                camera: Camera::default(),
                registry: DrawableRegistry::new(),
                log: DrawLog::default(),
            }
        }

        fn marker(&mut self, program: Option<SharedProgram>) -> DrawableId {
            let owner = self.world.spawn(Transform::default());
            let marker = Marker::new("m", program, Rc::clone(&self.log));
            self.registry.insert(owner, Box::new(marker))
        }

        fn activate(&mut self, id: DrawableId) -> bool {
            self.registry
                .activate(id, &self.components, &mut self.tracker, &self.camera)
        }
    }

    #[test]
    fn inserted_drawables_start_detached() {
        let mut fx = Fixture::new();
        let id = fx.marker(None);
        assert!(!fx.registry.is_enabled(id));
        assert_eq!(fx.registry.active_len(), 0);
        assert_eq!(fx.registry.len(), 1);
    }

    #[test]
    fn activation_is_idempotent() {
        let mut fx = Fixture::new();
        let program: SharedProgram = Rc::new(RecordingProgram::new("plain"));
        let id = fx.marker(Some(Rc::clone(&program)));

        assert!(fx.activate(id));
        assert!(!fx.activate(id));
        assert_eq!(fx.registry.active_len(), 1);
        assert_eq!(fx.tracker.usage(&program), 1);

        assert!(fx.registry.deactivate(id, &mut fx.tracker));
        assert!(!fx.registry.deactivate(id, &mut fx.tracker));
        assert_eq!(fx.registry.active_len(), 0);
        assert!(!fx.tracker.is_tracked(&program));
    }

    #[test]
    fn missing_body_is_not_an_error() {
        let mut fx = Fixture::new();
        let id = fx.marker(None);
        assert!(fx.activate(id));
        assert_eq!(fx.registry.body(id), None);
        assert_eq!(fx.registry.active().count(), 1);
    }

    #[test]
    fn body_link_is_resolved_at_activation() {
        let mut fx = Fixture::new();
        let id = fx.marker(None);
        let owner = fx.registry.owner(id).unwrap();
        let body = fx.components.attach_kinematic(owner, Kinematic::default());
        fx.activate(id);
        assert_eq!(fx.registry.body(id), Some(body));

        // Re-attaching later does not update the cached link.
        let replacement = fx.components.attach_kinematic(owner, Kinematic::default());
        assert_ne!(replacement, body);
        assert_eq!(fx.registry.body(id), Some(body));

        fx.registry.deactivate(id, &mut fx.tracker);
        assert_eq!(fx.registry.body(id), None);
        fx.activate(id);
        assert_eq!(fx.registry.body(id), Some(replacement));
    }

    #[test]
    fn switching_programs_rebalances_counts() {
        let mut fx = Fixture::new();
        let a: SharedProgram = Rc::new(RecordingProgram::new("a"));
        let b_recording = Rc::new(RecordingProgram::new("b"));
        let b: SharedProgram = b_recording.clone();
        let id = fx.marker(Some(Rc::clone(&a)));
        fx.activate(id);

        assert!(fx.registry.set_shader_program(
            id,
            Some(Rc::clone(&b)),
            &mut fx.tracker,
            &fx.camera
        ));
        assert!(!fx.tracker.is_tracked(&a));
        assert_eq!(fx.tracker.usage(&b), 1);
        assert_eq!(b_recording.uniform_sets(PROJECTION_UNIFORM), 1);

        fx.registry.deactivate(id, &mut fx.tracker);
        assert_eq!(fx.tracker.tracked_len(), 0);
    }

    #[test]
    fn switching_programs_while_inactive_skips_tracker() {
        let mut fx = Fixture::new();
        let a: SharedProgram = Rc::new(RecordingProgram::new("a"));
        let id = fx.marker(None);
        fx.registry
            .set_shader_program(id, Some(Rc::clone(&a)), &mut fx.tracker, &fx.camera);
        assert_eq!(fx.tracker.tracked_len(), 0);
        fx.activate(id);
        assert_eq!(fx.tracker.usage(&a), 1);
    }

    #[test]
    fn remove_deactivates_first() {
        let mut fx = Fixture::new();
        let program: SharedProgram = Rc::new(RecordingProgram::new("plain"));
        let id = fx.marker(Some(Rc::clone(&program)));
        fx.activate(id);
        assert!(fx.registry.remove(id, &mut fx.tracker).is_some());
        assert!(fx.registry.remove(id, &mut fx.tracker).is_none());
        assert!(fx.registry.is_empty());
        assert!(!fx.tracker.is_tracked(&program));
    }

    #[test]
    fn deactivation_releases_the_counted_program() {
        let mut fx = Fixture::new();
        let a: SharedProgram = Rc::new(RecordingProgram::new("a"));
        let b_recording = Rc::new(RecordingProgram::new("b"));
        let b: SharedProgram = b_recording.clone();
        let x = fx.marker(Some(Rc::clone(&a)));
        let y = fx.marker(Some(Rc::clone(&b)));
        fx.activate(x);
        fx.activate(y);

        // Swap behind the tracker's back.
        fx.registry
            .get_mut(x)
            .unwrap()
            .set_shader_program(Some(Rc::clone(&b)));
        fx.registry.deactivate(x, &mut fx.tracker);

        assert!(!fx.tracker.is_tracked(&a));
        assert_eq!(fx.tracker.usage(&b), 1);

        b_recording.reset();
        fx.camera.set_position(Vec3::new(0.0, 0.0, -5.0));
        fx.tracker.refresh(&mut fx.camera);
        assert_eq!(b_recording.uniform_sets(VIEW_UNIFORM), 1);

        // Reactivation counts the program it holds now.
        fx.activate(x);
        assert_eq!(fx.tracker.usage(&b), 2);
        assert_eq!(fx.tracker.tracked_len(), 1);
    }
}
