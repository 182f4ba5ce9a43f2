use hum_common::{EntityId, Transform};
use hum_ecs::{BodyHandle, ComponentStore};
use hum_kernel::World;
use std::time::Duration;

/// Remaps a composed transform from simulation space into render space.
pub type SpaceMapping = Box<dyn Fn(&World, &mut Transform)>;

/// Read-only simulation state one render frame is built from.
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    pub world: &'a World,
    pub components: &'a ComponentStore,
    /// Progress towards the next fixed step, in `[0, 1)`.
    pub lag: f32,
    /// Length of one fixed step.
    pub step: Duration,
}

impl<'a> FrameContext<'a> {
    /// Context with no extrapolation.
    pub fn new(world: &'a World, components: &'a ComponentStore) -> Self {
        Self {
            world,
            components,
            lag: 0.0,
            step: Duration::ZERO,
        }
    }

    pub fn with_lag(mut self, lag: f32, step: Duration) -> Self {
        self.lag = lag;
        self.step = step;
        self
    }
}

/// Resolves a drawable's world transform for the current frame.
pub struct TransformComposer {
    space_mapping: SpaceMapping,
}

impl Default for TransformComposer {
    fn default() -> Self {
        Self {
            space_mapping: Box::new(|_, _| {}),
        }
    }
}

impl TransformComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the hook applied to every composed transform.
    pub fn set_space_mapping(&mut self, mapping: impl Fn(&World, &mut Transform) + 'static) {
        self.space_mapping = Box::new(mapping);
    }

    /// Restore the identity mapping.
    pub fn reset_space_mapping(&mut self) {
        *self = Self::default();
    }

    /// Transform the drawable's local transform is relative to.
    ///
    /// With a live body link this is the owner's transform extrapolated by
    /// the frame lag. A stale link falls back to the authoritative transform.
    pub fn base_transform(
        &self,
        owner: EntityId,
        body: Option<BodyHandle>,
        frame: &FrameContext<'_>,
    ) -> Option<Transform> {
        let current = frame.world.transform(owner)?;
        let kinematic = body.and_then(|handle| frame.components.kinematic(handle));
        Some(match kinematic {
            Some(kinematic) => kinematic.extrapolate(current, frame.lag, frame.step),
            None => *current,
        })
    }

    /// World transform of a drawable with transform `local` owned by `owner`.
    ///
    /// `None` when the owner is no longer in the world. The space mapping
    /// runs exactly once per resolved transform.
    pub fn resolve(
        &self,
        local: &Transform,
        owner: EntityId,
        body: Option<BodyHandle>,
        frame: &FrameContext<'_>,
    ) -> Option<Transform> {
        let base = self.base_transform(owner, body, frame)?;
        let mut resolved = local.compose(&base);
        (self.space_mapping)(frame.world, &mut resolved);
        Some(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use hum_ecs::Kinematic;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn without_body_uses_authoritative_transform() {
        let mut world = World::new();
        let owner = world.spawn(Transform::from_position(Vec3::new(3.0, 4.0, 5.0)));
        let components = ComponentStore::new();
        let frame = FrameContext::new(&world, &components).with_lag(0.5, Duration::from_secs(1));

        let composer = TransformComposer::new();
        let resolved = composer
            .resolve(&Transform::default(), owner, None, &frame)
            .unwrap();
        assert_eq!(resolved.position, Vec3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn body_is_extrapolated_by_lag() {
        let mut world = World::new();
        let owner = world.spawn(Transform::default());
        let mut components = ComponentStore::new();
        let body = components.attach_kinematic(owner, Kinematic::with_velocity(Vec3::X * 10.0));
        let frame = FrameContext::new(&world, &components).with_lag(0.5, Duration::from_secs(1));

        let composer = TransformComposer::new();
        let resolved = composer
            .resolve(&Transform::default(), owner, Some(body), &frame)
            .unwrap();
        assert!(resolved.position.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn stale_body_falls_back() {
        let mut world = World::new();
        let owner = world.spawn(Transform::from_position(Vec3::Y));
        let mut components = ComponentStore::new();
        let body = components.attach_kinematic(owner, Kinematic::with_velocity(Vec3::X));
        components.detach_kinematic(owner);
        let frame = FrameContext::new(&world, &components).with_lag(0.9, Duration::from_secs(1));

        let composer = TransformComposer::new();
        let base = composer.base_transform(owner, Some(body), &frame).unwrap();
        assert_eq!(base.position, Vec3::Y);
    }

    #[test]
    fn missing_owner_resolves_to_none() {
        let mut world = World::new();
        let owner = world.spawn(Transform::default());
        world.despawn(owner);
        let components = ComponentStore::new();
        let frame = FrameContext::new(&world, &components);
        assert!(
            TransformComposer::new()
                .resolve(&Transform::default(), owner, None, &frame)
                .is_none()
        );
    }

    #[test]
    fn space_mapping_runs_after_composition() {
        let mut world = World::new();
        let owner = world.spawn(Transform::from_position(Vec3::new(0.0, 7.0, 0.0)));
        let components = ComponentStore::new();
        let frame = FrameContext::new(&world, &components);

        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let mut composer = TransformComposer::new();
        composer.set_space_mapping(move |_, transform| {
            seen.set(seen.get() + 1);
            transform.position.z = transform.position.y;
        });

        let local = Transform::from_position(Vec3::new(0.0, 1.0, 0.0));
        let resolved = composer.resolve(&local, owner, None, &frame).unwrap();
        assert_eq!(resolved.position, Vec3::new(0.0, 8.0, 8.0));
        assert_eq!(calls.get(), 1);

        composer.reset_space_mapping();
        let resolved = composer.resolve(&local, owner, None, &frame).unwrap();
        assert_eq!(resolved.position, Vec3::new(0.0, 8.0, 0.0));
        assert_eq!(calls.get(), 1);
    }
}
