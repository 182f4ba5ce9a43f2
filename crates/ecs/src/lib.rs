//! Minimal sibling-component model for world entities.
//!
//! Components are stored in BTreeMap for deterministic iteration order.
//! Kinematic bodies live in their own storage keyed by a stable
//! [`BodyHandle`] so other systems can cache the link once and skip the
//! entity lookup afterwards.
//!
//! # Invariants
//! - An entity owns at most one kinematic body.
//! - A body handle is never reused after its body is detached.

mod kinematic;

pub use kinematic::Kinematic;

use hum_common::EntityId;
use hum_kernel::World;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable handle to a kinematic body in a [`ComponentStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u64);

/// Human-readable name component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name(pub String);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Body {
    owner: EntityId,
    kinematic: Kinematic,
}

/// Component storage for all sibling component types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentStore {
    names: BTreeMap<EntityId, Name>,
    bodies: BTreeMap<BodyHandle, Body>,
    body_by_entity: BTreeMap<EntityId, BodyHandle>,
    next_body: u64,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Name ---
    pub fn set_name(&mut self, entity: EntityId, name: impl Into<String>) {
        self.names.insert(entity, Name(name.into()));
    }

    pub fn remove_name(&mut self, entity: EntityId) -> Option<Name> {
        self.names.remove(&entity)
    }

    pub fn get_name(&self, entity: EntityId) -> Option<&Name> {
        self.names.get(&entity)
    }

    // --- Kinematic ---

    /// Attach a kinematic body to `entity`, replacing any previous one.
    pub fn attach_kinematic(&mut self, entity: EntityId, kinematic: Kinematic) -> BodyHandle {
        self.detach_kinematic(entity);
        let handle = BodyHandle(self.next_body);
        self.next_body += 1;
        self.bodies.insert(
            handle,
            Body {
                owner: entity,
                kinematic,
            },
        );
        self.body_by_entity.insert(entity, handle);
        tracing::debug!(entity = %entity.0, body = handle.0, "kinematic attached");
        handle
    }

    pub fn detach_kinematic(&mut self, entity: EntityId) -> Option<Kinematic> {
        let handle = self.body_by_entity.remove(&entity)?;
        tracing::debug!(entity = %entity.0, body = handle.0, "kinematic detached");
        self.bodies.remove(&handle).map(|body| body.kinematic)
    }

    /// Sibling lookup: the kinematic body owned by `entity`, if any.
    pub fn body_of(&self, entity: EntityId) -> Option<BodyHandle> {
        self.body_by_entity.get(&entity).copied()
    }

    pub fn kinematic(&self, handle: BodyHandle) -> Option<&Kinematic> {
        self.bodies.get(&handle).map(|body| &body.kinematic)
    }

    pub fn kinematic_mut(&mut self, handle: BodyHandle) -> Option<&mut Kinematic> {
        self.bodies.get_mut(&handle).map(|body| &mut body.kinematic)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Run one fixed step of kinematic motion, writing the authoritative
    /// transforms back into `world`. Bodies whose entity is gone are skipped.
    pub fn integrate(&mut self, world: &mut World, dt: f32) {
        for body in self.bodies.values_mut() {
            let Some(current) = world.transform(body.owner) else {
                continue;
            };
            let next = body.kinematic.simulate(current, dt);
            world.set_transform(body.owner, next);
            body.kinematic.accelerate(dt);
        }
    }

    /// Remove all components for an entity.
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.remove_name(entity);
        self.detach_kinematic(entity);
    }
}
