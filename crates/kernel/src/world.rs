use hum_common::{EntityId, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The authoritative world state.
///
/// Holds each entity's simulation transform. Renderers read from it and
/// never write back; kinematic integration and game logic are the only
/// writers.
///
/// Uses BTreeMap for deterministic iteration order across all platforms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    entities: BTreeMap<EntityId, EntityData>,
    tick: u64,
}

/// Per-entity data stored in the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityData {
    pub transform: Transform,
}

impl World {
    /// Create an empty world at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fixed steps completed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of entities in the world.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Read-only access to all entities (BTreeMap for deterministic iteration).
    pub fn entities(&self) -> &BTreeMap<EntityId, EntityData> {
        &self.entities
    }

    /// Spawn a new entity with the given transform. Returns its id.
    pub fn spawn(&mut self, transform: Transform) -> EntityId {
        let id = EntityId::new();
        self.entities.insert(id, EntityData { transform });
        tracing::debug!(entity = %id.0, "spawned entity");
        id
    }

    /// Remove an entity. Returns the data if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityData> {
        let data = self.entities.remove(&id);
        if data.is_some() {
            tracing::debug!(entity = %id.0, "despawned entity");
        }
        data
    }

    /// Get a reference to entity data.
    pub fn get(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(&id)
    }

    /// Authoritative transform of an entity, if it exists.
    pub fn transform(&self, id: EntityId) -> Option<&Transform> {
        self.entities.get(&id).map(|data| &data.transform)
    }

    /// Update an entity's transform. Returns false if the entity is unknown.
    pub fn set_transform(&mut self, id: EntityId, new: Transform) -> bool {
        if let Some(data) = self.entities.get_mut(&id) {
            data.transform = new;
            true
        } else {
            false
        }
    }

    /// Mark the end of one fixed simulation step.
    pub fn step(&mut self) {
        self.tick += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn world_starts_empty() {
        let w = World::new();
        assert_eq!(w.tick(), 0);
        assert_eq!(w.entity_count(), 0);
    }

    #[test]
    fn spawn_and_despawn() {
        let mut w = World::new();
        let id = w.spawn(Transform::default());
        assert_eq!(w.entity_count(), 1);
        assert!(w.get(id).is_some());

        let data = w.despawn(id);
        assert!(data.is_some());
        assert_eq!(w.entity_count(), 0);
        assert!(w.despawn(id).is_none());
    }

    #[test]
    fn step_increments_tick() {
        let mut w = World::new();
        w.step();
        w.step();
        w.step();
        assert_eq!(w.tick(), 3);
    }

    #[test]
    fn set_transform_updates_authoritative_state() {
        let mut w = World::new();
        let id = w.spawn(Transform::default());
        let moved = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        assert!(w.set_transform(id, moved));
        assert_eq!(w.transform(id).unwrap().position, moved.position);
    }

    #[test]
    fn set_transform_unknown_entity() {
        let mut w = World::new();
        assert!(!w.set_transform(EntityId::new(), Transform::default()));
    }

    #[test]
    fn btreemap_gives_deterministic_iteration() {
        let mut w = World::new();
        for _ in 0..100 {
            w.spawn(Transform::default());
        }
        let entity_keys: Vec<EntityId> = w.entities().keys().copied().collect();
        let mut sorted = entity_keys.clone();
        sorted.sort();
        assert_eq!(entity_keys, sorted);
    }
}
