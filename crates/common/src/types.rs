use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an entity in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Spatial transform: position, Euler rotation in degrees (XYZ order), scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    /// Rotation around the X, Y and Z axes, in degrees.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Identity transform moved to `position`.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Affine matrix built as `translate · rotateX · rotateY · rotateZ · scale`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_scale(self.scale)
    }

    /// Express `self` (the child) in the frame of `parent`.
    ///
    /// The position goes through the parent's matrix; rotations add up and
    /// scales multiply component-wise. Not commutative.
    pub fn compose(&self, parent: &Transform) -> Transform {
        Transform {
            position: parent.matrix().transform_point3(self.position),
            rotation: parent.rotation + self.rotation,
            scale: parent.scale * self.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_uniqueness() {
        let a = EntityId::new();
        let b = EntityId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert!(t.matrix().abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn compose_scales_then_translates_child() {
        let parent = Transform {
            position: Vec3::new(50.0, 50.0, 0.0),
            scale: Vec3::new(10.0, 10.0, 1.0),
            ..Transform::default()
        };
        let child = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        let world = child.compose(&parent);
        assert!(world.position.abs_diff_eq(Vec3::new(60.0, 50.0, 0.0), 1e-5));
        assert_eq!(world.scale, Vec3::new(10.0, 10.0, 1.0));
    }

    #[test]
    fn compose_rotates_child_position() {
        let parent = Transform {
            rotation: Vec3::new(0.0, 0.0, 90.0),
            ..Transform::default()
        };
        let child = Transform {
            position: Vec3::new(1.0, 0.0, 0.0),
            rotation: Vec3::new(0.0, 0.0, 15.0),
            ..Transform::default()
        };
        let world = child.compose(&parent);
        assert!(world.position.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));
        assert!((world.rotation.z - 105.0).abs() < 1e-5);
    }

    #[test]
    fn compose_is_not_commutative() {
        let a = Transform {
            position: Vec3::new(1.0, 0.0, 0.0),
            scale: Vec3::splat(2.0),
            ..Transform::default()
        };
        let b = Transform::from_position(Vec3::new(0.0, 3.0, 0.0));
        assert_ne!(a.compose(&b).position, b.compose(&a).position);
    }

    #[test]
    fn compose_with_identity_parent_is_noop() {
        let child = Transform {
            position: Vec3::new(3.0, -2.0, 7.0),
            rotation: Vec3::new(10.0, 20.0, 30.0),
            scale: Vec3::new(1.0, 2.0, 3.0),
        };
        let world = child.compose(&Transform::default());
        assert!(world.position.abs_diff_eq(child.position, 1e-6));
        assert_eq!(world.rotation, child.rotation);
        assert_eq!(world.scale, child.scale);
    }
}
