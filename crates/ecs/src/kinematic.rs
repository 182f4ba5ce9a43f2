use glam::Vec3;
use hum_common::Transform;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Kinematic body: moves its entity with constant acceleration.
///
/// Velocities are expressed per second. Angular velocity is in degrees per
/// second around X, Y and Z, matching [`Transform::rotation`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Kinematic {
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub acceleration: Vec3,
}

impl Kinematic {
    pub fn with_velocity(velocity: Vec3) -> Self {
        Self {
            velocity,
            ..Self::default()
        }
    }

    /// Where `current` ends up `dt` seconds from now. Does not touch the body.
    pub fn simulate(&self, current: &Transform, dt: f32) -> Transform {
        Transform {
            position: current.position
                + self.velocity * dt
                + 0.5 * self.acceleration * dt * dt,
            rotation: current.rotation + self.angular_velocity * dt,
            scale: current.scale,
        }
    }

    /// Extrapolate `current` by a fraction of one fixed step.
    ///
    /// `lag` is the progress towards the next fixed step, in `[0, 1)`.
    pub fn extrapolate(&self, current: &Transform, lag: f32, step: Duration) -> Transform {
        self.simulate(current, lag * step.as_secs_f32())
    }

    /// Apply acceleration for `dt` seconds.
    pub fn accelerate(&mut self, dt: f32) {
        self.velocity += self.acceleration * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulate_moves_with_velocity() {
        let body = Kinematic::with_velocity(Vec3::new(10.0, 0.0, 0.0));
        let out = body.simulate(&Transform::default(), 0.5);
        assert!(out.position.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-6));
        assert_eq!(out.scale, Vec3::ONE);
    }

    #[test]
    fn simulate_applies_acceleration_and_spin() {
        let body = Kinematic {
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::new(0.0, 0.0, 90.0),
            acceleration: Vec3::new(0.0, -2.0, 0.0),
        };
        let out = body.simulate(&Transform::default(), 1.0);
        assert!(out.position.abs_diff_eq(Vec3::new(0.0, -1.0, 0.0), 1e-6));
        assert!((out.rotation.z - 90.0).abs() < 1e-6);
    }

    #[test]
    fn extrapolate_uses_fraction_of_step() {
        let body = Kinematic::with_velocity(Vec3::new(60.0, 0.0, 0.0));
        let step = Duration::from_millis(100);
        let out = body.extrapolate(&Transform::default(), 0.5, step);
        assert!(out.position.abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn zero_lag_is_identity() {
        let body = Kinematic::with_velocity(Vec3::new(1.0, 2.0, 3.0));
        let current = Transform::from_position(Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(body.extrapolate(&current, 0.0, Duration::from_millis(16)), current);
    }

    #[test]
    fn accelerate_updates_velocity() {
        let mut body = Kinematic {
            acceleration: Vec3::new(1.0, 0.0, 0.0),
            ..Kinematic::default()
        };
        body.accelerate(2.0);
        assert_eq!(body.velocity, Vec3::new(2.0, 0.0, 0.0));
    }
}
