//! Physics Adapter
//!
//! The battle core never integrates motion itself. It talks to a rigid-body
//! world through [`PhysicsWorld`], which owns body positions, velocities and
//! forces. Every operation tolerates handles that were already removed, since
//! teardown can race with forces queued earlier in the same tick.
//!
//! [`KinematicWorld`] is the built-in implementation: a damped explicit-Euler
//! integrator over circular bodies with no gravity, enough for a flat arena.

use bevy::prelude::*;
use std::collections::HashMap;

/// Opaque handle to a body owned by a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

/// Rigid-body world contract used by the battle core.
pub trait PhysicsWorld: Send + Sync {
    /// Create a dynamic circular body of diameter `size` at `position`.
    fn create_body(&mut self, position: Vec2, size: f32) -> BodyHandle;
    fn remove_body(&mut self, handle: BodyHandle);
    /// Accumulate a force for the next step.
    fn apply_force(&mut self, handle: BodyHandle, force: Vec2);
    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2);
    fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: f32);
    /// Move a body instantly (teleport), keeping its velocity.
    fn set_position(&mut self, handle: BodyHandle, position: Vec2);
    /// Static bodies ignore forces and never move.
    fn set_static(&mut self, handle: BodyHandle, is_static: bool);
    fn position(&self, handle: BodyHandle) -> Option<Vec2>;
    fn velocity(&self, handle: BodyHandle) -> Option<Vec2>;
    fn angle(&self, handle: BodyHandle) -> Option<f32>;
    /// Advance the simulation by `dt` seconds of physics time.
    fn step(&mut self, dt: f32);
    fn body_count(&self) -> usize;
}

#[derive(Debug, Clone)]
struct Body {
    position: Vec2,
    velocity: Vec2,
    angle: f32,
    angular_velocity: f32,
    force: Vec2,
    mass: f32,
    is_static: bool,
}

/// Damped Euler integrator used when no external engine is attached.
pub struct KinematicWorld {
    bodies: HashMap<BodyHandle, Body>,
    next_handle: u32,
    /// Fraction of linear velocity lost per second
    pub linear_damping: f32,
    /// Fraction of angular velocity lost per second
    pub angular_damping: f32,
}

/// Mass per square unit of body size
const MASS_PER_AREA: f32 = 0.001;

impl Default for KinematicWorld {
    fn default() -> Self {
        Self {
            bodies: HashMap::new(),
            next_handle: 0,
            linear_damping: 0.4,
            angular_damping: 0.8,
        }
    }
}

impl KinematicWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle)
    }

    pub fn is_static(&self, handle: BodyHandle) -> Option<bool> {
        self.bodies.get(&handle).map(|b| b.is_static)
    }
}

impl PhysicsWorld for KinematicWorld {
    fn create_body(&mut self, position: Vec2, size: f32) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(
            handle,
            Body {
                position,
                velocity: Vec2::ZERO,
                angle: 0.0,
                angular_velocity: 0.0,
                force: Vec2::ZERO,
                mass: (size * size * MASS_PER_AREA).max(0.1),
                is_static: false,
            },
        );
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        self.bodies.remove(&handle);
    }

    fn apply_force(&mut self, handle: BodyHandle, force: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            if !body.is_static {
                body.force += force;
            }
        }
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.velocity = velocity;
        }
    }

    fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: f32) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.angular_velocity = angular_velocity;
        }
    }

    fn set_position(&mut self, handle: BodyHandle, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.position = position;
        }
    }

    fn set_static(&mut self, handle: BodyHandle, is_static: bool) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.is_static = is_static;
            if is_static {
                body.velocity = Vec2::ZERO;
                body.angular_velocity = 0.0;
                body.force = Vec2::ZERO;
            }
        }
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|b| b.position)
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|b| b.velocity)
    }

    fn angle(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies.get(&handle).map(|b| b.angle)
    }

    fn step(&mut self, dt: f32) {
        let linear_keep = (1.0 - self.linear_damping * dt).max(0.0);
        let angular_keep = (1.0 - self.angular_damping * dt).max(0.0);

        for body in self.bodies.values_mut() {
            // Forces only last one step, even a zero-length (frozen) one
            let force = std::mem::take(&mut body.force);
            if body.is_static || dt <= 0.0 {
                continue;
            }

            body.velocity += force / body.mass * dt;
            body.velocity *= linear_keep;
            body.angular_velocity *= angular_keep;
            body.position += body.velocity * dt;
            body.angle += body.angular_velocity * dt;
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_moves_with_velocity() {
        let mut world = KinematicWorld::new();
        world.linear_damping = 0.0;
        let body = world.create_body(Vec2::ZERO, 50.0);
        world.set_velocity(body, Vec2::new(10.0, 0.0));

        world.step(1.0);

        let pos = world.position(body).unwrap();
        assert!((pos.x - 10.0).abs() < 1e-4);
        assert_eq!(pos.y, 0.0);
    }

    #[test]
    fn test_zero_dt_step_does_not_move_or_keep_forces() {
        let mut world = KinematicWorld::new();
        let body = world.create_body(Vec2::ZERO, 50.0);
        world.set_velocity(body, Vec2::new(10.0, 0.0));
        world.apply_force(body, Vec2::new(1000.0, 0.0));

        world.step(0.0);
        assert_eq!(world.position(body), Some(Vec2::ZERO));

        // Force was consumed by the frozen step
        world.set_velocity(body, Vec2::ZERO);
        world.step(1.0 / 60.0);
        assert_eq!(world.position(body), Some(Vec2::ZERO));
    }

    #[test]
    fn test_force_accelerates_body() {
        let mut world = KinematicWorld::new();
        let body = world.create_body(Vec2::ZERO, 50.0);
        world.apply_force(body, Vec2::new(100.0, 0.0));
        world.step(1.0 / 60.0);
        assert!(world.velocity(body).unwrap().x > 0.0);
    }

    #[test]
    fn test_static_body_ignores_forces() {
        let mut world = KinematicWorld::new();
        let body = world.create_body(Vec2::new(5.0, 5.0), 50.0);
        world.set_velocity(body, Vec2::new(10.0, 0.0));
        world.set_static(body, true);
        world.apply_force(body, Vec2::new(1000.0, 0.0));
        world.step(1.0);
        assert_eq!(world.position(body), Some(Vec2::new(5.0, 5.0)));
        assert_eq!(world.is_static(body), Some(true));
    }

    #[test]
    fn test_removed_handle_operations_are_noops() {
        let mut world = KinematicWorld::new();
        let body = world.create_body(Vec2::ZERO, 50.0);
        world.remove_body(body);

        world.remove_body(body);
        world.apply_force(body, Vec2::ONE);
        world.set_velocity(body, Vec2::ONE);
        world.set_angular_velocity(body, 1.0);
        world.set_position(body, Vec2::ONE);
        world.set_static(body, true);
        world.step(1.0);

        assert_eq!(world.position(body), None);
        assert_eq!(world.body_count(), 0);
    }
}
