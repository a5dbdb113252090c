//! Target selection helpers shared by the skills.
//!
//! Every query works over living combatants minus an exclusion list, reads
//! positions from the physics bodies, and breaks ties by spawn order.

use bevy::prelude::*;
use smallvec::SmallVec;

use super::components::CombatantId;
use super::physics::PhysicsWorld;
use super::registry::EntityRegistry;

/// Positional snapshot of one living combatant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySnapshot {
    pub id: CombatantId,
    pub position: Vec2,
    pub size: f32,
    pub hp: f32,
}

pub type Snapshots = SmallVec<[BodySnapshot; 16]>;

/// Living combatants not in `exclude`, in spawn order.
pub fn alive_bodies(
    registry: &EntityRegistry,
    physics: &dyn PhysicsWorld,
    exclude: &[CombatantId],
) -> Snapshots {
    registry
        .all_alive()
        .filter(|c| !exclude.contains(&c.id))
        .map(|c| BodySnapshot {
            id: c.id,
            position: c
                .body
                .and_then(|body| physics.position(body))
                .unwrap_or(c.last_position),
            size: c.size(),
            hp: c.hp,
        })
        .collect()
}

/// Closest body to `origin`
pub fn nearest(bodies: &[BodySnapshot], origin: Vec2) -> Option<BodySnapshot> {
    let mut best: Option<(BodySnapshot, f32)> = None;
    for body in bodies {
        let distance = body.position.distance_squared(origin);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((*body, distance));
        }
    }
    best.map(|(body, _)| body)
}

/// Farthest body from `origin`
pub fn farthest(bodies: &[BodySnapshot], origin: Vec2) -> Option<BodySnapshot> {
    let mut best: Option<(BodySnapshot, f32)> = None;
    for body in bodies {
        let distance = body.position.distance_squared(origin);
        if best.map_or(true, |(_, d)| distance > d) {
            best = Some((*body, distance));
        }
    }
    best.map(|(body, _)| body)
}

/// Body with the most current HP
pub fn highest_hp(bodies: &[BodySnapshot]) -> Option<BodySnapshot> {
    let mut best: Option<BodySnapshot> = None;
    for body in bodies {
        if best.map_or(true, |b| body.hp > b.hp) {
            best = Some(*body);
        }
    }
    best
}

/// Mean position of the bodies
pub fn centroid(bodies: &[BodySnapshot]) -> Option<Vec2> {
    if bodies.is_empty() {
        return None;
    }
    let sum: Vec2 = bodies.iter().map(|b| b.position).sum();
    Some(sum / bodies.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(id: u32, x: f32, hp: f32) -> BodySnapshot {
        BodySnapshot {
            id: CombatantId(id),
            position: Vec2::new(x, 0.0),
            size: 20.0,
            hp,
        }
    }

    #[test]
    fn test_nearest_and_farthest() {
        let bodies = [body(0, 10.0, 50.0), body(1, 100.0, 50.0), body(2, -40.0, 50.0)];
        assert_eq!(nearest(&bodies, Vec2::ZERO).map(|b| b.id), Some(CombatantId(0)));
        assert_eq!(farthest(&bodies, Vec2::ZERO).map(|b| b.id), Some(CombatantId(1)));
    }

    #[test]
    fn test_ties_go_to_spawn_order() {
        let bodies = [body(3, 10.0, 80.0), body(4, -10.0, 80.0)];
        assert_eq!(nearest(&bodies, Vec2::ZERO).map(|b| b.id), Some(CombatantId(3)));
        assert_eq!(highest_hp(&bodies).map(|b| b.id), Some(CombatantId(3)));
    }

    #[test]
    fn test_highest_hp_and_centroid() {
        let bodies = [body(0, 0.0, 20.0), body(1, 10.0, 90.0), body(2, 20.0, 40.0)];
        assert_eq!(highest_hp(&bodies).map(|b| b.id), Some(CombatantId(1)));
        assert_eq!(centroid(&bodies), Some(Vec2::new(10.0, 0.0)));
        assert_eq!(centroid(&[]), None);
    }
}
