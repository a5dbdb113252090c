//! Combat Resolver
//!
//! Per-tick combat rules, run after physics has stepped, in this order:
//!
//! 1. [`check_boundaries`] kills anything that left the arena.
//! 2. [`resolve_collisions`] applies contact damage and repulsion.
//! 3. [`trigger_skills`] casts for every combatant with full mana.
//! 4. [`expire_statuses`] drops timed statuses whose time is up.
//! 5. [`apply_attraction`] pulls the survivors together.
//!
//! Every step re-checks aliveness, since earlier steps in the same tick may
//! have killed a combatant.

use bevy::prelude::*;

use super::arena::CombatContext;
use super::components::{CombatantId, TimedEffect};
use super::constants::{
    ATTRACTION_FORCE, COLLISION_MARGIN, DAMAGE_ROLL_MAX, DAMAGE_ROLL_MIN,
    DUEL_ATTRACTION_MULTIPLIER, REPULSION_PER_SIZE,
};
use super::events::{BattleEvent, DeathCause};
use super::log::BattleLogEventType;
use super::skills;

pub fn resolve_tick(ctx: &mut CombatContext) {
    check_boundaries(ctx);
    resolve_collisions(ctx);
    trigger_skills(ctx);
    expire_statuses(ctx);
    apply_attraction(ctx);
}

/// Kill combatants whose centre is outside `[0, width] x [0, height]`.
pub fn check_boundaries(ctx: &mut CombatContext) {
    let bounds = Rect::new(0.0, 0.0, ctx.settings.arena_width, ctx.settings.arena_height);

    let escaped: Vec<CombatantId> = ctx
        .enemies(&[])
        .iter()
        .filter(|body| !bounds.contains(body.position))
        .map(|body| body.id)
        .collect();

    for id in escaped {
        ctx.kill(id, None, DeathCause::OutOfBounds);
    }
}

/// Contact damage both ways for every touching pair, plus a repulsive push.
pub fn resolve_collisions(ctx: &mut CombatContext) {
    let bodies = ctx.enemies(&[]);

    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let (a, b) = (bodies[i], bodies[j]);
            let offset = b.position - a.position;
            let distance = offset.length();
            if distance > (a.size + b.size) / 2.0 + COLLISION_MARGIN {
                continue;
            }
            if !ctx.is_alive(a.id) || !ctx.is_alive(b.id) {
                continue;
            }

            collision_hit(ctx, a.id, b.id);
            collision_hit(ctx, b.id, a.id);

            let direction = if distance > f32::EPSILON {
                offset / distance
            } else {
                ctx.rng.unit_vector()
            };
            let push = direction * REPULSION_PER_SIZE * (a.size + b.size);
            ctx.apply_force(a.id, -push);
            ctx.apply_force(b.id, push);
        }
    }
}

fn collision_hit(ctx: &mut CombatContext, attacker: CombatantId, target: CombatantId) {
    if !ctx.is_alive(attacker) {
        return;
    }
    let vulnerable = ctx
        .registry
        .get_alive(target)
        .is_some_and(|c| c.is_vulnerable(ctx.now));
    if !vulnerable {
        return;
    }

    let amount = ctx.settings.base_damage * ctx.rng.random_range(DAMAGE_ROLL_MIN, DAMAGE_ROLL_MAX);
    ctx.registry.mark_hit(target, ctx.now);
    ctx.deal_damage(target, amount, Some(attacker), true);
}

/// Cast a random enabled skill for every living combatant with full mana.
pub fn trigger_skills(ctx: &mut CombatContext) {
    let ready: Vec<CombatantId> = ctx
        .registry
        .all_alive()
        .filter(|c| c.mana_full())
        .map(|c| c.id)
        .collect();

    for caster in ready {
        if !ctx.is_alive(caster) {
            continue;
        }
        let catalog = ctx.catalog;
        let Some(skill) = catalog.pick(ctx.rng) else {
            continue;
        };

        let message = format!("{} casts {}", ctx.name_of(caster), skill.name);
        info!("{}", message);
        ctx.log_event(BattleLogEventType::SkillCast, message);
        ctx.emit(BattleEvent::SkillCast {
            caster,
            skill: skill.kind,
        });

        skills::cast(skill.kind, ctx, caster);
        ctx.registry.reset_mana(caster);

        if let Some(duration) = skill.duration {
            ctx.registry.add_effect(
                caster,
                TimedEffect {
                    skill: skill.kind,
                    expires_at: ctx.now + duration,
                },
            );
        }
    }
}

/// Remove timed statuses past their expiry.
pub fn expire_statuses(ctx: &mut CombatContext) {
    for (id, effect) in ctx.registry.take_expired_effects(ctx.now) {
        let message = format!("{} lost {}", ctx.name_of(id), effect.skill.name());
        ctx.log_event(BattleLogEventType::StatusExpired, message);
        ctx.emit(BattleEvent::StatusExpired {
            id,
            status: effect.skill,
        });
    }
}

/// Pull every pair of living combatants toward each other. The pull is
/// stronger when only two remain.
pub fn apply_attraction(ctx: &mut CombatContext) {
    let bodies = ctx.enemies(&[]);
    let strength = if bodies.len() == 2 {
        ATTRACTION_FORCE * DUEL_ATTRACTION_MULTIPLIER
    } else {
        ATTRACTION_FORCE
    };

    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let (a, b) = (bodies[i], bodies[j]);
            let direction = (b.position - a.position).normalize_or_zero();
            ctx.apply_force(a.id, direction * strength);
            ctx.apply_force(b.id, -direction * strength);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::arena::Arena;
    use crate::combat::components::{GameRng, Subscriber};
    use crate::combat::registry::SpawnSpec;
    use crate::combat::sprites::SpriteAsset;
    use crate::settings::BattleSettings;

    fn spawn_at(arena: &mut Arena, name: &str, position: Vec2, max_hp: f32) -> CombatantId {
        arena.spawn(SpawnSpec {
            subscriber: Subscriber::new(name),
            sprite: SpriteAsset::new("Kappa", 56.0, 56.0),
            position,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            max_hp,
            max_mana: 100.0,
        })
    }

    fn new_arena() -> Arena {
        let mut arena = Arena::new(BattleSettings::default(), GameRng::from_seed(3));
        arena.set_battle_active(true);
        arena
    }

    fn velocity_of(arena: &Arena, id: CombatantId) -> Vec2 {
        arena
            .registry()
            .get(id)
            .and_then(|c| c.body)
            .and_then(|body| arena.physics().velocity(body))
            .unwrap_or(Vec2::ZERO)
    }

    fn collision_damage(events: &[BattleEvent]) -> Vec<f32> {
        events
            .iter()
            .filter_map(|e| match e {
                BattleEvent::Damaged {
                    attacker: Some(_),
                    amount,
                    ..
                } => Some(*amount),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_leaving_arena_bounds_kills() {
        let mut arena = new_arena();
        let inside_edge = spawn_at(&mut arena, "edge", Vec2::new(0.0, 300.0), 100.0);
        let left = spawn_at(&mut arena, "left", Vec2::new(-20.0, 300.0), 100.0);
        let right = spawn_at(&mut arena, "right", Vec2::new(1281.0, 300.0), 100.0);
        let below = spawn_at(&mut arena, "below", Vec2::new(640.0, 721.0), 100.0);

        check_boundaries(&mut arena.context());

        assert!(arena.registry().is_alive(inside_edge));
        assert!(!arena.registry().is_alive(left));
        assert!(!arena.registry().is_alive(right));
        assert!(!arena.registry().is_alive(below));

        let out_of_bounds = arena
            .pending_events()
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    BattleEvent::Killed {
                        cause: DeathCause::OutOfBounds,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(out_of_bounds, 3);
    }

    #[test]
    fn test_boundary_kill_precedes_skill_trigger() {
        let mut arena = new_arena();
        let escaped = spawn_at(&mut arena, "escaped", Vec2::new(-500.0, 300.0), 100.0);
        spawn_at(&mut arena, "other", Vec2::new(640.0, 360.0), 100.0);
        arena.context().registry.add_mana(escaped, 100.0);

        resolve_tick(&mut arena.context());

        assert!(!arena.registry().is_alive(escaped));
        let casts = arena
            .pending_events()
            .iter()
            .filter(|e| matches!(e, BattleEvent::SkillCast { .. }))
            .count();
        assert_eq!(casts, 0);
    }

    #[test]
    fn test_collision_hits_both_sides_once_per_window() {
        let mut arena = new_arena();
        let a = spawn_at(&mut arena, "a", Vec2::new(600.0, 360.0), 1000.0);
        let b = spawn_at(&mut arena, "b", Vec2::new(640.0, 360.0), 1000.0);

        let mut hits_per_tick = Vec::new();
        for _ in 0..6 {
            let before = arena.pending_events().len();
            resolve_collisions(&mut arena.context());
            hits_per_tick.push(collision_damage(&arena.pending_events()[before..]).len());
            arena.advance_clock(0.25);
        }

        // Ticks at 0.0, 0.25, ..., 1.25; the window is 0.5s
        assert_eq!(hits_per_tick, vec![2, 0, 2, 0, 2, 0]);
        assert!(arena.registry().get(a).unwrap().hp < 1000.0);
        assert!(arena.registry().get(b).unwrap().hp < 1000.0);
    }

    #[test]
    fn test_collision_damage_within_roll_range() {
        let mut arena = new_arena();
        spawn_at(&mut arena, "a", Vec2::new(600.0, 360.0), 1000.0);
        spawn_at(&mut arena, "b", Vec2::new(640.0, 360.0), 1000.0);

        for _ in 0..20 {
            resolve_collisions(&mut arena.context());
            arena.advance_clock(0.5);
        }

        let base = arena.settings().base_damage;
        let amounts = collision_damage(arena.pending_events());
        assert_eq!(amounts.len(), 40);
        for amount in &amounts {
            assert!(*amount >= base * DAMAGE_ROLL_MIN && *amount <= base * DAMAGE_ROLL_MAX);
        }
        assert!(amounts.iter().any(|a| (*a - amounts[0]).abs() > f32::EPSILON));
    }

    #[test]
    fn test_collision_pushes_pair_apart() {
        let mut arena = new_arena();
        let a = spawn_at(&mut arena, "a", Vec2::new(600.0, 360.0), 100.0);
        let b = spawn_at(&mut arena, "b", Vec2::new(640.0, 360.0), 100.0);

        resolve_collisions(&mut arena.context());
        arena.step_physics(1.0 / 60.0);

        assert!(velocity_of(&arena, a).x < 0.0);
        assert!(velocity_of(&arena, b).x > 0.0);
    }

    #[test]
    fn test_attraction_is_stronger_in_a_duel() {
        let mut crowd = new_arena();
        let crowd_a = spawn_at(&mut crowd, "a", Vec2::new(100.0, 360.0), 100.0);
        spawn_at(&mut crowd, "b", Vec2::new(600.0, 360.0), 100.0);
        spawn_at(&mut crowd, "c", Vec2::new(1100.0, 360.0), 100.0);

        let mut duel = new_arena();
        let duel_a = spawn_at(&mut duel, "a", Vec2::new(100.0, 360.0), 100.0);
        spawn_at(&mut duel, "b", Vec2::new(600.0, 360.0), 100.0);

        apply_attraction(&mut crowd.context());
        apply_attraction(&mut duel.context());
        crowd.step_physics(1.0 / 60.0);
        duel.step_physics(1.0 / 60.0);

        // Crowd: two pulls toward +x. Duel: one pull at the duel multiplier.
        let crowd_speed = velocity_of(&crowd, crowd_a).x;
        let duel_speed = velocity_of(&duel, duel_a).x;
        assert!(crowd_speed > 0.0);
        let expected_ratio = DUEL_ATTRACTION_MULTIPLIER / 2.0;
        assert!((duel_speed / crowd_speed - expected_ratio).abs() < 1e-3);
    }
}
