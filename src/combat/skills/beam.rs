//! Beam (Kamehameha)
//!
//! 1. Cast: physics freezes while the caster charges.
//! 2. Fire: the caster teleports next to the farthest enemy and aims at the
//!    centroid of the remaining enemies.
//! 3. Channel: every tick damages each enemy whose body overlaps the beam
//!    corridor.
//! 4. Fade: the freeze is released.
//!
//! If the caster dies or the battle ends at any point, the remaining stages
//! are skipped and the freeze is released straight away.

use bevy::prelude::*;

use crate::combat::arena::CombatContext;
use crate::combat::components::CombatantId;
use crate::combat::constants::{
    BEAM_CHARGE_DURATION, BEAM_FIRE_DURATION, BEAM_HALF_WIDTH, BEAM_LENGTH, BEAM_TELEPORT_GAP,
    BEAM_TICK_DAMAGE, BEAM_TICK_INTERVAL,
};
use crate::combat::events::BattleEvent;
use crate::combat::skills::DeferredAction;
use crate::combat::targeting;

pub fn cast(ctx: &mut CombatContext, caster: CombatantId) {
    ctx.freeze_time();
    ctx.emit(BattleEvent::BeamCharging {
        caster,
        duration: BEAM_CHARGE_DURATION,
    });
    ctx.schedule(BEAM_CHARGE_DURATION, DeferredAction::BeamFire { caster });
}

pub fn fire(ctx: &mut CombatContext, caster: CombatantId) {
    if !ctx.battle_active {
        fade(ctx, caster);
        return;
    }
    let Some(caster_position) = ctx.position(caster) else {
        fade(ctx, caster);
        return;
    };
    let enemies = ctx.enemies(&[caster]);
    let Some(farthest) = targeting::farthest(&enemies, caster_position) else {
        fade(ctx, caster);
        return;
    };

    let mut away = (caster_position - farthest.position).normalize_or_zero();
    if away == Vec2::ZERO {
        away = Vec2::X;
    }
    let gap = (ctx.size_of(caster) + farthest.size) / 2.0 + BEAM_TELEPORT_GAP;
    let origin = farthest.position + away * gap;
    ctx.teleport(caster, origin);

    let aim = targeting::centroid(&enemies).unwrap_or(farthest.position);
    let mut direction = (aim - origin).normalize_or_zero();
    if direction == Vec2::ZERO {
        direction = (farthest.position - origin).normalize_or_zero();
    }
    if direction == Vec2::ZERO {
        direction = -away;
    }

    ctx.emit(BattleEvent::BeamFired {
        caster,
        origin,
        direction,
        length: BEAM_LENGTH,
        half_width: BEAM_HALF_WIDTH,
    });

    let ticks = (BEAM_FIRE_DURATION / BEAM_TICK_INTERVAL).round() as u32;
    ctx.schedule(
        BEAM_TICK_INTERVAL,
        DeferredAction::BeamTick {
            caster,
            origin,
            direction,
            ticks_left: ticks,
        },
    );
}

pub fn tick(
    ctx: &mut CombatContext,
    caster: CombatantId,
    origin: Vec2,
    direction: Vec2,
    ticks_left: u32,
) {
    if !ctx.battle_active || !ctx.is_alive(caster) {
        fade(ctx, caster);
        return;
    }

    for enemy in ctx.enemies(&[caster]) {
        if in_corridor(origin, direction, enemy.position, enemy.size / 2.0) {
            ctx.deal_damage(enemy.id, BEAM_TICK_DAMAGE, Some(caster), false);
        }
    }

    if ticks_left > 1 {
        ctx.schedule(
            BEAM_TICK_INTERVAL,
            DeferredAction::BeamTick {
                caster,
                origin,
                direction,
                ticks_left: ticks_left - 1,
            },
        );
    } else {
        fade(ctx, caster);
    }
}

fn fade(ctx: &mut CombatContext, caster: CombatantId) {
    ctx.release_time();
    ctx.emit(BattleEvent::BeamFaded { caster });
}

/// Whether a body of `radius` at `point` overlaps the beam corridor.
pub fn in_corridor(origin: Vec2, direction: Vec2, point: Vec2, radius: f32) -> bool {
    let relative = point - origin;
    let along = relative.dot(direction);
    if !(0.0..=BEAM_LENGTH).contains(&along) {
        return false;
    }
    relative.perp_dot(direction).abs() <= BEAM_HALF_WIDTH + radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corridor_bounds() {
        let origin = Vec2::ZERO;
        let direction = Vec2::X;
        assert!(in_corridor(origin, direction, Vec2::new(300.0, 30.0), 14.0));
        assert!(in_corridor(origin, direction, Vec2::new(300.0, -50.0), 14.0));
        assert!(!in_corridor(origin, direction, Vec2::new(300.0, 60.0), 14.0));
        assert!(!in_corridor(origin, direction, Vec2::new(-20.0, 0.0), 14.0));
        assert!(!in_corridor(origin, direction, Vec2::new(BEAM_LENGTH + 1.0, 0.0), 14.0));
    }
}
