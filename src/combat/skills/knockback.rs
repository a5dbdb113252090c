//! Knockback (Shinra Tensei)
//!
//! Time freezes for a moment, then every other combatant is blasted away
//! from the caster. Closer targets are pushed harder: the force is scaled by
//! `reference_distance / distance`, clamped to a fixed range.

use bevy::prelude::*;

use crate::combat::arena::CombatContext;
use crate::combat::components::CombatantId;
use crate::combat::constants::{
    KNOCKBACK_DAMAGE, KNOCKBACK_DELAY, KNOCKBACK_FORCE, KNOCKBACK_REFERENCE_DISTANCE,
    KNOCKBACK_SCALE_MAX, KNOCKBACK_SCALE_MIN,
};
use crate::combat::events::BattleEvent;
use crate::combat::skills::DeferredAction;

pub fn cast(ctx: &mut CombatContext, caster: CombatantId) {
    ctx.freeze_time();
    ctx.schedule(KNOCKBACK_DELAY, DeferredAction::KnockbackBlast { caster });
}

pub fn blast(ctx: &mut CombatContext, caster: CombatantId) {
    ctx.release_time();
    if !ctx.battle_active {
        return;
    }
    let Some(origin) = ctx.position(caster) else {
        debug!("Knockback from {} fizzled", caster);
        return;
    };

    let targets = ctx.enemies(&[caster]);
    for target in &targets {
        let offset = target.position - origin;
        let distance = offset.length();
        let direction = if distance > f32::EPSILON {
            offset / distance
        } else {
            ctx.rng.unit_vector()
        };
        ctx.apply_force(
            target.id,
            direction * KNOCKBACK_FORCE * force_scale(distance),
        );
        ctx.deal_damage(target.id, KNOCKBACK_DAMAGE, Some(caster), false);
    }

    ctx.emit(BattleEvent::Knockback {
        caster,
        affected: targets.len(),
    });
}

/// Distance falloff of the blast
pub fn force_scale(distance: f32) -> f32 {
    (KNOCKBACK_REFERENCE_DISTANCE / distance.max(1.0))
        .clamp(KNOCKBACK_SCALE_MIN, KNOCKBACK_SCALE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_scale_falls_off_with_distance() {
        assert_eq!(force_scale(KNOCKBACK_REFERENCE_DISTANCE), 1.0);
        assert!(force_scale(100.0) > force_scale(400.0));
        assert_eq!(force_scale(0.0), KNOCKBACK_SCALE_MAX);
        assert_eq!(force_scale(100_000.0), KNOCKBACK_SCALE_MIN);
    }
}
