//! Lightning Chain: a bolt that jumps between up to three enemies.
//!
//! The chain is picked at cast time: nearest enemy to the caster, then the
//! nearest not-yet-hit enemy to the previous target. The first hop lands
//! immediately, later hops follow on the wall clock with decaying damage. A
//! hop whose target has died in the meantime is skipped.

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::combat::arena::CombatContext;
use crate::combat::components::CombatantId;
use crate::combat::constants::{
    LIGHTNING_BASE_DAMAGE, LIGHTNING_HOP_DELAY, LIGHTNING_HOP_MULTIPLIERS,
};
use crate::combat::events::BattleEvent;
use crate::combat::skills::{resolve_deferred, DeferredAction};
use crate::combat::targeting;

pub fn cast(ctx: &mut CombatContext, caster: CombatantId) {
    let Some(mut from_position) = ctx.position(caster) else {
        return;
    };

    let mut hit: SmallVec<[CombatantId; 4]> = SmallVec::new();
    hit.push(caster);
    for _ in 0..LIGHTNING_HOP_MULTIPLIERS.len() {
        let candidates = ctx.enemies(&hit);
        let Some(next) = targeting::nearest(&candidates, from_position) else {
            break;
        };
        hit.push(next.id);
        from_position = next.position;
    }

    let mut from = caster;
    for (hop, target) in hit.iter().skip(1).copied().enumerate() {
        let action = DeferredAction::ChainHop {
            caster,
            from,
            target,
            amount: LIGHTNING_BASE_DAMAGE * LIGHTNING_HOP_MULTIPLIERS[hop],
            hop: hop as u8,
        };
        if hop == 0 {
            resolve_deferred(action, ctx);
        } else {
            ctx.schedule(LIGHTNING_HOP_DELAY * hop as f32, action);
        }
        from = target;
    }
}

pub fn resolve_hop(
    ctx: &mut CombatContext,
    caster: CombatantId,
    from: CombatantId,
    target: CombatantId,
    amount: f32,
    hop: u8,
) {
    if !ctx.battle_active || !ctx.is_alive(target) {
        debug!("Lightning hop {} skipped, {} is gone", hop, target);
        return;
    }

    ctx.emit(BattleEvent::ChainHop {
        from,
        to: target,
        hop,
    });
    ctx.deal_damage(target, amount, Some(caster), false);
}
