//! Execute (Omae wa mou shindeiru): mark the highest-HP enemy, then kill it
//! outright after a delay. Shields do not help.

use bevy::prelude::*;

use crate::combat::arena::CombatContext;
use crate::combat::components::CombatantId;
use crate::combat::constants::EXECUTE_DELAY;
use crate::combat::events::BattleEvent;
use crate::combat::log::BattleLogEventType;
use crate::combat::skills::DeferredAction;
use crate::combat::targeting;

pub fn cast(ctx: &mut CombatContext, caster: CombatantId) {
    let enemies = ctx.enemies(&[caster]);
    let Some(target) = targeting::highest_hp(&enemies) else {
        return;
    };

    let message = format!(
        "{} marks {}: omae wa mou shindeiru",
        ctx.name_of(caster),
        ctx.name_of(target.id)
    );
    ctx.log_event(BattleLogEventType::StatusApplied, message);
    ctx.emit(BattleEvent::ExecuteMarked {
        caster,
        target: target.id,
        delay: EXECUTE_DELAY,
    });
    ctx.schedule(
        EXECUTE_DELAY,
        DeferredAction::ExecuteStrike {
            caster,
            target: target.id,
        },
    );
}

pub fn strike(ctx: &mut CombatContext, caster: CombatantId, target: CombatantId) {
    if !ctx.battle_active || !ctx.is_alive(caster) || !ctx.is_alive(target) {
        debug!("Execute from {} on {} fizzled", caster, target);
        return;
    }
    ctx.strike_lethal(target, Some(caster));
}
