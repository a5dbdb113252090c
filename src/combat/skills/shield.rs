//! Shield: halve incoming damage for a fixed duration.
//!
//! The timed status entry is registered by the caster's skill trigger from
//! the descriptor's duration; expiry clears the flag in the registry.

use bevy::prelude::*;

use crate::combat::arena::CombatContext;
use crate::combat::components::CombatantId;
use crate::combat::constants::SHIELD_DURATION;
use crate::combat::events::BattleEvent;
use crate::combat::log::BattleLogEventType;
use crate::combat::skills::SkillKind;

pub fn cast(ctx: &mut CombatContext, caster: CombatantId) {
    if !ctx.is_alive(caster) {
        return;
    }

    if !ctx.registry.set_shield(caster, true) {
        debug!("{} refreshed an active shield", caster);
    }

    let name = ctx.name_of(caster);
    ctx.log_event(
        BattleLogEventType::StatusApplied,
        format!("{} is shielded for {:.0}s", name, SHIELD_DURATION),
    );
    ctx.emit(BattleEvent::StatusApplied {
        id: caster,
        status: SkillKind::Shield,
        duration: SHIELD_DURATION,
        visual_only: false,
    });
}
