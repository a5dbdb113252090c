//! Heal: restore a share of max HP instantly.
//!
//! The glow shown afterwards is purely visual; no duration is tracked in
//! combat state.

use crate::combat::arena::CombatContext;
use crate::combat::components::CombatantId;
use crate::combat::constants::{HEAL_FRACTION, HEAL_GLOW_DURATION};
use crate::combat::events::BattleEvent;
use crate::combat::skills::SkillKind;

pub fn cast(ctx: &mut CombatContext, caster: CombatantId) {
    let Some(max_hp) = ctx.registry.get_alive(caster).map(|c| c.max_hp) else {
        return;
    };

    ctx.heal(caster, max_hp * HEAL_FRACTION);
    ctx.emit(BattleEvent::StatusApplied {
        id: caster,
        status: SkillKind::Heal,
        duration: HEAL_GLOW_DURATION,
        visual_only: true,
    });
}
