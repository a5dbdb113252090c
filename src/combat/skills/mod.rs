//! Skill Catalog
//!
//! Six fixed skills, each a self-contained procedure over the shared combat
//! primitives in [`CombatContext`]:
//!
//! | Skill            | Pattern                                              |
//! |------------------|------------------------------------------------------|
//! | Heal             | instantaneous self heal, visual-only glow            |
//! | Shield           | timed status, halves incoming damage                 |
//! | Lightning Chain  | multi-target hops with decaying damage               |
//! | Beam             | freeze, teleport, channel corridor damage            |
//! | Execute          | delayed lethal strike on the highest-HP enemy        |
//! | Knockback        | freeze, then radial blast scaled by distance         |
//!
//! A combatant casts when its mana is full: the resolver picks one enabled
//! skill at random, runs [`cast`], resets mana and registers a timed status
//! if the skill declares a duration.
//!
//! Follow-up work is queued as [`DeferredAction`] data on the wall-clock
//! scheduler and run through [`resolve_deferred`], which re-checks that every
//! referenced combatant is still alive before touching it.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub mod beam;
pub mod execute;
pub mod heal;
pub mod knockback;
pub mod lightning;
pub mod shield;

use super::arena::CombatContext;
use super::components::{CombatantId, GameRng};
use super::constants::SHIELD_DURATION;
use crate::settings::SkillToggles;

/// The six canonical skills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    Heal,
    Shield,
    LightningChain,
    /// Kamehameha
    Beam,
    /// Omae wa mou shindeiru
    Execute,
    /// Shinra Tensei
    Knockback,
}

impl SkillKind {
    pub const ALL: [SkillKind; 6] = [
        SkillKind::Heal,
        SkillKind::Shield,
        SkillKind::LightningChain,
        SkillKind::Beam,
        SkillKind::Execute,
        SkillKind::Knockback,
    ];

    /// Name announced on the overlay
    pub fn name(&self) -> &'static str {
        match self {
            SkillKind::Heal => "Heal",
            SkillKind::Shield => "Shield",
            SkillKind::LightningChain => "Lightning Chain",
            SkillKind::Beam => "Kamehameha",
            SkillKind::Execute => "Omae wa mou shindeiru",
            SkillKind::Knockback => "Shinra Tensei",
        }
    }

    /// Duration of the timed status the skill leaves on its caster, if any
    pub fn status_duration(&self) -> Option<f32> {
        match self {
            SkillKind::Shield => Some(SHIELD_DURATION),
            _ => None,
        }
    }
}

/// Stateless description of one catalog entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillDescriptor {
    pub kind: SkillKind,
    pub name: &'static str,
    pub enabled: bool,
    pub duration: Option<f32>,
}

impl SkillDescriptor {
    pub fn new(kind: SkillKind, enabled: bool) -> Self {
        Self {
            kind,
            name: kind.name(),
            enabled,
            duration: kind.status_duration(),
        }
    }
}

/// The fixed skill registry
#[derive(Debug, Clone)]
pub struct SkillCatalog {
    skills: Vec<SkillDescriptor>,
}

impl Default for SkillCatalog {
    fn default() -> Self {
        Self::from_toggles(&SkillToggles::default())
    }
}

impl SkillCatalog {
    pub fn from_toggles(toggles: &SkillToggles) -> Self {
        Self {
            skills: SkillKind::ALL
                .iter()
                .map(|kind| SkillDescriptor::new(*kind, toggles.is_enabled(*kind)))
                .collect(),
        }
    }

    pub fn descriptor(&self, kind: SkillKind) -> Option<&SkillDescriptor> {
        self.skills.iter().find(|s| s.kind == kind)
    }

    pub fn all(&self) -> &[SkillDescriptor] {
        &self.skills
    }

    pub fn enabled(&self) -> impl Iterator<Item = &SkillDescriptor> {
        self.skills.iter().filter(|s| s.enabled)
    }

    /// Uniformly random enabled skill
    pub fn pick(&self, rng: &mut GameRng) -> Option<SkillDescriptor> {
        let enabled: Vec<&SkillDescriptor> = self.enabled().collect();
        if enabled.is_empty() {
            return None;
        }
        Some(*enabled[rng.index(enabled.len())])
    }
}

/// Delayed follow-up of a skill, run by the wall-clock scheduler
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredAction {
    ChainHop {
        caster: CombatantId,
        from: CombatantId,
        target: CombatantId,
        amount: f32,
        hop: u8,
    },
    BeamFire {
        caster: CombatantId,
    },
    BeamTick {
        caster: CombatantId,
        origin: Vec2,
        direction: Vec2,
        ticks_left: u32,
    },
    ExecuteStrike {
        caster: CombatantId,
        target: CombatantId,
    },
    KnockbackBlast {
        caster: CombatantId,
    },
}

/// Run a skill's immediate effect for `caster`
pub fn cast(kind: SkillKind, ctx: &mut CombatContext, caster: CombatantId) {
    match kind {
        SkillKind::Heal => heal::cast(ctx, caster),
        SkillKind::Shield => shield::cast(ctx, caster),
        SkillKind::LightningChain => lightning::cast(ctx, caster),
        SkillKind::Beam => beam::cast(ctx, caster),
        SkillKind::Execute => execute::cast(ctx, caster),
        SkillKind::Knockback => knockback::cast(ctx, caster),
    }
}

/// Run a scheduled follow-up
pub fn resolve_deferred(action: DeferredAction, ctx: &mut CombatContext) {
    match action {
        DeferredAction::ChainHop {
            caster,
            from,
            target,
            amount,
            hop,
        } => lightning::resolve_hop(ctx, caster, from, target, amount, hop),
        DeferredAction::BeamFire { caster } => beam::fire(ctx, caster),
        DeferredAction::BeamTick {
            caster,
            origin,
            direction,
            ticks_left,
        } => beam::tick(ctx, caster, origin, direction, ticks_left),
        DeferredAction::ExecuteStrike { caster, target } => execute::strike(ctx, caster, target),
        DeferredAction::KnockbackBlast { caster } => knockback::blast(ctx, caster),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_only_returns_enabled_skills() {
        let catalog = SkillCatalog::from_toggles(&SkillToggles::only(SkillKind::Shield));
        let mut rng = GameRng::from_seed(9);
        for _ in 0..20 {
            assert_eq!(catalog.pick(&mut rng).map(|s| s.kind), Some(SkillKind::Shield));
        }
    }

    #[test]
    fn test_pick_with_nothing_enabled() {
        let catalog = SkillCatalog::from_toggles(&SkillToggles::all_disabled());
        let mut rng = GameRng::from_seed(9);
        assert!(catalog.pick(&mut rng).is_none());
    }

    #[test]
    fn test_pick_covers_every_enabled_skill() {
        let catalog = SkillCatalog::default();
        let mut rng = GameRng::from_seed(2);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            if let Some(skill) = catalog.pick(&mut rng) {
                seen.insert(skill.kind);
            }
        }
        assert_eq!(seen.len(), SkillKind::ALL.len());
    }

    #[test]
    fn test_only_shield_declares_duration() {
        let catalog = SkillCatalog::default();
        for skill in catalog.all() {
            assert_eq!(skill.duration.is_some(), skill.kind == SkillKind::Shield);
        }
    }
}
