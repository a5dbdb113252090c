//! Battle events
//!
//! [`BattleEvent`] is the diff stream the simulation emits for the render
//! surface: the core changes combat state, records what happened here, and
//! the overlay reacts. Nothing flows back into the simulation.
//!
//! The Bevy `Event` wrappers at the bottom carry these (and inbound chat and
//! commands) through an `App`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::components::CombatantId;
use super::controller::{BattleOutcome, BattlePhase};
use super::render::RenderFrame;
use super::skills::SkillKind;
use crate::chat::ChatMessage;

/// Why a combatant died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    /// HP reached zero
    Damage,
    /// Left the arena bounds
    OutOfBounds,
}

/// Something the overlay should show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    PhaseChanged {
        from: BattlePhase,
        to: BattlePhase,
    },
    Spawned {
        id: CombatantId,
        name: String,
        sprite: String,
        position: Vec2,
    },
    Damaged {
        target: CombatantId,
        attacker: Option<CombatantId>,
        amount: f32,
        hp: f32,
        shielded: bool,
    },
    Healed {
        target: CombatantId,
        amount: f32,
        hp: f32,
    },
    Killed {
        id: CombatantId,
        killer: Option<CombatantId>,
        cause: DeathCause,
    },
    /// Visual resources for this combatant can be released
    Despawned {
        id: CombatantId,
    },
    SkillCast {
        caster: CombatantId,
        skill: SkillKind,
    },
    StatusApplied {
        id: CombatantId,
        status: SkillKind,
        duration: f32,
        /// Visual-only statuses carry no combat state
        visual_only: bool,
    },
    StatusExpired {
        id: CombatantId,
        status: SkillKind,
    },
    TimeScaleChanged {
        scale: f32,
    },
    Teleported {
        id: CombatantId,
        from: Vec2,
        to: Vec2,
    },
    ChainHop {
        from: CombatantId,
        to: CombatantId,
        hop: u8,
    },
    BeamCharging {
        caster: CombatantId,
        duration: f32,
    },
    BeamFired {
        caster: CombatantId,
        origin: Vec2,
        direction: Vec2,
        length: f32,
        half_width: f32,
    },
    BeamFaded {
        caster: CombatantId,
    },
    ExecuteMarked {
        caster: CombatantId,
        target: CombatantId,
        delay: f32,
    },
    Knockback {
        caster: CombatantId,
        affected: usize,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
}

// ============================================================================
// Bevy events
// ============================================================================

/// Inbound chat message from the chat stream collaborator
#[derive(Event, Debug, Clone)]
pub struct ChatMessageEvent(pub ChatMessage);

/// External battle control request
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleCommand {
    Start,
    Abort,
}

/// Outbound presentation diff
#[derive(Event, Debug, Clone)]
pub struct BattleEventMessage(pub BattleEvent);

/// Outbound per-tick render frame
#[derive(Event, Debug, Clone)]
pub struct RenderFrameEvent(pub RenderFrame);
