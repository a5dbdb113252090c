//! Battle simulation
//!
//! A physics-driven arena where chat participants fight as emote sprites:
//! - Candidate recruitment and spawning ([`controller`])
//! - Entity bookkeeping and physics bodies ([`registry`], [`physics`])
//! - Collision damage, mana and skill triggers ([`resolver`], [`skills`])
//! - Statistics and the battle log ([`stats`], [`log`])
//! - The presentation boundary ([`events`], [`render`])
//!
//! The simulation itself is plain Rust driven by [`BattleController::tick`];
//! [`CombatPlugin`] wires it into a Bevy `App`.

use bevy::prelude::*;

pub mod arena;
pub mod components;
pub mod constants;
pub mod controller;
pub mod events;
pub mod log;
pub mod physics;
pub mod registry;
pub mod render;
pub mod resolver;
pub mod scheduler;
pub mod skills;
pub mod sprites;
pub mod stats;
pub mod systems;
pub mod targeting;

pub use controller::BattleController;

use events::*;
use render::FrameRecorder;
use sprites::SpriteCatalog;
use systems::*;

use crate::settings::BattleSettings;

/// Ordering of the battle systems within `Update`
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum BattleSet {
    /// Chat and external commands
    Intake,
    /// One controller tick
    Advance,
    /// Events and frames out to the surface
    Publish,
}

/// Plugin for the battle simulation
#[derive(Default)]
pub struct CombatPlugin {
    pub settings: BattleSettings,
    /// Seed for deterministic battles; entropy when `None`
    pub seed: Option<u64>,
    pub sprites: SpriteCatalog,
}

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        let controller = BattleController::new(self.settings.clone(), self.seed)
            .with_sprites(self.sprites.clone());

        app
            // Battle events
            .add_event::<ChatMessageEvent>()
            .add_event::<BattleCommand>()
            .add_event::<BattleEventMessage>()
            .add_event::<RenderFrameEvent>()
            // Resources
            .insert_resource(controller)
            .init_resource::<BattleClock>()
            .init_resource::<FrameRecorder>()
            // Systems
            .configure_sets(
                Update,
                (BattleSet::Intake, BattleSet::Advance, BattleSet::Publish).chain(),
            )
            .add_systems(
                Update,
                (ingest_chat, handle_commands).chain().in_set(BattleSet::Intake),
            )
            .add_systems(Update, advance_battle.in_set(BattleSet::Advance))
            .add_systems(
                Update,
                (publish_events, record_presentation)
                    .chain()
                    .in_set(BattleSet::Publish),
            );
    }
}

/// How far the simulation advances per `Update`
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct BattleClock {
    /// Fixed step in seconds; frame delta when `None`
    pub fixed_dt: Option<f32>,
}

impl BattleClock {
    pub fn fixed(dt: f32) -> Self {
        Self { fixed_dt: Some(dt) }
    }

    pub fn delta(&self, time: &Time) -> f32 {
        self.fixed_dt.unwrap_or_else(|| time.delta_secs())
    }
}
