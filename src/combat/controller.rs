//! Battle Controller
//!
//! Owns the battle state machine and the arena it drives:
//!
//! ```text
//! Idle -> Spawning -> Active -> Ending -> Idle
//! ```
//!
//! - **Idle**: chat feeds the candidate pool; a start request moves on if at
//!   least three candidates are known.
//! - **Spawning**: draws participants, assigns sprites, places them on a
//!   circle around the center with an inward push. Falls back to Idle when
//!   nobody could be spawned.
//! - **Active**: the resolver runs every tick until one (or no) combatant is
//!   left or the battle timer runs out.
//! - **Ending**: bodies are frozen, the outcome is announced and, after a
//!   grace period, the arena is torn down.
//!
//! One [`BattleController::tick`] runs, in order: wall clock, scheduled
//! actions, physics, resolver, deferred removals, win check or grace timer,
//! and returns the render frame for the surface.

use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::components::{CombatantId, GameRng, Subscriber};
use super::constants::{
    INITIAL_INWARD_SPEED, INITIAL_SPIN, MIN_CANDIDATES, SPAWN_RADIUS_FRACTION,
    VICTORY_GRACE_DURATION,
};
use super::events::BattleEvent;
use super::log::BattleLogEventType;
use super::physics::{KinematicWorld, PhysicsWorld};
use super::registry::{EntityRegistry, SpawnSpec};
use super::render::RenderFrame;
use super::sprites::SpriteCatalog;
use super::stats::RankedStat;
use crate::chat::{CandidatePool, ChatIntake, ChatMessage, ChatOutcome};
use crate::settings::BattleSettings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattlePhase {
    #[default]
    Idle,
    Spawning,
    Active,
    Ending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleOutcome {
    Winner(CombatantId),
    /// Nobody survived
    Draw,
    /// Stopped by an external request
    Aborted,
}

/// The battle currently running
#[derive(Debug, Clone)]
pub struct BattleSession {
    pub started_at: f32,
    pub duration_limit: f32,
    pub participants: Vec<CombatantId>,
    pub outcome: Option<BattleOutcome>,
    /// Wall-clock time the Ending phase began
    pub ending_since: Option<f32>,
}

/// Retained after a battle for the results screen and reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSummary {
    pub outcome: BattleOutcome,
    /// Name of the winner, if there is one
    pub winner_name: Option<String>,
    pub duration_secs: f32,
    pub ranking: Vec<RankedStat>,
    pub participants: usize,
}

/// Why a start request did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRejection {
    NotIdle(BattlePhase),
    NotEnoughCandidates { available: usize, required: usize },
    NoBattleAssets,
}

impl fmt::Display for StartRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartRejection::NotIdle(phase) => {
                write!(f, "a battle is already running ({:?})", phase)
            }
            StartRejection::NotEnoughCandidates {
                available,
                required,
            } => write!(
                f,
                "not enough candidates ({} of {} needed)",
                available, required
            ),
            StartRejection::NoBattleAssets => write!(f, "no battle-eligible sprite assets"),
        }
    }
}

impl std::error::Error for StartRejection {}

#[derive(Resource)]
pub struct BattleController {
    arena: Arena,
    pool: CandidatePool,
    sprites: SpriteCatalog,
    intake: ChatIntake,
    phase: BattlePhase,
    session: Option<BattleSession>,
    last_summary: Option<BattleSummary>,
    battles_completed: usize,
}

impl BattleController {
    pub fn new(settings: BattleSettings, seed: Option<u64>) -> Self {
        Self::with_physics(
            settings,
            GameRng::from_optional_seed(seed),
            Box::new(KinematicWorld::new()),
        )
    }

    pub fn with_physics(
        settings: BattleSettings,
        rng: GameRng,
        physics: Box<dyn PhysicsWorld>,
    ) -> Self {
        Self {
            arena: Arena::with_physics(settings, rng, physics),
            pool: CandidatePool::new(),
            sprites: SpriteCatalog::default(),
            intake: ChatIntake::new(),
            phase: BattlePhase::Idle,
            session: None,
            last_summary: None,
            battles_completed: 0,
        }
    }

    /// Replace the sprite catalog
    pub fn with_sprites(mut self, sprites: SpriteCatalog) -> Self {
        self.sprites = sprites;
        self
    }

    pub fn now(&self) -> f32 {
        self.arena.now()
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn session(&self) -> Option<&BattleSession> {
        self.session.as_ref()
    }

    pub fn last_summary(&self) -> Option<&BattleSummary> {
        self.last_summary.as_ref()
    }

    pub fn battles_completed(&self) -> usize {
        self.battles_completed
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    pub fn registry(&self) -> &EntityRegistry {
        self.arena.registry()
    }

    pub fn pool(&self) -> &CandidatePool {
        &self.pool
    }

    pub fn sprites(&self) -> &SpriteCatalog {
        &self.sprites
    }

    pub fn settings(&self) -> &BattleSettings {
        self.arena.settings()
    }

    pub fn record_candidate(&mut self, subscriber: Subscriber) {
        self.pool.record(subscriber);
    }

    /// Feed one chat message. A battle emote may roll a start request.
    pub fn ingest_chat(&mut self, message: &ChatMessage) -> ChatOutcome {
        let outcome = self.intake.ingest(message, &self.sprites, &mut self.pool);

        let chance = self.arena.settings().battle_spawn_chance;
        if outcome.battle_emote && self.phase == BattlePhase::Idle && chance > 0.0 {
            let roll = self.arena.rng_mut().random_f32();
            if roll < chance {
                info!(
                    "{} used a battle emote, starting a battle",
                    message.user.username
                );
                // Rejections are already logged
                let _ = self.request_start();
            }
        }

        outcome
    }

    /// Start a battle from the candidate pool. Returns the number of
    /// combatants spawned.
    pub fn request_start(&mut self) -> Result<usize, StartRejection> {
        if self.phase != BattlePhase::Idle {
            info!("Start request ignored: battle already {:?}", self.phase);
            return Err(StartRejection::NotIdle(self.phase));
        }
        let available = self.pool.count();
        if available < MIN_CANDIDATES {
            warn!(
                "Start request ignored: {} candidates, {} needed",
                available, MIN_CANDIDATES
            );
            return Err(StartRejection::NotEnoughCandidates {
                available,
                required: MIN_CANDIDATES,
            });
        }

        self.transition(BattlePhase::Spawning);

        let wanted = self.arena.settings().battle_event_participants.min(available);
        let chosen = self.pool.sample(wanted, self.arena.rng_mut());
        let assigned = self.sprites.assign(&chosen, self.arena.rng_mut());
        if assigned.is_empty() {
            warn!("No battle-eligible sprite assets, battle cancelled");
            self.transition(BattlePhase::Idle);
            return Err(StartRejection::NoBattleAssets);
        }

        let now = self.arena.now();
        let settings = self.arena.settings().clone();
        self.arena.clear_log();
        self.arena.stats_mut().start_battle(now);
        self.arena
            .log_event(BattleLogEventType::BattleEvent, "Battle started".to_string());

        let center = settings.arena_center();
        let radius = settings.arena_width.min(settings.arena_height) * SPAWN_RADIUS_FRACTION;
        let count = assigned.len();
        let mut participants = Vec::with_capacity(count);

        for (i, (subscriber, sprite)) in assigned.into_iter().enumerate() {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            let outward = Vec2::new(angle.cos(), angle.sin());
            let spin = self.arena.rng_mut().random_range(-INITIAL_SPIN, INITIAL_SPIN);
            let id = self.arena.spawn(SpawnSpec {
                subscriber,
                sprite,
                position: center + outward * radius,
                velocity: -outward * INITIAL_INWARD_SPEED,
                angular_velocity: spin,
                max_hp: settings.base_hp,
                max_mana: settings.max_mana,
            });
            participants.push(id);
        }

        info!("Battle started with {} combatants", count);
        self.session = Some(BattleSession {
            started_at: now,
            duration_limit: settings.battle_duration_secs,
            participants,
            outcome: None,
            ending_since: None,
        });
        self.arena.set_battle_active(true);
        self.transition(BattlePhase::Active);
        Ok(count)
    }

    /// Stop the running battle. Returns false when there is none.
    pub fn request_abort(&mut self) -> bool {
        if self.phase != BattlePhase::Active {
            info!("Abort request ignored: battle {:?}", self.phase);
            return false;
        }
        self.end_battle(BattleOutcome::Aborted);
        true
    }

    /// Advance the simulation by `dt` seconds of wall-clock time.
    pub fn tick(&mut self, dt: f32) -> RenderFrame {
        self.arena.advance_clock(dt);
        self.arena.run_scheduled();

        if self.phase != BattlePhase::Idle {
            self.arena.step_physics(dt);
        }
        if self.phase == BattlePhase::Active {
            self.arena.resolve();
        }
        self.arena.flush_removals();

        match self.phase {
            BattlePhase::Active => self.check_win_condition(),
            BattlePhase::Ending => self.check_grace_elapsed(),
            BattlePhase::Idle | BattlePhase::Spawning => {}
        }

        self.arena.render_frame()
    }

    pub fn render_frame(&self) -> RenderFrame {
        self.arena.render_frame()
    }

    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        self.arena.drain_events()
    }

    fn check_win_condition(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let elapsed = self.arena.now() - session.started_at;
        let registry = self.arena.registry();
        let alive = registry.alive_count();

        let outcome = if alive <= 1 {
            match registry.all_alive().next() {
                Some(survivor) => BattleOutcome::Winner(survivor.id),
                None => BattleOutcome::Draw,
            }
        } else if elapsed >= session.duration_limit {
            info!("Battle timer ran out with {} survivors", alive);
            match timeout_winner(registry) {
                Some(id) => BattleOutcome::Winner(id),
                None => BattleOutcome::Draw,
            }
        } else {
            return;
        };

        self.end_battle(outcome);
    }

    fn end_battle(&mut self, outcome: BattleOutcome) {
        let now = self.arena.now();
        self.arena.freeze_bodies();
        self.arena.set_battle_active(false);

        let started_at = self.session.as_ref().map_or(now, |s| s.started_at);
        let participants = self.session.as_ref().map_or(0, |s| s.participants.len());
        let winner_name = match outcome {
            BattleOutcome::Winner(id) => self
                .arena
                .registry()
                .get(id)
                .map(|c| c.subscriber.display_name.clone()),
            _ => None,
        };

        let message = match (&outcome, &winner_name) {
            (BattleOutcome::Winner(_), Some(name)) => format!("{} wins the battle!", name),
            (BattleOutcome::Winner(id), None) => format!("{} wins the battle!", id),
            (BattleOutcome::Draw, _) => "Battle ended in a DRAW!".to_string(),
            (BattleOutcome::Aborted, _) => "Battle aborted".to_string(),
        };
        info!("{}", message);
        self.arena.log_event(BattleLogEventType::BattleEvent, message);
        self.arena.emit(BattleEvent::BattleEnded { outcome });

        self.last_summary = Some(BattleSummary {
            outcome,
            winner_name,
            duration_secs: now - started_at,
            ranking: self.arena.stats().end_battle(now),
            participants,
        });

        if let Some(session) = self.session.as_mut() {
            session.outcome = Some(outcome);
            session.ending_since = Some(now);
        }
        self.transition(BattlePhase::Ending);
    }

    fn check_grace_elapsed(&mut self) {
        let since = self
            .session
            .as_ref()
            .and_then(|s| s.ending_since)
            .unwrap_or(self.arena.now());
        if self.arena.now() - since < VICTORY_GRACE_DURATION {
            return;
        }

        let removed = self.arena.teardown();
        debug!("Tore down {} combatants", removed.len());
        self.session = None;
        self.battles_completed += 1;
        self.transition(BattlePhase::Idle);
    }

    fn transition(&mut self, to: BattlePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        info!("Battle phase {:?} -> {:?}", from, to);
        self.phase = to;
        self.arena.emit(BattleEvent::PhaseChanged { from, to });
    }
}

/// Survivor with the most HP. Ties go to the earliest spawned.
pub fn timeout_winner(registry: &EntityRegistry) -> Option<CombatantId> {
    let mut best: Option<(CombatantId, f32, usize)> = None;
    for c in registry.all_alive() {
        let better = match best {
            None => true,
            Some((_, hp, order)) => c.hp > hp || (c.hp == hp && c.spawn_order < order),
        };
        if better {
            best = Some((c.id, c.hp, c.spawn_order));
        }
    }
    best.map(|(id, _, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller_with_candidates(n: usize) -> BattleController {
        let mut controller = BattleController::new(BattleSettings::default(), Some(11));
        for i in 0..n {
            controller.record_candidate(Subscriber::new(format!("viewer{}", i)));
        }
        controller
    }

    #[test]
    fn test_start_rejected_below_minimum() {
        let mut controller = controller_with_candidates(2);
        assert_eq!(
            controller.request_start(),
            Err(StartRejection::NotEnoughCandidates {
                available: 2,
                required: 3
            })
        );
        assert_eq!(controller.phase(), BattlePhase::Idle);
    }

    #[test]
    fn test_start_rejected_while_running() {
        let mut controller = controller_with_candidates(4);
        assert_eq!(controller.request_start(), Ok(4));
        assert_eq!(controller.phase(), BattlePhase::Active);
        assert_eq!(
            controller.request_start(),
            Err(StartRejection::NotIdle(BattlePhase::Active))
        );
        assert_eq!(controller.registry().len(), 4);
    }

    #[test]
    fn test_no_assets_returns_to_idle() {
        let mut controller = controller_with_candidates(3).with_sprites(SpriteCatalog::empty());
        assert_eq!(controller.request_start(), Err(StartRejection::NoBattleAssets));
        assert_eq!(controller.phase(), BattlePhase::Idle);
        assert!(controller.registry().is_empty());
    }

    #[test]
    fn test_spawns_on_circle_moving_inward() {
        let mut controller = controller_with_candidates(4);
        controller.request_start().unwrap();
        let center = controller.settings().arena_center();

        for c in controller.registry().all() {
            let body = c.body.unwrap();
            let position = controller.arena().physics().position(body).unwrap();
            let velocity = controller.arena().physics().velocity(body).unwrap();
            assert!((position.distance(center) - 252.0).abs() < 0.01);
            assert!(velocity.dot(center - position) > 0.0);
        }
    }

    #[test]
    fn test_abort_only_while_active() {
        let mut controller = controller_with_candidates(3);
        assert!(!controller.request_abort());
        controller.request_start().unwrap();
        assert!(controller.request_abort());
        assert_eq!(controller.phase(), BattlePhase::Ending);
        assert_eq!(
            controller.last_summary().map(|s| s.outcome),
            Some(BattleOutcome::Aborted)
        );
    }

    #[test]
    fn test_start_rejection_messages() {
        assert_eq!(
            StartRejection::NotEnoughCandidates {
                available: 1,
                required: 3
            }
            .to_string(),
            "not enough candidates (1 of 3 needed)"
        );
    }
}
