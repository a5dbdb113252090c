//! Arena
//!
//! The simulation context: registry, physics world, scheduler, time scale,
//! statistics, battle log and RNG for one overlay. There is exactly one per
//! [`BattleController`](super::controller::BattleController) and nothing
//! reaches it through globals.
//!
//! Two clocks run side by side. The wall clock (`now`) advances with real
//! frame time and drives the scheduler, invulnerability, status expiry and
//! the battle timer. The physics clock advances by `dt * time_scale` and is
//! the only thing a freeze stops.
//!
//! Skills and the resolver receive a [`CombatContext`], a bundle of
//! disjoint borrows into the arena with the shared combat primitives
//! (damage, heal, kill, teleport, freeze) defined on it.

use bevy::prelude::*;

use super::components::{Combatant, CombatantId, GameRng, TimeScale};
use super::constants::{MANA_PER_DAMAGE, MANA_PER_HIT, SHIELD_DAMAGE_MULTIPLIER};
use super::events::{BattleEvent, DeathCause};
use super::log::{BattleLog, BattleLogEventType};
use super::physics::{KinematicWorld, PhysicsWorld};
use super::registry::{EntityRegistry, SpawnSpec};
use super::render::RenderFrame;
use super::resolver;
use super::scheduler::Scheduler;
use super::skills::{self, DeferredAction, SkillCatalog};
use super::stats::StatsTracker;
use super::targeting::{self, Snapshots};
use crate::settings::BattleSettings;

/// Upper bound on scheduler passes per tick (actions scheduled with zero
/// delay run in the same tick)
const MAX_SCHEDULER_PASSES: usize = 8;

pub struct Arena {
    registry: EntityRegistry,
    physics: Box<dyn PhysicsWorld>,
    scheduler: Scheduler<DeferredAction>,
    time_scale: TimeScale,
    stats: StatsTracker,
    log: BattleLog,
    events: Vec<BattleEvent>,
    rng: GameRng,
    settings: BattleSettings,
    catalog: SkillCatalog,
    now: f32,
    battle_active: bool,
}

impl Arena {
    pub fn new(settings: BattleSettings, rng: GameRng) -> Self {
        Self::with_physics(settings, rng, Box::new(KinematicWorld::new()))
    }

    pub fn with_physics(
        settings: BattleSettings,
        rng: GameRng,
        physics: Box<dyn PhysicsWorld>,
    ) -> Self {
        let catalog = SkillCatalog::from_toggles(&settings.skills);
        Self {
            registry: EntityRegistry::new(),
            physics,
            scheduler: Scheduler::new(),
            time_scale: TimeScale::default(),
            stats: StatsTracker::new(),
            log: BattleLog::default(),
            events: Vec::new(),
            rng,
            settings,
            catalog,
            now: 0.0,
            battle_active: false,
        }
    }

    pub fn now(&self) -> f32 {
        self.now
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn physics(&self) -> &dyn PhysicsWorld {
        &*self.physics
    }

    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut StatsTracker {
        &mut self.stats
    }

    pub fn log(&self) -> &BattleLog {
        &self.log
    }

    pub fn settings(&self) -> &BattleSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &SkillCatalog {
        &self.catalog
    }

    pub fn time_scale(&self) -> &TimeScale {
        &self.time_scale
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduler.len()
    }

    pub fn rng_mut(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    pub fn is_battle_active(&self) -> bool {
        self.battle_active
    }

    pub fn set_battle_active(&mut self, active: bool) {
        self.battle_active = active;
    }

    /// Bring a combatant into the arena and register it for statistics.
    pub fn spawn(&mut self, spec: SpawnSpec) -> CombatantId {
        let name = spec.subscriber.display_name.clone();
        let sprite = spec.sprite.name.clone();
        let position = spec.position;
        let id = self.registry.spawn(spec, &mut *self.physics);

        self.stats.register(id, name.clone());
        self.log.log(
            self.now,
            BattleLogEventType::BattleEvent,
            format!("{} enters the arena as {}", name, sprite),
        );
        self.events.push(BattleEvent::Spawned {
            id,
            name,
            sprite,
            position,
        });
        id
    }

    pub fn context(&mut self) -> CombatContext<'_> {
        CombatContext {
            registry: &mut self.registry,
            physics: &mut *self.physics,
            scheduler: &mut self.scheduler,
            time_scale: &mut self.time_scale,
            stats: &mut self.stats,
            log: &mut self.log,
            events: &mut self.events,
            rng: &mut self.rng,
            settings: &self.settings,
            catalog: &self.catalog,
            now: self.now,
            battle_active: self.battle_active,
        }
    }

    /// Advance the wall clock. Never affected by the time scale.
    pub fn advance_clock(&mut self, dt: f32) {
        self.now += dt.max(0.0);
    }

    /// Run every scheduled action whose due time has passed. Returns the
    /// number of actions run.
    pub fn run_scheduled(&mut self) -> usize {
        let mut ran = 0;
        for _ in 0..MAX_SCHEDULER_PASSES {
            let due = self.scheduler.take_due(self.now);
            if due.is_empty() {
                break;
            }
            ran += due.len();
            let mut ctx = self.context();
            for action in due {
                skills::resolve_deferred(action, &mut ctx);
            }
        }
        ran
    }

    /// Advance the physics clock by `dt` scaled by the time scale.
    pub fn step_physics(&mut self, dt: f32) {
        let scaled = dt.max(0.0) * self.time_scale.value();
        self.physics.step(scaled);
        self.registry.sync_from_physics(&*self.physics);
    }

    /// Boundaries, collisions, skill triggers, status expiry and attraction.
    pub fn resolve(&mut self) {
        let mut ctx = self.context();
        resolver::resolve_tick(&mut ctx);
    }

    /// Destroy combatants whose removal delay has elapsed.
    pub fn flush_removals(&mut self) -> Vec<CombatantId> {
        let removed = self.registry.take_due_removals(self.now, &mut *self.physics);
        for id in &removed {
            self.events.push(BattleEvent::Despawned { id: *id });
        }
        removed
    }

    /// Make every remaining body static for the victory pose.
    pub fn freeze_bodies(&mut self) {
        self.registry.freeze_all(&mut *self.physics);
    }

    /// Drop every combatant, pending action and time-scale hold.
    pub fn teardown(&mut self) -> Vec<CombatantId> {
        let removed = self.registry.destroy_all(&mut *self.physics);
        for id in &removed {
            self.events.push(BattleEvent::Despawned { id: *id });
        }
        self.scheduler.clear();
        if self.time_scale.reset() {
            self.events.push(BattleEvent::TimeScaleChanged { scale: 1.0 });
        }
        self.battle_active = false;
        removed
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    pub fn log_event(&mut self, event_type: BattleLogEventType, message: String) {
        self.log.log(self.now, event_type, message);
    }

    pub fn emit(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn pending_events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn render_frame(&self) -> RenderFrame {
        RenderFrame::capture(&self.registry, self.now, self.time_scale.value())
    }
}

/// Borrowed view of the arena handed to the resolver and to skills.
pub struct CombatContext<'a> {
    pub registry: &'a mut EntityRegistry,
    pub physics: &'a mut dyn PhysicsWorld,
    pub scheduler: &'a mut Scheduler<DeferredAction>,
    pub time_scale: &'a mut TimeScale,
    pub stats: &'a mut StatsTracker,
    pub log: &'a mut BattleLog,
    pub events: &'a mut Vec<BattleEvent>,
    pub rng: &'a mut GameRng,
    pub settings: &'a BattleSettings,
    pub catalog: &'a SkillCatalog,
    /// Wall-clock time of this tick
    pub now: f32,
    pub battle_active: bool,
}

impl<'a> CombatContext<'a> {
    pub fn is_alive(&self, id: CombatantId) -> bool {
        self.registry.is_alive(id)
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.registry.get(id)
    }

    pub fn name_of(&self, id: CombatantId) -> String {
        self.registry
            .get(id)
            .map(|c| c.subscriber.display_name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Current physics position of a living combatant
    pub fn position(&self, id: CombatantId) -> Option<Vec2> {
        self.registry
            .get_alive(id)
            .and_then(|c| c.body)
            .and_then(|body| self.physics.position(body))
    }

    pub fn size_of(&self, id: CombatantId) -> f32 {
        self.registry.get(id).map_or(0.0, |c| c.size())
    }

    /// Living combatants other than `exclude`
    pub fn enemies(&self, exclude: &[CombatantId]) -> Snapshots {
        targeting::alive_bodies(&*self.registry, &*self.physics, exclude)
    }

    pub fn emit(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn log_event(&mut self, event_type: BattleLogEventType, message: String) {
        self.log.log(self.now, event_type, message);
    }

    /// Queue an action `delay` wall-clock seconds from now
    pub fn schedule(&mut self, delay: f32, action: DeferredAction) {
        self.scheduler.schedule(self.now + delay.max(0.0), action);
    }

    /// Take a hold on the time scale
    pub fn freeze_time(&mut self) {
        if self.time_scale.freeze() {
            debug!("Physics frozen");
            self.events.push(BattleEvent::TimeScaleChanged { scale: 0.0 });
        }
    }

    /// Give back a hold taken with [`Self::freeze_time`]
    pub fn release_time(&mut self) {
        if self.time_scale.release() {
            debug!("Physics resumed");
            self.events.push(BattleEvent::TimeScaleChanged { scale: 1.0 });
        }
    }

    pub fn apply_force(&mut self, id: CombatantId, force: Vec2) {
        if let Some(body) = self.registry.get_alive(id).and_then(|c| c.body) {
            self.physics.apply_force(body, force);
        }
    }

    /// Move a living combatant's body. Returns false if it has none.
    pub fn teleport(&mut self, id: CombatantId, to: Vec2) -> bool {
        let Some(body) = self.registry.get_alive(id).and_then(|c| c.body) else {
            return false;
        };
        let from = self.physics.position(body).unwrap_or(to);
        self.physics.set_position(body, to);
        self.physics.set_velocity(body, Vec2::ZERO);
        self.events.push(BattleEvent::Teleported { id, from, to });
        true
    }

    /// Damage a living target. The shield halves the amount. Kills the target
    /// when HP reaches zero. With `grant_mana`, a living attacker gains mana
    /// from the hit.
    pub fn deal_damage(
        &mut self,
        target: CombatantId,
        amount: f32,
        attacker: Option<CombatantId>,
        grant_mana: bool,
    ) -> Option<f32> {
        self.apply_damage(target, amount, attacker, grant_mana, false)
    }

    /// Reduce a living target straight to zero HP, ignoring its shield.
    pub fn strike_lethal(
        &mut self,
        target: CombatantId,
        attacker: Option<CombatantId>,
    ) -> Option<f32> {
        let hp = self.registry.get_alive(target)?.hp;
        self.apply_damage(target, hp, attacker, false, true)
    }

    fn apply_damage(
        &mut self,
        target: CombatantId,
        amount: f32,
        attacker: Option<CombatantId>,
        grant_mana: bool,
        pierce_shield: bool,
    ) -> Option<f32> {
        let shielded = self.registry.get_alive(target)?.has_shield && !pierce_shield;
        let amount = if shielded {
            amount * SHIELD_DAMAGE_MULTIPLIER
        } else {
            amount
        };

        let dealt = self.registry.reduce_hp(target, amount)?;
        let hp = self.registry.get(target).map_or(0.0, |c| c.hp);

        self.stats.record_damage(attacker, target, dealt, self.now);
        let message = match attacker {
            Some(a) => format!(
                "{} hits {} for {:.0}{}",
                self.name_of(a),
                self.name_of(target),
                dealt,
                if shielded { " (shielded)" } else { "" }
            ),
            None => format!("{} takes {:.0} damage", self.name_of(target), dealt),
        };
        self.log.log_damage(self.now, attacker, target, dealt, message);
        self.events.push(BattleEvent::Damaged {
            target,
            attacker,
            amount: dealt,
            hp,
            shielded,
        });

        if hp <= 0.0 {
            self.kill(target, attacker, DeathCause::Damage);
        }

        if grant_mana {
            if let Some(attacker) = attacker {
                self.registry.add_mana(attacker, MANA_PER_HIT + amount * MANA_PER_DAMAGE);
            }
        }

        Some(dealt)
    }

    /// Restore HP to a living combatant, capped at max HP.
    pub fn heal(&mut self, target: CombatantId, amount: f32) -> Option<f32> {
        let healed = self.registry.restore_hp(target, amount)?;
        let hp = self.registry.get(target).map_or(0.0, |c| c.hp);
        let message = format!("{} heals for {:.0}", self.name_of(target), healed);
        self.log.log(self.now, BattleLogEventType::Healing, message);
        self.events.push(BattleEvent::Healed {
            target,
            amount: healed,
            hp,
        });
        Some(healed)
    }

    /// Kill a combatant once. Later calls for the same id do nothing and
    /// return false.
    pub fn kill(
        &mut self,
        id: CombatantId,
        killer: Option<CombatantId>,
        cause: DeathCause,
    ) -> bool {
        if !self.registry.kill(id, self.now, &mut *self.physics) {
            return false;
        }

        self.stats.record_kill(killer, id, self.now);
        let victim = self.name_of(id);
        let message = match (cause, killer) {
            (DeathCause::OutOfBounds, _) => format!("{} was thrown out of the arena", victim),
            (DeathCause::Damage, Some(k)) => {
                format!("{} was defeated by {}", victim, self.name_of(k))
            }
            (DeathCause::Damage, None) => format!("{} was defeated", victim),
        };
        info!("{}", message);
        self.log.log(self.now, BattleLogEventType::Death, message);
        self.events.push(BattleEvent::Killed { id, killer, cause });
        true
    }
}
