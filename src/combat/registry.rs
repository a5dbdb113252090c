//! Entity Registry
//!
//! Single source of truth for which combatants exist and for their HP, mana,
//! shield and aliveness. Other systems read combatants through shared
//! references and change them through the methods here.
//!
//! Lifecycle of an entry:
//! - **Alive**: spawned with a physics body.
//! - **Dying**: [`EntityRegistry::kill`] removed the body and queued a
//!   removal; the overlay fades the sprite out.
//! - **Destroyed**: the removal fired (or the battle was torn down) and the
//!   entry is gone.

use bevy::prelude::*;

use super::components::{Combatant, CombatantId, Subscriber, TimedEffect};
use super::constants::{INVULNERABILITY_WINDOW, REMOVAL_DELAY};
use super::physics::PhysicsWorld;
use super::skills::SkillKind;
use super::sprites::SpriteAsset;

/// Everything needed to bring a combatant into the arena.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    pub subscriber: Subscriber,
    pub sprite: SpriteAsset,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub max_hp: f32,
    pub max_mana: f32,
}

#[derive(Debug, Clone, Copy)]
struct PendingRemoval {
    id: CombatantId,
    due: f32,
}

/// Owns every live and dying combatant, in spawn order.
#[derive(Default)]
pub struct EntityRegistry {
    combatants: Vec<Combatant>,
    next_id: u32,
    spawned_this_battle: usize,
    pending_removals: Vec<PendingRemoval>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a combatant, give it a physics body and a fresh id.
    pub fn spawn(&mut self, spec: SpawnSpec, physics: &mut dyn PhysicsWorld) -> CombatantId {
        let id = CombatantId(self.next_id);
        self.next_id += 1;

        let size = spec.sprite.size();
        let body = physics.create_body(spec.position, size);
        physics.set_velocity(body, spec.velocity);
        physics.set_angular_velocity(body, spec.angular_velocity);

        self.combatants.push(Combatant {
            id,
            subscriber: spec.subscriber,
            sprite: spec.sprite.name,
            width: spec.sprite.width,
            height: spec.sprite.height,
            hp: spec.max_hp,
            max_hp: spec.max_hp,
            mana: 0.0,
            max_mana: spec.max_mana,
            body: Some(body),
            is_alive: true,
            has_shield: false,
            last_damage_time: None,
            invulnerability_window: INVULNERABILITY_WINDOW,
            effects: Vec::new(),
            died_at: None,
            spawn_order: self.spawned_this_battle,
            last_position: spec.position,
            last_angle: 0.0,
        });
        self.spawned_this_battle += 1;

        id
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id == id)
    }

    /// Live combatant by id; dead or destroyed ids yield `None`.
    pub fn get_alive(&self, id: CombatantId) -> Option<&Combatant> {
        self.get(id).filter(|c| c.is_alive)
    }

    pub fn is_alive(&self, id: CombatantId) -> bool {
        self.get_alive(id).is_some()
    }

    /// Every registered combatant (alive and dying), in spawn order.
    pub fn all(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter()
    }

    pub fn all_alive(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(|c| c.is_alive)
    }

    pub fn alive_ids(&self) -> Vec<CombatantId> {
        self.all_alive().map(|c| c.id).collect()
    }

    pub fn alive_count(&self) -> usize {
        self.all_alive().count()
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    pub fn pending_removal_count(&self) -> usize {
        self.pending_removals.len()
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Mark a combatant dead, remove its body now and queue its teardown.
    ///
    /// Idempotent: returns `false` (and does nothing) if the combatant is
    /// already dead or unknown.
    pub fn kill(&mut self, id: CombatantId, now: f32, physics: &mut dyn PhysicsWorld) -> bool {
        let Some(combatant) = self.get_mut(id) else {
            return false;
        };
        if !combatant.is_alive {
            return false;
        }

        combatant.is_alive = false;
        combatant.hp = combatant.hp.max(0.0);
        combatant.has_shield = false;
        combatant.effects.clear();
        combatant.died_at = Some(now);
        if let Some(body) = combatant.body.take() {
            if let Some(pos) = physics.position(body) {
                combatant.last_position = pos;
            }
            physics.remove_body(body);
        }

        self.pending_removals.push(PendingRemoval {
            id,
            due: now + REMOVAL_DELAY,
        });
        true
    }

    /// Subtract HP from a live combatant, clamping at zero.
    ///
    /// Returns the HP actually removed, or `None` if the target is not alive.
    pub fn reduce_hp(&mut self, id: CombatantId, amount: f32) -> Option<f32> {
        let combatant = self.get_mut(id).filter(|c| c.is_alive)?;
        let removed = amount.max(0.0).min(combatant.hp);
        combatant.hp -= removed;
        Some(removed)
    }

    /// Add HP to a live combatant, clamping at max HP.
    pub fn restore_hp(&mut self, id: CombatantId, amount: f32) -> Option<f32> {
        let combatant = self.get_mut(id).filter(|c| c.is_alive)?;
        let restored = amount.max(0.0).min(combatant.max_hp - combatant.hp);
        combatant.hp += restored;
        Some(restored)
    }

    /// Add mana to a live combatant, capped at max mana. Returns the new value.
    pub fn add_mana(&mut self, id: CombatantId, amount: f32) -> Option<f32> {
        let combatant = self.get_mut(id).filter(|c| c.is_alive)?;
        combatant.mana = (combatant.mana + amount.max(0.0)).min(combatant.max_mana);
        Some(combatant.mana)
    }

    pub fn reset_mana(&mut self, id: CombatantId) {
        if let Some(combatant) = self.get_mut(id) {
            combatant.mana = 0.0;
        }
    }

    /// Set the shield flag on a live combatant. Returns true if it changed.
    pub fn set_shield(&mut self, id: CombatantId, active: bool) -> bool {
        match self.get_mut(id).filter(|c| c.is_alive) {
            Some(combatant) if combatant.has_shield != active => {
                combatant.has_shield = active;
                true
            }
            _ => false,
        }
    }

    /// Start the post-hit invulnerability window.
    pub fn mark_hit(&mut self, id: CombatantId, now: f32) {
        if let Some(combatant) = self.get_mut(id) {
            combatant.last_damage_time = Some(now);
        }
    }

    /// Register a timed status, replacing any running one from the same skill.
    pub fn add_effect(&mut self, id: CombatantId, effect: TimedEffect) -> bool {
        let Some(combatant) = self.get_mut(id).filter(|c| c.is_alive) else {
            return false;
        };
        combatant.effects.retain(|e| e.skill != effect.skill);
        combatant.effects.push(effect);
        true
    }

    /// Remove every status that has expired by `now`.
    ///
    /// Shield expiry clears the shield flag here, once, as the entry leaves
    /// the list.
    pub fn take_expired_effects(&mut self, now: f32) -> Vec<(CombatantId, TimedEffect)> {
        let mut expired = Vec::new();
        for combatant in self.combatants.iter_mut().filter(|c| c.is_alive) {
            let id = combatant.id;
            combatant.effects.retain(|effect| {
                if effect.expires_at <= now {
                    expired.push((id, *effect));
                    false
                } else {
                    true
                }
            });
            if expired.iter().any(|(owner, e)| *owner == id && e.skill == SkillKind::Shield) {
                combatant.has_shield = false;
            }
        }
        expired
    }

    /// Copy body positions from the physics world into the registry.
    pub fn sync_from_physics(&mut self, physics: &dyn PhysicsWorld) {
        for combatant in self.combatants.iter_mut() {
            let Some(body) = combatant.body else {
                continue;
            };
            if let Some(pos) = physics.position(body) {
                combatant.last_position = pos;
            }
            if let Some(angle) = physics.angle(body) {
                combatant.last_angle = angle;
            }
        }
    }

    /// Stop every remaining body and pin it in place.
    pub fn freeze_all(&mut self, physics: &mut dyn PhysicsWorld) {
        for body in self.combatants.iter().filter_map(|c| c.body) {
            physics.set_velocity(body, Vec2::ZERO);
            physics.set_angular_velocity(body, 0.0);
            physics.set_static(body, true);
        }
    }

    /// Destroy dying combatants whose removal delay has elapsed.
    pub fn take_due_removals(
        &mut self,
        now: f32,
        physics: &mut dyn PhysicsWorld,
    ) -> Vec<CombatantId> {
        let due: Vec<CombatantId> = self
            .pending_removals
            .iter()
            .filter(|p| p.due <= now)
            .map(|p| p.id)
            .collect();

        due.into_iter()
            .filter(|id| self.destroy(*id, physics))
            .collect()
    }

    /// Remove an entry and any body it still owns. Returns false if unknown.
    pub fn destroy(&mut self, id: CombatantId, physics: &mut dyn PhysicsWorld) -> bool {
        self.pending_removals.retain(|p| p.id != id);
        let Some(index) = self.combatants.iter().position(|c| c.id == id) else {
            return false;
        };
        let combatant = self.combatants.remove(index);
        if let Some(body) = combatant.body {
            physics.remove_body(body);
        }
        true
    }

    /// Destroy every entry, returning the ids that were torn down.
    pub fn destroy_all(&mut self, physics: &mut dyn PhysicsWorld) -> Vec<CombatantId> {
        let ids: Vec<CombatantId> = self.combatants.iter().map(|c| c.id).collect();
        for id in &ids {
            self.destroy(*id, physics);
        }
        self.spawned_this_battle = 0;
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::physics::KinematicWorld;

    fn spec(name: &str, x: f32) -> SpawnSpec {
        SpawnSpec {
            subscriber: Subscriber::new(name),
            sprite: SpriteAsset::new("pepe", 60.0, 60.0),
            position: Vec2::new(x, 0.0),
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            max_hp: 100.0,
            max_mana: 100.0,
        }
    }

    #[test]
    fn test_spawn_assigns_fresh_ids_and_bodies() {
        let mut physics = KinematicWorld::new();
        let mut registry = EntityRegistry::new();

        let a = registry.spawn(spec("a", 0.0), &mut physics);
        let b = registry.spawn(spec("b", 100.0), &mut physics);

        assert_ne!(a, b);
        assert_eq!(registry.alive_count(), 2);
        assert_eq!(physics.body_count(), 2);
        assert_eq!(registry.get(b).unwrap().spawn_order, 1);
        assert_eq!(registry.get(a).unwrap().size(), 60.0);
    }

    #[test]
    fn test_kill_is_idempotent() {
        let mut physics = KinematicWorld::new();
        let mut registry = EntityRegistry::new();
        let a = registry.spawn(spec("a", 0.0), &mut physics);

        assert!(registry.kill(a, 1.0, &mut physics));
        assert!(!registry.kill(a, 2.0, &mut physics));

        let combatant = registry.get(a).unwrap();
        assert!(!combatant.is_alive);
        assert!(combatant.body.is_none());
        assert_eq!(combatant.died_at, Some(1.0));
        assert_eq!(registry.pending_removal_count(), 1);
        assert_eq!(physics.body_count(), 0);
    }

    #[test]
    fn test_hp_clamps_at_bounds() {
        let mut physics = KinematicWorld::new();
        let mut registry = EntityRegistry::new();
        let a = registry.spawn(spec("a", 0.0), &mut physics);

        assert_eq!(registry.reduce_hp(a, 150.0), Some(100.0));
        assert_eq!(registry.get(a).unwrap().hp, 0.0);

        assert_eq!(registry.restore_hp(a, 500.0), Some(100.0));
        assert_eq!(registry.get(a).unwrap().hp, 100.0);
    }

    #[test]
    fn test_dead_combatants_reject_mutation() {
        let mut physics = KinematicWorld::new();
        let mut registry = EntityRegistry::new();
        let a = registry.spawn(spec("a", 0.0), &mut physics);
        registry.kill(a, 0.0, &mut physics);

        assert_eq!(registry.reduce_hp(a, 10.0), None);
        assert_eq!(registry.restore_hp(a, 10.0), None);
        assert_eq!(registry.add_mana(a, 10.0), None);
        assert!(!registry.set_shield(a, true));
    }

    #[test]
    fn test_mana_is_capped() {
        let mut physics = KinematicWorld::new();
        let mut registry = EntityRegistry::new();
        let a = registry.spawn(spec("a", 0.0), &mut physics);

        registry.add_mana(a, 70.0);
        assert_eq!(registry.add_mana(a, 70.0), Some(100.0));
        assert!(registry.get(a).unwrap().mana_full());
    }

    #[test]
    fn test_shield_expiry_clears_flag_once() {
        let mut physics = KinematicWorld::new();
        let mut registry = EntityRegistry::new();
        let a = registry.spawn(spec("a", 0.0), &mut physics);

        registry.set_shield(a, true);
        registry.add_effect(
            a,
            TimedEffect {
                skill: SkillKind::Shield,
                expires_at: 5.0,
            },
        );

        assert!(registry.take_expired_effects(4.9).is_empty());
        assert!(registry.get(a).unwrap().has_shield);

        let expired = registry.take_expired_effects(5.0);
        assert_eq!(expired.len(), 1);
        assert!(!registry.get(a).unwrap().has_shield);
        assert!(registry.take_expired_effects(6.0).is_empty());
    }

    #[test]
    fn test_reapplied_effect_replaces_previous_entry() {
        let mut physics = KinematicWorld::new();
        let mut registry = EntityRegistry::new();
        let a = registry.spawn(spec("a", 0.0), &mut physics);

        let effect = |expires_at| TimedEffect {
            skill: SkillKind::Shield,
            expires_at,
        };
        registry.add_effect(a, effect(5.0));
        registry.add_effect(a, effect(8.0));

        let combatant = registry.get(a).unwrap();
        assert_eq!(combatant.effects.len(), 1);
        assert_eq!(combatant.effects[0].expires_at, 8.0);
    }

    #[test]
    fn test_due_removals_destroy_entries() {
        let mut physics = KinematicWorld::new();
        let mut registry = EntityRegistry::new();
        let a = registry.spawn(spec("a", 0.0), &mut physics);
        let b = registry.spawn(spec("b", 100.0), &mut physics);
        registry.kill(a, 0.0, &mut physics);

        assert!(registry.take_due_removals(REMOVAL_DELAY * 0.5, &mut physics).is_empty());
        assert_eq!(registry.take_due_removals(REMOVAL_DELAY, &mut physics), vec![a]);
        assert!(registry.get(a).is_none());
        assert!(registry.get(b).is_some());
    }

    #[test]
    fn test_destroy_all_releases_every_body() {
        let mut physics = KinematicWorld::new();
        let mut registry = EntityRegistry::new();
        registry.spawn(spec("a", 0.0), &mut physics);
        let b = registry.spawn(spec("b", 100.0), &mut physics);
        registry.kill(b, 0.0, &mut physics);

        let torn_down = registry.destroy_all(&mut physics);
        assert_eq!(torn_down.len(), 2);
        assert!(registry.is_empty());
        assert_eq!(registry.pending_removal_count(), 0);
        assert_eq!(physics.body_count(), 0);
    }
}
