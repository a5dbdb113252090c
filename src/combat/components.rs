//! Combatant data and shared simulation resources
//!
//! This module contains the plain data types that flow through the battle
//! simulation: combatant identity and stats, timed status entries, the seeded
//! RNG and the time-scale hold counter used by time-freezing skills.

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::physics::BodyHandle;
use super::skills::SkillKind;

// ============================================================================
// Identity
// ============================================================================

/// Opaque combatant identifier, unique for the lifetime of a controller.
///
/// Ids are handed out in spawn order, so comparing two ids also compares
/// their spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(pub u32);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "combatant-{}", self.0)
    }
}

/// The chat participant a combatant represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Lowercase login name, used as the pool key
    pub username: String,
    /// Name shown on the overlay
    pub display_name: String,
    /// Chat color as a hex string (e.g. "#FF4500"), if the user set one
    #[serde(default)]
    pub color: Option<String>,
}

impl Subscriber {
    pub fn new(username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            display_name: username.clone(),
            username: username.to_lowercase(),
            color: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

// ============================================================================
// Status Effects
// ============================================================================

/// A timed status registered by a skill that declares a duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedEffect {
    /// Skill that applied the status
    pub skill: SkillKind,
    /// Wall-clock time (seconds) at which the status expires
    pub expires_at: f32,
}

// ============================================================================
// Combatant
// ============================================================================

/// One battling entity.
///
/// Fields are readable by everyone but only the
/// [`EntityRegistry`](super::registry::EntityRegistry) hands out mutable
/// access, so HP, mana and aliveness change through its contract alone.
#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: CombatantId,
    pub subscriber: Subscriber,
    /// Name of the sprite asset drawn for this combatant
    pub sprite: String,
    pub width: f32,
    pub height: f32,

    pub hp: f32,
    pub max_hp: f32,
    pub mana: f32,
    pub max_mana: f32,

    /// Physics body; `None` once the body has been removed
    pub body: Option<BodyHandle>,
    pub is_alive: bool,
    pub has_shield: bool,
    /// Wall-clock time of the last collision hit taken
    pub last_damage_time: Option<f32>,
    /// Post-hit window during which collisions deal no damage
    pub invulnerability_window: f32,
    pub effects: Vec<TimedEffect>,

    /// Wall-clock time of death
    pub died_at: Option<f32>,
    /// 0-based spawn order within the battle
    pub spawn_order: usize,
    /// Last position read from the physics body (kept after the body is gone)
    pub last_position: Vec2,
    pub last_angle: f32,
}

impl Combatant {
    /// Collision size derived from the sprite dimensions.
    pub fn size(&self) -> f32 {
        (self.width + self.height) / 2.0
    }

    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp <= 0.0 {
            0.0
        } else {
            self.hp / self.max_hp
        }
    }

    /// Whether mana is full and a skill should fire.
    pub fn mana_full(&self) -> bool {
        self.is_alive && self.mana >= self.max_mana
    }

    /// Whether a collision at `now` may damage this combatant.
    pub fn is_vulnerable(&self, now: f32) -> bool {
        match self.last_damage_time {
            Some(last) => now - last >= self.invulnerability_window,
            None => true,
        }
    }

    pub fn has_effect(&self, skill: SkillKind) -> bool {
        self.effects.iter().any(|e| e.skill == skill)
    }
}

// ============================================================================
// Resources
// ============================================================================

/// Seeded random number generator for deterministic battle simulation.
///
/// When a seed is provided (e.g., via headless config), the same seed and
/// the same chat script always produce the same battle outcome. Without a
/// seed, uses system entropy.
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Generate a random f32 in the given range
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.random_f32() * (max - min)
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Up to `amount` distinct indices from `0..len`, in random order.
    pub fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        let amount = amount.min(len);
        rand::seq::index::sample(&mut self.rng, len, amount).into_vec()
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// Random unit vector, used when two bodies overlap exactly.
    pub fn unit_vector(&mut self) -> Vec2 {
        let angle = self.random_f32() * std::f32::consts::TAU;
        Vec2::new(angle.cos(), angle.sin())
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Shared time-scale multiplier for the physics clock.
///
/// Skills that "freeze time" take a hold; the scale is 0 while any hold is
/// outstanding and 1 otherwise. Wall-clock timers are unaffected.
#[derive(Debug, Default, Clone)]
pub struct TimeScale {
    holds: u32,
}

impl TimeScale {
    pub fn value(&self) -> f32 {
        if self.holds > 0 {
            0.0
        } else {
            1.0
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.holds > 0
    }

    pub fn holds(&self) -> u32 {
        self.holds
    }

    /// Take a freeze hold. Returns true if this froze a running clock.
    pub fn freeze(&mut self) -> bool {
        self.holds += 1;
        self.holds == 1
    }

    /// Release one hold. Returns true if this resumed the clock.
    pub fn release(&mut self) -> bool {
        if self.holds == 0 {
            return false;
        }
        self.holds -= 1;
        self.holds == 0
    }

    /// Drop every hold. Returns true if the clock was frozen.
    pub fn reset(&mut self) -> bool {
        let was_frozen = self.holds > 0;
        self.holds = 0;
        was_frozen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_scale_holds_nest() {
        let mut scale = TimeScale::default();
        assert_eq!(scale.value(), 1.0);

        assert!(scale.freeze());
        assert!(!scale.freeze());
        assert_eq!(scale.value(), 0.0);

        assert!(!scale.release());
        assert_eq!(scale.value(), 0.0);
        assert!(scale.release());
        assert_eq!(scale.value(), 1.0);

        // Extra releases are ignored
        assert!(!scale.release());
        assert_eq!(scale.holds(), 0);
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let mut a = GameRng::from_seed(7);
        let mut b = GameRng::from_seed(7);
        for _ in 0..10 {
            assert_eq!(a.random_f32(), b.random_f32());
        }
        assert_eq!(a.sample_indices(10, 4), b.sample_indices(10, 4));
    }

    #[test]
    fn test_sample_indices_clamps_to_len() {
        let mut rng = GameRng::from_seed(1);
        let picked = rng.sample_indices(2, 5);
        assert_eq!(picked.len(), 2);
        assert_ne!(picked[0], picked[1]);
    }

    #[test]
    fn test_subscriber_username_is_lowercased() {
        let sub = Subscriber::new("SomeViewer");
        assert_eq!(sub.username, "someviewer");
        assert_eq!(sub.display_name, "SomeViewer");
    }
}
