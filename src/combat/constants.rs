//! Combat Constants
//!
//! Centralized location for fixed tuning values used throughout the battle
//! system. Values that streamers are expected to change live in
//! [`BattleSettings`](crate::settings::BattleSettings) instead.

// ============================================================================
// Battle Flow
// ============================================================================

/// Minimum Candidate Pool size required to start a battle.
pub const MIN_CANDIDATES: usize = 3;

/// Maximum number of participants the Candidate Pool remembers.
pub const CANDIDATE_POOL_CAPACITY: usize = 50;

/// Delay between a combatant dying and its registry entry being destroyed
/// (the fade-out window on the overlay), in seconds.
pub const REMOVAL_DELAY: f32 = 1.0;

/// Time the outcome stays on screen before the arena is torn down, in seconds.
pub const VICTORY_GRACE_DURATION: f32 = 5.0;

// ============================================================================
// Spawning
// ============================================================================

/// Spawn circle radius as a fraction of the smaller arena dimension.
pub const SPAWN_RADIUS_FRACTION: f32 = 0.35;

/// Initial inward speed given to freshly spawned combatants (units/s).
pub const INITIAL_INWARD_SPEED: f32 = 140.0;

/// Initial spin given to freshly spawned combatants (rad/s).
pub const INITIAL_SPIN: f32 = 1.5;

// ============================================================================
// Collisions
// ============================================================================

/// Extra distance added to the summed half-sizes when testing contact.
pub const COLLISION_MARGIN: f32 = 4.0;

/// Post-hit invulnerability window in seconds.
pub const INVULNERABILITY_WINDOW: f32 = 0.5;

/// Collision damage roll range, as multipliers of base damage.
pub const DAMAGE_ROLL_MIN: f32 = 0.8;
pub const DAMAGE_ROLL_MAX: f32 = 1.2;

/// Repulsion force per unit of summed size when two combatants touch.
pub const REPULSION_PER_SIZE: f32 = 90.0;

// ============================================================================
// Mana
// ============================================================================

/// Flat mana gained per damaging hit.
pub const MANA_PER_HIT: f32 = 10.0;

/// Additional mana gained per point of damage dealt.
pub const MANA_PER_DAMAGE: f32 = 0.2;

// ============================================================================
// Attraction
// ============================================================================

/// Pairwise attraction force between living combatants.
pub const ATTRACTION_FORCE: f32 = 60.0;

/// Attraction multiplier applied when exactly two combatants remain.
pub const DUEL_ATTRACTION_MULTIPLIER: f32 = 6.0;

// ============================================================================
// Skills
// ============================================================================

/// Fraction of max HP restored by Heal.
pub const HEAL_FRACTION: f32 = 0.3;

/// How long the heal glow is shown (visual only).
pub const HEAL_GLOW_DURATION: f32 = 1.0;

/// Shield lifetime in seconds.
pub const SHIELD_DURATION: f32 = 5.0;

/// Incoming damage multiplier while shielded.
pub const SHIELD_DAMAGE_MULTIPLIER: f32 = 0.5;

/// Lightning Chain damage of the first hop.
pub const LIGHTNING_BASE_DAMAGE: f32 = 40.0;

/// Damage multipliers for each Lightning Chain hop.
pub const LIGHTNING_HOP_MULTIPLIERS: [f32; 3] = [1.0, 0.66, 0.33];

/// Delay between Lightning Chain hops in seconds.
pub const LIGHTNING_HOP_DELAY: f32 = 0.15;

/// Beam charge window (arena frozen) in seconds.
pub const BEAM_CHARGE_DURATION: f32 = 1.5;

/// How long the beam keeps dealing damage once fired.
pub const BEAM_FIRE_DURATION: f32 = 1.0;

/// Interval between beam damage ticks.
pub const BEAM_TICK_INTERVAL: f32 = 0.1;

/// Damage dealt per beam tick to everyone inside the corridor.
pub const BEAM_TICK_DAMAGE: f32 = 6.0;

/// Beam length along its axis.
pub const BEAM_LENGTH: f32 = 1600.0;

/// Half-width of the beam corridor (target half-size is added on top).
pub const BEAM_HALF_WIDTH: f32 = 40.0;

/// Gap left between the teleported caster and the farthest enemy.
pub const BEAM_TELEPORT_GAP: f32 = 10.0;

/// Delay before Execute resolves, in seconds.
pub const EXECUTE_DELAY: f32 = 3.0;

/// Delay between the Knockback freeze and the blast, in seconds.
pub const KNOCKBACK_DELAY: f32 = 1.0;

/// Flat damage dealt by the Knockback blast.
pub const KNOCKBACK_DAMAGE: f32 = 35.0;

/// Base outward force of the Knockback blast at the reference distance.
pub const KNOCKBACK_FORCE: f32 = 60_000.0;

/// Distance at which the Knockback force equals [`KNOCKBACK_FORCE`].
pub const KNOCKBACK_REFERENCE_DISTANCE: f32 = 200.0;

/// Clamp on the inverse-distance scale of the Knockback force.
pub const KNOCKBACK_SCALE_MIN: f32 = 0.25;
pub const KNOCKBACK_SCALE_MAX: f32 = 3.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lightning_hops_decrease() {
        for pair in LIGHTNING_HOP_MULTIPLIERS.windows(2) {
            assert!(pair[0] > pair[1]);
        }
    }

    #[test]
    fn test_damage_roll_range_is_valid() {
        assert!(DAMAGE_ROLL_MIN > 0.0);
        assert!(DAMAGE_ROLL_MIN < DAMAGE_ROLL_MAX);
    }

    #[test]
    fn test_beam_ticks_fit_fire_window() {
        let ticks = (BEAM_FIRE_DURATION / BEAM_TICK_INTERVAL).round() as u32;
        assert_eq!(ticks, 10);
    }
}
