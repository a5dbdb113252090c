//! Battle logging
//!
//! Records all combat events for display and post-battle analysis.

use serde::{Deserialize, Serialize};

use super::components::CombatantId;

/// A single entry in the battle log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleLogEntry {
    /// Timestamp in wall-clock time (seconds since controller start)
    pub timestamp: f32,
    /// The type of event
    pub event_type: BattleLogEventType,
    /// Human-readable description of the event
    pub message: String,
    /// Structured damage data for aggregation (damage entries only)
    #[serde(default)]
    pub damage: Option<DamageRecord>,
}

/// Structured payload of a damage entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageRecord {
    pub attacker: Option<CombatantId>,
    pub target: CombatantId,
    pub amount: f32,
}

/// Types of battle log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleLogEventType {
    /// Damage dealt
    Damage,
    /// Healing done
    Healing,
    /// Skill cast
    SkillCast,
    /// Timed status applied
    StatusApplied,
    /// Timed status expired
    StatusExpired,
    /// Combatant died
    Death,
    /// Battle event (start, end, teardown)
    BattleEvent,
}

/// In-memory battle log storing all events
#[derive(Debug, Default)]
pub struct BattleLog {
    /// All log entries in chronological order
    pub entries: Vec<BattleLogEntry>,
}

impl BattleLog {
    /// Clear the log for a new battle
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Add a new entry to the log
    pub fn log(&mut self, timestamp: f32, event_type: BattleLogEventType, message: String) {
        self.entries.push(BattleLogEntry {
            timestamp,
            event_type,
            message,
            damage: None,
        });
    }

    /// Add a damage entry with structured data
    pub fn log_damage(
        &mut self,
        timestamp: f32,
        attacker: Option<CombatantId>,
        target: CombatantId,
        amount: f32,
        message: String,
    ) {
        self.entries.push(BattleLogEntry {
            timestamp,
            event_type: BattleLogEventType::Damage,
            message,
            damage: Some(DamageRecord {
                attacker,
                target,
                amount,
            }),
        });
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: BattleLogEventType) -> Vec<&BattleLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get only HP-changing events (damage and healing)
    pub fn hp_changes_only(&self) -> Vec<&BattleLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    BattleLogEventType::Damage | BattleLogEventType::Healing
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&BattleLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Total damage dealt by one combatant
    pub fn damage_dealt_by(&self, attacker: CombatantId) -> f32 {
        self.entries
            .iter()
            .filter_map(|e| e.damage)
            .filter(|d| d.attacker == Some(attacker))
            .map(|d| d.amount)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
