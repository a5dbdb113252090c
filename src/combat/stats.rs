//! Statistics Tracker
//!
//! Accumulates damage, kills and deaths per combatant for one battle and
//! produces the ranked DPS summary shown after the outcome.
//!
//! The resolver reports events synchronously as they happen. Unknown ids are
//! ignored, so the ranking always contains exactly the registered (spawned)
//! combatants.

use serde::{Deserialize, Serialize};

use super::components::CombatantId;

/// One timestamped entry in a combatant's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatEvent {
    DamageDealt { target: CombatantId, amount: f32, at: f32 },
    DamageTaken { attacker: Option<CombatantId>, amount: f32, at: f32 },
    Kill { victim: CombatantId, at: f32 },
    Death { killer: Option<CombatantId>, at: f32 },
}

/// Per-combatant accumulator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatEntry {
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub kills: u32,
    pub deaths: u32,
    pub events: Vec<StatEvent>,
    pub death_time: Option<f32>,
}

/// A combatant's line in the post-battle ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStat {
    /// 1-based rank
    pub rank: usize,
    pub id: CombatantId,
    pub name: String,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub kills: u32,
    pub deaths: u32,
    /// Seconds alive during the battle
    pub survival_secs: f32,
    pub dps: f32,
    pub kda: f32,
    pub survived: bool,
}

#[derive(Debug, Default)]
pub struct StatsTracker {
    entries: Vec<(CombatantId, String, StatEntry)>,
    started_at: f32,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every accumulator for a new battle starting at `at`.
    pub fn start_battle(&mut self, at: f32) {
        self.entries.clear();
        self.started_at = at;
    }

    /// Start tracking a spawned combatant.
    pub fn register(&mut self, id: CombatantId, name: impl Into<String>) {
        if self.entry_mut(id).is_none() {
            self.entries.push((id, name.into(), StatEntry::default()));
        }
    }

    pub fn entry(&self, id: CombatantId) -> Option<&StatEntry> {
        self.entries
            .iter()
            .find(|(entry_id, _, _)| *entry_id == id)
            .map(|(_, _, entry)| entry)
    }

    fn entry_mut(&mut self, id: CombatantId) -> Option<&mut StatEntry> {
        self.entries
            .iter_mut()
            .find(|(entry_id, _, _)| *entry_id == id)
            .map(|(_, _, entry)| entry)
    }

    pub fn tracked_count(&self) -> usize {
        self.entries.len()
    }

    pub fn record_damage(
        &mut self,
        attacker: Option<CombatantId>,
        target: CombatantId,
        amount: f32,
        at: f32,
    ) {
        if let Some(attacker) = attacker {
            if let Some(entry) = self.entry_mut(attacker) {
                entry.damage_dealt += amount;
                entry.events.push(StatEvent::DamageDealt { target, amount, at });
            }
        }
        if let Some(entry) = self.entry_mut(target) {
            entry.damage_taken += amount;
            entry.events.push(StatEvent::DamageTaken { attacker, amount, at });
        }
    }

    /// Record a death, crediting `killer` if there was one.
    pub fn record_kill(&mut self, killer: Option<CombatantId>, victim: CombatantId, at: f32) {
        if let Some(killer) = killer.filter(|k| *k != victim) {
            if let Some(entry) = self.entry_mut(killer) {
                entry.kills += 1;
                entry.events.push(StatEvent::Kill { victim, at });
            }
        }
        if let Some(entry) = self.entry_mut(victim) {
            entry.deaths += 1;
            entry.death_time.get_or_insert(at);
            entry.events.push(StatEvent::Death { killer, at });
        }
    }

    /// Produce the ranking for a battle that ended at `at`.
    ///
    /// DPS uses time alive: survival time for the dead, full battle length
    /// for survivors. Sorted by DPS descending; ties keep spawn order.
    pub fn end_battle(&self, at: f32) -> Vec<RankedStat> {
        let battle_secs = (at - self.started_at).max(0.0);

        let mut ranking: Vec<RankedStat> = self
            .entries
            .iter()
            .map(|(id, name, entry)| {
                let survival_secs = match entry.death_time {
                    Some(died) => (died - self.started_at).clamp(0.0, battle_secs),
                    None => battle_secs,
                };
                let dps = if survival_secs > 0.0 {
                    entry.damage_dealt / survival_secs
                } else {
                    0.0
                };
                RankedStat {
                    rank: 0,
                    id: *id,
                    name: name.clone(),
                    damage_dealt: entry.damage_dealt,
                    damage_taken: entry.damage_taken,
                    kills: entry.kills,
                    deaths: entry.deaths,
                    survival_secs,
                    dps,
                    kda: entry.kills as f32 / entry.deaths.max(1) as f32,
                    survived: entry.death_time.is_none(),
                }
            })
            .collect();

        // sort_by is stable, so equal DPS keeps insertion order
        ranking.sort_by(|a, b| b.dps.total_cmp(&a.dps));
        for (i, stat) in ranking.iter_mut().enumerate() {
            stat.rank = i + 1;
        }
        ranking
    }
}
