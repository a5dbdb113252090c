//! Battle settings
//!
//! Streamer-tunable values read by the Battle Controller and Combat Resolver.
//! Stored as RON next to the executable; a missing or broken file falls back
//! to defaults.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::combat::skills::SkillKind;

/// Default settings file name
pub const SETTINGS_FILE: &str = "battle_settings.ron";

/// Battle configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleSettings {
    /// Battle length before the timeout outcome, in seconds
    pub battle_duration_secs: f32,
    /// Maximum number of combatants spawned per battle
    pub battle_event_participants: usize,
    /// Starting (and maximum) HP of every combatant
    pub base_hp: f32,
    /// Collision damage before the random roll
    pub base_damage: f32,
    /// Mana needed to cast a skill
    pub max_mana: f32,
    /// Chance that a chat message using a battle emote starts a battle
    pub battle_spawn_chance: f32,
    /// Arena size in overlay pixels
    pub arena_width: f32,
    pub arena_height: f32,
    pub skills: SkillToggles,
}

impl Default for BattleSettings {
    fn default() -> Self {
        Self {
            battle_duration_secs: 60.0,
            battle_event_participants: 8,
            base_hp: 100.0,
            base_damage: 10.0,
            max_mana: 100.0,
            battle_spawn_chance: 0.0,
            arena_width: 1280.0,
            arena_height: 720.0,
            skills: SkillToggles::default(),
        }
    }
}

/// Per-skill enable switches
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillToggles {
    pub heal: bool,
    pub shield: bool,
    pub lightning_chain: bool,
    pub beam: bool,
    pub execute: bool,
    pub knockback: bool,
}

impl Default for SkillToggles {
    fn default() -> Self {
        Self {
            heal: true,
            shield: true,
            lightning_chain: true,
            beam: true,
            execute: true,
            knockback: true,
        }
    }
}

impl SkillToggles {
    pub fn all_disabled() -> Self {
        Self {
            heal: false,
            shield: false,
            lightning_chain: false,
            beam: false,
            execute: false,
            knockback: false,
        }
    }

    /// Only the given skill enabled
    pub fn only(skill: SkillKind) -> Self {
        let mut toggles = Self::all_disabled();
        toggles.set(skill, true);
        toggles
    }

    pub fn is_enabled(&self, skill: SkillKind) -> bool {
        match skill {
            SkillKind::Heal => self.heal,
            SkillKind::Shield => self.shield,
            SkillKind::LightningChain => self.lightning_chain,
            SkillKind::Beam => self.beam,
            SkillKind::Execute => self.execute,
            SkillKind::Knockback => self.knockback,
        }
    }

    pub fn set(&mut self, skill: SkillKind, enabled: bool) {
        let flag = match skill {
            SkillKind::Heal => &mut self.heal,
            SkillKind::Shield => &mut self.shield,
            SkillKind::LightningChain => &mut self.lightning_chain,
            SkillKind::Beam => &mut self.beam,
            SkillKind::Execute => &mut self.execute,
            SkillKind::Knockback => &mut self.knockback,
        };
        *flag = enabled;
    }
}

impl BattleSettings {
    /// Get the path to the default settings file
    pub fn settings_path() -> PathBuf {
        PathBuf::from(SETTINGS_FILE)
    }

    /// Load settings from `path`, or return defaults if it is missing or invalid
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::read(path) {
            Ok(settings) => {
                info!("Loaded battle settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Read and validate a settings file
    pub fn read(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings file {:?}: {}", path, e))?;
        let settings: BattleSettings = ron::from_str(&contents)
            .map_err(|e| format!("Failed to parse settings file {:?}: {}", path, e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, contents)?;
        info!("Saved battle settings to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.battle_duration_secs <= 0.0 {
            return Err("battle_duration_secs must be positive".to_string());
        }
        if self.battle_event_participants == 0 {
            return Err("battle_event_participants must be at least 1".to_string());
        }
        if self.base_hp <= 0.0 {
            return Err("base_hp must be positive".to_string());
        }
        if self.base_damage < 0.0 {
            return Err("base_damage must not be negative".to_string());
        }
        if self.max_mana <= 0.0 {
            return Err("max_mana must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.battle_spawn_chance) {
            return Err("battle_spawn_chance must be between 0 and 1".to_string());
        }
        if self.arena_width <= 0.0 || self.arena_height <= 0.0 {
            return Err("arena dimensions must be positive".to_string());
        }
        Ok(())
    }

    pub fn arena_center(&self) -> Vec2 {
        Vec2::new(self.arena_width / 2.0, self.arena_height / 2.0)
    }
}
