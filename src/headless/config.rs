//! JSON configuration parsing for headless mode
//!
//! A headless run is a scripted chat session: timed chat lines feed the
//! candidate pool, an optional explicit start request kicks the battle off,
//! and the run ends once the battle has been torn down (or the safety cap is
//! reached).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::chat::{ChatMessage, ChatUser};
use crate::combat::sprites::{SpriteAsset, SpriteCatalog};
use crate::settings::BattleSettings;

/// One chat line delivered at a fixed wall-clock time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedChatLine {
    /// Seconds since the run started
    #[serde(default)]
    pub at_secs: f32,
    #[serde(default = "default_channel")]
    pub channel: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub subscriber: bool,
    #[serde(default)]
    pub moderator: bool,
    #[serde(default)]
    pub vip: bool,
    #[serde(default)]
    pub broadcaster: bool,
    #[serde(default)]
    pub text: String,
}

impl ScriptedChatLine {
    /// Subscriber line at `at_secs`
    pub fn subscriber(at_secs: f32, username: &str, text: &str) -> Self {
        Self {
            at_secs,
            channel: default_channel(),
            username: username.to_string(),
            display_name: None,
            color: None,
            subscriber: true,
            moderator: false,
            vip: false,
            broadcaster: false,
            text: text.to_string(),
        }
    }

    pub fn to_message(&self) -> ChatMessage {
        ChatMessage::new(
            self.channel.clone(),
            ChatUser {
                username: self.username.clone(),
                display_name: self.display_name.clone(),
                color: self.color.clone(),
                subscriber: self.subscriber,
                moderator: self.moderator,
                vip: self.vip,
                broadcaster: self.broadcaster,
            },
            self.text.clone(),
        )
    }
}

/// Headless battle configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessBattleConfig {
    /// Scripted chat, in any order
    #[serde(default)]
    pub chat: Vec<ScriptedChatLine>,
    /// Sprite catalog override (default: built-in emote set)
    #[serde(default)]
    pub sprites: Option<Vec<SpriteAsset>>,
    /// Explicit start request time, in seconds
    #[serde(default)]
    pub start_at_secs: Option<f32>,
    /// Wall-clock safety cap for the whole run (default: 300)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Simulation ticks per simulated second (default: 60)
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: f32,
    /// Random seed for deterministic battle reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Where to write the JSON report (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// RON settings file (optional)
    #[serde(default)]
    pub settings_path: Option<String>,
    /// Inline settings; take precedence over `settings_path`
    #[serde(default)]
    pub settings: Option<BattleSettings>,
}

fn default_channel() -> String {
    "#overlay".to_string()
}

fn default_max_duration() -> f32 {
    300.0
}

fn default_tick_rate() -> f32 {
    60.0
}

impl Default for HeadlessBattleConfig {
    fn default() -> Self {
        Self {
            chat: Vec::new(),
            sprites: None,
            start_at_secs: None,
            max_duration_secs: default_max_duration(),
            tick_rate_hz: default_tick_rate(),
            random_seed: None,
            output_path: None,
            settings_path: None,
            settings: None,
        }
    }
}

impl HeadlessBattleConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: HeadlessBattleConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_duration_secs <= 0.0 {
            return Err("max_duration_secs must be positive".to_string());
        }
        if !(1.0..=1000.0).contains(&self.tick_rate_hz) {
            return Err(format!(
                "tick_rate_hz {} is out of range (1-1000)",
                self.tick_rate_hz
            ));
        }
        if let Some(start) = self.start_at_secs {
            if start < 0.0 {
                return Err("start_at_secs must not be negative".to_string());
            }
        }

        for (i, line) in self.chat.iter().enumerate() {
            if line.username.trim().is_empty() {
                return Err(format!("chat line {} has an empty username", i));
            }
            if line.at_secs < 0.0 {
                return Err(format!("chat line {} has a negative at_secs", i));
            }
        }

        if let Some(sprites) = &self.sprites {
            for sprite in sprites {
                if sprite.width <= 0.0 || sprite.height <= 0.0 {
                    return Err(format!(
                        "sprite '{}' must have positive dimensions",
                        sprite.name
                    ));
                }
            }
        }

        if let Some(settings) = &self.settings {
            settings.validate()?;
        }

        Ok(())
    }

    /// Settings for the run: inline, then file, then defaults
    pub fn resolve_settings(&self) -> BattleSettings {
        if let Some(settings) = &self.settings {
            return settings.clone();
        }
        match &self.settings_path {
            Some(path) => BattleSettings::load_from(Path::new(path)),
            None => BattleSettings::default(),
        }
    }

    pub fn sprite_catalog(&self) -> SpriteCatalog {
        match &self.sprites {
            Some(assets) => SpriteCatalog::new(assets.clone()),
            None => SpriteCatalog::default(),
        }
    }

    /// Seconds per simulation tick
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate_hz
    }

    /// Built-in scenario used when no config file is given: eight
    /// subscribers chat, then a battle starts.
    pub fn demo() -> Self {
        let viewers = [
            ("kappa_enjoyer", "Kappa Kappa"),
            ("pogfrog", "PogChamp"),
            ("catjam_dave", "catJAM catJAM"),
            ("sadge_sam", "Sadge"),
            ("lulwhale", "LUL that was close"),
            ("kekw_kat", "KEKW"),
            ("monka_mike", "monkaS"),
            ("happy_pea", "peepoHappy hi chat"),
        ];

        Self {
            chat: viewers
                .iter()
                .enumerate()
                .map(|(i, (name, text))| ScriptedChatLine::subscriber(0.1 * i as f32, name, text))
                .collect(),
            start_at_secs: Some(1.0),
            random_seed: Some(7),
            ..Default::default()
        }
    }
}
