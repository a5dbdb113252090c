//! Chat intake
//!
//! Consumes `(channel, user, message)` events from the chat stream. Privileged
//! users (subscriber, moderator, VIP, broadcaster) are recorded into the
//! [`CandidatePool`]; whitespace-separated tokens matching a known emote name
//! are recognized so a battle emote can trigger a start request.

pub mod pool;

pub use pool::CandidatePool;

use serde::{Deserialize, Serialize};

use crate::combat::components::Subscriber;
use crate::combat::sprites::SpriteCatalog;

/// Author of a chat message, with the badges the stream reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
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
}

impl ChatUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    pub fn subscriber(mut self) -> Self {
        self.subscriber = true;
        self
    }

    /// Whether this user may be drafted into a battle
    pub fn is_eligible(&self) -> bool {
        self.subscriber || self.moderator || self.vip || self.broadcaster
    }

    pub fn to_subscriber(&self) -> Subscriber {
        let mut subscriber = Subscriber::new(self.username.as_str());
        if let Some(display_name) = &self.display_name {
            subscriber = subscriber.with_display_name(display_name.as_str());
        }
        if let Some(color) = &self.color {
            subscriber = subscriber.with_color(color.as_str());
        }
        subscriber
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub channel: String,
    pub user: ChatUser,
    pub text: String,
}

impl ChatMessage {
    pub fn new(channel: impl Into<String>, user: ChatUser, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            user,
            text: text.into(),
        }
    }
}

/// What one message contributed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatOutcome {
    /// The author was recorded into the candidate pool
    pub recorded: bool,
    /// Known emote names found in the text, in order of appearance
    pub emotes: Vec<String>,
    /// At least one of the emotes is battle-eligible
    pub battle_emote: bool,
}

/// Emote recognition and pool feeding
#[derive(Debug, Clone, Default)]
pub struct ChatIntake;

impl ChatIntake {
    pub fn new() -> Self {
        Self
    }

    pub fn ingest(
        &self,
        message: &ChatMessage,
        sprites: &SpriteCatalog,
        pool: &mut CandidatePool,
    ) -> ChatOutcome {
        let mut outcome = ChatOutcome::default();

        if message.user.is_eligible() && !message.user.username.is_empty() {
            pool.record(message.user.to_subscriber());
            outcome.recorded = true;
        }

        for token in message.text.split_whitespace() {
            if let Some(asset) = sprites.find(token) {
                outcome.emotes.push(asset.name.clone());
                outcome.battle_emote |= asset.battle_eligible;
            }
        }

        outcome
    }
}
