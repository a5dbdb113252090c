//! ChatArena - chat-driven battle arena for stream overlays
//!
//! Chat participants are drafted as emote sprites into a physics arena where
//! they collide, build mana, cast skills and fight until one is left.
//!
//! This library exposes the simulation core for testing and reuse.

pub mod chat;
pub mod cli;
pub mod combat;
pub mod headless;
pub mod settings;

// Re-export commonly used types
pub use combat::controller::{BattleController, BattleOutcome, BattlePhase, StartRejection};
pub use combat::log::{BattleLog, BattleLogEventType};
pub use headless::{HeadlessBattleConfig, HeadlessReport};
pub use settings::BattleSettings;
