//! Headless mode for automated testing
//!
//! Runs scripted chat sessions and their battles without any graphical
//! output, suitable for automated testing and balance checks.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless battle
//! cargo run --release -- --headless battle_config.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "chat": [
//!     { "at_secs": 0.0, "username": "pogfrog", "subscriber": true, "text": "PogChamp" },
//!     { "at_secs": 0.2, "username": "kekw_kat", "vip": true, "text": "KEKW" },
//!     { "at_secs": 0.4, "username": "modmin", "moderator": true, "text": "hi" }
//!   ],
//!   "start_at_secs": 1.0,
//!   "random_seed": 42,
//!   "max_duration_secs": 120
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{HeadlessBattleConfig, ScriptedChatLine};
pub use runner::{run_headless_battle, simulate, HeadlessReport, HeadlessScript};
