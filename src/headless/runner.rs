//! Headless battle execution
//!
//! Runs a scripted chat session and its battle without any graphical output,
//! suitable for automated testing. [`simulate`] drives the controller
//! directly; [`run_headless_battle`] runs the same script inside a Bevy
//! `App` through [`CombatPlugin`].

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::chat::ChatMessage;
use crate::combat::controller::{BattleController, BattleOutcome, BattlePhase};
use crate::combat::events::{BattleCommand, ChatMessageEvent};
use crate::combat::render::{FrameRecorder, RenderSurface};
use crate::combat::stats::RankedStat;
use crate::combat::{BattleClock, BattleSet, CombatPlugin};

use super::config::{HeadlessBattleConfig, ScriptedChatLine};

/// Result of a completed headless run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlessReport {
    /// `None` if no battle finished during the run
    pub outcome: Option<BattleOutcome>,
    pub winner_name: Option<String>,
    /// Battle length from start to outcome
    pub battle_duration_secs: f32,
    /// Total simulated wall-clock time of the run
    pub simulated_secs: f32,
    pub participants: usize,
    pub ranking: Vec<RankedStat>,
    pub frames: usize,
    pub battle_log_entries: usize,
    /// Candidates known when the run ended
    pub candidates: usize,
    pub random_seed: Option<u64>,
    /// The safety cap ended the run
    pub timed_out: bool,
}

impl HeadlessReport {
    pub fn from_controller(
        controller: &BattleController,
        recorder: &FrameRecorder,
        random_seed: Option<u64>,
        timed_out: bool,
    ) -> Self {
        let summary = controller.last_summary();
        Self {
            outcome: summary.map(|s| s.outcome),
            winner_name: summary.and_then(|s| s.winner_name.clone()),
            battle_duration_secs: summary.map_or(0.0, |s| s.duration_secs),
            simulated_secs: controller.now(),
            participants: summary.map_or(0, |s| s.participants),
            ranking: summary.map(|s| s.ranking.clone()).unwrap_or_default(),
            frames: recorder.frames_presented,
            battle_log_entries: controller.arena().log().len(),
            candidates: controller.pool().count(),
            random_seed,
            timed_out,
        }
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(path.to_path_buf())
    }
}

/// Chat and start requests due at a given time
#[derive(Debug, Default)]
pub struct ScriptStep {
    pub messages: Vec<ChatMessage>,
    pub start: bool,
}

/// Replays a config's chat lines and start request in time order
#[derive(Debug, Clone)]
pub struct HeadlessScript {
    chat: Vec<ScriptedChatLine>,
    next: usize,
    start_at: Option<f32>,
}

impl HeadlessScript {
    pub fn from_config(config: &HeadlessBattleConfig) -> Self {
        let mut chat = config.chat.clone();
        chat.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
        Self {
            chat,
            next: 0,
            start_at: config.start_at_secs,
        }
    }

    /// Everything due at or before `now`, each item handed out once
    pub fn due(&mut self, now: f32) -> ScriptStep {
        let mut step = ScriptStep::default();
        while let Some(line) = self.chat.get(self.next) {
            if line.at_secs > now {
                break;
            }
            step.messages.push(line.to_message());
            self.next += 1;
        }
        if self.start_at.is_some_and(|at| at <= now) {
            self.start_at = None;
            step.start = true;
        }
        step
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.chat.len() && self.start_at.is_none()
    }
}

/// The run is over once a battle has been torn down, or nothing is left
/// that could start one.
fn run_finished(controller: &BattleController, script: &HeadlessScript) -> bool {
    if controller.battles_completed() > 0 {
        return true;
    }
    script.is_exhausted()
        && controller.phase() == BattlePhase::Idle
        && controller.settings().battle_spawn_chance <= 0.0
}

pub fn build_controller(config: &HeadlessBattleConfig) -> BattleController {
    let settings = config.resolve_settings();
    match config.random_seed {
        Some(seed) => info!("Using deterministic RNG with seed: {}", seed),
        None => info!("Using non-deterministic RNG (no seed provided)"),
    }
    BattleController::new(settings, config.random_seed).with_sprites(config.sprite_catalog())
}

/// Run the script against a controller directly, without a Bevy `App`.
pub fn simulate(config: &HeadlessBattleConfig) -> HeadlessReport {
    let mut controller = build_controller(config);
    let mut script = HeadlessScript::from_config(config);
    let mut recorder = FrameRecorder::default();
    let dt = config.tick_dt();
    let mut timed_out = false;

    loop {
        let step = script.due(controller.now());
        for message in &step.messages {
            controller.ingest_chat(message);
        }
        if step.start {
            if let Err(reason) = controller.request_start() {
                warn!("Scripted start rejected: {}", reason);
            }
        }

        let frame = controller.tick(dt);
        for event in controller.drain_events() {
            recorder.notify(&event);
        }
        recorder.present(&frame);

        if run_finished(&controller, &script) {
            break;
        }
        if controller.now() >= config.max_duration_secs {
            warn!(
                "Headless run hit the {:.0}s safety cap",
                config.max_duration_secs
            );
            timed_out = true;
            break;
        }
    }

    HeadlessReport::from_controller(&controller, &recorder, config.random_seed, timed_out)
}

/// Shared slot the app writes its report into
#[derive(Resource, Clone, Default)]
pub struct ReportSlot(pub Arc<Mutex<Option<HeadlessReport>>>);

/// Resource to track headless run state
#[derive(Resource)]
pub struct HeadlessRunState {
    pub script: HeadlessScript,
    pub max_duration: f32,
    pub output_path: Option<String>,
    pub random_seed: Option<u64>,
    pub complete: bool,
}

/// Plugin for headless battle execution
pub struct HeadlessPlugin {
    pub config: HeadlessBattleConfig,
    pub slot: ReportSlot,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(CombatPlugin {
            settings: self.config.resolve_settings(),
            seed: self.config.random_seed,
            sprites: self.config.sprite_catalog(),
        })
        .insert_resource(BattleClock::fixed(self.config.tick_dt()))
        .insert_resource(self.slot.clone())
        .insert_resource(HeadlessRunState {
            script: HeadlessScript::from_config(&self.config),
            max_duration: self.config.max_duration_secs,
            output_path: self.config.output_path.clone(),
            random_seed: self.config.random_seed,
            complete: false,
        })
        .add_systems(Update, headless_drive_script.before(BattleSet::Intake))
        .add_systems(Update, headless_check_complete.after(BattleSet::Publish))
        .add_systems(PostUpdate, headless_exit_on_complete);
    }
}

/// Send the chat lines and start request that are due
fn headless_drive_script(
    controller: Res<BattleController>,
    mut state: ResMut<HeadlessRunState>,
    mut chat: EventWriter<ChatMessageEvent>,
    mut commands: EventWriter<BattleCommand>,
) {
    let step = state.script.due(controller.now());
    for message in step.messages {
        chat.send(ChatMessageEvent(message));
    }
    if step.start {
        commands.send(BattleCommand::Start);
    }
}

/// Build the report once the run is over
fn headless_check_complete(
    controller: Res<BattleController>,
    recorder: Res<FrameRecorder>,
    slot: Res<ReportSlot>,
    mut state: ResMut<HeadlessRunState>,
) {
    if state.complete {
        return;
    }

    let finished = run_finished(&controller, &state.script);
    let timed_out = !finished && controller.now() >= state.max_duration;
    if !finished && !timed_out {
        return;
    }
    if timed_out {
        warn!("Headless run hit the {:.0}s safety cap", state.max_duration);
    }

    let report =
        HeadlessReport::from_controller(&controller, &recorder, state.random_seed, timed_out);
    if let Some(path) = &state.output_path {
        match report.save(Path::new(path)) {
            Ok(path) => println!("Battle complete. Report saved to: {}", path.display()),
            Err(e) => eprintln!("Failed to save battle report: {}", e),
        }
    }
    if let Ok(mut guard) = slot.0.lock() {
        *guard = Some(report);
    }
    state.complete = true;
}

/// Exit the app when the run is complete
fn headless_exit_on_complete(state: Res<HeadlessRunState>, mut exit: EventWriter<AppExit>) {
    if state.complete {
        exit.send(AppExit::Success);
    }
}

/// Run a headless battle inside a Bevy `App`
pub fn run_headless_battle(config: HeadlessBattleConfig) -> Result<HeadlessReport, String> {
    config.validate()?;

    println!("Starting headless battle simulation...");
    println!("  Chat lines: {}", config.chat.len());
    match config.start_at_secs {
        Some(at) => println!("  Start request at: {:.1}s", at),
        None => println!("  Start request: chat-triggered only"),
    }
    println!("  Max duration: {:.0}s", config.max_duration_secs);

    let slot = ReportSlot::default();
    App::new()
        // Minimal plugins - no window, no rendering; ticks are fixed-step so
        // the loop runs as fast as it can
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)))
        .add_plugins(LogPlugin::default())
        .add_plugins(HeadlessPlugin {
            config,
            slot: slot.clone(),
        })
        .run();

    let report = slot
        .0
        .lock()
        .map_err(|_| "Report slot was poisoned".to_string())?
        .take();
    report.ok_or_else(|| "Headless run ended without a report".to_string())
}
