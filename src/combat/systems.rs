//! Battle systems
//!
//! Thin ECS systems around [`BattleController`]: inbound chat and commands,
//! one tick per `Update`, and outbound events and frames.

use bevy::prelude::*;

use super::controller::BattleController;
use super::events::*;
use super::render::{FrameRecorder, RenderSurface};
use super::BattleClock;

/// Feed chat messages into the candidate pool and emote detection
pub fn ingest_chat(
    mut messages: EventReader<ChatMessageEvent>,
    mut controller: ResMut<BattleController>,
) {
    for ChatMessageEvent(message) in messages.read() {
        controller.ingest_chat(message);
    }
}

/// Apply external start and abort requests
pub fn handle_commands(
    mut commands: EventReader<BattleCommand>,
    mut controller: ResMut<BattleController>,
) {
    for command in commands.read() {
        match command {
            BattleCommand::Start => {
                if let Err(reason) = controller.request_start() {
                    debug!("Start request rejected: {}", reason);
                }
            }
            BattleCommand::Abort => {
                controller.request_abort();
            }
        }
    }
}

/// Run one controller tick and send out the resulting frame
pub fn advance_battle(
    time: Res<Time>,
    clock: Res<BattleClock>,
    mut controller: ResMut<BattleController>,
    mut frames: EventWriter<RenderFrameEvent>,
) {
    let frame = controller.tick(clock.delta(&time));
    frames.send(RenderFrameEvent(frame));
}

/// Drain the controller's presentation events
pub fn publish_events(
    mut controller: ResMut<BattleController>,
    mut out: EventWriter<BattleEventMessage>,
) {
    for event in controller.drain_events() {
        out.send(BattleEventMessage(event));
    }
}

/// Hand frames and events to the in-process surface
pub fn record_presentation(
    mut frames: EventReader<RenderFrameEvent>,
    mut events: EventReader<BattleEventMessage>,
    mut recorder: ResMut<FrameRecorder>,
) {
    for BattleEventMessage(event) in events.read() {
        recorder.notify(event);
    }
    for RenderFrameEvent(frame) in frames.read() {
        recorder.present(frame);
    }
}
