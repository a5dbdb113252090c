//! Render surface boundary
//!
//! Once per tick the simulation publishes a [`RenderFrame`]: where every
//! sprite is, how it is rotated and how opaque it is. The surface draws it
//! and never writes back.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::components::CombatantId;
use super::controller::BattlePhase;
use super::constants::REMOVAL_DELAY;
use super::events::BattleEvent;
use super::registry::EntityRegistry;

/// Drawing state of one combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteState {
    pub id: CombatantId,
    pub name: String,
    pub sprite: String,
    pub position: Vec2,
    pub angle: f32,
    pub size: f32,
    /// 1.0 while alive, fading to 0.0 over the removal delay
    pub opacity: f32,
    pub hp_fraction: f32,
    pub has_shield: bool,
}

/// Everything the surface needs to draw one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    /// Wall-clock time of the frame
    pub time: f32,
    pub time_scale: f32,
    pub sprites: Vec<SpriteState>,
}

impl RenderFrame {
    pub fn capture(registry: &EntityRegistry, now: f32, time_scale: f32) -> Self {
        let sprites = registry
            .all()
            .map(|c| {
                let opacity = match c.died_at {
                    Some(died) => (1.0 - (now - died) / REMOVAL_DELAY).clamp(0.0, 1.0),
                    None => 1.0,
                };
                SpriteState {
                    id: c.id,
                    name: c.subscriber.display_name.clone(),
                    sprite: c.sprite.clone(),
                    position: c.last_position,
                    angle: c.last_angle,
                    size: c.size(),
                    opacity,
                    hp_fraction: c.hp_fraction(),
                    has_shield: c.has_shield,
                }
            })
            .collect();

        Self {
            time: now,
            time_scale,
            sprites,
        }
    }
}

/// Consumer of frames and presentation events
pub trait RenderSurface {
    fn present(&mut self, frame: &RenderFrame);
    fn notify(&mut self, event: &BattleEvent);
}

/// In-memory surface that keeps counts and the latest frame.
#[derive(Debug, Default, Resource)]
pub struct FrameRecorder {
    pub frames_presented: usize,
    pub events_seen: usize,
    pub last_frame: Option<RenderFrame>,
    /// Sprites released during the current battle
    pub despawned: Vec<CombatantId>,
}

impl RenderSurface for FrameRecorder {
    fn present(&mut self, frame: &RenderFrame) {
        self.frames_presented += 1;
        self.last_frame = Some(frame.clone());
    }

    fn notify(&mut self, event: &BattleEvent) {
        self.events_seen += 1;
        match event {
            BattleEvent::PhaseChanged {
                to: BattlePhase::Spawning,
                ..
            } => self.despawned.clear(),
            BattleEvent::Despawned { id } => self.despawned.push(*id),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_forgets_despawns_from_previous_battle() {
        let mut recorder = FrameRecorder::default();
        recorder.notify(&BattleEvent::Despawned { id: CombatantId(0) });
        recorder.notify(&BattleEvent::Despawned { id: CombatantId(1) });
        assert_eq!(recorder.despawned.len(), 2);

        recorder.notify(&BattleEvent::PhaseChanged {
            from: BattlePhase::Idle,
            to: BattlePhase::Spawning,
        });
        assert!(recorder.despawned.is_empty());

        recorder.notify(&BattleEvent::Despawned { id: CombatantId(0) });
        assert_eq!(recorder.despawned, vec![CombatantId(0)]);
        assert_eq!(recorder.events_seen, 4);
    }
}
