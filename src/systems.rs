use bevy_ecs::prelude::*;
use log::{debug, trace};
use std::collections::VecDeque;
use std::time::Duration;

use crate::engine::{Engine, Intent};
use crate::sound::AudioState;

/// Intents waiting to reach the engine, oldest first.
#[derive(Resource, Debug, Clone, Default)]
pub struct Input {
    pending: VecDeque<Intent>,
}

impl Input {
    pub fn push(&mut self, intent: Intent) {
        self.pending.push_back(intent);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Player actions that only concern the audio side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioAction {
    ToggleMusic,
    ToggleSound,
    VolumeUp,
    VolumeDown,
}

const VOLUME_STEP: f32 = 0.1;

/// Feeds the queued intents into the engine in the order they arrived.
pub fn input_system(world: &mut World) {
    let pending = std::mem::take(&mut world.resource_mut::<Input>().pending);
    if pending.is_empty() {
        return;
    }

    let mut engine = world.resource_mut::<Engine>();
    for intent in pending {
        debug!("Applying {intent:?}");
        engine.apply(intent);
    }
}

/// Advances gravity by the elapsed frame time.
pub fn game_tick_system(world: &mut World, delta: Duration) {
    trace!("Game tick with delta: {delta:?}");
    world.resource_mut::<Engine>().tick(delta);
}

pub fn audio_system(world: &mut World, action: AudioAction) {
    let Some(mut audio) = world.get_resource_mut::<AudioState>() else {
        return;
    };

    match action {
        AudioAction::ToggleMusic => audio.toggle_music(),
        AudioAction::ToggleSound => audio.toggle_sound(),
        AudioAction::VolumeUp => {
            let volume = audio.get_volume();
            audio.set_volume((volume + VOLUME_STEP).min(1.0));
        }
        AudioAction::VolumeDown => {
            let volume = audio.get_volume();
            audio.set_volume((volume - VOLUME_STEP).max(0.0));
        }
    }
    debug!(
        "Audio: music {}, sound {}, volume {:.1}",
        audio.is_music_enabled(),
        audio.is_sound_enabled(),
        audio.get_volume()
    );
}
