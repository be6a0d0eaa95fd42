#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::*;

use crate::Time;
use crate::config::Config;
use crate::engine::{Engine, Intent, PieceSource, RandomPieces, Snapshot};
use crate::sound::AudioState;
use crate::systems::{self, AudioAction, Input};

pub struct App {
    pub world: World,
    pub should_quit: bool,
}

impl App {
    /// Builds the game world with a live audio thread behind it.
    pub fn new(config: &Config) -> Self {
        Self::with_parts(
            Box::new(RandomPieces::new()),
            AudioState::new(&config.audio),
        )
    }

    /// Builds the game world with no audio output.
    pub fn headless(pieces: Box<dyn PieceSource>) -> Self {
        Self::with_parts(pieces, AudioState::silent(&Config::default().audio))
    }

    fn with_parts(pieces: Box<dyn PieceSource>, audio: AudioState) -> Self {
        let mut engine = Engine::with_piece_source(pieces);
        engine.add_listener(Box::new(audio.hooks()));

        let mut world = World::new();
        world.insert_resource(Time::new());
        world.insert_resource(Input::default());
        world.insert_resource(audio);
        world.insert_resource(engine);

        Self {
            world,
            should_quit: false,
        }
    }

    pub fn push_intent(&mut self, intent: Intent) {
        self.world.resource_mut::<Input>().push(intent);
    }

    pub fn audio(&mut self, action: AudioAction) {
        systems::audio_system(&mut self.world, action);
    }

    /// Runs one game step: queued input first, then gravity.
    pub fn on_tick(&mut self) {
        self.world.resource_mut::<Time>().update();
        let delta = self.world.resource::<Time>().delta();

        systems::input_system(&mut self.world);
        systems::game_tick_system(&mut self.world, delta);
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        self.world.resource::<Engine>()
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.engine().snapshot()
    }

    #[must_use]
    pub fn audio_state(&self) -> &AudioState {
        self.world.resource::<AudioState>()
    }

    /// Current settings, including audio changes made during play.
    #[must_use]
    pub fn settings(&self) -> Config {
        Config {
            audio: self.audio_state().settings(),
            ..Config::current()
        }
    }
}
