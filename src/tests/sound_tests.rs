#[cfg(test)]
mod envelope_tests {
    use crate::sound::{SoundEffect, Tone, Waveform, envelope_gain};

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_effect_tones() {
        let rotate = SoundEffect::Rotate.tone();
        assert!(close(rotate.frequency, 800.0));
        assert!(close(rotate.seconds, 0.1));
        assert_eq!(rotate.waveform, Waveform::Square);

        let drop = SoundEffect::Drop.tone();
        assert!(close(drop.frequency, 200.0));
        assert!(close(drop.seconds, 0.2));

        let clear = SoundEffect::LineClear.tone();
        assert!(close(clear.frequency, 1000.0));
        assert!(close(clear.seconds, 0.3));

        let over = SoundEffect::GameOver.tone();
        assert!(close(over.frequency, 150.0));
        assert!(close(over.seconds, 1.0));
        assert_eq!(over.waveform, Waveform::Sawtooth);
    }

    #[test]
    fn test_tone_sample_count() {
        assert_eq!(SoundEffect::Rotate.tone().samples(44_100.0), 4410);
        assert_eq!(SoundEffect::GameOver.tone().samples(8_000.0), 8000);
    }

    #[test]
    fn test_attack_rises_linearly() {
        assert!(close(envelope_gain(0.0, 0.1, 0.1), 0.0));
        assert!(close(envelope_gain(0.005, 0.1, 0.1), 0.05));
        assert!(close(envelope_gain(0.01, 0.1, 0.1), 0.1));
    }

    #[test]
    fn test_decay_falls_to_floor() {
        let near_end = envelope_gain(0.0999, 0.1, 0.1);
        assert!(near_end > 0.0);
        assert!(near_end < 0.0011);

        let mut previous = envelope_gain(0.01, 0.3, 0.1);
        let mut t = 0.02;
        while t < 0.3 {
            let gain = envelope_gain(t, 0.3, 0.1);
            assert!(gain < previous, "gain rose at {t}");
            previous = gain;
            t += 0.01;
        }
    }

    #[test]
    fn test_silent_outside_the_tone() {
        assert!(close(envelope_gain(-0.1, 0.1, 0.1), 0.0));
        assert!(close(envelope_gain(0.1, 0.1, 0.1), 0.0));
        assert!(close(envelope_gain(5.0, 0.1, 0.1), 0.0));
    }

    #[test]
    fn test_music_tone_from_note() {
        let note = crate::melody::KOROBEINIKI[0];
        let tone = Tone::music(&note);
        assert!(close(tone.frequency, 659.25));
        assert!(close(tone.seconds, 0.5));
        assert_eq!(tone.waveform, Waveform::Square);
    }
}

#[cfg(test)]
mod mixer_tests {
    use crate::sound::{Mixer, MixerCommand, SoundEffect, Voice};

    const RATE: f64 = 8_000.0;

    #[test]
    fn test_voice_runs_for_its_length() {
        let mut voice = Voice::new(SoundEffect::Rotate.tone(), RATE);
        let mut count = 0;
        while voice.next_sample().is_some() {
            count += 1;
        }
        assert_eq!(count, 800);
        assert!(voice.is_finished());
        assert_eq!(voice.next_sample(), None);
    }

    #[test]
    fn test_silent_without_voices() {
        let mut mixer = Mixer::new(RATE);
        for _ in 0..100 {
            assert!(mixer.next_sample().abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_finished_voices_are_dropped() {
        let mut mixer = Mixer::new(RATE);
        mixer.apply(MixerCommand::Play(Voice::new(SoundEffect::Rotate.tone(), RATE)));
        mixer.apply(MixerCommand::Play(Voice::new(SoundEffect::Drop.tone(), RATE)));
        assert_eq!(mixer.active_voices(), 2);

        let mut energy = 0.0;
        for _ in 0..800 {
            energy += mixer.next_sample().abs();
        }
        assert!(energy > 0.0);
        assert_eq!(mixer.active_voices(), 1);

        for _ in 0..800 {
            mixer.next_sample();
        }
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_output_stays_in_range() {
        let mut mixer = Mixer::new(RATE);
        mixer.apply(MixerCommand::Volume(1.0));
        mixer.apply(MixerCommand::Music(true));
        for _ in 0..20 {
            mixer.apply(MixerCommand::Play(Voice::new(
                SoundEffect::GameOver.tone(),
                RATE,
            )));
        }
        for _ in 0..2000 {
            let sample = mixer.next_sample();
            assert!((-1.0..=1.0).contains(&sample));
        }
    }

    #[test]
    fn test_zero_volume_mutes_only_music() {
        let mut mixer = Mixer::new(RATE);
        mixer.apply(MixerCommand::Volume(0.0));
        mixer.apply(MixerCommand::Music(true));
        for _ in 0..500 {
            assert!(mixer.next_sample().abs() < f32::EPSILON);
        }

        // Effects keep their own fixed level
        mixer.apply(MixerCommand::Play(Voice::new(SoundEffect::LineClear.tone(), RATE)));
        let mut energy = 0.0;
        for _ in 0..500 {
            energy += mixer.next_sample().abs();
        }
        assert!(energy > 0.0);
    }

    #[test]
    fn test_effect_level_ignores_volume() {
        let mut quiet = Mixer::new(RATE);
        let mut loud = Mixer::new(RATE);
        quiet.apply(MixerCommand::Volume(0.1));
        loud.apply(MixerCommand::Volume(1.0));
        quiet.apply(MixerCommand::Play(Voice::new(SoundEffect::Drop.tone(), RATE)));
        loud.apply(MixerCommand::Play(Voice::new(SoundEffect::Drop.tone(), RATE)));
        for _ in 0..1600 {
            assert!((quiet.next_sample() - loud.next_sample()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_music_start_and_stop() {
        let mut mixer = Mixer::new(RATE);
        mixer.apply(MixerCommand::Music(true));
        assert!(mixer.is_music_playing());
        // Starting twice keeps one track going
        mixer.apply(MixerCommand::Music(true));
        assert!(mixer.is_music_playing());

        let mut energy = 0.0;
        for _ in 0..1000 {
            energy += mixer.next_sample().abs();
        }
        assert!(energy > 0.0);

        mixer.apply(MixerCommand::Music(false));
        mixer.apply(MixerCommand::Music(false));
        assert!(!mixer.is_music_playing());
        for _ in 0..100 {
            assert!(mixer.next_sample().abs() < f32::EPSILON);
        }
    }
}

#[cfg(test)]
mod controller_tests {
    use crate::sound::{AudioCommand, AudioController, MixerCommand, SoundEffect};

    #[test]
    fn test_sound_effects_respect_toggle() {
        let mut controller = AudioController::new(8_000.0);
        assert!(matches!(
            controller.handle(AudioCommand::PlaySound(SoundEffect::Rotate)),
            Some(MixerCommand::Play(_))
        ));

        assert!(
            controller
                .handle(AudioCommand::SetSoundEnabled(false))
                .is_none()
        );
        assert!(
            controller
                .handle(AudioCommand::PlaySound(SoundEffect::Rotate))
                .is_none()
        );
    }

    #[test]
    fn test_music_needs_request_and_permission() {
        let mut controller = AudioController::new(8_000.0);
        assert!(!controller.music_playing());

        assert!(matches!(
            controller.handle(AudioCommand::StartMusic),
            Some(MixerCommand::Music(true))
        ));
        assert!(controller.music_playing());

        // Turning music off mid-game stops it, turning it back on resumes
        assert!(matches!(
            controller.handle(AudioCommand::SetMusicEnabled(false)),
            Some(MixerCommand::Music(false))
        ));
        assert!(matches!(
            controller.handle(AudioCommand::SetMusicEnabled(true)),
            Some(MixerCommand::Music(true))
        ));

        assert!(matches!(
            controller.handle(AudioCommand::StopMusic),
            Some(MixerCommand::Music(false))
        ));
        // Enabling music while the game is not asking for it stays silent
        assert!(matches!(
            controller.handle(AudioCommand::SetMusicEnabled(true)),
            Some(MixerCommand::Music(false))
        ));
    }

    #[test]
    fn test_start_music_while_disabled() {
        let mut controller = AudioController::new(8_000.0);
        controller.handle(AudioCommand::SetMusicEnabled(false));
        assert!(matches!(
            controller.handle(AudioCommand::StartMusic),
            Some(MixerCommand::Music(false))
        ));
    }

    #[test]
    fn test_stop_music_is_idempotent() {
        let mut controller = AudioController::new(8_000.0);
        for _ in 0..3 {
            assert!(matches!(
                controller.handle(AudioCommand::StopMusic),
                Some(MixerCommand::Music(false))
            ));
        }
    }

    #[test]
    fn test_volume_and_quit() {
        let mut controller = AudioController::new(8_000.0);
        match controller.handle(AudioCommand::SetVolume(0.3)) {
            Some(MixerCommand::Volume(v)) => assert!((v - 0.3).abs() < f32::EPSILON),
            _ => panic!("expected a volume message"),
        }
        assert!(controller.handle(AudioCommand::Quit).is_none());
    }
}

#[cfg(test)]
mod hooks_tests {
    use crossbeam_channel::{bounded, unbounded};

    use crate::components::TetrominoType;
    use crate::sound::{AudioCommand, SoundEffect, SoundHooks};
    use crate::tests::test_utils::{engine_with, fill_row_except};

    #[test]
    fn test_engine_events_become_audio_commands() {
        let (sender, receiver) = unbounded();
        let (mut engine, _) = engine_with(&[TetrominoType::O]);
        engine.add_listener(Box::new(SoundHooks::new(Some(sender))));

        engine.start();
        assert_eq!(receiver.try_recv(), Ok(AudioCommand::StartMusic));

        // The O accepts rotation as a no-op turn
        engine.rotate();
        assert_eq!(
            receiver.try_recv(),
            Ok(AudioCommand::PlaySound(SoundEffect::Rotate))
        );

        fill_row_except(engine.board_mut(), 19, &[4, 5]);
        engine.hard_drop();
        assert_eq!(
            receiver.try_iter().collect::<Vec<_>>(),
            vec![
                AudioCommand::PlaySound(SoundEffect::Drop),
                AudioCommand::PlaySound(SoundEffect::LineClear),
            ]
        );

        engine.pause_toggle();
        engine.pause_toggle();
        assert_eq!(
            receiver.try_iter().collect::<Vec<_>>(),
            vec![AudioCommand::StopMusic, AudioCommand::StartMusic]
        );
    }

    #[test]
    fn test_landing_is_quiet_and_game_over_is_not() {
        let (sender, receiver) = unbounded();
        let (mut engine, _) = engine_with(&[TetrominoType::O]);
        engine.add_listener(Box::new(SoundHooks::new(Some(sender))));
        engine.start();

        for _ in 0..18 {
            engine.soft_drop();
        }
        engine.tick(engine.drop_interval() + std::time::Duration::from_millis(1));
        assert_eq!(receiver.try_iter().collect::<Vec<_>>(), vec![AudioCommand::StartMusic]);

        for _ in 0..9 {
            engine.hard_drop();
        }
        let commands: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            commands[commands.len() - 2..],
            [
                AudioCommand::StopMusic,
                AudioCommand::PlaySound(SoundEffect::GameOver)
            ]
        );
    }

    #[test]
    fn test_full_queue_drops_commands_without_blocking() {
        let (sender, receiver) = bounded(1);
        let (mut engine, _) = engine_with(&[TetrominoType::O]);
        engine.add_listener(Box::new(SoundHooks::new(Some(sender))));

        engine.start();
        engine.rotate();
        engine.pause_toggle();

        // Only the first command fit, the rest were dropped
        assert_eq!(
            receiver.try_iter().collect::<Vec<_>>(),
            vec![AudioCommand::StartMusic]
        );
        assert_eq!(engine.run_state(), crate::engine::RunState::Paused);
    }

    #[test]
    fn test_hooks_without_channel_do_nothing() {
        let (mut engine, _) = engine_with(&[TetrominoType::T]);
        engine.add_listener(Box::new(SoundHooks::new(None)));
        engine.start();
        engine.rotate();
        engine.hard_drop();
    }
}

#[cfg(test)]
mod audio_state_tests {
    use bevy_ecs::prelude::*;

    use crate::config::AudioConfig;
    use crate::sound::AudioState;

    #[test]
    fn test_silent_state_uses_config() {
        let config = AudioConfig {
            music_enabled: false,
            sound_enabled: true,
            volume: 0.8,
        };
        let state = AudioState::silent(&config);
        assert!(!state.is_music_enabled());
        assert!(state.is_sound_enabled());
        assert!((state.get_volume() - 0.8).abs() < f32::EPSILON);
        assert!(!state.is_audio_available());
        assert_eq!(state.settings(), config);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut state = AudioState::silent(&AudioConfig::default());
        state.set_volume(0.8);
        assert!((state.get_volume() - 0.8).abs() < f32::EPSILON);
        state.set_volume(1.5);
        assert!((state.get_volume() - 1.0).abs() < f32::EPSILON);
        state.set_volume(-0.5);
        assert!(state.get_volume().abs() < f32::EPSILON);

        let loud = AudioConfig {
            volume: 3.0,
            ..AudioConfig::default()
        };
        assert!((AudioState::silent(&loud).get_volume() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_toggles() {
        let mut state = AudioState::silent(&AudioConfig::default());
        state.toggle_music();
        state.toggle_sound();
        assert!(!state.is_music_enabled());
        assert!(!state.is_sound_enabled());
        state.toggle_music();
        assert!(state.is_music_enabled());
    }

    #[test]
    fn test_audiostate_as_resource() {
        let mut world = World::new();
        world.insert_resource(AudioState::silent(&AudioConfig::default()));

        {
            let mut audio_state = world.resource_mut::<AudioState>();
            audio_state.set_volume(0.7);
            audio_state.toggle_music();
        }

        let audio_state = world.resource::<AudioState>();
        assert!((audio_state.get_volume() - 0.7).abs() < f32::EPSILON);
        assert!(!audio_state.is_music_enabled());
    }
}
