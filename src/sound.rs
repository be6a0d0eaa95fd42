use anyhow::Result;
use bevy_ecs::system::Resource;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use fundsp::hacker32::{AudioUnit, envelope, saw_hz, square_hz};
use log::{debug, error, info, trace};
use std::iter::Cycle;
use std::slice::Iter;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::config::AudioConfig;
use crate::engine::RunState;
use crate::events::{GameListener, LockKind};
use crate::melody::{Melody, Note};

// Sound effects the game can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    Rotate,
    Drop,
    LineClear,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Square,
    Sawtooth,
}

/// A single enveloped note: quick attack, exponential decay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency: f32,
    pub seconds: f32,
    pub waveform: Waveform,
    pub peak: f32,
}

const EFFECT_PEAK: f32 = 0.1;
const MUSIC_PEAK: f32 = 0.1;
const ATTACK_SECONDS: f32 = 0.01;
const RELEASE_FLOOR: f32 = 0.001;

impl SoundEffect {
    #[must_use]
    pub fn tone(self) -> Tone {
        let (frequency, seconds, waveform) = match self {
            SoundEffect::Rotate => (800.0, 0.1, Waveform::Square),
            SoundEffect::Drop => (200.0, 0.2, Waveform::Square),
            SoundEffect::LineClear => (1000.0, 0.3, Waveform::Square),
            SoundEffect::GameOver => (150.0, 1.0, Waveform::Sawtooth),
        };
        Tone {
            frequency,
            seconds,
            waveform,
            peak: EFFECT_PEAK,
        }
    }
}

impl Tone {
    #[must_use]
    pub fn music(note: &Note) -> Self {
        Self {
            frequency: note.frequency,
            seconds: note.seconds,
            waveform: Waveform::Square,
            peak: MUSIC_PEAK,
        }
    }

    /// Number of output samples the tone lasts for.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn samples(&self, sample_rate: f64) -> usize {
        (f64::from(self.seconds) * sample_rate).round() as usize
    }
}

/// Gain at `t` seconds into a tone: linear rise to `peak` over the attack,
/// then an exponential fall that reaches the release floor at `seconds`.
#[must_use]
pub fn envelope_gain(t: f32, seconds: f32, peak: f32) -> f32 {
    if t < 0.0 || t >= seconds {
        return 0.0;
    }
    if t < ATTACK_SECONDS {
        return peak * t / ATTACK_SECONDS;
    }
    let decay_time = (seconds - ATTACK_SECONDS).max(f32::EPSILON);
    let progress = ((t - ATTACK_SECONDS) / decay_time).min(1.0);
    peak * (RELEASE_FLOOR / peak).powf(progress)
}

fn tone_unit(tone: Tone) -> Box<dyn AudioUnit> {
    let Tone {
        frequency,
        seconds,
        waveform,
        peak,
    } = tone;
    let env = envelope(move |t| envelope_gain(t, seconds, peak));
    match waveform {
        Waveform::Square => Box::new(square_hz(frequency) * env),
        Waveform::Sawtooth => Box::new(saw_hz(frequency) * env),
    }
}

/// A tone being played, counting down its remaining samples.
pub struct Voice {
    unit: Box<dyn AudioUnit>,
    remaining: usize,
}

impl Voice {
    #[must_use]
    pub fn new(tone: Tone, sample_rate: f64) -> Self {
        let mut unit = tone_unit(tone);
        unit.set_sample_rate(sample_rate);
        Self {
            unit,
            remaining: tone.samples(sample_rate),
        }
    }

    pub fn next_sample(&mut self) -> Option<f32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.unit.get_mono())
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }
}

/// Loops a melody note by note while playing.
pub struct MusicTrack {
    melody: Melody,
    notes: Cycle<Iter<'static, Note>>,
    current: Option<Voice>,
    sample_rate: f64,
    playing: bool,
}

impl MusicTrack {
    #[must_use]
    pub fn new(melody: Melody, sample_rate: f64) -> Self {
        Self {
            melody,
            notes: melody.play(),
            current: None,
            sample_rate,
            playing: false,
        }
    }

    /// Starts from the first note. Already playing tracks keep going.
    pub fn start(&mut self) {
        if self.playing {
            return;
        }
        self.playing = true;
        self.notes = self.melody.play();
        self.current = None;
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.current = None;
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn next_sample(&mut self) -> f32 {
        if !self.playing {
            return 0.0;
        }

        if self.current.as_ref().is_none_or(Voice::is_finished) {
            self.current = self
                .notes
                .next()
                .map(|note| Voice::new(Tone::music(note), self.sample_rate));
        }

        self.current
            .as_mut()
            .and_then(Voice::next_sample)
            .unwrap_or(0.0)
    }
}

// Messages from the audio thread to the stream callback
pub enum MixerCommand {
    Play(Voice),
    Music(bool),
    Volume(f32),
}

/// Sums the active effect voices and the music into one output sample.
pub struct Mixer {
    voices: Vec<Voice>,
    music: MusicTrack,
    volume: f32,
}

impl Mixer {
    #[must_use]
    pub fn new(sample_rate: f64) -> Self {
        Self {
            voices: Vec::new(),
            music: MusicTrack::new(Melody::korobeiniki(), sample_rate),
            volume: 0.5,
        }
    }

    pub fn apply(&mut self, command: MixerCommand) {
        match command {
            MixerCommand::Play(voice) => self.voices.push(voice),
            MixerCommand::Music(true) => self.music.start(),
            MixerCommand::Music(false) => self.music.stop(),
            MixerCommand::Volume(volume) => self.volume = volume.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn is_music_playing(&self) -> bool {
        self.music.is_playing()
    }

    #[cfg(test)]
    #[must_use]
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn next_sample(&mut self) -> f32 {
        let effects: f32 = self.voices.iter_mut().filter_map(Voice::next_sample).sum();
        self.voices.retain(|voice| !voice.is_finished());

        // Volume only scales the music, effects keep their fixed peak
        let music = self.music.next_sample() * self.volume;
        (effects + music).clamp(-1.0, 1.0)
    }
}

// Command to control the audio thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCommand {
    PlaySound(SoundEffect),
    StartMusic,
    StopMusic,
    SetMusicEnabled(bool),
    SetSoundEnabled(bool),
    SetVolume(f32), // 0.0 to 1.0
    Quit,
}

/// Audio thread bookkeeping: turns commands into mixer messages.
///
/// Music plays only while the game asks for it *and* the player has not
/// switched it off.
pub struct AudioController {
    sample_rate: f64,
    sound_enabled: bool,
    music_enabled: bool,
    music_requested: bool,
}

impl AudioController {
    #[must_use]
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            sound_enabled: true,
            music_enabled: true,
            music_requested: false,
        }
    }

    #[must_use]
    pub fn music_playing(&self) -> bool {
        self.music_enabled && self.music_requested
    }

    pub fn handle(&mut self, command: AudioCommand) -> Option<MixerCommand> {
        match command {
            AudioCommand::PlaySound(effect) => self
                .sound_enabled
                .then(|| MixerCommand::Play(Voice::new(effect.tone(), self.sample_rate))),
            AudioCommand::StartMusic => {
                self.music_requested = true;
                Some(MixerCommand::Music(self.music_playing()))
            }
            AudioCommand::StopMusic => {
                self.music_requested = false;
                Some(MixerCommand::Music(false))
            }
            AudioCommand::SetMusicEnabled(enabled) => {
                self.music_enabled = enabled;
                Some(MixerCommand::Music(self.music_playing()))
            }
            AudioCommand::SetSoundEnabled(enabled) => {
                self.sound_enabled = enabled;
                None
            }
            AudioCommand::SetVolume(volume) => Some(MixerCommand::Volume(volume)),
            AudioCommand::Quit => None,
        }
    }
}

/// Forwards engine events to the audio thread.
pub struct SoundHooks {
    sender: Option<Sender<AudioCommand>>,
}

impl SoundHooks {
    #[must_use]
    pub fn new(sender: Option<Sender<AudioCommand>>) -> Self {
        Self { sender }
    }

    fn send(&self, command: AudioCommand) {
        if let Some(sender) = &self.sender {
            match sender.try_send(command) {
                Ok(()) => {}
                Err(TrySendError::Full(command)) => {
                    debug!("Audio queue full, dropped {command:?}");
                }
                Err(TrySendError::Disconnected(_)) => {
                    trace!("Audio thread gone, nothing to send to");
                }
            }
        }
    }
}

impl GameListener for SoundHooks {
    fn on_rotate_accepted(&mut self) {
        self.send(AudioCommand::PlaySound(SoundEffect::Rotate));
    }

    fn on_piece_locked(&mut self, kind: LockKind) {
        if kind == LockKind::HardDrop {
            self.send(AudioCommand::PlaySound(SoundEffect::Drop));
        }
    }

    fn on_lines_cleared(&mut self, _count: u32) {
        self.send(AudioCommand::PlaySound(SoundEffect::LineClear));
    }

    fn on_game_over(&mut self, _final_score: u32) {
        self.send(AudioCommand::PlaySound(SoundEffect::GameOver));
    }

    fn on_run_state_changed(&mut self, _from: RunState, to: RunState) {
        match to {
            RunState::Running => self.send(AudioCommand::StartMusic),
            RunState::Paused | RunState::GameOver | RunState::NotStarted => {
                self.send(AudioCommand::StopMusic);
            }
        }
    }
}

// Player-facing audio settings and the handle to the audio thread
#[derive(Resource)]
pub struct AudioState {
    sender: Option<Sender<AudioCommand>>,
    available: Arc<AtomicBool>,
    music_enabled: bool,
    sound_enabled: bool,
    volume: f32,
}

impl AudioState {
    #[must_use]
    pub fn new(config: &AudioConfig) -> Self {
        let (sender, receiver) = bounded(64);
        let available = Arc::new(AtomicBool::new(true));

        // Start the audio thread
        let thread_available = Arc::clone(&available);
        let spawned = thread::Builder::new()
            .name("audio".to_string())
            .spawn(move || {
                if let Err(e) = run_audio_thread(&receiver) {
                    error!("Audio thread error: {e}");
                }
                thread_available.store(false, Ordering::Relaxed);
            });

        if let Err(e) = spawned {
            error!("Failed to start audio thread: {e}");
            available.store(false, Ordering::Relaxed);
        }

        let mut state = Self {
            sender: Some(sender),
            available,
            music_enabled: config.music_enabled,
            sound_enabled: config.sound_enabled,
            volume: config.volume.clamp(0.0, 1.0),
        };
        state.send(AudioCommand::SetVolume(state.volume));
        state.send(AudioCommand::SetMusicEnabled(state.music_enabled));
        state.send(AudioCommand::SetSoundEnabled(state.sound_enabled));
        state
    }

    /// An audio state with no thread behind it, every command is dropped.
    #[must_use]
    pub fn silent(config: &AudioConfig) -> Self {
        Self {
            sender: None,
            available: Arc::new(AtomicBool::new(false)),
            music_enabled: config.music_enabled,
            sound_enabled: config.sound_enabled,
            volume: config.volume.clamp(0.0, 1.0),
        }
    }

    /// A listener that turns engine events into sounds.
    #[must_use]
    pub fn hooks(&self) -> SoundHooks {
        SoundHooks::new(self.sender.clone())
    }

    fn send(&mut self, command: AudioCommand) {
        if let Some(sender) = &self.sender {
            if let Err(TrySendError::Disconnected(_)) = sender.try_send(command) {
                self.available.store(false, Ordering::Relaxed);
            }
        }
    }

    pub fn is_audio_available(&self) -> bool {
        self.sender.is_some() && self.available.load(Ordering::Relaxed)
    }

    pub fn is_music_enabled(&self) -> bool {
        self.music_enabled
    }

    pub fn is_sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn toggle_music(&mut self) {
        self.music_enabled = !self.music_enabled;
        self.send(AudioCommand::SetMusicEnabled(self.music_enabled));
    }

    pub fn toggle_sound(&mut self) {
        self.sound_enabled = !self.sound_enabled;
        self.send(AudioCommand::SetSoundEnabled(self.sound_enabled));
    }

    pub fn get_volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        // Clamp volume between 0.0 and 1.0
        self.volume = volume.clamp(0.0, 1.0);
        self.send(AudioCommand::SetVolume(self.volume));
    }

    /// Snapshot of the settings, for writing back to the config file.
    #[must_use]
    pub fn settings(&self) -> AudioConfig {
        AudioConfig {
            music_enabled: self.music_enabled,
            sound_enabled: self.sound_enabled,
            volume: self.volume,
        }
    }
}

impl Drop for AudioState {
    fn drop(&mut self) {
        self.send(AudioCommand::Quit);
    }
}

fn run_audio_thread(receiver: &Receiver<AudioCommand>) -> Result<()> {
    // Get the default audio device
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No audio output device found"))?;
    let config = device.default_output_config()?;
    let sample_rate = f64::from(config.sample_rate().0);
    info!(
        "Audio output at {sample_rate} Hz, melody loops every {:?}",
        Melody::korobeiniki().length()
    );

    let (mixer_sender, mixer_receiver) = bounded::<MixerCommand>(64);

    // Set up audio stream based on the device's sample format
    let _stream = match config.sample_format() {
        cpal::SampleFormat::F32 => {
            run_audio_stream::<f32>(&device, &config.into(), mixer_receiver, sample_rate)?
        }
        cpal::SampleFormat::I16 => {
            run_audio_stream::<i16>(&device, &config.into(), mixer_receiver, sample_rate)?
        }
        cpal::SampleFormat::U16 => {
            run_audio_stream::<u16>(&device, &config.into(), mixer_receiver, sample_rate)?
        }
        _ => return Err(anyhow::anyhow!("Unsupported audio format")),
    };

    let mut controller = AudioController::new(sample_rate);

    // Keep the thread alive and process commands
    while let Ok(command) = receiver.recv() {
        if command == AudioCommand::Quit {
            break;
        }
        debug!("Audio command: {command:?}");
        if let Some(message) = controller.handle(command) {
            let _ = mixer_sender.try_send(message);
        }
    }

    Ok(())
}

fn run_audio_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer_receiver: Receiver<MixerCommand>,
    sample_rate: f64,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = usize::from(config.channels);
    let mut mixer = Mixer::new(sample_rate);

    // Callback for error handling
    let err_fn = |err| error!("Error in audio stream: {err}");

    // Create the audio stream
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            while let Ok(message) = mixer_receiver.try_recv() {
                mixer.apply(message);
            }

            for frame in data.chunks_mut(channels) {
                let value = T::from_sample(mixer.next_sample());
                for sample in frame.iter_mut() {
                    *sample = value;
                }
            }
        },
        err_fn,
        None,
    )?;

    // Start the stream
    stream.play()?;

    Ok(stream)
}
