//! Audio cues and sinks
//!
//! The simulation only emits `GameEvent`s; this module maps them onto named
//! cues and background tracks and hands them to an `AudioSink`. Playback is
//! fire-and-forget: sinks never report back into the game.

use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::sim::{GameEvent, GamePhase, HeightClass, RunOutcome};

/// One-shot sound effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    Jump,
    Crash,
    /// Cleared a low obstacle
    PointLow,
    /// Cleared a tall obstacle (also used for bribes)
    PointTall,
    Milestone,
    SpeedUp,
    VictoryFanfare,
    Fail,
}

impl SoundCue {
    /// Asset name used by the host page
    pub fn name(&self) -> &'static str {
        match self {
            SoundCue::Jump => "jump",
            SoundCue::Crash => "crash",
            SoundCue::PointLow => "pointLow",
            SoundCue::PointTall => "pointTall",
            SoundCue::Milestone => "milestone",
            SoundCue::SpeedUp => "speedUp",
            SoundCue::VictoryFanfare => "victory-fanfare",
            SoundCue::Fail => "fail",
        }
    }
}

/// Looping background tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicTrack {
    Menu,
    Game,
    Pause,
}

impl MusicTrack {
    pub fn name(&self) -> &'static str {
        match self {
            MusicTrack::Menu => "menu",
            MusicTrack::Game => "game",
            MusicTrack::Pause => "pause",
        }
    }
}

/// Which cue (if any) an event should play
pub fn cue_for_event(event: &GameEvent) -> Option<SoundCue> {
    match event {
        // A stomp is a trampoline jump as far as the ear is concerned
        GameEvent::Jump | GameEvent::Stomp => Some(SoundCue::Jump),
        GameEvent::Crash => Some(SoundCue::Crash),
        GameEvent::ObstaclePassed(HeightClass::Low) => Some(SoundCue::PointLow),
        GameEvent::ObstaclePassed(HeightClass::Tall) | GameEvent::BribeCollected => {
            Some(SoundCue::PointTall)
        }
        GameEvent::Milestone { .. } => Some(SoundCue::Milestone),
        GameEvent::SpeedUp { .. } => Some(SoundCue::SpeedUp),
        GameEvent::RunFinished(RunOutcome::Victory) => Some(SoundCue::VictoryFanfare),
        GameEvent::RunFinished(RunOutcome::Fail) => Some(SoundCue::Fail),
        GameEvent::ParachuteDeployed
        | GameEvent::ParachuteExpired
        | GameEvent::Landed
        | GameEvent::PhaseChanged { .. } => None,
    }
}

/// Background track for a phase; None keeps whatever is playing
pub fn music_for_phase(phase: GamePhase) -> Option<MusicTrack> {
    match phase {
        GamePhase::Start | GamePhase::GameOver => Some(MusicTrack::Menu),
        GamePhase::Playing => Some(MusicTrack::Game),
        GamePhase::Paused => Some(MusicTrack::Pause),
        GamePhase::Crashing => None,
    }
}

/// Fire-and-forget audio output
pub trait AudioSink {
    fn play_cue(&mut self, cue: SoundCue);
    fn play_music(&mut self, track: MusicTrack);
    /// Apply new volume settings
    fn set_mixer(&mut self, mixer: AudioMixer);
}

/// Volume model shared by every sink
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioMixer {
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
}

impl Default for AudioMixer {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl AudioMixer {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut mixer = Self {
            master_volume: 1.0,
            sfx_volume: 1.0,
            music_volume: 1.0,
            muted: settings.muted,
        };
        mixer.set_master_volume(settings.master_volume);
        mixer.set_sfx_volume(settings.sfx_volume);
        mixer.set_music_volume(settings.music_volume);
        mixer
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Get effective cue volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    pub fn effective_music_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.music_volume
        }
    }
}

/// Sink that remembers what it was asked to play (headless runs, tests)
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    pub mixer: AudioMixer,
    pub cues: Vec<SoundCue>,
    pub tracks: Vec<MusicTrack>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_track(&self) -> Option<MusicTrack> {
        self.tracks.last().copied()
    }

    pub fn count(&self, cue: SoundCue) -> usize {
        self.cues.iter().filter(|c| **c == cue).count()
    }
}

impl AudioSink for RecordingAudio {
    fn play_cue(&mut self, cue: SoundCue) {
        // Inaudible cues are dropped, same as a real device
        if self.mixer.effective_volume() <= 0.0 {
            return;
        }
        self.cues.push(cue);
    }

    fn play_music(&mut self, track: MusicTrack) {
        if self.current_track() != Some(track) {
            self.tracks.push(track);
        }
    }

    fn set_mixer(&mut self, mixer: AudioMixer) {
        self.mixer = mixer;
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

/// Procedural cues through the Web Audio API
#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioMixer, AudioSink, MusicTrack, SoundCue};

    /// Synthesizes cues; music files are streamed by the host page, which
    /// polls `current_track`
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        mixer: AudioMixer,
        current_track: Option<MusicTrack>,
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudio {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                mixer: AudioMixer::default(),
                current_track: None,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn current_track(&self) -> Option<MusicTrack> {
            self.current_track
        }

        pub fn music_volume(&self) -> f32 {
            self.mixer.effective_music_volume()
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Single enveloped tone sliding from `from` to `to` Hz
        fn sweep(
            &self,
            ctx: &AudioContext,
            at: f64,
            (from, to): (f32, f32),
            duration: f64,
            osc_type: OscillatorType,
            vol: f32,
        ) {
            let Some((osc, gain)) = self.create_osc(ctx, from, osc_type) else {
                return;
            };
            gain.gain().set_value_at_time(vol, at).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, at + duration)
                .ok();
            osc.frequency().set_value_at_time(from, at).ok();
            if to != from {
                osc.frequency()
                    .exponential_ramp_to_value_at_time(to, at + duration)
                    .ok();
            }
            osc.start_with_when(at).ok();
            osc.stop_with_when(at + duration + 0.05).ok();
        }

        /// Rising arpeggio, one note every `spacing` seconds
        fn arpeggio(&self, ctx: &AudioContext, notes: &[f32], spacing: f64, vol: f32) {
            let t = ctx.current_time();
            for (i, &freq) in notes.iter().enumerate() {
                let at = t + i as f64 * spacing;
                self.sweep(ctx, at, (freq, freq), spacing * 1.5, OscillatorType::Triangle, vol);
            }
        }
    }

    impl AudioSink for WebAudio {
        fn play_cue(&mut self, cue: SoundCue) {
            let vol = self.mixer.effective_volume();
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let t = ctx.current_time();
            match cue {
                SoundCue::Jump => {
                    self.sweep(ctx, t, (220.0, 660.0), 0.15, OscillatorType::Square, vol * 0.25)
                }
                SoundCue::Crash => {
                    self.sweep(ctx, t, (120.0, 30.0), 0.4, OscillatorType::Sawtooth, vol * 0.5);
                    self.sweep(ctx, t, (1500.0, 1500.0), 0.1, OscillatorType::Square, vol * 0.2);
                }
                SoundCue::PointLow => {
                    self.sweep(ctx, t, (660.0, 660.0), 0.08, OscillatorType::Sine, vol * 0.3)
                }
                SoundCue::PointTall => {
                    self.arpeggio(ctx, &[660.0, 880.0], 0.06, vol * 0.3);
                }
                SoundCue::Milestone => {
                    self.arpeggio(ctx, &[523.0, 659.0, 784.0], 0.08, vol * 0.3);
                }
                SoundCue::SpeedUp => {
                    self.sweep(ctx, t, (300.0, 1200.0), 0.3, OscillatorType::Sawtooth, vol * 0.2)
                }
                SoundCue::VictoryFanfare => {
                    self.arpeggio(ctx, &[523.0, 659.0, 784.0, 1047.0], 0.12, vol * 0.35);
                }
                SoundCue::Fail => {
                    self.arpeggio(ctx, &[392.0, 330.0, 262.0], 0.2, vol * 0.3);
                }
            }
        }

        fn play_music(&mut self, track: MusicTrack) {
            if self.current_track != Some(track) {
                log::info!("Music -> {}", track.name());
                self.current_track = Some(track);
            }
        }

        fn set_mixer(&mut self, mixer: AudioMixer) {
            self.mixer = mixer;
        }
    }
}
