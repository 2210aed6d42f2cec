//! Frame driver
//!
//! `Game` owns a session plus its collaborators. Each frame it turns the
//! wall clock into a delta, runs one tick, then fans the tick's events out
//! to audio and the leaderboard. Collaborator failures are logged and
//! degrade to defaults; they never stop the loop.

use crate::audio::{AudioMixer, AudioSink, MusicTrack, cue_for_event, music_for_phase};
use crate::consts::FALLBACK_VICTORY_THRESHOLD;
use crate::leaderboard::{Leaderboard, ScoreEntry, SubmitReceipt, victory_threshold};
use crate::platform::FrameClock;
use crate::settings::Settings;
use crate::sim::{GameEvent, GamePhase, GameState, InputEvent, TickInput, tick};
use crate::snapshot::RenderSnapshot;
use crate::tuning::Tuning;

/// A finished run waiting to be (re)sent
#[derive(Debug, Clone, PartialEq)]
pub struct PendingScore {
    pub name: String,
    pub score: u64,
    pub duration_secs: f64,
}

pub struct Game<L: Leaderboard, A: AudioSink> {
    pub state: GameState,
    input: TickInput,
    clock: FrameClock,
    settings: Settings,
    leaderboard: L,
    audio: A,
    top_scores: Vec<ScoreEntry>,
    pending_submission: Option<PendingScore>,
    last_submission: Option<SubmitReceipt>,
}

impl<L: Leaderboard, A: AudioSink> Game<L, A> {
    pub fn new(seed: u64, tuning: Tuning, settings: Settings, leaderboard: L, mut audio: A) -> Self {
        audio.set_mixer(AudioMixer::from_settings(&settings));
        audio.play_music(MusicTrack::Menu);
        log::info!("Game initialized with seed: {}", seed);
        Self {
            state: GameState::new(seed, tuning),
            input: TickInput::new(),
            clock: FrameClock::new(),
            settings,
            leaderboard,
            audio,
            top_scores: Vec::new(),
            pending_submission: None,
            last_submission: None,
        }
    }

    /// Queue input for the next tick
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one animation frame stamped `now_ms`
    pub fn frame(&mut self, now_ms: f64) {
        let dt_ms = self.clock.delta(now_ms);
        self.step(dt_ms);
    }

    /// Run one tick of `dt_ms` and dispatch its events
    pub fn step(&mut self, dt_ms: f32) {
        tick(&mut self.state, &mut self.input, dt_ms);
        for event in self.state.drain_events() {
            self.dispatch(event);
        }
    }

    /// The tab was hidden: pause a live run and drop the stale timestamp
    pub fn suspend(&mut self) {
        if self.state.phase == GamePhase::Playing {
            self.input.push(InputEvent::Pause);
            log::info!("Auto-paused (tab hidden)");
        }
        self.clock.reset();
    }

    fn dispatch(&mut self, event: GameEvent) {
        if let Some(cue) = cue_for_event(&event) {
            self.audio.play_cue(cue);
        }
        match event {
            GameEvent::PhaseChanged { from, to } => {
                if let Some(track) = music_for_phase(to) {
                    self.audio.play_music(track);
                }
                if from == GamePhase::Start && to == GamePhase::Playing {
                    self.begin_session();
                }
            }
            GameEvent::RunFinished(_) => self.submit_run(),
            _ => {}
        }
    }

    fn begin_session(&mut self) {
        self.pending_submission = None;
        self.last_submission = None;

        let n = self.state.tuning.leaderboard_top_n;
        self.state.victory_threshold = match self.leaderboard.top_scores(n) {
            Ok(top) => {
                let threshold = victory_threshold(&top, n);
                self.top_scores = top;
                threshold
            }
            Err(err) => {
                log::warn!("Leaderboard fetch failed, assuming {}: {}", FALLBACK_VICTORY_THRESHOLD, err);
                FALLBACK_VICTORY_THRESHOLD
            }
        };
        log::debug!("Victory threshold {}", self.state.victory_threshold);
    }

    fn submit_run(&mut self) {
        let Some(name) = self.settings.sanitized_name() else {
            log::warn!("No player name set, score not submitted");
            return;
        };
        self.pending_submission = Some(PendingScore {
            name,
            score: self.state.score,
            duration_secs: self.state.duration_secs(),
        });
        self.retry_submission();
    }

    /// Send the pending score; returns true once it has been accepted
    pub fn retry_submission(&mut self) -> bool {
        let Some(pending) = self.pending_submission.clone() else {
            return false;
        };
        match self
            .leaderboard
            .submit_score(&pending.name, pending.score, pending.duration_secs)
        {
            Ok(receipt) => {
                log::info!(
                    "Submitted {} for {}: rank {:?}, personal best {}",
                    pending.score,
                    pending.name,
                    receipt.global_rank,
                    receipt.is_personal_best
                );
                self.last_submission = Some(receipt);
                self.pending_submission = None;
                true
            }
            Err(err) => {
                log::warn!("Score submission failed: {}", err);
                self.last_submission = None;
                false
            }
        }
    }

    /// Receipt of the last accepted submission this session
    pub fn last_submission(&self) -> Option<SubmitReceipt> {
        self.last_submission
    }

    /// Score waiting on a retry
    pub fn pending_submission(&self) -> Option<&PendingScore> {
        self.pending_submission.as_ref()
    }

    /// Top-N as fetched at session start
    pub fn top_scores(&self) -> &[ScoreEntry] {
        &self.top_scores
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Apply and persist new preferences
    pub fn set_settings(&mut self, settings: Settings) {
        let settings = settings.normalized();
        self.audio.set_mixer(AudioMixer::from_settings(&settings));
        settings.save();
        self.settings = settings;
    }

    pub fn leaderboard(&self) -> &L {
        &self.leaderboard
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::capture(&self.state, &self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{RecordingAudio, SoundCue};
    use crate::consts::FRAME_MS;
    use crate::leaderboard::{LeaderboardError, LocalLeaderboard};
    use crate::sim::{HeightClass, Obstacle, RunOutcome};

    /// Backend that can be switched off
    struct FlakyLeaderboard {
        inner: LocalLeaderboard,
        down: bool,
    }

    impl Leaderboard for FlakyLeaderboard {
        fn submit_score(
            &mut self,
            name: &str,
            score: u64,
            duration_secs: f64,
        ) -> Result<SubmitReceipt, LeaderboardError> {
            if self.down {
                return Err(LeaderboardError::Unavailable("offline".to_string()));
            }
            self.inner.submit_score(name, score, duration_secs)
        }

        fn top_scores(&self, limit: usize) -> Result<Vec<ScoreEntry>, LeaderboardError> {
            if self.down {
                return Err(LeaderboardError::Unavailable("offline".to_string()));
            }
            self.inner.top_scores(limit)
        }
    }

    fn quiet_tuning() -> Tuning {
        Tuning {
            obstacle_frequency: 0,
            enemy_frequency: 0,
            pickup_frequency: 0,
            tall_interval_min: u32::MAX,
            tall_interval_max: u32::MAX,
            pattern_interval_min: u32::MAX,
            pattern_interval_max: u32::MAX,
            ..Tuning::default()
        }
    }

    fn game<L: Leaderboard>(leaderboard: L) -> Game<L, RecordingAudio> {
        game_with(quiet_tuning(), leaderboard)
    }

    fn game_with<L: Leaderboard>(tuning: Tuning, leaderboard: L) -> Game<L, RecordingAudio> {
        Game::new(3, tuning, Settings::default(), leaderboard, RecordingAudio::new())
    }

    fn two_entry_board() -> LocalLeaderboard {
        let mut board = LocalLeaderboard::new(2);
        board.submit_score("A", 300, 10.0).unwrap();
        board.submit_score("B", 200, 10.0).unwrap();
        board
    }

    /// Start a run, score `score`, crash, and wait out the crash
    fn play_and_crash<L: Leaderboard>(game: &mut Game<L, RecordingAudio>, score: u64) {
        game.push_input(InputEvent::Start);
        game.step(FRAME_MS);
        game.state.score = score;
        let tuning = game.state.tuning.clone();
        let mut obstacle = Obstacle::spawn(999, HeightClass::Low, &tuning, &mut game.state.rng);
        obstacle.rect.pos.x = tuning.player_x + 10.0;
        game.state.obstacles.push(obstacle);
        for _ in 0..25 {
            game.step(100.0);
        }
        assert_eq!(game.state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_music_follows_phase() {
        let mut game = game(LocalLeaderboard::new(10));
        assert_eq!(game.audio().current_track(), Some(MusicTrack::Menu));

        game.push_input(InputEvent::Start);
        game.step(FRAME_MS);
        assert_eq!(game.audio().current_track(), Some(MusicTrack::Game));

        game.push_input(InputEvent::Pause);
        game.step(FRAME_MS);
        assert_eq!(game.audio().current_track(), Some(MusicTrack::Pause));
    }

    #[test]
    fn test_jump_plays_cue() {
        let mut game = game(LocalLeaderboard::new(10));
        game.push_input(InputEvent::Start);
        game.step(FRAME_MS);
        game.push_input(InputEvent::Jump);
        game.step(FRAME_MS);
        assert_eq!(game.audio().count(SoundCue::Jump), 1);
    }

    #[test]
    fn test_empty_board_any_score_wins() {
        let mut game = game(LocalLeaderboard::new(10));
        play_and_crash(&mut game, 5);
        assert_eq!(game.state.victory_threshold, 1);
        assert_eq!(game.state.outcome, Some(RunOutcome::Victory));
        assert_eq!(game.audio().count(SoundCue::Crash), 1);
        assert_eq!(game.audio().count(SoundCue::VictoryFanfare), 1);

        let receipt = game.last_submission().unwrap();
        assert_eq!(receipt.global_rank, Some(1));
        assert!(receipt.is_personal_best);
        assert_eq!(game.leaderboard().top_score(), Some(5));
    }

    #[test]
    fn test_full_board_threshold() {
        let tuning = Tuning {
            leaderboard_top_n: 2,
            ..quiet_tuning()
        };
        let mut game = game_with(tuning, two_entry_board());
        play_and_crash(&mut game, 150);
        assert_eq!(game.state.victory_threshold, 201);
        assert_eq!(game.state.outcome, Some(RunOutcome::Fail));
        assert_eq!(game.audio().count(SoundCue::Fail), 1);
        assert_eq!(game.top_scores().len(), 2);
        assert_eq!(game.last_submission().unwrap().global_rank, None);
    }

    #[test]
    fn test_short_board_any_score_wins() {
        // Two entries against a top ten is not a full board
        let mut game = game(two_entry_board());
        play_and_crash(&mut game, 150);
        assert_eq!(game.state.victory_threshold, 1);
        assert_eq!(game.state.outcome, Some(RunOutcome::Victory));
    }

    #[test]
    fn test_offline_board_degrades_and_retries() {
        let mut game = game(FlakyLeaderboard {
            inner: LocalLeaderboard::new(10),
            down: true,
        });
        play_and_crash(&mut game, 1200);
        assert_eq!(game.state.victory_threshold, FALLBACK_VICTORY_THRESHOLD);
        assert_eq!(game.state.outcome, Some(RunOutcome::Victory));
        assert!(game.last_submission().is_none());
        assert_eq!(game.pending_submission().map(|p| p.score), Some(1200));

        // Still down
        assert!(!game.retry_submission());

        game.leaderboard.down = false;
        assert!(game.retry_submission());
        assert!(game.pending_submission().is_none());
        assert_eq!(game.last_submission().unwrap().global_rank, Some(1));
        assert!(!game.retry_submission());
    }

    #[test]
    fn test_new_run_clears_submission() {
        let mut game = game(LocalLeaderboard::new(10));
        play_and_crash(&mut game, 5);
        assert!(game.last_submission().is_some());

        game.push_input(InputEvent::Restart);
        game.step(FRAME_MS);
        game.push_input(InputEvent::Start);
        game.step(FRAME_MS);
        assert!(game.last_submission().is_none());
        // Board now has one entry, so any positive score still wins
        assert_eq!(game.state.victory_threshold, 1);
    }

    #[test]
    fn test_suspend_pauses_and_resets_clock() {
        let mut game = game(LocalLeaderboard::new(10));
        game.frame(1_000.0);
        game.push_input(InputEvent::Start);
        game.frame(1_016.0);
        assert_eq!(game.state.phase, GamePhase::Playing);

        game.suspend();
        game.frame(120_000.0);
        assert_eq!(game.state.phase, GamePhase::Paused);
        // The hidden minute was never integrated
        assert!(game.state.time_ms < 100.0);
    }

    #[test]
    fn test_muted_settings_silence_cues() {
        let mut game = game(LocalLeaderboard::new(10));
        game.set_settings(Settings {
            muted: true,
            ..Settings::default()
        });
        game.push_input(InputEvent::Start);
        game.step(FRAME_MS);
        game.push_input(InputEvent::Jump);
        game.step(FRAME_MS);
        assert!(game.audio().cues.is_empty());
    }
}
