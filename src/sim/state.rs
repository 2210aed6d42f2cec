//! Game state and core simulation types
//!
//! Everything a session mutates lives in one owned `GameState`; subsystems
//! get the pieces they need passed in by reference.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::EffectModifiers;
use super::entities::{Background, Enemy, HeightClass, Obstacle, Pickup, ScorePopup};
use super::player::Player;
use super::ragdoll::Ragdoll;
use super::spawn::SpawnScheduler;
use crate::consts::FALLBACK_VICTORY_THRESHOLD;
use crate::tuning::Tuning;

/// Top-level game state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for start input
    Start,
    /// Active gameplay
    Playing,
    /// Game is paused; nothing in the world moves
    Paused,
    /// Ragdoll is flying, run is over but not yet scored
    Crashing,
    /// Run ended
    GameOver,
}

/// How the finished run compares to the leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Victory,
    Fail,
}

/// Things that happened during a tick, for audio and UI collaborators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Jump,
    Crash,
    /// Cleared an obstacle
    ObstaclePassed(HeightClass),
    BribeCollected,
    Stomp,
    ParachuteDeployed,
    /// Parachute ran out before touchdown
    ParachuteExpired,
    /// Back on the ground after a jump or bounce
    Landed,
    Milestone { score: u64 },
    SpeedUp { speed: f32 },
    PhaseChanged { from: GamePhase, to: GamePhase },
    RunFinished(RunOutcome),
}

/// World scroll speed (px per 60 Hz frame)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedState {
    /// Milestone-ramped speed before effect modifiers
    pub base: f32,
    /// What the world actually scrolls at this tick
    pub current: f32,
    pub max: f32,
    pub ramp: f32,
}

impl SpeedState {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            base: tuning.base_speed,
            current: tuning.base_speed,
            max: tuning.max_speed,
            ramp: tuning.speed_ramp,
        }
    }

    /// Step the ramp; returns false once capped
    pub fn ramp_up(&mut self) -> bool {
        if self.base >= self.max {
            return false;
        }
        self.base = (self.base + self.ramp).min(self.max);
        true
    }
}

/// Complete session state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub(crate) rng: Pcg32,
    pub phase: GamePhase,
    pub score: u64,
    /// Simulation frames while playing
    pub frame: u64,
    /// Time spent playing this run (ms)
    pub time_ms: f64,
    pub speed: SpeedState,
    next_milestone: u64,
    pub player: Player,
    /// Present from the crash until the next run starts
    pub ragdoll: Option<Ragdoll>,
    pub obstacles: Vec<Obstacle>,
    pub enemies: Vec<Enemy>,
    pub pickups: Vec<Pickup>,
    pub popups: Vec<ScorePopup>,
    pub background: Background,
    pub effects: EffectModifiers,
    pub spawner: SpawnScheduler,
    pub crash_timer_ms: f32,
    pub screen_shake: f32,
    /// Score needed for the victory cue; written by the leaderboard lookup
    pub victory_threshold: u64,
    pub outcome: Option<RunOutcome>,
    /// Pending events, drained by the frame driver
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new session on the title screen
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let spawner = SpawnScheduler::new(&tuning, &mut rng);
        Self {
            seed,
            rng,
            phase: GamePhase::Start,
            score: 0,
            frame: 0,
            time_ms: 0.0,
            speed: SpeedState::from_tuning(&tuning),
            next_milestone: tuning.milestone_interval,
            player: Player::new(&tuning),
            ragdoll: None,
            obstacles: Vec::new(),
            enemies: Vec::new(),
            pickups: Vec::new(),
            popups: Vec::new(),
            background: Background::default(),
            effects: EffectModifiers::new(),
            spawner,
            crash_timer_ms: 0.0,
            screen_shake: 0.0,
            victory_threshold: FALLBACK_VICTORY_THRESHOLD,
            outcome: None,
            events: Vec::new(),
            tuning,
        }
    }

    /// Wipe everything a run mutates; the RNG stream carries on
    pub fn reset(&mut self) {
        let tuning = &self.tuning;
        self.score = 0;
        self.frame = 0;
        self.time_ms = 0.0;
        self.speed = SpeedState::from_tuning(tuning);
        self.next_milestone = tuning.milestone_interval;
        self.player = Player::new(tuning);
        self.ragdoll = None;
        self.obstacles.clear();
        self.enemies.clear();
        self.pickups.clear();
        self.popups.clear();
        self.effects.clear();
        self.spawner = SpawnScheduler::new(tuning, &mut self.rng);
        self.crash_timer_ms = 0.0;
        self.screen_shake = 0.0;
        self.outcome = None;
        log::info!("New run (seed {})", self.seed);
    }

    pub fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::info!("Phase {:?} -> {:?}", from, to);
        self.phase = to;
        self.events.push(GameEvent::PhaseChanged { from, to });
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Award points scaled by the active score modifier; returns what was added
    pub fn award(&mut self, base_points: u64) -> u64 {
        let points = (base_points as f32 * self.effects.score_mod()).round() as u64;
        self.score += points;
        points
    }

    /// Fixed deduction, floored at zero
    pub fn penalize(&mut self, points: u64) {
        self.score = self.score.saturating_sub(points);
    }

    pub fn popup(&mut self, pos: Vec2, amount: i64) {
        self.popups.push(ScorePopup::new(pos, amount));
    }

    /// Fire milestone events and ramp speed for every crossed milestone
    pub fn check_milestones(&mut self) {
        if self.tuning.milestone_interval == 0 {
            return;
        }
        while self.score >= self.next_milestone {
            let score = self.next_milestone;
            self.next_milestone += self.tuning.milestone_interval;
            self.events.push(GameEvent::Milestone { score });
            if self.speed.ramp_up() {
                log::info!("Milestone {}: speed -> {}", score, self.speed.base);
                self.events.push(GameEvent::SpeedUp {
                    speed: self.speed.base,
                });
            }
        }
    }

    /// Ramped speed folded with the effect multiplier
    pub fn refresh_speed(&mut self) {
        self.speed.current = self.speed.base * self.effects.speed_mod();
    }

    pub fn duration_secs(&self) -> f64 {
        self.time_ms / 1000.0
    }
}
