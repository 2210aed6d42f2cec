//! Campaign Runner - A side-scrolling runner with ragdoll crashes
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, spawning, game state)
//! - `game`: Frame driver wiring the simulation to its collaborators
//! - `snapshot`: Read-only render view of the simulation
//! - `platform`: Browser/native platform abstraction
//! - `leaderboard`: Score submission and top-N lookup
//! - `audio`: Sound cues, music tracks and volume mixing
//! - `settings`: Player preferences
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod game;
pub mod leaderboard;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod snapshot;
pub mod tuning;

pub use game::Game;
pub use leaderboard::{Leaderboard, LeaderboardError, LocalLeaderboard};
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Reference frame duration; per-frame tunables are expressed at this rate
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
    /// Largest elapsed time a single tick may integrate (tab suspension guard)
    pub const MAX_DT_MS: f32 = 100.0;

    /// Victory threshold assumed when the leaderboard cannot be read
    pub const FALLBACK_VICTORY_THRESHOLD: u64 = 1000;
}

/// Linear interpolation from `a` toward `b` by `t`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Convert elapsed milliseconds to a 60 Hz step factor
#[inline]
pub fn step_factor(dt_ms: f32) -> f32 {
    dt_ms / consts::FRAME_MS
}
