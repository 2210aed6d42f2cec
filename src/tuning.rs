//! Data-driven game balance
//!
//! Every gameplay number lives here so a session can be re-tuned from JSON
//! without touching simulation code. Per-frame values are expressed at
//! 60 Hz and scaled by the tick's step factor.

use serde::{Deserialize, Serialize};

use crate::sim::ragdoll::RagdollConfig;

/// Named numeric tunables applied at session start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === World ===
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Top of the ground plane (y grows downward)
    pub ground_y: f32,

    // === Player ===
    pub player_x: f32,
    pub player_width: f32,
    pub player_height: f32,
    pub gravity: f32,
    pub jump_power: f32,
    /// Upward velocity applied after stomping an enemy
    pub stomp_bounce: f32,

    // === Parachute ===
    /// Altitude above ground (px) that deploys the parachute
    pub parachute_altitude: f32,
    pub parachute_duration_ms: f32,
    /// A tap counts as "recent" for this long
    pub parachute_tap_window_ms: f32,
    /// Gravity multiplier while drifting
    pub parachute_gravity_scale: f32,
    pub parachute_fall_speed: f32,
    /// Upward acceleration while taps keep coming
    pub parachute_lift: f32,
    pub parachute_max_rise: f32,
    /// Downward speed forced when the parachute expires
    pub min_fall_speed: f32,

    // === Speed & scoring ===
    pub base_speed: f32,
    pub max_speed: f32,
    pub speed_ramp: f32,
    pub milestone_interval: u64,
    pub score_tick_frames: u64,
    pub score_tick_points: u64,
    pub low_obstacle_points: u64,
    pub tall_obstacle_points: u64,
    pub bribe_points: u64,
    pub stomp_penalty: u64,

    // === Spawning ===
    pub min_spawn_gap: f32,
    pub obstacle_frequency: u64,
    /// Minimum px between the last obstacle's trailing edge and the screen edge
    pub min_obstacle_gap: f32,
    pub tall_interval_min: u32,
    pub tall_interval_max: u32,
    pub enemy_frequency: u64,
    pub pickup_frequency: u64,
    pub pattern_interval_min: u32,
    pub pattern_interval_max: u32,
    pub pattern_spacing: f32,
    pub pickup_size: f32,

    // === Effects ===
    pub penalty_duration_ms: f32,
    pub penalty_speed_mult: f32,
    pub penalty_score_mult: f32,
    pub bonus_duration_ms: f32,
    pub bonus_speed_mult: f32,
    pub bonus_score_mult: f32,

    // === Crash ===
    pub crash_duration_ms: f32,
    pub crash_shake: f32,
    pub shake_decay: f32,
    pub ragdoll: RagdollConfig,

    // === Leaderboard ===
    pub leaderboard_top_n: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 400.0,
            ground_y: 340.0,

            player_x: 100.0,
            player_width: 40.0,
            player_height: 60.0,
            gravity: 0.6,
            jump_power: -13.0,
            stomp_bounce: -15.0,

            parachute_altitude: 150.0,
            parachute_duration_ms: 3000.0,
            parachute_tap_window_ms: 300.0,
            parachute_gravity_scale: 0.15,
            parachute_fall_speed: 1.2,
            parachute_lift: 0.35,
            parachute_max_rise: 3.0,
            min_fall_speed: 2.0,

            base_speed: 5.0,
            max_speed: 12.0,
            speed_ramp: 0.5,
            milestone_interval: 500,
            score_tick_frames: 10,
            score_tick_points: 1,
            low_obstacle_points: 10,
            tall_obstacle_points: 25,
            bribe_points: 100,
            stomp_penalty: 50,

            min_spawn_gap: 200.0,
            obstacle_frequency: 90,
            min_obstacle_gap: 250.0,
            tall_interval_min: 150,
            tall_interval_max: 300,
            enemy_frequency: 150,
            pickup_frequency: 120,
            pattern_interval_min: 200,
            pattern_interval_max: 500,
            pattern_spacing: 45.0,
            pickup_size: 25.0,

            penalty_duration_ms: 5000.0,
            penalty_speed_mult: 0.85,
            penalty_score_mult: 0.5,
            bonus_duration_ms: 7000.0,
            bonus_speed_mult: 1.15,
            bonus_score_mult: 2.0,

            crash_duration_ms: 2000.0,
            crash_shake: 12.0,
            shake_decay: 0.9,
            ragdoll: RagdollConfig::default(),

            leaderboard_top_n: 10,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning override; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Player's y when standing on the ground
    #[inline]
    pub fn player_ground_y(&self) -> f32 {
        self.ground_y - self.player_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "gravity": 0.8, "min_spawn_gap": 300.0 }"#).unwrap();
        assert_eq!(tuning.gravity, 0.8);
        assert_eq!(tuning.min_spawn_gap, 300.0);
        assert_eq!(tuning.jump_power, Tuning::default().jump_power);
    }

    #[test]
    fn test_json_roundtrip() {
        let tuning = Tuning::default();
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(Tuning::from_json("{ gravity: ").is_err());
    }
}
