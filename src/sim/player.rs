//! The runner: jump physics, parachute drift and procedural pose

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;
use crate::lerp;
use crate::tuning::Tuning;

/// Parachute sub-state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parachute {
    pub active: bool,
    pub remaining_ms: f32,
    /// Session time of the last tap while drifting
    pub last_tap_ms: Option<f64>,
    /// Deploys at most once per jump
    pub used_this_jump: bool,
}

impl Parachute {
    fn close(&mut self) {
        self.active = false;
        self.remaining_ms = 0.0;
        self.last_tap_ms = None;
    }

    fn tapped_recently(&self, now_ms: f64, window_ms: f32) -> bool {
        self.last_tap_ms
            .is_some_and(|tap| now_ms - tap <= f64::from(window_ms))
    }
}

/// Joint angles (radians) and offsets for the procedural rig
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseAngles {
    pub leg_left: f32,
    pub leg_right: f32,
    pub arm_left: f32,
    pub arm_right: f32,
    /// Vertical head offset (px)
    pub head_bob: f32,
    pub lean: f32,
}

impl PoseAngles {
    fn lerp_toward(&mut self, target: &PoseAngles, t: f32) {
        self.leg_left = lerp(self.leg_left, target.leg_left, t);
        self.leg_right = lerp(self.leg_right, target.leg_right, t);
        self.arm_left = lerp(self.arm_left, target.arm_left, t);
        self.arm_right = lerp(self.arm_right, target.arm_right, t);
        self.head_bob = lerp(self.head_bob, target.head_bob, t);
        self.lean = lerp(self.lean, target.lean, t);
    }
}

/// Current pose eased toward a per-state target
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerPose {
    pub current: PoseAngles,
    pub target: PoseAngles,
    pub run_phase: f32,
}

/// Pose smoothing per 60 Hz frame
const POSE_LERP: f32 = 0.2;

/// What happened to the player this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerUpdate {
    pub landed: bool,
    pub parachute_deployed: bool,
    pub parachute_expired: bool,
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub vy: f32,
    pub size: Vec2,
    pub jumping: bool,
    pub parachute: Parachute,
    pub pose: PlayerPose,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            pos: Vec2::new(tuning.player_x, tuning.player_ground_y()),
            vy: 0.0,
            size: Vec2::new(tuning.player_width, tuning.player_height),
            jumping: false,
            parachute: Parachute::default(),
            pose: PlayerPose::default(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    #[inline]
    pub fn has_parachute(&self) -> bool {
        self.parachute.active
    }

    /// Height of the feet above the ground
    pub fn altitude(&self, tuning: &Tuning) -> f32 {
        tuning.ground_y - (self.pos.y + self.size.y)
    }

    /// Jump request: leaves the ground, or taps the parachute in the air
    ///
    /// Returns true when a new jump actually started.
    pub fn request_jump(&mut self, tuning: &Tuning, now_ms: f64) -> bool {
        if !self.jumping {
            self.vy = tuning.jump_power;
            self.jumping = true;
            self.parachute.used_this_jump = false;
            return true;
        }
        if self.parachute.active {
            self.parachute.last_tap_ms = Some(now_ms);
        }
        false
    }

    /// Trampoline off a stomped enemy; counts as a fresh jump
    pub fn bounce(&mut self, tuning: &Tuning) {
        self.vy = tuning.stomp_bounce;
        self.jumping = true;
        self.parachute.close();
        self.parachute.used_this_jump = false;
    }

    /// Integrate one tick of gravity, parachute and ground contact
    pub fn update(&mut self, tuning: &Tuning, dt_ms: f32, step: f32, now_ms: f64) -> PlayerUpdate {
        let mut result = PlayerUpdate::default();

        if self.parachute.active {
            self.parachute.remaining_ms -= dt_ms;
            if self.parachute.remaining_ms <= 0.0 {
                // Never leave the player floating after expiry
                self.parachute.close();
                self.vy = self.vy.max(tuning.min_fall_speed);
                result.parachute_expired = true;
            } else if self
                .parachute
                .tapped_recently(now_ms, tuning.parachute_tap_window_ms)
            {
                self.vy = (self.vy - tuning.parachute_lift * step).max(-tuning.parachute_max_rise);
            } else {
                self.vy = (self.vy + tuning.gravity * tuning.parachute_gravity_scale * step)
                    .min(tuning.parachute_fall_speed);
            }
        } else {
            self.vy += tuning.gravity * step;
        }

        self.pos.y += self.vy * step;

        if self.pos.y < 0.0 {
            self.pos.y = 0.0;
            self.vy = self.vy.max(0.0);
        }

        if self.jumping
            && !self.parachute.active
            && !self.parachute.used_this_jump
            && self.altitude(tuning) > tuning.parachute_altitude
        {
            self.parachute.active = true;
            self.parachute.used_this_jump = true;
            self.parachute.remaining_ms = tuning.parachute_duration_ms;
            self.parachute.last_tap_ms = None;
            self.vy = self.vy.max(-tuning.parachute_max_rise);
            result.parachute_deployed = true;
        }

        let floor = tuning.player_ground_y();
        if self.pos.y >= floor {
            self.pos.y = floor;
            self.vy = 0.0;
            if self.jumping {
                result.landed = true;
            }
            self.jumping = false;
            self.parachute.close();
        }

        result
    }

    /// Procedural limb animation; `speed` drives the stride
    pub fn animate(&mut self, step: f32, speed: f32) {
        let pose = &mut self.pose;
        pose.run_phase += 0.05 * speed * step;
        let s = pose.run_phase.sin();

        pose.target = if self.parachute.active {
            // Hanging from the canopy, legs dangling
            PoseAngles {
                leg_left: s * 0.2,
                leg_right: -s * 0.2,
                arm_left: -2.6,
                arm_right: -2.6,
                head_bob: 0.0,
                lean: 0.0,
            }
        } else if self.jumping {
            // Tucked
            PoseAngles {
                leg_left: 0.8,
                leg_right: -0.3,
                arm_left: -1.2,
                arm_right: -1.2,
                head_bob: 0.0,
                lean: -0.05,
            }
        } else {
            PoseAngles {
                leg_left: s * 0.6,
                leg_right: -s * 0.6,
                arm_left: -s * 0.5,
                arm_right: s * 0.5,
                head_bob: (pose.run_phase * 2.0).sin().abs() * 2.0,
                lean: 0.1,
            }
        };

        let t = (POSE_LERP * step).min(1.0);
        let target = pose.target;
        pose.current.lerp_toward(&target, t);
    }
}
