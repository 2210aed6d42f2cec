//! Squash-stretch-launch animation for stomped constituents
//!
//! A stomped enemy squashes flat, springs up tall, then gets flung off
//! screen spinning and fading. Phases are picked purely from elapsed time so
//! the sequence plays the same at any frame rate.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geom::Rect;

/// End of the squash phase (ms since the stomp)
pub const SQUASH_END_MS: f32 = 120.0;
/// End of the stretch phase
pub const STRETCH_END_MS: f32 = 250.0;
/// Opacity reaches zero this long into the launch
pub const LAUNCH_FADE_MS: f32 = 250.0;
/// Never removed before this
pub const REMOVE_AFTER_MS: f32 = 800.0;
/// Fraction of the stretch phase at which the launch velocity is assigned
pub const LAUNCH_POINT: f32 = 0.8;
/// Per-tick exponential smoothing toward the phase target
pub const SCALE_SMOOTHING: f32 = 0.25;
pub const LAUNCH_GRAVITY: f32 = 0.5;
/// Maximum lift off the ground during the stretch
pub const STRETCH_LIFT: f32 = 20.0;

const SQUASH_SCALE: Vec2 = Vec2::new(1.75, 0.25);
const STRETCH_SCALE: Vec2 = Vec2::new(0.6, 1.5);

/// Animation phase derived from elapsed time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StompPhase {
    Walking,
    Squashing,
    Stretching,
    Launching,
}

#[inline]
pub fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Overshooting spring curve; 0 at t=0, settles on 1 at t=1
pub fn ease_out_elastic(t: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let c4 = std::f32::consts::TAU / 3.0;
    2f32.powf(-10.0 * t) * ((10.0 * t - 0.75) * c4).sin() + 1.0
}

/// Per-enemy stomp state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StompState {
    /// Once set this never reverts for the entity's lifetime
    is_being_stomped: bool,
    pub elapsed_ms: f32,
    pub scale: Vec2,
    pub target_scale: Vec2,
    pub launch_vel: Vec2,
    launched: bool,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub opacity: f32,
    /// Upward offset from the ground during the stretch (px)
    pub lift: f32,
}

impl Default for StompState {
    fn default() -> Self {
        Self {
            is_being_stomped: false,
            elapsed_ms: 0.0,
            scale: Vec2::ONE,
            target_scale: Vec2::ONE,
            launch_vel: Vec2::ZERO,
            launched: false,
            rotation: 0.0,
            rotation_speed: 0.0,
            opacity: 1.0,
            lift: 0.0,
        }
    }
}

impl StompState {
    #[inline]
    pub fn is_being_stomped(&self) -> bool {
        self.is_being_stomped
    }

    #[inline]
    pub fn has_launched(&self) -> bool {
        self.launched
    }

    /// Start the sequence; returns false if already stomped
    pub fn begin(&mut self) -> bool {
        if self.is_being_stomped {
            return false;
        }
        self.is_being_stomped = true;
        self.elapsed_ms = 0.0;
        true
    }

    pub fn phase(&self) -> StompPhase {
        if !self.is_being_stomped {
            StompPhase::Walking
        } else if self.elapsed_ms < SQUASH_END_MS {
            StompPhase::Squashing
        } else if self.elapsed_ms < STRETCH_END_MS {
            StompPhase::Stretching
        } else {
            StompPhase::Launching
        }
    }

    /// Advance the animation; returns how far the body moved this tick
    pub fn update<R: Rng + ?Sized>(&mut self, dt_ms: f32, step: f32, rng: &mut R) -> Vec2 {
        if !self.is_being_stomped {
            return Vec2::ZERO;
        }
        self.elapsed_ms += dt_ms;

        let mut displacement = Vec2::ZERO;
        match self.phase() {
            StompPhase::Walking => {}
            StompPhase::Squashing => {
                let e = ease_out_quad(self.elapsed_ms / SQUASH_END_MS);
                self.target_scale = Vec2::ONE.lerp(SQUASH_SCALE, e);
                self.lift = 0.0;
            }
            StompPhase::Stretching => {
                let t = (self.elapsed_ms - SQUASH_END_MS) / (STRETCH_END_MS - SQUASH_END_MS);
                let e = ease_out_elastic(t);
                self.target_scale = SQUASH_SCALE + (STRETCH_SCALE - SQUASH_SCALE) * e;
                self.lift = STRETCH_LIFT * e;
                if t >= LAUNCH_POINT {
                    self.assign_launch(rng);
                }
            }
            StompPhase::Launching => {
                self.target_scale = STRETCH_SCALE;
                // A long frame can skip the launch point entirely
                self.assign_launch(rng);

                displacement = self.launch_vel * step;
                self.launch_vel.y += LAUNCH_GRAVITY * step;
                self.rotation += self.rotation_speed * step;
                let fade = (self.elapsed_ms - STRETCH_END_MS) / LAUNCH_FADE_MS;
                self.opacity = (1.0 - fade).max(0.0);
            }
        }

        self.scale += (self.target_scale - self.scale) * SCALE_SMOOTHING;
        displacement
    }

    /// Launch velocity and spin are assigned exactly once
    fn assign_launch<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.launched {
            return;
        }
        self.launched = true;
        self.launch_vel = Vec2::new(rng.random_range(3.0..=6.0), rng.random_range(-14.0..=-10.0));
        let spin = rng.random_range(0.15..=0.3);
        self.rotation_speed = if rng.random_bool(0.5) { spin } else { -spin };
    }

    /// Gone once it has played long enough and left the view or faded out
    pub fn should_remove(&self, body: &Rect, canvas_width: f32, canvas_height: f32) -> bool {
        if !self.is_being_stomped || self.elapsed_ms <= REMOVE_AFTER_MS {
            return false;
        }
        let off_horizontal = body.right() < 0.0 || body.left() > canvas_width;
        let off_vertical = body.bottom() < -canvas_height || body.top() > canvas_height * 2.0;
        off_horizontal || off_vertical || self.opacity <= 0.0
    }
}
