//! World entities: obstacles, constituents, bribes, popups and scenery

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geom::Rect;
use super::stomp::StompState;
use crate::tuning::Tuning;

/// Obstacle height class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeightClass {
    /// Short hurdle, regular cadence
    Low,
    /// Tall barrier, randomized cadence
    Tall,
}

impl HeightClass {
    /// Height range (px) for this class
    pub fn height_range(&self) -> (f32, f32) {
        match self {
            HeightClass::Low => (30.0, 50.0),
            HeightClass::Tall => (70.0, 100.0),
        }
    }

    pub fn width(&self) -> f32 {
        match self {
            HeightClass::Low => 30.0,
            HeightClass::Tall => 36.0,
        }
    }

    /// Points for clearing an obstacle of this class
    pub fn points(&self, tuning: &Tuning) -> u64 {
        match self {
            HeightClass::Low => tuning.low_obstacle_points,
            HeightClass::Tall => tuning.tall_obstacle_points,
        }
    }
}

/// A ground obstacle; touching one ends the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub rect: Rect,
    pub class: HeightClass,
    /// Already scored as cleared
    pub passed: bool,
}

impl Obstacle {
    /// Spawn just past the right edge, resting on the ground
    pub fn spawn<R: Rng + ?Sized>(id: u32, class: HeightClass, tuning: &Tuning, rng: &mut R) -> Self {
        let (min_h, max_h) = class.height_range();
        let height = rng.random_range(min_h..=max_h);
        let width = class.width();
        Self {
            id,
            rect: Rect::new(tuning.canvas_width, tuning.ground_y - height, width, height),
            class,
            passed: false,
        }
    }

    pub fn advance(&mut self, dx: f32) {
        self.rect.pos.x -= dx;
    }

    pub fn is_offscreen(&self) -> bool {
        self.rect.right() < 0.0
    }
}

/// A walking constituent; stomping one bounces the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub rect: Rect,
    /// Walk cycle phase (radians)
    pub walk_phase: f32,
    /// Extra speed toward the player on top of the world scroll
    pub walk_speed: f32,
    pub stomp: StompState,
}

impl Enemy {
    /// Player-sized so that stomping is dimensionally sensible
    pub fn spawn(id: u32, tuning: &Tuning) -> Self {
        Self {
            id,
            rect: Rect::new(
                tuning.canvas_width,
                tuning.player_ground_y(),
                tuning.player_width,
                tuning.player_height,
            ),
            walk_phase: 0.0,
            walk_speed: 1.0,
            stomp: StompState::default(),
        }
    }

    /// Scroll, walk, and play the stomp animation
    pub fn update<R: Rng + ?Sized>(&mut self, world_dx: f32, dt_ms: f32, step: f32, rng: &mut R) {
        if self.stomp.is_being_stomped() {
            self.rect.pos.x -= world_dx;
            self.rect.pos += self.stomp.update(dt_ms, step, rng);
        } else {
            self.rect.pos.x -= world_dx + self.walk_speed * step;
            self.walk_phase += 0.2 * step;
        }
    }

    pub fn should_remove(&self, tuning: &Tuning) -> bool {
        if self.stomp.is_being_stomped() {
            self.stomp
                .should_remove(&self.rect, tuning.canvas_width, tuning.canvas_height)
        } else {
            self.rect.right() < 0.0
        }
    }
}

/// A floating bribe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub rect: Rect,
    /// Resting y the float oscillates around
    pub base_y: f32,
    pub float_phase: f32,
}

/// Float amplitude (px)
const PICKUP_FLOAT: f32 = 4.0;

impl Pickup {
    pub fn new(id: u32, x: f32, y: f32, size: f32, float_phase: f32) -> Self {
        Self {
            id,
            rect: Rect::new(x, y, size, size),
            base_y: y,
            float_phase,
        }
    }

    pub fn update(&mut self, world_dx: f32, step: f32) {
        self.rect.pos.x -= world_dx;
        self.float_phase += 0.08 * step;
        self.rect.pos.y = self.base_y + self.float_phase.sin() * PICKUP_FLOAT;
    }

    pub fn is_offscreen(&self) -> bool {
        self.rect.right() < 0.0
    }
}

/// Popup lifetime
pub const POPUP_LIFE_MS: f32 = 900.0;

/// Floating "+N" / "-N" text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorePopup {
    pub pos: Vec2,
    pub amount: i64,
    pub life_ms: f32,
}

impl ScorePopup {
    pub fn new(pos: Vec2, amount: i64) -> Self {
        Self {
            pos,
            amount,
            life_ms: POPUP_LIFE_MS,
        }
    }

    pub fn update(&mut self, dt_ms: f32, step: f32) {
        self.pos.y -= step;
        self.life_ms -= dt_ms;
    }

    /// 1.0 when fresh, 0.0 when expired
    pub fn alpha(&self) -> f32 {
        (self.life_ms / POPUP_LIFE_MS).clamp(0.0, 1.0)
    }

    pub fn is_alive(&self) -> bool {
        self.life_ms > 0.0
    }
}

/// Parallax factor per background layer (far to near)
pub const PARALLAX: [f32; 3] = [0.2, 0.5, 1.0];

/// Scrolling scenery offsets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Background {
    pub offsets: [f32; 3],
}

impl Background {
    /// Scroll every layer by its parallax share of `dx`, wrapping at `width`
    pub fn scroll(&mut self, dx: f32, width: f32) {
        for (offset, factor) in self.offsets.iter_mut().zip(PARALLAX) {
            *offset = (*offset + dx * factor).rem_euclid(width);
        }
    }
}
