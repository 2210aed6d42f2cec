//! Ragdoll crash physics
//!
//! After a crash the player is replaced by ten box segments held together by
//! nine distance joints. Segments integrate independently, bounce off the
//! ground and the screen edges, then the joints are relaxed a few times per
//! tick to pull the body back into shape. This is a fixed-topology
//! approximation, not a general rigid-body solver.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Named body parts, one per segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyPart {
    Head,
    Torso,
    UpperArmLeft,
    LowerArmLeft,
    UpperArmRight,
    LowerArmRight,
    ThighLeft,
    ShinLeft,
    ThighRight,
    ShinRight,
}

/// Anatomical rest layout relative to the top-left of the player box
struct SegmentLayout {
    part: BodyPart,
    center: (f32, f32),
    size: (f32, f32),
    mass: f32,
}

const LAYOUT: [SegmentLayout; 10] = [
    SegmentLayout { part: BodyPart::Head, center: (20.0, 8.0), size: (16.0, 16.0), mass: 1.0 },
    SegmentLayout { part: BodyPart::Torso, center: (20.0, 26.0), size: (14.0, 24.0), mass: 3.0 },
    SegmentLayout { part: BodyPart::UpperArmLeft, center: (10.0, 22.0), size: (6.0, 14.0), mass: 0.8 },
    SegmentLayout { part: BodyPart::LowerArmLeft, center: (8.0, 34.0), size: (5.0, 12.0), mass: 0.6 },
    SegmentLayout { part: BodyPart::UpperArmRight, center: (30.0, 22.0), size: (6.0, 14.0), mass: 0.8 },
    SegmentLayout { part: BodyPart::LowerArmRight, center: (32.0, 34.0), size: (5.0, 12.0), mass: 0.6 },
    SegmentLayout { part: BodyPart::ThighLeft, center: (16.0, 44.0), size: (7.0, 14.0), mass: 1.2 },
    SegmentLayout { part: BodyPart::ShinLeft, center: (15.0, 54.0), size: (6.0, 12.0), mass: 1.0 },
    SegmentLayout { part: BodyPart::ThighRight, center: (24.0, 44.0), size: (7.0, 14.0), mass: 1.2 },
    SegmentLayout { part: BodyPart::ShinRight, center: (25.0, 54.0), size: (6.0, 12.0), mass: 1.0 },
];

/// Joint topology as (segment index, segment index, stiffness)
const JOINTS: [(usize, usize, f32); 9] = [
    (0, 1, 0.9), // neck
    (1, 2, 0.8), // left shoulder
    (2, 3, 0.7), // left elbow
    (1, 4, 0.8), // right shoulder
    (4, 5, 0.7), // right elbow
    (1, 6, 0.8), // left hip
    (6, 7, 0.7), // left knee
    (1, 8, 0.8), // right hip
    (8, 9, 0.7), // right knee
];

/// Solver constants (per tick)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagdollConfig {
    pub gravity: f32,
    pub friction: f32,
    pub angular_friction: f32,
    pub bounce: f32,
    pub ground_friction: f32,
    /// Post-bounce vertical speed below which a segment comes to rest
    pub stop_threshold: f32,
    pub settle_threshold: f32,
    pub iterations: u32,
    /// Fraction of each joint correction fed back into velocity
    pub constraint_velocity_transfer: f32,
}

impl Default for RagdollConfig {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            friction: 0.98,
            angular_friction: 0.99,
            bounce: 0.6,
            ground_friction: 0.8,
            stop_threshold: 1.0,
            settle_threshold: 0.5,
            iterations: 3,
            constraint_velocity_transfer: 0.5,
        }
    }
}

/// One rigid box of the ragdoll (position is the box center)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodySegment {
    pub part: BodyPart,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub angle: f32,
    pub angular_vel: f32,
    /// Only used as an impulse divisor
    pub mass: f32,
}

impl BodySegment {
    #[inline]
    pub fn half_size(&self) -> Vec2 {
        self.size * 0.5
    }
}

/// Distance constraint between two segments
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Joint {
    pub a: usize,
    pub b: usize,
    pub rest_length: f32,
    /// 0-1, fraction of the error removed per relaxation pass
    pub stiffness: f32,
}

/// Physics-driven crash body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ragdoll {
    segments: Vec<BodySegment>,
    joints: Vec<Joint>,
    ground_y: f32,
    screen_width: f32,
    config: RagdollConfig,
}

impl Ragdoll {
    /// Build a ragdoll standing where the player box was
    ///
    /// `origin` is the top-left of the player's bounding box. Every segment
    /// gets a little random velocity so the collapse doesn't look uniform.
    pub fn new<R: Rng + ?Sized>(
        origin: Vec2,
        ground_y: f32,
        screen_width: f32,
        config: RagdollConfig,
        rng: &mut R,
    ) -> Self {
        let segments: Vec<BodySegment> = LAYOUT
            .iter()
            .map(|layout| BodySegment {
                part: layout.part,
                pos: origin + Vec2::new(layout.center.0, layout.center.1),
                vel: Vec2::new(rng.random_range(-1.0..=1.0), rng.random_range(-1.0..=1.0)),
                size: Vec2::new(layout.size.0, layout.size.1),
                angle: 0.0,
                angular_vel: rng.random_range(-0.1..=0.1),
                mass: layout.mass,
            })
            .collect();

        let joints = JOINTS
            .iter()
            .map(|&(a, b, stiffness)| Joint {
                a,
                b,
                rest_length: segments[a].pos.distance(segments[b].pos),
                stiffness,
            })
            .collect();

        Self {
            segments,
            joints,
            ground_y,
            screen_width,
            config,
        }
    }

    pub fn segments(&self) -> &[BodySegment] {
        &self.segments
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn ground_y(&self) -> f32 {
        self.ground_y
    }

    pub fn screen_width(&self) -> f32 {
        self.screen_width
    }

    /// Kick every segment; per-segment random scaling desynchronizes the limbs
    pub fn apply_impulse<R: Rng + ?Sized>(&mut self, fx: f32, fy: f32, rng: &mut R) {
        for seg in &mut self.segments {
            seg.vel.x += fx / seg.mass * rng.random_range(0.5..=1.0);
            seg.vel.y += fy / seg.mass * rng.random_range(0.5..=1.0);
            seg.angular_vel += rng.random_range(-0.3..=0.3);
        }
    }

    /// Advance one tick: integrate, collide, then relax joints
    pub fn update(&mut self) {
        let cfg = &self.config;

        for seg in &mut self.segments {
            seg.vel.y += cfg.gravity;
            seg.vel *= cfg.friction;
            seg.angular_vel *= cfg.angular_friction;

            seg.pos += seg.vel;
            seg.angle += seg.angular_vel;

            let half = seg.half_size();

            if seg.pos.y + half.y > self.ground_y {
                seg.pos.y = self.ground_y - half.y;
                seg.vel.y = -seg.vel.y * cfg.bounce;
                seg.vel.x *= cfg.ground_friction;
                seg.angular_vel *= cfg.ground_friction;

                // Kill micro-bounces
                if seg.vel.y.abs() < cfg.stop_threshold {
                    seg.vel.y = 0.0;
                }
                if seg.vel.x.abs() < 0.1 {
                    seg.vel.x = 0.0;
                }
                if seg.angular_vel.abs() < 0.01 {
                    seg.angular_vel = 0.0;
                }
            }

            if seg.pos.x < half.x {
                seg.pos.x = half.x;
                seg.vel.x = -seg.vel.x * 0.5;
            } else if seg.pos.x > self.screen_width - half.x {
                seg.pos.x = self.screen_width - half.x;
                seg.vel.x = -seg.vel.x * 0.5;
            }
        }

        self.relax_joints();
        self.clamp_to_bounds();
    }

    /// Iterative pairwise distance relaxation
    ///
    /// Joints share segments, so fixing one can break a neighbor; several
    /// passes let the corrections propagate through the body.
    fn relax_joints(&mut self) {
        let mut corrections = [Vec2::ZERO; LAYOUT.len()];

        for _ in 0..self.config.iterations {
            for joint in &self.joints {
                let pa = self.segments[joint.a].pos;
                let pb = self.segments[joint.b].pos;
                let delta = pb - pa;
                let dist = delta.length();
                if dist < 1e-4 {
                    continue;
                }

                // Half of the stiffness-scaled error goes to each end
                let diff = (dist - joint.rest_length) / dist * joint.stiffness * 0.5;
                let correction = delta * diff;

                self.segments[joint.a].pos += correction;
                self.segments[joint.b].pos -= correction;
                corrections[joint.a] += correction;
                corrections[joint.b] -= correction;
            }
        }

        let transfer = self.config.constraint_velocity_transfer;
        for (seg, correction) in self.segments.iter_mut().zip(corrections) {
            seg.vel += correction * transfer;
        }
    }

    /// Joint relaxation may push segments back out of bounds
    fn clamp_to_bounds(&mut self) {
        for seg in &mut self.segments {
            let half = seg.half_size();
            if seg.pos.y + half.y > self.ground_y {
                seg.pos.y = self.ground_y - half.y;
                seg.vel.y = seg.vel.y.min(0.0);
            }
            seg.pos.x = seg.pos.x.clamp(half.x, self.screen_width - half.x);
        }
    }

    /// Advisory: every segment is nearly still
    pub fn is_settled(&self) -> bool {
        let threshold = self.config.settle_threshold;
        self.segments
            .iter()
            .all(|s| s.vel.x.abs() < threshold && s.vel.y.abs() < threshold)
    }
}
