//! Axis-aligned box geometry for runner collisions
//!
//! Everything in the world is a box: the player, obstacles, constituents and
//! bribes. Positions are top-left corners with y growing downward.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap test; touching edges do not count
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Shrink on every side (forgiving hitboxes)
    pub fn inset(&self, amount: f32) -> Rect {
        let amount = amount.min(self.size.x * 0.5).min(self.size.y * 0.5);
        Rect {
            pos: self.pos + Vec2::splat(amount),
            size: self.size - Vec2::splat(amount * 2.0),
        }
    }

    /// Bottom quarter of the box (the player's "feet")
    pub fn lower_quarter(&self) -> Rect {
        Rect::new(
            self.pos.x,
            self.pos.y + self.size.y * 0.75,
            self.size.x,
            self.size.y * 0.25,
        )
    }

    /// Top half of the box (the enemy's stompable "head")
    pub fn upper_half(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size.x, self.size.y * 0.5)
    }
}

/// Stomp test: falling feet landing on a head
///
/// The player's lower quarter must overlap the enemy's upper half while the
/// player is moving downward.
pub fn is_stomp(player: &Rect, player_vy: f32, enemy: &Rect) -> bool {
    player_vy > 0.0 && player.lower_quarter().overlaps(&enemy.upper_half())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_basic() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        let c = Rect::new(20.0, 0.0, 5.0, 5.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_inset_never_inverts() {
        let r = Rect::new(0.0, 0.0, 4.0, 100.0).inset(10.0);
        assert!(r.size.x >= 0.0);
        assert!(r.size.y >= 0.0);
    }

    #[test]
    fn test_stomp_requires_falling() {
        let enemy = Rect::new(100.0, 280.0, 40.0, 60.0);
        // Feet just inside the enemy's head
        let player = Rect::new(100.0, 225.0, 40.0, 60.0);
        assert!(is_stomp(&player, 3.0, &enemy));
        assert!(!is_stomp(&player, -3.0, &enemy));
        assert!(!is_stomp(&player, 0.0, &enemy));
    }

    #[test]
    fn test_side_contact_is_not_stomp() {
        let enemy = Rect::new(100.0, 280.0, 40.0, 60.0);
        // Same height, overlapping horizontally: feet are at the enemy's feet
        let player = Rect::new(90.0, 280.0, 40.0, 60.0);
        assert!(!is_stomp(&player, 2.0, &enemy));
    }
}
