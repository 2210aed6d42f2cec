//! Read-only render view of a session
//!
//! A renderer never touches `GameState`; it draws a `RenderSnapshot` captured
//! after each tick. Sprites reference assets by key, and a renderer that has
//! not loaded a key falls back to drawing the rect.

use glam::Vec2;
use serde::Serialize;

use crate::settings::Settings;
use crate::sim::{
    BodyPart, EffectKind, GamePhase, GameState, HeightClass, PoseAngles, Rect, RunOutcome,
    StompState,
};

impl BodyPart {
    pub fn asset_key(&self) -> &'static str {
        match self {
            BodyPart::Head => "ragdoll/head",
            BodyPart::Torso => "ragdoll/torso",
            BodyPart::UpperArmLeft => "ragdoll/upper_arm_left",
            BodyPart::LowerArmLeft => "ragdoll/lower_arm_left",
            BodyPart::UpperArmRight => "ragdoll/upper_arm_right",
            BodyPart::LowerArmRight => "ragdoll/lower_arm_right",
            BodyPart::ThighLeft => "ragdoll/thigh_left",
            BodyPart::ShinLeft => "ragdoll/shin_left",
            BodyPart::ThighRight => "ragdoll/thigh_right",
            BodyPart::ShinRight => "ragdoll/shin_right",
        }
    }
}

/// Everything drawn as a single sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpriteKind {
    ObstacleLow,
    ObstacleTall,
    Constituent,
    Bribe,
}

impl SpriteKind {
    pub fn asset_key(&self) -> &'static str {
        match self {
            SpriteKind::ObstacleLow => "obstacle/low",
            SpriteKind::ObstacleTall => "obstacle/tall",
            SpriteKind::Constituent => "enemy/constituent",
            SpriteKind::Bribe => "pickup/bribe",
        }
    }
}

impl From<HeightClass> for SpriteKind {
    fn from(class: HeightClass) -> Self {
        match class {
            HeightClass::Low => SpriteKind::ObstacleLow,
            HeightClass::Tall => SpriteKind::ObstacleTall,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpriteView {
    pub id: u32,
    pub kind: SpriteKind,
    pub asset_key: &'static str,
    /// Already scaled and lifted for stomp animation
    pub rect: Rect,
    pub rotation: f32,
    pub opacity: f32,
    /// Walk cycle phase for constituents, float phase for bribes
    pub anim_phase: f32,
}

impl SpriteView {
    fn new(id: u32, kind: SpriteKind, rect: Rect, anim_phase: f32) -> Self {
        Self {
            id,
            kind,
            asset_key: kind.asset_key(),
            rect,
            rotation: 0.0,
            opacity: 1.0,
            anim_phase,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub rect: Rect,
    pub pose: PoseAngles,
    pub parachute: bool,
    pub parachute_remaining_ms: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentView {
    pub part: BodyPart,
    pub asset_key: &'static str,
    pub center: Vec2,
    pub size: Vec2,
    pub angle: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PopupView {
    pub pos: Vec2,
    pub text: String,
    pub alpha: f32,
    pub negative: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectView {
    pub kind: EffectKind,
    pub remaining_ms: f32,
}

/// One frame's worth of drawable state
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub phase: GamePhase,
    pub score: u64,
    pub speed: f32,
    pub canvas: Vec2,
    pub ground_y: f32,
    /// Camera offset; zero when shake is off
    pub shake_offset: Vec2,
    /// Far to near
    pub background: [f32; 3],
    /// None once the ragdoll has taken over
    pub player: Option<PlayerView>,
    pub ragdoll: Vec<SegmentView>,
    pub sprites: Vec<SpriteView>,
    pub popups: Vec<PopupView>,
    pub effects: Vec<EffectView>,
    pub outcome: Option<RunOutcome>,
}

impl RenderSnapshot {
    pub fn capture(state: &GameState, settings: &Settings) -> Self {
        let tuning = &state.tuning;

        let player = state.ragdoll.is_none().then(|| PlayerView {
            rect: state.player.rect(),
            pose: state.player.pose.current,
            parachute: state.player.has_parachute(),
            parachute_remaining_ms: state.player.parachute.remaining_ms.max(0.0),
        });

        let ragdoll = state
            .ragdoll
            .iter()
            .flat_map(|r| r.segments())
            .map(|s| SegmentView {
                part: s.part,
                asset_key: s.part.asset_key(),
                center: s.pos,
                size: s.size,
                angle: s.angle,
            })
            .collect();

        let mut sprites =
            Vec::with_capacity(state.obstacles.len() + state.enemies.len() + state.pickups.len());
        for o in &state.obstacles {
            sprites.push(SpriteView::new(o.id, o.class.into(), o.rect, 0.0));
        }
        for e in &state.enemies {
            let mut view = SpriteView::new(
                e.id,
                SpriteKind::Constituent,
                stomped_rect(&e.rect, &e.stomp),
                e.walk_phase,
            );
            view.rotation = e.stomp.rotation;
            view.opacity = e.stomp.opacity;
            sprites.push(view);
        }
        for p in &state.pickups {
            sprites.push(SpriteView::new(p.id, SpriteKind::Bribe, p.rect, p.float_phase));
        }

        let popups = if settings.score_popups {
            state
                .popups
                .iter()
                .map(|p| PopupView {
                    pos: p.pos,
                    text: format!("{:+}", p.amount),
                    alpha: p.alpha(),
                    negative: p.amount < 0,
                })
                .collect()
        } else {
            Vec::new()
        };

        let effects = state
            .effects
            .active()
            .iter()
            .map(|e| EffectView {
                kind: e.kind,
                remaining_ms: e.remaining_ms,
            })
            .collect();

        let mut background = state.background.offsets;
        if !settings.effective_parallax() {
            // Distant layers hold still; only the ground keeps moving
            background[0] = 0.0;
            background[1] = 0.0;
        }

        Self {
            phase: state.phase,
            score: state.score,
            speed: state.speed.current,
            canvas: Vec2::new(tuning.canvas_width, tuning.canvas_height),
            ground_y: tuning.ground_y,
            shake_offset: shake_offset(state, settings),
            background,
            player,
            ragdoll,
            sprites,
            popups,
            effects,
            outcome: state.outcome,
        }
    }
}

/// Scale about the bottom center, then lift
fn stomped_rect(body: &Rect, stomp: &StompState) -> Rect {
    if !stomp.is_being_stomped() {
        return *body;
    }
    let size = body.size * stomp.scale;
    let bottom_center = Vec2::new(body.center().x, body.bottom() - stomp.lift);
    Rect {
        pos: bottom_center - Vec2::new(size.x * 0.5, size.y),
        size,
    }
}

fn shake_offset(state: &GameState, settings: &Settings) -> Vec2 {
    if !settings.effective_screen_shake() || state.screen_shake <= 0.0 {
        return Vec2::ZERO;
    }
    let t = state.crash_timer_ms * 0.05;
    Vec2::new((t * 1.7).sin(), (t * 2.3).cos()) * state.screen_shake
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Enemy, InputEvent, TickInput, tick};
    use crate::tuning::Tuning;

    fn crashed_state() -> GameState {
        let mut state = GameState::new(7, Tuning::default());
        let mut input = TickInput::new();
        input.push(InputEvent::Start);
        tick(&mut state, &mut input, 16.0);
        state.score = 40;
        let mut obstacle = crate::sim::Obstacle::spawn(
            99,
            HeightClass::Low,
            &state.tuning.clone(),
            &mut state.rng,
        );
        obstacle.rect.pos.x = state.tuning.player_x + 10.0;
        state.obstacles.push(obstacle);
        tick(&mut state, &mut input, 16.0);
        tick(&mut state, &mut input, 16.0);
        state
    }

    #[test]
    fn test_playing_snapshot_has_player() {
        let state = GameState::new(7, Tuning::default());
        let snapshot = RenderSnapshot::capture(&state, &Settings::default());
        assert!(snapshot.player.is_some());
        assert!(snapshot.ragdoll.is_empty());
        assert_eq!(snapshot.shake_offset, Vec2::ZERO);
    }

    #[test]
    fn test_crash_swaps_player_for_ragdoll() {
        let state = crashed_state();
        assert_eq!(state.phase, GamePhase::Crashing);
        let snapshot = RenderSnapshot::capture(&state, &Settings::default());
        assert!(snapshot.player.is_none());
        assert_eq!(snapshot.ragdoll.len(), 10);
        assert_eq!(snapshot.ragdoll[0].asset_key, "ragdoll/head");
        assert_ne!(snapshot.shake_offset, Vec2::ZERO);
    }

    #[test]
    fn test_shake_respects_settings() {
        let state = crashed_state();
        let reduced = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert_eq!(RenderSnapshot::capture(&state, &reduced).shake_offset, Vec2::ZERO);
        let off = Settings {
            screen_shake: false,
            ..Settings::default()
        };
        assert_eq!(RenderSnapshot::capture(&state, &off).shake_offset, Vec2::ZERO);
    }

    #[test]
    fn test_stomped_sprite_is_squashed_on_ground() {
        let tuning = Tuning::default();
        let mut enemy = Enemy::spawn(1, &tuning);
        enemy.stomp.begin();
        enemy.stomp.scale = Vec2::new(1.75, 0.25);
        let rect = stomped_rect(&enemy.rect, &enemy.stomp);
        assert!((rect.bottom() - enemy.rect.bottom()).abs() < 1e-4);
        assert!((rect.size.y - enemy.rect.size.y * 0.25).abs() < 1e-4);
        assert!((rect.center().x - enemy.rect.center().x).abs() < 1e-4);
    }

    #[test]
    fn test_popup_text_and_toggle() {
        let mut state = GameState::new(7, Tuning::default());
        state.popup(Vec2::new(10.0, 10.0), 25);
        state.popup(Vec2::new(10.0, 10.0), -50);
        let snapshot = RenderSnapshot::capture(&state, &Settings::default());
        assert_eq!(snapshot.popups[0].text, "+25");
        assert_eq!(snapshot.popups[1].text, "-50");
        assert!(snapshot.popups[1].negative);

        let quiet = Settings {
            score_popups: false,
            ..Settings::default()
        };
        assert!(RenderSnapshot::capture(&state, &quiet).popups.is_empty());
    }

    #[test]
    fn test_sprite_asset_keys() {
        assert_eq!(SpriteKind::from(HeightClass::Tall).asset_key(), "obstacle/tall");
        assert_eq!(SpriteKind::Bribe.asset_key(), "pickup/bribe");
    }
}
