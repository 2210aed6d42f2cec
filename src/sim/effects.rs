//! Timed gameplay modifiers
//!
//! Stomping a constituent and grabbing a bribe each start a timed effect.
//! Effects stack multiplicatively into one speed and one score multiplier.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// What triggered the effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Stomped a constituent
    ConstituentPenalty,
    /// Collected a bribe
    BribeBonus,
}

/// A running effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: EffectKind,
    pub remaining_ms: f32,
    pub speed_mult: f32,
    pub score_mult: f32,
}

impl ActiveEffect {
    /// Effect with the tuned duration and multipliers for `kind`
    pub fn from_tuning(kind: EffectKind, tuning: &Tuning) -> Self {
        let (remaining_ms, speed_mult, score_mult) = match kind {
            EffectKind::ConstituentPenalty => (
                tuning.penalty_duration_ms,
                tuning.penalty_speed_mult,
                tuning.penalty_score_mult,
            ),
            EffectKind::BribeBonus => (
                tuning.bonus_duration_ms,
                tuning.bonus_speed_mult,
                tuning.bonus_score_mult,
            ),
        };
        Self {
            kind,
            remaining_ms,
            speed_mult,
            score_mult,
        }
    }
}

/// All active effects, folded into `(speed_mod, score_mod)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectModifiers {
    effects: Vec<ActiveEffect>,
    speed_mod: f32,
    score_mod: f32,
}

impl Default for EffectModifiers {
    fn default() -> Self {
        Self {
            effects: Vec::new(),
            speed_mod: 1.0,
            score_mod: 1.0,
        }
    }
}

impl EffectModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new effect for a gameplay event
    pub fn trigger(&mut self, kind: EffectKind, tuning: &Tuning) {
        self.push(ActiveEffect::from_tuning(kind, tuning));
    }

    pub fn push(&mut self, effect: ActiveEffect) {
        log::debug!(
            "Effect {:?} for {}ms (speed x{}, score x{})",
            effect.kind,
            effect.remaining_ms,
            effect.speed_mult,
            effect.score_mult
        );
        self.effects.push(effect);
        self.recompute();
    }

    /// Count down by elapsed real time and drop expired effects
    pub fn update(&mut self, dt_ms: f32) {
        if self.effects.is_empty() {
            return;
        }
        for effect in &mut self.effects {
            effect.remaining_ms -= dt_ms;
        }
        self.effects.retain(|e| e.remaining_ms > 0.0);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.speed_mod = self.effects.iter().map(|e| e.speed_mult).product();
        self.score_mod = self.effects.iter().map(|e| e.score_mult).product();
    }

    #[inline]
    pub fn speed_mod(&self) -> f32 {
        self.speed_mod
    }

    #[inline]
    pub fn score_mod(&self) -> f32 {
        self.score_mod
    }

    pub fn active(&self) -> &[ActiveEffect] {
        &self.effects
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn clear(&mut self) {
        self.effects.clear();
        self.recompute();
    }
}
