//! Variable timestep simulation tick
//!
//! Advances the session by the elapsed wall time. Per-frame tunables are
//! scaled by `dt / FRAME_MS` so motion is independent of the display rate.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;

use super::effects::EffectKind;
use super::geom::is_stomp;
use super::ragdoll::Ragdoll;
use super::state::{GameEvent, GamePhase, GameState, RunOutcome};
use crate::consts::MAX_DT_MS;
use crate::step_factor;

/// Player box shrink (px) used for obstacle hits
const PLAYER_HITBOX_INSET: f32 = 4.0;
/// Scenery keeps drifting at this share of base speed once the run is over
const AFTERMATH_SCROLL: f32 = 0.2;

/// Discrete input events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Jump, or tap the parachute while airborne
    Jump,
    /// Toggle pause
    Pause,
    /// Leave the title screen
    Start,
    /// Back to the title screen after a run
    Restart,
}

/// Input queued between ticks, drained at the start of the next one
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    events: VecDeque<InputEvent>,
}

impl TickInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }
}

/// Advance the game state by `dt_ms` of wall time
pub fn tick(state: &mut GameState, input: &mut TickInput, dt_ms: f32) {
    let dt_ms = dt_ms.clamp(0.0, MAX_DT_MS);
    let step = step_factor(dt_ms);

    // Input lands before anything moves
    for event in input.drain() {
        handle_input(state, event);
    }

    match state.phase {
        GamePhase::Start | GamePhase::Paused => {}
        GamePhase::Playing => tick_playing(state, dt_ms, step),
        GamePhase::Crashing => {
            animate_aftermath(state, dt_ms, step);
            state.crash_timer_ms += dt_ms;
            if state.crash_timer_ms >= state.tuning.crash_duration_ms {
                finish_run(state);
            }
        }
        GamePhase::GameOver => animate_aftermath(state, dt_ms, step),
    }
}

fn handle_input(state: &mut GameState, event: InputEvent) {
    match (state.phase, event) {
        (GamePhase::Start, InputEvent::Start | InputEvent::Jump) => {
            state.reset();
            state.set_phase(GamePhase::Playing);
        }
        (GamePhase::Playing, InputEvent::Jump) => {
            if state.player.request_jump(&state.tuning, state.time_ms) {
                state.events.push(GameEvent::Jump);
            }
        }
        (GamePhase::Playing, InputEvent::Pause) => state.set_phase(GamePhase::Paused),
        (GamePhase::Paused, InputEvent::Pause) => state.set_phase(GamePhase::Playing),
        (GamePhase::GameOver, InputEvent::Restart) => state.set_phase(GamePhase::Start),
        _ => {}
    }
}

fn tick_playing(state: &mut GameState, dt_ms: f32, step: f32) {
    state.frame += 1;
    state.time_ms += f64::from(dt_ms);

    state.refresh_speed();
    let speed = state.speed.current;
    let dx = speed * step;
    state.spawner.cursor.advance(dx);

    let update = state
        .player
        .update(&state.tuning, dt_ms, step, state.time_ms);
    if update.parachute_deployed {
        state.events.push(GameEvent::ParachuteDeployed);
    }
    if update.parachute_expired {
        state.events.push(GameEvent::ParachuteExpired);
    }
    if update.landed {
        state.events.push(GameEvent::Landed);
    }
    state.player.animate(step, speed);

    let spawned = state.spawner.update(
        state.frame,
        &mut state.obstacles,
        &mut state.enemies,
        &mut state.pickups,
        &state.tuning,
        &mut state.rng,
    );
    if spawned.any() {
        log::trace!("Frame {} spawned {:?}", state.frame, spawned);
    }

    if update_obstacles(state, dx) {
        begin_crash(state);
        return;
    }
    update_enemies(state, dx, dt_ms, step);
    update_pickups(state, dx, step);

    state.effects.update(dt_ms);
    state.background.scroll(dx, state.tuning.canvas_width);
    update_popups(state, dt_ms, step);

    let tick_frames = state.tuning.score_tick_frames;
    if tick_frames > 0 && state.frame.is_multiple_of(tick_frames) {
        state.award(state.tuning.score_tick_points);
    }
    state.check_milestones();
    state.refresh_speed();
}

/// Scroll obstacles, score the cleared ones; returns true on a crash
fn update_obstacles(state: &mut GameState, dx: f32) -> bool {
    let body = state.player.rect();
    let hitbox = body.inset(PLAYER_HITBOX_INSET);
    let mut cleared = Vec::new();
    let mut crashed = false;

    for obstacle in &mut state.obstacles {
        obstacle.advance(dx);
        if hitbox.overlaps(&obstacle.rect) {
            crashed = true;
        }
        if !obstacle.passed && obstacle.rect.right() < body.left() {
            obstacle.passed = true;
            cleared.push((obstacle.class, Vec2::new(obstacle.rect.center().x, obstacle.rect.top())));
        }
    }
    state.obstacles.retain(|o| !o.is_offscreen());

    if crashed {
        return true;
    }
    for (class, pos) in cleared {
        let base = class.points(&state.tuning);
        let points = state.award(base);
        state.events.push(GameEvent::ObstaclePassed(class));
        state.popup(pos, points as i64);
    }
    false
}

fn update_enemies(state: &mut GameState, dx: f32, dt_ms: f32, step: f32) {
    let mut stomped = Vec::new();

    for enemy in &mut state.enemies {
        enemy.update(dx, dt_ms, step, &mut state.rng);
        // Side contact is harmless; only a landing from above counts
        if !enemy.stomp.is_being_stomped()
            && is_stomp(&state.player.rect(), state.player.vy, &enemy.rect)
        {
            enemy.stomp.begin();
            state.player.bounce(&state.tuning);
            stomped.push(Vec2::new(enemy.rect.center().x, enemy.rect.top()));
        }
    }
    state
        .enemies
        .retain(|e| !e.should_remove(&state.tuning));

    for pos in stomped {
        let penalty = state.tuning.stomp_penalty;
        state.penalize(penalty);
        state
            .effects
            .trigger(EffectKind::ConstituentPenalty, &state.tuning);
        state.events.push(GameEvent::Stomp);
        state.popup(pos, -(penalty as i64));
        log::debug!("Stomped a constituent, score now {}", state.score);
    }
}

fn update_pickups(state: &mut GameState, dx: f32, step: f32) {
    let body = state.player.rect();
    let mut collected = Vec::new();

    state.pickups.retain_mut(|pickup| {
        pickup.update(dx, step);
        if body.overlaps(&pickup.rect) {
            collected.push(pickup.rect.center());
            return false;
        }
        !pickup.is_offscreen()
    });

    for pos in collected {
        // Awarded at the modifiers in force before this bribe's own bonus
        let points = state.award(state.tuning.bribe_points);
        state.effects.trigger(EffectKind::BribeBonus, &state.tuning);
        state.events.push(GameEvent::BribeCollected);
        state.popup(pos, points as i64);
    }
}

fn update_popups(state: &mut GameState, dt_ms: f32, step: f32) {
    for popup in &mut state.popups {
        popup.update(dt_ms, step);
    }
    state.popups.retain(|p| p.is_alive());
}

fn begin_crash(state: &mut GameState) {
    let tuning = &state.tuning;
    let mut ragdoll = Ragdoll::new(
        state.player.pos,
        tuning.ground_y,
        tuning.canvas_width,
        tuning.ragdoll.clone(),
        &mut state.rng,
    );
    let fx = -state.rng.random_range(3.0..6.0);
    let fy = -state.rng.random_range(8.0..12.0);
    ragdoll.apply_impulse(fx, fy, &mut state.rng);

    state.ragdoll = Some(ragdoll);
    state.screen_shake = tuning.crash_shake;
    state.crash_timer_ms = 0.0;
    state.events.push(GameEvent::Crash);
    log::info!(
        "Crashed at score {} after {:.1}s",
        state.score,
        state.duration_secs()
    );
    state.set_phase(GamePhase::Crashing);
}

/// Cosmetic motion after the crash: ragdoll, shake decay, drifting scenery
fn animate_aftermath(state: &mut GameState, dt_ms: f32, step: f32) {
    if let Some(ragdoll) = state.ragdoll.as_mut() {
        ragdoll.update();
    }

    state.screen_shake *= state.tuning.shake_decay.powf(step);
    if state.screen_shake < 0.01 {
        state.screen_shake = 0.0;
    }

    let drift = state.speed.base * AFTERMATH_SCROLL * step;
    state.background.scroll(drift, state.tuning.canvas_width);
    update_popups(state, dt_ms, step);
}

fn finish_run(state: &mut GameState) {
    let outcome = if state.score > 0 && state.score >= state.victory_threshold {
        RunOutcome::Victory
    } else {
        RunOutcome::Fail
    };
    state.outcome = Some(outcome);
    state.events.push(GameEvent::RunFinished(outcome));
    log::info!(
        "Run over: {} points ({:?}, threshold {})",
        state.score,
        outcome,
        state.victory_threshold
    );
    state.set_phase(GamePhase::GameOver);
}
