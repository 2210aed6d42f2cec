//! Campaign Runner entry point
//!
//! On wasm this wires browser input and `requestAnimationFrame` to the game
//! and hands each frame's snapshot to the page for drawing. Natively it runs
//! a few headless sessions under an autopilot and prints the leaderboard.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use campaign_runner::audio::{MusicTrack, WebAudio};
    use campaign_runner::sim::{GamePhase, InputEvent};
    use campaign_runner::{Game, LocalLeaderboard, Settings, Tuning, platform};

    type WebGame = Game<LocalLeaderboard, WebAudio>;

    // Drawing and music streaming live in the page
    #[wasm_bindgen(inline_js = "
        export function draw_frame(json) {
            if (window.drawRunnerFrame) {
                window.drawRunnerFrame(JSON.parse(json));
            }
        }
        export function play_track(name, volume) {
            if (window.playRunnerTrack) {
                window.playRunnerTrack(name, volume);
            }
        }
    ")]
    extern "C" {
        fn draw_frame(json: &str);
        fn play_track(name: &str, volume: f32);
    }

    struct Runner {
        game: WebGame,
        playing_track: Option<MusicTrack>,
    }

    pub fn run() {
        platform::init_logging();
        log::info!("Campaign Runner starting...");

        let settings = Settings::load();
        let tuning = Tuning::default();
        let leaderboard = LocalLeaderboard::load(tuning.leaderboard_top_n);
        let seed = platform::session_seed();
        let runner = Rc::new(RefCell::new(Runner {
            game: Game::new(seed, tuning, settings, leaderboard, WebAudio::new()),
            playing_track: None,
        }));

        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            if let Some(loading) = document.get_element_by_id("loading") {
                let _ = loading.set_attribute("class", "hidden");
            }
        }

        setup_input_handlers(runner.clone());
        setup_auto_pause(runner.clone());
        request_animation_frame(runner);

        log::info!("Campaign Runner running!");
    }

    /// What a tap or the action key means in the current phase
    fn action_for(phase: GamePhase) -> Option<InputEvent> {
        match phase {
            GamePhase::Start => Some(InputEvent::Start),
            GamePhase::Playing => Some(InputEvent::Jump),
            GamePhase::GameOver => Some(InputEvent::Restart),
            GamePhase::Paused | GamePhase::Crashing => None,
        }
    }

    fn setup_input_handlers(runner: Rc<RefCell<Runner>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard
        {
            let runner = runner.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut r = runner.borrow_mut();
                let phase = r.game.state.phase;
                match event.key().as_str() {
                    " " | "ArrowUp" | "Enter" => {
                        event.prevent_default();
                        r.game.audio().resume();
                        if let Some(action) = action_for(phase) {
                            r.game.push_input(action);
                        }
                    }
                    "Escape" | "p" | "P" => r.game.push_input(InputEvent::Pause),
                    "r" | "R" => {
                        if phase == GamePhase::GameOver {
                            r.game.retry_submission();
                        }
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer / touch
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut r = runner.borrow_mut();
                r.game.audio().resume();
                if let Some(action) = action_for(r.game.state.phase) {
                    r.game.push_input(action);
                }
            });
            let _ = window
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(runner: Rc<RefCell<Runner>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(runner, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(runner: Rc<RefCell<Runner>>, time: f64) {
        {
            let mut r = runner.borrow_mut();
            r.game.frame(time);

            let track = r.game.audio().current_track();
            if track != r.playing_track {
                if let Some(track) = track {
                    play_track(track.name(), r.game.audio().music_volume());
                }
                r.playing_track = track;
            }

            match serde_json::to_string(&r.game.snapshot()) {
                Ok(json) => draw_frame(&json),
                Err(err) => log::warn!("Snapshot encoding failed: {}", err),
            }
        }

        request_animation_frame(runner);
    }

    fn setup_auto_pause(runner: Rc<RefCell<Runner>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let runner = runner.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    runner.borrow_mut().game.suspend();
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                runner.borrow_mut().game.suspend();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use campaign_runner::audio::{RecordingAudio, SoundCue};
    use campaign_runner::consts::FRAME_MS;
    use campaign_runner::leaderboard::Leaderboard;
    use campaign_runner::sim::{GamePhase, InputEvent};
    use campaign_runner::{Game, LocalLeaderboard, Settings, Tuning, platform};

    /// Ten minutes of simulated time per run at most
    const MAX_FRAMES: u32 = 60 * 60 * 10;
    const RUNS: usize = 3;

    platform::init_logging();
    log::info!("Campaign Runner (native) starting...");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let tuning = Tuning::default();
    let leaderboard = LocalLeaderboard::new(tuning.leaderboard_top_n);
    let mut game = Game::new(
        seed,
        tuning,
        Settings::default(),
        leaderboard,
        RecordingAudio::new(),
    );

    for run in 1..=RUNS {
        game.push_input(InputEvent::Start);
        let mut frames = 0;
        while game.state.phase != GamePhase::GameOver && frames < MAX_FRAMES {
            if game.state.phase == GamePhase::Playing && autopilot::should_jump(&game.state) {
                game.push_input(InputEvent::Jump);
            }
            game.step(FRAME_MS);
            frames += 1;
        }
        println!(
            "Run {}: {} points in {:.1}s ({:?})",
            run,
            game.state.score,
            game.state.duration_secs(),
            game.state.outcome
        );
        game.push_input(InputEvent::Restart);
        game.step(FRAME_MS);
    }

    println!("\nLeaderboard:");
    match game.leaderboard().top_scores(10) {
        Ok(top) => {
            for (i, entry) in top.iter().enumerate() {
                println!("{:>2}. {:<16} {:>6}  {:.1}s", i + 1, entry.name, entry.score, entry.duration_secs);
            }
        }
        Err(err) => log::warn!("Leaderboard unavailable: {}", err),
    }
    println!(
        "\nCues: {} jumps, {} crashes",
        game.audio().count(SoundCue::Jump),
        game.audio().count(SoundCue::Crash)
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Demo player: jump over whatever obstacle is about to arrive
#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use campaign_runner::sim::GameState;

    /// Frames of lead time before an obstacle reaches the player
    const LEAD_FRAMES: f32 = 12.0;

    pub fn should_jump(state: &GameState) -> bool {
        if state.player.jumping {
            return false;
        }
        let body = state.player.rect();
        let reach = state.speed.current * LEAD_FRAMES;
        state.obstacles.iter().any(|o| {
            let gap = o.rect.left() - body.right();
            gap > 0.0 && gap < reach
        })
    }
}
