//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time
//! - Frame delta computation
//! - Logger setup

use crate::consts::{FRAME_MS, MAX_DT_MS};

/// Turns absolute frame timestamps into clamped deltas
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed ms since the previous call, clamped to `[0, MAX_DT_MS]`
    ///
    /// The first call after construction or `reset` reports one nominal frame.
    pub fn delta(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) as f32).clamp(0.0, MAX_DT_MS),
            None => FRAME_MS,
        };
        self.last_ms = Some(now_ms);
        dt
    }

    /// Forget the previous timestamp (after the tab was hidden)
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or_default()
}

/// Seed for a fresh session
pub fn session_seed() -> u64 {
    now_ms() as u64
}

/// Route `log` output to the browser console
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
}

/// Route `log` output to stderr (`RUST_LOG` controls the level)
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_is_nominal() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.delta(5_000.0), FRAME_MS);
        assert_eq!(clock.delta(5_020.0), 20.0);
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut clock = FrameClock::new();
        clock.delta(0.0);
        // Tab suspended for a minute
        assert_eq!(clock.delta(60_000.0), MAX_DT_MS);
        // Clock went backwards
        assert_eq!(clock.delta(59_000.0), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut clock = FrameClock::new();
        clock.delta(0.0);
        clock.reset();
        assert_eq!(clock.delta(90_000.0), FRAME_MS);
    }

    #[test]
    fn test_now_is_positive() {
        assert!(now_ms() > 0.0);
    }
}
