//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - Elapsed time is passed in, never read
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering, audio or platform dependencies

pub mod effects;
pub mod entities;
pub mod geom;
pub mod player;
pub mod ragdoll;
pub mod spawn;
pub mod state;
pub mod stomp;
pub mod tick;

pub use effects::{ActiveEffect, EffectKind, EffectModifiers};
pub use entities::{Background, Enemy, HeightClass, Obstacle, Pickup, ScorePopup};
pub use geom::{Rect, is_stomp};
pub use player::{Parachute, Player, PlayerPose, PoseAngles};
pub use ragdoll::{BodyPart, BodySegment, Joint, Ragdoll, RagdollConfig};
pub use spawn::{PickupPattern, SpawnCursor, SpawnReport, SpawnScheduler};
pub use state::{GameEvent, GamePhase, GameState, RunOutcome, SpeedState};
pub use stomp::{StompPhase, StompState};
pub use tick::{InputEvent, TickInput, tick};
