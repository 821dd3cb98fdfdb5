//! Client-side simulation module
//!
//! All gameplay logic lives here:
//! - Elapsed-time scaled motion (nominal 60 Hz)
//! - Seeded RNG only
//! - Stable iteration order (ordered maps keyed by id)
//! - No rendering or platform dependencies

pub mod bots;
pub mod combat;
pub mod geometry;
pub mod input;
pub mod state;
pub mod tick;

pub use geometry::{Arena, circles_overlap, distance};
pub use input::{FIRE_KEY, KeySet, MoveKeys};
pub use state::{
    Bot, BotId, GameEvent, GameState, LocalPlayer, Owner, Particle, Player, Projectile, SessionId,
};
pub use tick::{StepInput, StepOutcome, step};
