//! Neon Arena - a multiplayer neon arena shooter
//!
//! Core modules:
//! - `sim`: Client-side simulation (movement, bots, projectiles, collisions)
//! - `net`: Wire protocol and the relay transport adapter
//! - `renderer`: Ordered frame building plus WebGPU / canvas back ends
//! - `session`: Frame scheduling, respawn and teardown for one local session
//! - `scores`: Best-score persistence
//! - `settings`: User preferences

pub mod net;
pub mod renderer;
pub mod scores;
pub mod session;
pub mod settings;
pub mod sim;

pub use scores::{BestScore, MemoryScores, ScoreStore};
pub use session::{FrameOutcome, Hud, Session, SessionError};
pub use settings::{KeyboardLayout, QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Frame duration the motion constants are tuned for (60 Hz)
    pub const NOMINAL_FRAME_MS: f32 = 16.67;
    /// Longest frame the session will feed into a single step (tab switches etc.)
    pub const MAX_FRAME_MS: f32 = 250.0;

    /// Port the relay listens on when no `relay` query parameter is given
    pub const RELAY_PORT: u16 = 3000;

    /// Collision radius shared by players and bots
    pub const PLAYER_RADIUS: f32 = 18.0;
    /// Local player speed (pixels per nominal frame, per axis)
    pub const PLAYER_SPEED: f32 = 5.0;
    /// Longest display name accepted from the name screen
    pub const MAX_NAME_LEN: usize = 12;
    /// Post-spawn window during which the local player ignores projectiles
    pub const INVULNERABILITY_MS: f64 = 2000.0;

    /// Projectile radius
    pub const PROJECTILE_RADIUS: f32 = 5.0;
    /// Projectile speed (pixels per nominal frame)
    pub const PROJECTILE_SPEED: f32 = 10.0;

    /// Bot roster size while no remote players are connected
    pub const MAX_BOTS: usize = 5;
    /// Bot wander speed (pixels per nominal frame)
    pub const BOT_SPEED: f32 = 3.0;
    /// Inset from the arena edge for bot spawn sampling
    pub const BOT_SPAWN_MARGIN: f32 = 50.0;
    /// Bots never spawn closer than this to the local player
    pub const BOT_SAFE_DISTANCE: f32 = 200.0;
    /// Rejection sampling budget before falling back to the farthest candidate
    pub const BOT_SPAWN_ATTEMPTS: u32 = 256;
    /// Re-aim interval range for wandering bots (ms)
    pub const BOT_MOVE_INTERVAL_MIN_MS: f32 = 1000.0;
    pub const BOT_MOVE_INTERVAL_MAX_MS: f32 = 3000.0;
    /// Global cadence of the bot volley (ms)
    pub const BOT_VOLLEY_INTERVAL_MS: f64 = 2000.0;
    /// Points for destroying a bot
    pub const BOT_KILL_POINTS: u64 = 50;

    /// Probability of a trail particle per projectile per step
    pub const PARTICLE_SPAWN_CHANCE: f64 = 0.5;
    /// Particle lifetime (nominal frames)
    pub const PARTICLE_LIFE: f32 = 20.0;
    /// Particle velocity spread (pixels per nominal frame, per axis)
    pub const PARTICLE_SPREAD: f32 = 2.0;
    /// Default particle population cap
    pub const MAX_PARTICLES: usize = 1000;
    /// Hue rotation per nominal frame (degrees)
    pub const PARTICLE_HUE_STEP: f32 = 12.0;

    /// Display names handed out to bots
    pub const BOT_NAMES: [&str; 8] = [
        "BotZoid",
        "DotMaster",
        "PixelBoi",
        "ZapTron",
        "GlowBot",
        "NeonNinja",
        "CyberDot",
        "BitBlaster",
    ];
}

/// Scale factor that turns per-nominal-frame speeds into per-step distances
#[inline]
pub fn frame_scale(elapsed_ms: f32) -> f32 {
    elapsed_ms / consts::NOMINAL_FRAME_MS
}

/// Unit vector for a heading in radians
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle (radians) of the ray from `from` towards `to`
#[inline]
pub fn aim_angle(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}
