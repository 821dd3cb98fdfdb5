//! Game state and entity model
//!
//! Everything the simulation step reads or writes lives in [`GameState`].
//! Remote players and bots are kept in ordered maps so that iteration order
//! (and therefore nearest-target tie-breaking) is stable.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bots;
use super::geometry::Arena;
use crate::consts::*;

/// Entity colors (linear RGBA)
pub mod palette {
    pub const LOCAL_PLAYER: [f32; 4] = [1.0, 0.0, 1.0, 1.0]; // #ff00ff
    pub const REMOTE_PLAYER: [f32; 4] = [0.0, 1.0, 1.0, 1.0]; // #00ffff
    pub const BOT: [f32; 4] = [0.0, 1.0, 0.0, 1.0]; // #00ff00
    pub const PROJECTILE: [f32; 4] = [1.0, 0.27, 0.27, 1.0]; // #ff4444
}

/// Network session identifier assigned to one participant
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id for a new local session
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(format!("{:016x}", rng.random::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Synthetic key for a locally simulated bot (never sent over the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BotId(pub u32);

/// Who fired a projectile - decides which collisions apply to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    Session(SessionId),
    Bot(BotId),
}

impl Owner {
    /// True only for projectiles fired by exactly this session
    pub fn is_session(&self, id: &SessionId) -> bool {
        matches!(self, Owner::Session(owner) if owner == id)
    }
}

/// A circular avatar (local, remote or the body of a bot)
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub pos: Vec2,
    pub name: String,
    pub radius: f32,
    pub color: [f32; 4],
}

impl Player {
    pub fn new(pos: Vec2, name: impl Into<String>, color: [f32; 4]) -> Self {
        Self {
            pos,
            name: name.into(),
            radius: PLAYER_RADIUS,
            color,
        }
    }

    /// Keep the whole circle inside the arena
    pub fn clamp_to(&mut self, arena: &Arena) {
        self.pos = arena.clamp_circle(self.pos, self.radius);
    }
}

/// The player driven by this instance's input
#[derive(Debug, Clone)]
pub struct LocalPlayer {
    pub body: Player,
    /// Score in the current life
    pub score: u64,
    /// Session time (ms) until which projectiles are ignored
    pub invulnerable_until_ms: f64,
    pub dead: bool,
}

impl LocalPlayer {
    pub fn new(pos: Vec2, name: impl Into<String>, now_ms: f64) -> Self {
        Self {
            body: Player::new(pos, name, palette::LOCAL_PLAYER),
            score: 0,
            invulnerable_until_ms: now_ms + INVULNERABILITY_MS,
            dead: false,
        }
    }

    pub fn is_invulnerable(&self, now_ms: f64) -> bool {
        now_ms < self.invulnerable_until_ms
    }
}

/// An autonomous opponent: a player body plus wander state
#[derive(Debug, Clone)]
pub struct Bot {
    pub body: Player,
    /// Current facing (radians)
    pub angle: f32,
    /// Time since the last re-aim (ms)
    pub move_timer_ms: f32,
    /// Time between re-aims (ms), resampled on every re-aim
    pub move_interval_ms: f32,
}

/// A projectile travelling in a straight line
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub pos: Vec2,
    pub angle: f32,
    pub radius: f32,
    pub owner: Owner,
}

impl Projectile {
    pub fn new(pos: Vec2, angle: f32, owner: Owner) -> Self {
        Self {
            pos,
            angle,
            radius: PROJECTILE_RADIUS,
            owner,
        }
    }

    /// Move along the fixed heading by `PROJECTILE_SPEED * scale`
    pub fn advance(&mut self, scale: f32) {
        self.pos += crate::heading(self.angle) * PROJECTILE_SPEED * scale;
    }
}

/// A decorative trail particle (not gameplay-affecting)
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining life in nominal frames
    pub life: f32,
    /// Hue in degrees, cycled every step
    pub hue: f32,
}

/// Things that happened during a step, for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Local player fired at the given angle
    Fired { angle: f32 },
    /// Local player was hit
    LocalDied { killer: Owner },
    /// A local projectile destroyed a bot
    BotDestroyed { bot: BotId, score: u64 },
    /// A remote participant was seen for the first time
    RemoteJoined(SessionId),
    /// A remote participant left
    RemoteLeft(SessionId),
    /// The bot roster was (re)filled
    BotsSpawned { count: usize },
    /// The bot roster was emptied
    BotsCleared,
}

/// Complete client-side simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    pub arena: Arena,
    /// This participant's session id (owner tag of local projectiles)
    pub session_id: SessionId,
    pub rng: Pcg32,
    /// None until a name has been submitted and the arena is sized
    pub local: Option<LocalPlayer>,
    pub remote_players: BTreeMap<SessionId, Player>,
    pub bots: BTreeMap<BotId, Bot>,
    pub projectiles: Vec<Projectile>,
    pub particles: Vec<Particle>,
    pub max_particles: usize,
    /// Session time of the last bot volley
    pub last_volley_ms: f64,
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    pub fn new(session_id: SessionId, seed: u64) -> Self {
        Self {
            arena: Arena::default(),
            session_id,
            rng: Pcg32::seed_from_u64(seed),
            local: None,
            remote_players: BTreeMap::new(),
            bots: BTreeMap::new(),
            projectiles: Vec::new(),
            particles: Vec::new(),
            max_particles: MAX_PARTICLES,
            last_volley_ms: 0.0,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new bot key
    pub fn next_bot_id(&mut self) -> BotId {
        bots::alloc_bot_id(&mut self.next_id)
    }

    /// Whether the step has everything it needs to run
    pub fn is_ready(&self) -> bool {
        self.arena.is_ready() && self.local.is_some()
    }

    /// Create or reset the local player at the arena center.
    ///
    /// Clears projectiles and bots, re-arms invulnerability, zeroes the score
    /// and refills the bot roster when nobody else is connected.
    pub fn spawn_local(&mut self, name: &str, now_ms: f64) {
        let center = self.arena.center();
        self.local = Some(LocalPlayer::new(center, name, now_ms));
        self.projectiles.clear();
        self.clear_bots();
        self.last_volley_ms = now_ms;
        self.ensure_bots();
    }

    /// Respawn after death, keeping the submitted name
    pub fn respawn(&mut self, now_ms: f64) {
        let Some(name) = self.local.as_ref().map(|p| p.body.name.clone()) else {
            return;
        };
        self.spawn_local(&name, now_ms);
    }

    /// Fill the bot roster up to `MAX_BOTS` if no remote players are known
    pub fn ensure_bots(&mut self) {
        let Some(local) = self.local.as_ref() else {
            return;
        };
        let anchor = local.body.pos;
        let before = self.bots.len();
        bots::ensure_bot_population(
            &mut self.bots,
            &self.remote_players,
            anchor,
            &self.arena,
            &mut self.rng,
            &mut self.next_id,
        );
        let added = self.bots.len() - before;
        if added > 0 {
            log::debug!("Spawned {} bots", added);
            self.events.push(GameEvent::BotsSpawned { count: added });
        }
    }

    /// Empty the bot roster
    pub fn clear_bots(&mut self) {
        if !self.bots.is_empty() {
            self.bots.clear();
            self.events.push(GameEvent::BotsCleared);
        }
    }

    /// Insert or update a remote player's mirror.
    ///
    /// The first remote presence observed clears the bot roster.
    pub fn upsert_remote(&mut self, id: SessionId, pos: Vec2, name: &str) {
        let was_alone = self.remote_players.is_empty();
        match self.remote_players.get_mut(&id) {
            Some(player) => {
                player.pos = pos;
                player.name = name.to_string();
            }
            None => {
                let player = Player::new(pos, name, palette::REMOTE_PLAYER);
                self.remote_players.insert(id.clone(), player);
                self.events.push(GameEvent::RemoteJoined(id));
                if was_alone {
                    self.clear_bots();
                }
            }
        }
    }

    /// Forget a remote player; repopulate bots if nobody is left.
    ///
    /// A dead local player gets its bots back on respawn instead.
    pub fn remove_remote(&mut self, id: &SessionId) {
        if self.remote_players.remove(id).is_some() {
            self.events.push(GameEvent::RemoteLeft(id.clone()));
            if self.remote_players.is_empty() && !self.is_dead() {
                self.ensure_bots();
            }
        }
    }

    /// Take all events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Current score (0 before spawn)
    pub fn score(&self) -> u64 {
        self.local.as_ref().map(|p| p.score).unwrap_or(0)
    }

    pub fn is_dead(&self) -> bool {
        self.local.as_ref().is_some_and(|p| p.dead)
    }
}
