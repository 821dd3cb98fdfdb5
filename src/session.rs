//! Game session
//!
//! Owns the simulation state, the relay connection and the best-score store
//! for one local player, and turns each display refresh into a simulation
//! step plus a draw list. The host calls [`Session::frame`] from its refresh
//! callback and stops rescheduling once it returns [`FrameOutcome::Stopped`].

use crate::consts::{MAX_FRAME_MS, MAX_NAME_LEN, NOMINAL_FRAME_MS};
use crate::net::{LinkState, Transport, TransportAdapter, WireMessage};
use crate::renderer::{BorderGlow, Frame, build_frame};
use crate::scores::ScoreStore;
use crate::settings::Settings;
use crate::sim::{
    Arena, FIRE_KEY, GameEvent, GameState, KeySet, SessionId, StepInput, StepOutcome, step,
};

/// Key that respawns the local player after death
pub const RESPAWN_KEY: &str = "Enter";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Name must contain at least one non-space character")]
    InvalidName,
    #[error("Session has been torn down")]
    TornDown,
}

/// What the presentation layer shows around the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hud {
    pub is_dead: bool,
    pub score: u64,
    pub best_score: u64,
    /// Spawn protection still active
    pub invulnerable: bool,
}

/// Result of one refresh
#[derive(Debug)]
pub enum FrameOutcome {
    /// Torn down; do not schedule another frame
    Stopped,
    /// Arena not sized or no player yet; try again next refresh
    Skipped,
    Rendered(Frame),
}

/// Trim and truncate a submitted name
pub fn validate_name(raw: &str) -> Result<String, SessionError> {
    let name: String = raw.trim().chars().take(MAX_NAME_LEN).collect();
    let name = name.trim_end().to_string();
    if name.is_empty() {
        return Err(SessionError::InvalidName);
    }
    Ok(name)
}

pub struct Session<T: Transport> {
    state: GameState,
    net: TransportAdapter<T>,
    scores: Box<dyn ScoreStore>,
    settings: Settings,
    keys: KeySet,
    border: BorderGlow,
    best_score: u64,
    /// Name accepted before the arena had a size
    pending_name: Option<String>,
    fire_pending: bool,
    respawn_pending: bool,
    last_time: Option<f64>,
    last_events: Vec<GameEvent>,
    running: bool,
}

impl<T: Transport> Session<T> {
    pub fn new(
        session_id: SessionId,
        transport: T,
        scores: Box<dyn ScoreStore>,
        settings: Settings,
        seed: u64,
    ) -> Self {
        let mut state = GameState::new(session_id, seed);
        state.max_particles = settings.max_particles();
        let best_score = scores.read();
        log::info!(
            "Session {} created (best score {})",
            state.session_id,
            best_score
        );
        Self {
            state,
            net: TransportAdapter::new(transport),
            scores,
            settings,
            keys: KeySet::new(),
            border: BorderGlow::new(),
            best_score,
            pending_name: None,
            fire_pending: false,
            respawn_pending: false,
            last_time: None,
            last_events: Vec::new(),
            running: true,
        }
    }

    /// Submit the player's name and enter the arena.
    ///
    /// If the arena has no size yet the player appears on the first frame
    /// after [`Session::resize`].
    pub fn start(&mut self, raw_name: &str, now_ms: f64) -> Result<(), SessionError> {
        if !self.running {
            return Err(SessionError::TornDown);
        }
        let name = validate_name(raw_name)?;
        self.best_score = self.scores.read();
        log::info!("{} entering the arena", name);
        if self.state.arena.is_ready() {
            self.state.spawn_local(&name, now_ms);
        } else {
            self.pending_name = Some(name);
        }
        Ok(())
    }

    /// The render surface changed size
    pub fn resize(&mut self, width: f32, height: f32) {
        self.state.arena = Arena::new(width, height);
        let arena = self.state.arena;
        if let Some(local) = self.state.local.as_mut() {
            local.body.clamp_to(&arena);
        }
        for bot in self.state.bots.values_mut() {
            bot.body.clamp_to(&arena);
        }
    }

    pub fn key_down(&mut self, key: &str) {
        let edge = self.keys.press(key);
        if !edge {
            return;
        }
        if key == FIRE_KEY {
            // Presses on the name screen must not fire on the first frame
            self.fire_pending = self.state.is_ready();
        } else if key == RESPAWN_KEY && self.state.is_dead() {
            self.respawn_pending = true;
        }
    }

    pub fn key_up(&mut self, key: &str) {
        self.keys.release(key);
    }

    /// Forget held keys (focus lost)
    pub fn clear_keys(&mut self) {
        self.keys.clear();
    }

    /// Bring a dead player back at the arena center
    pub fn respawn(&mut self, now_ms: f64) {
        if !self.running || !self.state.is_dead() {
            return;
        }
        self.state.respawn(now_ms);
        self.fire_pending = false;
        self.respawn_pending = false;
        log::info!("Respawned (best score {})", self.best_score);
    }

    /// Run one refresh: step the simulation and build the draw list
    pub fn frame(&mut self, now_ms: f64) -> FrameOutcome {
        if !self.running {
            return FrameOutcome::Stopped;
        }

        let elapsed_ms = match self.last_time {
            Some(last) => ((now_ms - last) as f32).clamp(0.0, MAX_FRAME_MS),
            None => NOMINAL_FRAME_MS,
        };
        self.last_time = Some(now_ms);

        if self.state.arena.is_ready() {
            if let Some(name) = self.pending_name.take() {
                self.state.spawn_local(&name, now_ms);
            }
        }
        if self.respawn_pending {
            self.respawn(now_ms);
        }
        if !self.state.is_ready() {
            self.fire_pending = false;
            return FrameOutcome::Skipped;
        }

        if self.settings.effective_border_glow() {
            self.border.advance(elapsed_ms);
        }

        let inbound = self.net.drain_inbound();
        let input = StepInput {
            now_ms,
            elapsed_ms,
            moves: self.keys.move_keys(self.settings.layout),
            fire: std::mem::take(&mut self.fire_pending),
        };
        let mut outbox: Vec<WireMessage> = Vec::with_capacity(2);
        if step(&mut self.state, &input, &inbound, &mut outbox) == StepOutcome::Skipped {
            return FrameOutcome::Skipped;
        }
        self.net.send_all(&outbox);

        self.last_events = self.state.drain_events();
        for event in &self.last_events {
            if let GameEvent::LocalDied { .. } = event {
                log::info!("Died with score {}", self.state.score());
            }
        }
        self.record_best();

        let hud = self.hud();
        FrameOutcome::Rendered(build_frame(&self.state, &hud, &self.border, &self.settings))
    }

    fn record_best(&mut self) {
        let score = self.state.score();
        if score > self.best_score {
            self.best_score = score;
            let name = self.state.local.as_ref().map_or("", |p| p.body.name.as_str());
            self.scores.write(score, name);
        }
    }

    pub fn hud(&self) -> Hud {
        let now = self.last_time.unwrap_or(0.0);
        Hud {
            is_dead: self.state.is_dead(),
            score: self.state.score(),
            best_score: self.best_score,
            invulnerable: self
                .state
                .local
                .as_ref()
                .is_some_and(|p| !p.dead && p.is_invulnerable(now)),
        }
    }

    /// Stop the loop and close the relay connection; safe to call repeatedly
    pub fn teardown(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.net.close();
        self.state.local = None;
        self.pending_name = None;
        self.keys.clear();
        log::info!("Session {} torn down", self.state.session_id);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn session_id(&self) -> &SessionId {
        &self.state.session_id
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Events recorded during the most recent step
    pub fn last_events(&self) -> &[GameEvent] {
        &self.last_events
    }

    pub fn link(&self) -> LinkState {
        self.net.link()
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{MAX_BOTS, PLAYER_SPEED};
    use crate::net::{MemoryRelay, MemoryTransport};
    use crate::renderer::Layer;
    use crate::scores::MemoryScores;
    use crate::sim::Owner;

    fn session(relay: &MemoryRelay, id: &str, scores: MemoryScores) -> Session<MemoryTransport> {
        Session::new(
            SessionId::new(id),
            relay.connect(),
            Box::new(scores),
            Settings::default(),
            42,
        )
    }

    fn ready(relay: &MemoryRelay, id: &str) -> Session<MemoryTransport> {
        let mut s = session(relay, id, MemoryScores::new());
        s.resize(800.0, 600.0);
        s.start(id, 0.0).unwrap();
        s
    }

    #[test]
    fn test_name_validation() {
        assert_eq!(validate_name("   "), Err(SessionError::InvalidName));
        assert_eq!(validate_name(""), Err(SessionError::InvalidName));
        assert_eq!(validate_name("  Neo "), Ok("Neo".to_string()));
        assert_eq!(
            validate_name("AVeryLongPlayerName"),
            Ok("AVeryLongPla".to_string())
        );
    }

    #[test]
    fn test_skipped_until_sized_then_spawns() {
        let relay = MemoryRelay::new();
        let mut s = session(&relay, "a", MemoryScores::new());
        assert!(matches!(s.frame(0.0), FrameOutcome::Skipped));

        s.start("Neo", 0.0).unwrap();
        assert!(matches!(s.frame(16.0), FrameOutcome::Skipped));

        s.resize(800.0, 600.0);
        match s.frame(32.0) {
            FrameOutcome::Rendered(frame) => {
                assert!(frame.is_ordered());
                assert_eq!(frame.count(Layer::LocalPlayer), 1);
                assert_eq!(frame.count(Layer::Bots), MAX_BOTS);
            }
            other => panic!("Expected a rendered frame, got {:?}", other),
        }
        assert!(s.hud().invulnerable);
    }

    #[test]
    fn test_teardown_stops_and_closes() {
        let relay = MemoryRelay::new();
        let mut s = ready(&relay, "a");
        assert_eq!(relay.connection_count(), 1);

        s.teardown();
        s.teardown();
        assert!(!s.is_running());
        assert_eq!(relay.connection_count(), 0);
        assert!(matches!(s.frame(100.0), FrameOutcome::Stopped));
        assert_eq!(s.start("Neo", 100.0), Err(SessionError::TornDown));
        assert_eq!(s.link(), LinkState::Closed);
    }

    #[test]
    fn test_replacing_session_after_teardown() {
        let relay = MemoryRelay::new();
        let mut slot = Some(ready(&relay, "a"));
        if let Some(mut s) = slot.take() {
            s.teardown();
        }
        assert_eq!(relay.connection_count(), 0);

        // The slot is free again, so a fresh session can join the same relay
        let s = slot.get_or_insert_with(|| ready(&relay, "a2"));
        assert_eq!(relay.connection_count(), 1);
        assert!(matches!(s.frame(16.0), FrameOutcome::Rendered(_)));
    }

    #[test]
    fn test_first_frame_nominal_then_clamped() {
        let relay = MemoryRelay::new();
        let mut s = ready(&relay, "a");
        s.key_down("d");

        s.frame(1000.0);
        let x0 = s.state().local.as_ref().unwrap().body.pos.x;
        assert!((x0 - (400.0 + PLAYER_SPEED)).abs() < 1e-3);

        // A stalled tab must not teleport the player across the arena
        s.frame(11_000.0);
        let x1 = s.state().local.as_ref().unwrap().body.pos.x;
        let expected = x0 + PLAYER_SPEED * MAX_FRAME_MS / NOMINAL_FRAME_MS;
        assert!((x1 - expected).abs() < 0.01);
    }

    #[test]
    fn test_two_sessions_share_arena() {
        let relay = MemoryRelay::new();
        let mut a = ready(&relay, "a");
        let mut b = ready(&relay, "b");

        a.frame(16.0);
        b.frame(16.0);
        a.frame(32.0);

        // Each sees the other and has dropped its bots
        assert!(a.state().remote_players.contains_key(&SessionId::new("b")));
        assert!(b.state().remote_players.contains_key(&SessionId::new("a")));
        assert!(a.state().bots.is_empty());
        assert!(b.state().bots.is_empty());

        // Fire from a shows up in b as a's projectile
        a.key_down(FIRE_KEY);
        a.frame(48.0);
        b.frame(48.0);
        let owners: Vec<&Owner> = b.state().projectiles.iter().map(|p| &p.owner).collect();
        assert_eq!(owners, vec![&Owner::Session(SessionId::new("a"))]);
        // The echo of a's own shot is not duplicated
        a.frame(64.0);
        assert_eq!(a.state().projectiles.len(), 1);

        // a leaves: b is alone again and gets a full roster
        a.teardown();
        b.frame(64.0);
        assert!(b.state().remote_players.is_empty());
        assert_eq!(b.state().bots.len(), MAX_BOTS);
    }

    #[test]
    fn test_best_score_written_when_beaten() {
        let relay = MemoryRelay::new();
        let scores = MemoryScores::with_best(100);
        let mut s = session(&relay, "a", scores.clone());
        s.resize(800.0, 600.0);
        s.start("Neo", 0.0).unwrap();
        assert_eq!(s.hud().best_score, 100);

        s.state.local.as_mut().unwrap().score = 50;
        s.frame(16.0);
        assert_eq!(scores.writes(), 0);

        s.state.local.as_mut().unwrap().score = 150;
        s.frame(32.0);
        assert_eq!(scores.read(), 150);
        assert_eq!(scores.name(), "Neo");
        assert_eq!(s.hud().best_score, 150);
        assert_eq!(scores.writes(), 1);
    }

    #[test]
    fn test_fire_before_spawn_is_dropped() {
        let relay = MemoryRelay::new();
        let mut s = session(&relay, "a", MemoryScores::new());
        s.start("Neo", 0.0).unwrap();

        // Space on the name screen, arena not sized yet
        s.key_down(FIRE_KEY);
        s.key_up(FIRE_KEY);
        assert!(matches!(s.frame(0.0), FrameOutcome::Skipped));

        s.resize(800.0, 600.0);
        assert!(matches!(s.frame(16.0), FrameOutcome::Rendered(_)));
        assert!(s.state().projectiles.is_empty());
        assert!(
            !s.last_events()
                .iter()
                .any(|e| matches!(e, GameEvent::Fired { .. }))
        );
    }

    #[test]
    fn test_respawn_key_after_death() {
        let relay = MemoryRelay::new();
        let mut s = ready(&relay, "a");
        s.frame(16.0);

        // Not dead: Enter does nothing
        s.key_down(RESPAWN_KEY);
        s.key_up(RESPAWN_KEY);
        s.frame(32.0);
        assert!(!s.hud().is_dead);

        {
            let local = s.state.local.as_mut().unwrap();
            local.dead = true;
            local.score = 200;
        }
        s.frame(48.0);
        assert!(s.hud().is_dead);

        s.key_down(RESPAWN_KEY);
        s.frame(64.0);
        let hud = s.hud();
        assert!(!hud.is_dead);
        assert_eq!(hud.score, 0);
        assert_eq!(hud.best_score, 200);
        assert!(hud.invulnerable);
    }

    #[test]
    fn test_degraded_transport_keeps_running() {
        let relay = MemoryRelay::new();
        let mut s = ready(&relay, "a");
        relay.shut_down();

        assert!(matches!(s.frame(16.0), FrameOutcome::Rendered(_)));
        assert_eq!(s.link(), LinkState::Degraded);
        assert!(matches!(s.frame(32.0), FrameOutcome::Rendered(_)));
    }

    #[test]
    fn test_garbage_from_relay_ignored() {
        let relay = MemoryRelay::new();
        let mut s = ready(&relay, "a");
        relay.inject_raw("{\"type\":\"position\",\"sender_id\":\"x\"}");
        relay.inject_raw("<html>");
        assert!(matches!(s.frame(16.0), FrameOutcome::Rendered(_)));
        assert!(s.state().remote_players.is_empty());
        assert_eq!(s.state().bots.len(), MAX_BOTS);
    }
}
