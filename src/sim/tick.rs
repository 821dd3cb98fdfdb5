//! Per-frame simulation step
//!
//! Advances the local player, bots, projectiles and particles by one
//! display refresh, resolves collisions, applies buffered inbound messages
//! and queues the outbound ones. Motion constants are per nominal 60 Hz
//! frame and get scaled by the real elapsed time.

use glam::Vec2;
use rand::Rng;

use super::bots;
use super::combat;
use super::geometry::circles_overlap;
use super::input::MoveKeys;
use super::state::{GameEvent, GameState, Owner, Particle, Projectile};
use crate::consts::*;
use crate::net::protocol::WireMessage;

/// Input for a single step
#[derive(Debug, Clone, Default)]
pub struct StepInput {
    /// Session clock (ms), used for invulnerability and the volley cadence
    pub now_ms: f64,
    /// Time since the previous step (ms)
    pub elapsed_ms: f32,
    /// Held movement keys
    pub moves: MoveKeys,
    /// Fire key was pressed since the previous step
    pub fire: bool,
}

/// What a step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Arena not sized or no local player yet; nothing was touched
    Skipped,
    Advanced,
}

/// Advance the game state by one frame.
///
/// `inbound` holds the messages received since the previous step, in arrival
/// order; messages to broadcast are appended to `outbox`.
pub fn step(
    state: &mut GameState,
    input: &StepInput,
    inbound: &[WireMessage],
    outbox: &mut Vec<WireMessage>,
) -> StepOutcome {
    if !state.is_ready() {
        return StepOutcome::Skipped;
    }
    let scale = crate::frame_scale(input.elapsed_ms.max(0.0));

    update_local(state, input, scale, outbox);

    let arena = state.arena;
    bots::update_bots(&mut state.bots, &arena, input.elapsed_ms.max(0.0), &mut state.rng);

    if bots::volley_due(input.now_ms, state.last_volley_ms) {
        if let Some(target) = state.local.as_ref().map(|p| p.body.pos) {
            let volley = bots::fire_volley(&state.bots, target);
            state.projectiles.extend(volley);
        }
        state.last_volley_ms = input.now_ms;
    }

    update_projectiles(state, input.now_ms, scale);
    update_particles(state, scale);

    for message in inbound {
        apply_inbound(state, message);
    }

    StepOutcome::Advanced
}

/// Movement, firing and the unconditional position broadcast
fn update_local(state: &mut GameState, input: &StepInput, scale: f32, outbox: &mut Vec<WireMessage>) {
    let arena = state.arena;
    let Some(local) = state.local.as_mut() else {
        return;
    };

    if !local.dead {
        local.body.pos += input.moves.direction() * PLAYER_SPEED * scale;
        local.body.clamp_to(&arena);

        if input.fire {
            let origin = local.body.pos;
            let angle =
                combat::fire_angle(origin, &state.remote_players, &state.bots, &mut state.rng);
            state.projectiles.push(Projectile::new(
                origin,
                angle,
                Owner::Session(state.session_id.clone()),
            ));
            outbox.push(WireMessage::Fire {
                sender_id: state.session_id.clone(),
                x: origin.x,
                y: origin.y,
                angle,
            });
            state.events.push(GameEvent::Fired { angle });
        }
    }

    outbox.push(WireMessage::Position {
        sender_id: state.session_id.clone(),
        x: local.body.pos.x,
        y: local.body.pos.y,
        name: local.body.name.clone(),
    });
}

/// Move projectiles, spawn trails and resolve hits.
///
/// A local death clears every projectile and ends processing for this step.
fn update_projectiles(state: &mut GameState, now_ms: f64, scale: f32) {
    let arena = state.arena;
    let session_id = state.session_id.clone();

    let mut i = 0;
    while i < state.projectiles.len() {
        state.projectiles[i].advance(scale);
        let (pos, radius) = (state.projectiles[i].pos, state.projectiles[i].radius);

        if state.max_particles > 0 && state.rng.random_bool(PARTICLE_SPAWN_CHANCE) {
            let particle = trail_particle(&mut state.rng, pos);
            state.particles.push(particle);
        }

        let Some(local) = state.local.as_mut() else {
            return;
        };
        let own_shot = state.projectiles[i].owner.is_session(&session_id);

        if !own_shot
            && !local.dead
            && !local.is_invulnerable(now_ms)
            && circles_overlap(local.body.pos, local.body.radius, pos, radius)
        {
            local.dead = true;
            let killer = state.projectiles[i].owner.clone();
            log::info!("Local player hit by {:?} (score {})", killer, local.score);
            state.events.push(GameEvent::LocalDied { killer });
            state.projectiles.clear();
            state.clear_bots();
            return;
        }

        if own_shot {
            let hit = state
                .bots
                .iter()
                .find(|(_, bot)| circles_overlap(bot.body.pos, bot.body.radius, pos, radius))
                .map(|(id, _)| *id);

            if let Some(bot_id) = hit {
                state.bots.remove(&bot_id);
                local.score += BOT_KILL_POINTS;
                let score = local.score;
                let anchor = local.body.pos;
                state.events.push(GameEvent::BotDestroyed { bot: bot_id, score });
                state.projectiles.remove(i);
                respawn_one_bot(state, anchor);
                continue;
            }
        }

        if !arena.contains_strict(pos) {
            state.projectiles.remove(i);
            continue;
        }
        i += 1;
    }
}

/// Replace a destroyed bot so a lone player always has company
fn respawn_one_bot(state: &mut GameState, anchor: Vec2) {
    if !state.remote_players.is_empty() {
        return;
    }
    let bot = bots::spawn_one_bot(&mut state.rng, anchor, &BOT_NAMES, &state.arena);
    let id = state.next_bot_id();
    state.bots.insert(id, bot);
    state.events.push(GameEvent::BotsSpawned { count: 1 });
}

fn trail_particle<R: Rng + ?Sized>(rng: &mut R, pos: Vec2) -> Particle {
    Particle {
        pos,
        vel: Vec2::new(
            (rng.random::<f32>() - 0.5) * PARTICLE_SPREAD,
            (rng.random::<f32>() - 0.5) * PARTICLE_SPREAD,
        ),
        life: PARTICLE_LIFE,
        hue: rng.random_range(0.0..360.0),
    }
}

/// Drift and age particles; drop the dead and the oldest over the cap
fn update_particles(state: &mut GameState, scale: f32) {
    for particle in state.particles.iter_mut() {
        particle.pos += particle.vel * scale;
        particle.life -= scale;
        particle.hue = (particle.hue + PARTICLE_HUE_STEP * scale).rem_euclid(360.0);
    }
    state.particles.retain(|p| p.life > 0.0);

    if state.particles.len() > state.max_particles {
        let excess = state.particles.len() - state.max_particles;
        state.particles.drain(..excess);
    }
}

/// Apply one relay message to the local mirrors
fn apply_inbound(state: &mut GameState, message: &WireMessage) {
    // The relay echoes our own fire events; the projectile already exists
    if *message.sender_id() == state.session_id {
        return;
    }

    match message {
        WireMessage::Position {
            sender_id,
            x,
            y,
            name,
        } => {
            let pos = state.arena.clamp_circle(Vec2::new(*x, *y), PLAYER_RADIUS);
            state.upsert_remote(sender_id.clone(), pos, &display_name(name));
        }
        WireMessage::Fire {
            sender_id,
            x,
            y,
            angle,
        } => {
            state.projectiles.push(Projectile::new(
                Vec2::new(*x, *y),
                *angle,
                Owner::Session(sender_id.clone()),
            ));
        }
        WireMessage::Departure { sender_id } => {
            log::info!("Player {} left", sender_id);
            state.remove_remote(sender_id);
        }
    }
}

/// Remote names: trimmed, at most `MAX_NAME_LEN` characters, never empty
fn display_name(name: &str) -> String {
    let trimmed: String = name.trim().chars().take(MAX_NAME_LEN).collect();
    if trimmed.is_empty() {
        "Player".to_string()
    } else {
        trimmed
    }
}
