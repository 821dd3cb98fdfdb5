//! Bot director
//!
//! Bots only exist to give a lone player something to fight: the roster is
//! filled while no remote players are connected and emptied as soon as one
//! shows up. Each bot wanders on a randomized re-aim timer, and the whole
//! roster fires one synchronized volley at the local player every two seconds.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;

use super::geometry::{Arena, distance, random_angle, random_point_in};
use super::state::{Bot, BotId, Owner, Player, Projectile, SessionId, palette};
use crate::consts::*;

/// Hand out the next bot key from a shared counter
pub fn alloc_bot_id(next_id: &mut u32) -> BotId {
    let id = BotId(*next_id);
    *next_id += 1;
    id
}

/// Fill `bots` up to `MAX_BOTS`, unless any remote player is connected.
///
/// `anchor` is the local player's position; new bots keep their distance
/// from it.
pub fn ensure_bot_population<R: Rng + ?Sized>(
    bots: &mut BTreeMap<BotId, Bot>,
    remote_players: &BTreeMap<SessionId, Player>,
    anchor: Vec2,
    arena: &Arena,
    rng: &mut R,
    next_id: &mut u32,
) {
    if !remote_players.is_empty() {
        return;
    }
    while bots.len() < MAX_BOTS {
        let bot = spawn_one_bot(rng, anchor, &BOT_NAMES, arena);
        bots.insert(alloc_bot_id(next_id), bot);
    }
}

/// Create one bot somewhere safe.
///
/// Positions are rejection-sampled inside the spawn margin until one lies
/// more than `BOT_SAFE_DISTANCE` from `anchor`. Arenas too small to ever
/// satisfy that fall back to the farthest candidate after
/// `BOT_SPAWN_ATTEMPTS` tries.
pub fn spawn_one_bot<R: Rng + ?Sized>(
    rng: &mut R,
    anchor: Vec2,
    names: &[&str],
    arena: &Arena,
) -> Bot {
    let mut best = random_point_in(rng, arena, BOT_SPAWN_MARGIN);
    let mut best_dist = distance(best, anchor);
    let mut attempts = 1;
    while best_dist <= BOT_SAFE_DISTANCE && attempts < BOT_SPAWN_ATTEMPTS {
        let candidate = random_point_in(rng, arena, BOT_SPAWN_MARGIN);
        let dist = distance(candidate, anchor);
        if dist > best_dist {
            best = candidate;
            best_dist = dist;
        }
        attempts += 1;
    }

    let name = if names.is_empty() {
        "Bot"
    } else {
        names[rng.random_range(0..names.len())]
    };

    Bot {
        body: Player::new(best, name, palette::BOT),
        angle: random_angle(rng),
        move_timer_ms: 0.0,
        move_interval_ms: random_move_interval(rng),
    }
}

fn random_move_interval<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.random_range(BOT_MOVE_INTERVAL_MIN_MS..BOT_MOVE_INTERVAL_MAX_MS)
}

/// Advance every bot's wander state by one step
pub fn update_bots<R: Rng + ?Sized>(
    bots: &mut BTreeMap<BotId, Bot>,
    arena: &Arena,
    elapsed_ms: f32,
    rng: &mut R,
) {
    let scale = crate::frame_scale(elapsed_ms);
    for bot in bots.values_mut() {
        bot.move_timer_ms += elapsed_ms;
        if bot.move_timer_ms >= bot.move_interval_ms {
            bot.angle = random_angle(rng);
            bot.move_timer_ms = 0.0;
            bot.move_interval_ms = random_move_interval(rng);
        }
        bot.body.pos += crate::heading(bot.angle) * BOT_SPEED * scale;
        bot.body.clamp_to(arena);
    }
}

/// Whether the global volley cadence has elapsed
#[inline]
pub fn volley_due(now_ms: f64, last_volley_ms: f64) -> bool {
    now_ms - last_volley_ms >= BOT_VOLLEY_INTERVAL_MS
}

/// One projectile from every bot, aimed at `target`
pub fn fire_volley(bots: &BTreeMap<BotId, Bot>, target: Vec2) -> Vec<Projectile> {
    bots.iter()
        .map(|(id, bot)| {
            let angle = crate::aim_angle(bot.body.pos, target);
            Projectile::new(bot.body.pos, angle, Owner::Bot(*id))
        })
        .collect()
}
