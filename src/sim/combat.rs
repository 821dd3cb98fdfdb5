//! Target selection for the local player's shots

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;

use super::geometry::{distance, random_angle};
use super::state::{Bot, BotId, Player, SessionId};

/// Position of the closest remote player or bot to `origin`.
///
/// Remote players are visited first, then bots, each in key order; the first
/// candidate at the minimum distance wins.
pub fn nearest_target(
    origin: Vec2,
    remote_players: &BTreeMap<SessionId, Player>,
    bots: &BTreeMap<BotId, Bot>,
) -> Option<Vec2> {
    let candidates = remote_players
        .values()
        .map(|p| p.pos)
        .chain(bots.values().map(|b| b.body.pos));

    let mut best: Option<(Vec2, f32)> = None;
    for pos in candidates {
        let dist = distance(origin, pos);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((pos, dist)),
        }
    }
    best.map(|(pos, _)| pos)
}

/// Angle for a shot from `origin`: at the nearest target, or anywhere if
/// there is nothing to aim at
pub fn fire_angle<R: Rng + ?Sized>(
    origin: Vec2,
    remote_players: &BTreeMap<SessionId, Player>,
    bots: &BTreeMap<BotId, Bot>,
    rng: &mut R,
) -> f32 {
    match nearest_target(origin, remote_players, bots) {
        Some(target) => crate::aim_angle(origin, target),
        None => random_angle(rng),
    }
}
