//! Arena geometry and circle collision
//!
//! Everything in the arena is a circle: players, bots and projectiles all
//! collide by comparing center distance against the sum of radii.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The bounded rectangle all entities live in (origin top-left, y down)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// False until the render surface has been given a real size
    pub fn is_ready(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamp a circle's center so the whole circle stays inside the arena.
    ///
    /// If the arena is narrower than the circle on an axis, the circle is
    /// centered on that axis instead.
    pub fn clamp_circle(&self, pos: Vec2, radius: f32) -> Vec2 {
        Vec2::new(
            clamp_axis(pos.x, radius, self.width),
            clamp_axis(pos.y, radius, self.height),
        )
    }

    /// Whether a point lies inside `[0, width] x [0, height]`
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.x <= self.width && pos.y >= 0.0 && pos.y <= self.height
    }

    /// Whether a point lies strictly inside the arena (edges count as outside)
    pub fn contains_strict(&self, pos: Vec2) -> bool {
        pos.x > 0.0 && pos.x < self.width && pos.y > 0.0 && pos.y < self.height
    }
}

#[inline]
fn clamp_axis(value: f32, radius: f32, extent: f32) -> f32 {
    if extent < radius * 2.0 {
        extent / 2.0
    } else {
        value.clamp(radius, extent - radius)
    }
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

/// Strict circle overlap: touching circles do not collide
#[inline]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    distance(a, b) < radius_a + radius_b
}

/// Uniform sample in `[margin, width - margin] x [margin, height - margin]`.
///
/// A margin larger than half the arena collapses that axis to its center.
pub fn random_point_in<R: Rng + ?Sized>(rng: &mut R, arena: &Arena, margin: f32) -> Vec2 {
    Vec2::new(
        sample_axis(rng, margin, arena.width),
        sample_axis(rng, margin, arena.height),
    )
}

fn sample_axis<R: Rng + ?Sized>(rng: &mut R, margin: f32, extent: f32) -> f32 {
    let lo = margin;
    let hi = extent - margin;
    if hi <= lo {
        extent / 2.0
    } else {
        rng.random_range(lo..hi)
    }
}

/// Uniform random heading in `[0, 2π)`
pub fn random_angle<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.random_range(0.0..std::f32::consts::TAU)
}
