//! Shape generation for the world pass

use glam::Vec2;
use std::f32::consts::PI;

use super::frame::{Command, DrawCmd};
use super::vertex::Vertex;

/// Concentric bands used to fake a blur halo
const GLOW_BANDS: u32 = 4;
/// Alpha of the innermost halo band
const GLOW_ALPHA: f32 = 0.35;

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Generate vertices for a ring (hollow circle)
pub fn ring(
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 6) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;
        let (sin1, cos1) = theta1.sin_cos();
        let (sin2, cos2) = theta2.sin_cos();

        let inner1 = center + Vec2::new(cos1, sin1) * inner_radius;
        let outer1 = center + Vec2::new(cos1, sin1) * outer_radius;
        let inner2 = center + Vec2::new(cos2, sin2) * inner_radius;
        let outer2 = center + Vec2::new(cos2, sin2) * outer_radius;

        // Two triangles per segment
        vertices.push(Vertex::new(inner1.x, inner1.y, color));
        vertices.push(Vertex::new(outer1.x, outer1.y, color));
        vertices.push(Vertex::new(inner2.x, inner2.y, color));

        vertices.push(Vertex::new(inner2.x, inner2.y, color));
        vertices.push(Vertex::new(outer1.x, outer1.y, color));
        vertices.push(Vertex::new(outer2.x, outer2.y, color));
    }

    vertices
}

/// Soft halo around a circle: translucent bands fading outward
pub fn glow_halo(
    center: Vec2,
    radius: f32,
    glow: f32,
    color: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    if glow <= 0.0 {
        return Vec::new();
    }
    let band = glow / GLOW_BANDS as f32;
    let mut vertices = Vec::with_capacity((segments * 6 * GLOW_BANDS) as usize);
    for k in 0..GLOW_BANDS {
        let fade = 1.0 - k as f32 / GLOW_BANDS as f32;
        let tint = [color[0], color[1], color[2], color[3] * GLOW_ALPHA * fade];
        let inner = radius + band * k as f32;
        vertices.extend(ring(center, inner, inner + band, tint, segments));
    }
    vertices
}

/// Triangulate the world commands in order.
///
/// Text and strokes belong to the overlay and are skipped; the clear color
/// is applied by the render pass itself.
pub fn tessellate<'a>(commands: impl Iterator<Item = &'a Command>, segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::new();
    for command in commands {
        match &command.cmd {
            DrawCmd::Circle {
                center,
                radius,
                color,
                glow,
            } => {
                // Small circles don't need the full segment count
                let segs = if *radius < 4.0 { 8 } else { segments };
                vertices.extend(glow_halo(*center, *radius, *glow, *color, segs));
                vertices.extend(circle(*center, *radius, *color, segs));
            }
            DrawCmd::Clear { .. } | DrawCmd::Text { .. } | DrawCmd::StrokeRect { .. } => {}
        }
    }
    vertices
}
