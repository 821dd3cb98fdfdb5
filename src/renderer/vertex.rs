//! Vertex types for the world pass

use bytemuck::{Pod, Zeroable};

/// 2D vertex in arena pixels (top-left origin) with RGBA color
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for everything that is not an entity
pub mod colors {
    pub const BACKGROUND: [f32; 4] = [30.0 / 255.0, 30.0 / 255.0, 47.0 / 255.0, 1.0]; // #1e1e2f
    pub const TEXT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const TEXT_DIM: [f32; 4] = [0.7, 0.7, 0.8, 1.0];
    pub const BORDER: [f32; 4] = [0.0, 1.0, 1.0, 1.0]; // #00ffff
}

/// CSS `rgba()` string for the 2D canvas
pub fn css_rgba(color: [f32; 4]) -> String {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "rgba({}, {}, {}, {:.3})",
        channel(color[0]),
        channel(color[1]),
        channel(color[2]),
        color[3].clamp(0.0, 1.0)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(Vertex::desc().attributes[1].offset, 8);
    }

    #[test]
    fn test_css_rgba() {
        assert_eq!(css_rgba(colors::BORDER), "rgba(0, 255, 255, 1.000)");
        assert_eq!(css_rgba(colors::BACKGROUND), "rgba(30, 30, 47, 1.000)");
        assert_eq!(css_rgba([1.0, 0.5, 0.0, 0.25]), "rgba(255, 128, 0, 0.250)");
    }
}
