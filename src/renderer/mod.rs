//! Rendering
//!
//! The world (background, projectiles, particles, players, bots) is drawn
//! with wgpu; HUD text and the border are painted on a 2D overlay canvas.

pub mod frame;
#[cfg(target_arch = "wasm32")]
pub mod overlay;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use frame::{BorderGlow, Command, DrawCmd, Frame, Layer, TextAlign, build_frame};
#[cfg(target_arch = "wasm32")]
pub use overlay::Overlay;
pub use pipeline::{RenderError, RenderState};
