//! 2D canvas overlay for text and the arena border
//!
//! Stacked above the GPU canvas, so everything painted here lands on top of
//! the world layers.

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::frame::{DrawCmd, Frame, TextAlign};
use super::vertex::css_rgba;

const FONT_FAMILY: &str = "'Courier New', monospace";

pub struct Overlay {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Overlay {
    pub fn new(canvas: HtmlCanvasElement) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { canvas, ctx })
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    /// Paint the HUD and border layers of `frame`
    pub fn paint(&self, frame: &Frame) {
        let ctx = &self.ctx;
        ctx.clear_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );

        for command in frame.overlay() {
            match &command.cmd {
                DrawCmd::Text {
                    pos,
                    text,
                    size,
                    color,
                    align,
                } => {
                    ctx.set_font(&format!("{}px {}", size, FONT_FAMILY));
                    ctx.set_fill_style_str(&css_rgba(*color));
                    ctx.set_text_align(match align {
                        TextAlign::Left => "left",
                        TextAlign::Center => "center",
                    });
                    ctx.set_shadow_blur(5.0);
                    ctx.set_shadow_color("#000");
                    let _ = ctx.fill_text(text, pos.x as f64, pos.y as f64);
                }
                DrawCmd::StrokeRect {
                    min,
                    max,
                    width,
                    color,
                    glow,
                } => {
                    let css = css_rgba(*color);
                    ctx.set_line_width(*width as f64);
                    ctx.set_stroke_style_str(&css);
                    ctx.set_shadow_color(&css);
                    ctx.set_shadow_blur(*glow as f64);
                    ctx.stroke_rect(
                        min.x as f64,
                        min.y as f64,
                        (max.x - min.x) as f64,
                        (max.y - min.y) as f64,
                    );
                }
                DrawCmd::Circle { .. } | DrawCmd::Clear { .. } => {}
            }
        }
        ctx.set_shadow_blur(0.0);
    }
}
