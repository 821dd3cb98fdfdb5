//! Per-frame draw list
//!
//! `build_frame` walks the game state and emits draw commands in paint
//! order. The GPU back end consumes the world layers and the 2D overlay
//! paints the HUD and border on top, so layer order is the only contract
//! between them.

use glam::Vec2;

use super::vertex::colors;
use crate::consts::NOMINAL_FRAME_MS;
use crate::session::Hud;
use crate::settings::Settings;
use crate::sim::state::palette;
use crate::sim::{Arena, GameState};

/// Glow radii (pixels of soft halo)
const PROJECTILE_GLOW: f32 = 10.0;
const ENTITY_GLOW: f32 = 20.0;
const INVULNERABLE_GLOW: f32 = 30.0;
const BORDER_GLOW: f32 = 15.0;

const PARTICLE_RADIUS: f32 = 2.0;
const LABEL_OFFSET: f32 = 25.0;
const LABEL_SIZE: f32 = 18.0;
const SCORE_SIZE: f32 = 28.0;
const BORDER_WIDTH: f32 = 10.0;
/// Border alpha lost per nominal frame
const BORDER_FADE_STEP: f32 = 0.01;

/// Paint order; commands in a frame never go back to an earlier layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Background,
    Projectiles,
    Particles,
    LocalPlayer,
    RemotePlayers,
    Bots,
    Hud,
    Border,
}

impl Layer {
    /// Drawn by the GPU pass rather than the overlay
    pub fn is_world(self) -> bool {
        self < Layer::Hud
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear {
        color: [f32; 4],
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: [f32; 4],
        /// Halo size in pixels, 0 for none
        glow: f32,
    },
    Text {
        pos: Vec2,
        text: String,
        size: f32,
        color: [f32; 4],
        align: TextAlign,
    },
    StrokeRect {
        min: Vec2,
        max: Vec2,
        width: f32,
        color: [f32; 4],
        glow: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub layer: Layer,
    pub cmd: DrawCmd,
}

/// Ordered draw list for one refresh
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub arena: Arena,
    pub commands: Vec<Command>,
}

impl Frame {
    fn push(&mut self, layer: Layer, cmd: DrawCmd) {
        self.commands.push(Command { layer, cmd });
    }

    pub fn world(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|c| c.layer.is_world())
    }

    pub fn overlay(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|c| !c.layer.is_world())
    }

    pub fn count(&self, layer: Layer) -> usize {
        self.commands.iter().filter(|c| c.layer == layer).count()
    }

    /// True when layers never decrease through the list
    pub fn is_ordered(&self) -> bool {
        self.commands.windows(2).all(|w| w[0].layer <= w[1].layer)
    }
}

/// Cycling alpha for the decorative arena border
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderGlow {
    alpha: f32,
}

impl Default for BorderGlow {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

impl BorderGlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fade by one step per nominal frame; wraps back to full once below zero
    pub fn advance(&mut self, elapsed_ms: f32) {
        self.alpha -= BORDER_FADE_STEP * elapsed_ms / NOMINAL_FRAME_MS;
        if self.alpha < 0.0 {
            self.alpha = 1.0;
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

/// Convert an HSL hue (degrees) at full saturation and half lightness to RGBA
pub fn hue_to_rgba(hue: f32) -> [f32; 4] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let (r, g, b) = match h as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    [r, g, b, 1.0]
}

fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
    [color[0], color[1], color[2], alpha]
}

/// Build the draw list for the current state
pub fn build_frame(state: &GameState, hud: &Hud, border: &BorderGlow, settings: &Settings) -> Frame {
    let mut frame = Frame {
        arena: state.arena,
        commands: Vec::new(),
    };
    let glow = |amount: f32| {
        if settings.quality.glow_enabled() {
            amount
        } else {
            0.0
        }
    };

    frame.push(
        Layer::Background,
        DrawCmd::Clear {
            color: colors::BACKGROUND,
        },
    );

    for projectile in &state.projectiles {
        frame.push(
            Layer::Projectiles,
            DrawCmd::Circle {
                center: projectile.pos,
                radius: projectile.radius,
                color: palette::PROJECTILE,
                glow: glow(PROJECTILE_GLOW),
            },
        );
    }

    for particle in &state.particles {
        frame.push(
            Layer::Particles,
            DrawCmd::Circle {
                center: particle.pos,
                radius: PARTICLE_RADIUS,
                color: hue_to_rgba(particle.hue),
                glow: 0.0,
            },
        );
    }

    let mut labels = Vec::new();

    if let Some(local) = state.local.as_ref().filter(|l| !l.dead) {
        let amount = if hud.invulnerable {
            INVULNERABLE_GLOW
        } else {
            ENTITY_GLOW
        };
        frame.push(
            Layer::LocalPlayer,
            DrawCmd::Circle {
                center: local.body.pos,
                radius: local.body.radius,
                color: local.body.color,
                glow: glow(amount),
            },
        );
        labels.push((local.body.pos, local.body.name.clone()));
    }

    for player in state.remote_players.values() {
        frame.push(
            Layer::RemotePlayers,
            DrawCmd::Circle {
                center: player.pos,
                radius: player.radius,
                color: player.color,
                glow: glow(ENTITY_GLOW),
            },
        );
        labels.push((player.pos, player.name.clone()));
    }

    for bot in state.bots.values() {
        frame.push(
            Layer::Bots,
            DrawCmd::Circle {
                center: bot.body.pos,
                radius: bot.body.radius,
                color: bot.body.color,
                glow: glow(ENTITY_GLOW),
            },
        );
        labels.push((bot.body.pos, bot.body.name.clone()));
    }

    if settings.name_labels {
        for (pos, text) in labels {
            frame.push(
                Layer::Hud,
                DrawCmd::Text {
                    pos: pos - Vec2::new(0.0, LABEL_OFFSET),
                    text,
                    size: LABEL_SIZE,
                    color: colors::TEXT,
                    align: TextAlign::Center,
                },
            );
        }
    }

    frame.push(
        Layer::Hud,
        DrawCmd::Text {
            pos: Vec2::new(20.0, 40.0),
            text: format!("Score: {}", hud.score),
            size: SCORE_SIZE,
            color: colors::TEXT,
            align: TextAlign::Left,
        },
    );
    frame.push(
        Layer::Hud,
        DrawCmd::Text {
            pos: Vec2::new(20.0, 76.0),
            text: format!("Best: {}", hud.best_score),
            size: LABEL_SIZE,
            color: colors::TEXT_DIM,
            align: TextAlign::Left,
        },
    );
    if hud.is_dead {
        let center = state.arena.center();
        frame.push(
            Layer::Hud,
            DrawCmd::Text {
                pos: center,
                text: "YOU DIED".to_string(),
                size: 48.0,
                color: palette::LOCAL_PLAYER,
                align: TextAlign::Center,
            },
        );
        frame.push(
            Layer::Hud,
            DrawCmd::Text {
                pos: center + Vec2::new(0.0, 40.0),
                text: "Press Enter to respawn".to_string(),
                size: LABEL_SIZE,
                color: colors::TEXT,
                align: TextAlign::Center,
            },
        );
    }

    let alpha = if settings.effective_border_glow() {
        border.alpha()
    } else {
        1.0
    };
    let inset = BORDER_WIDTH / 2.0;
    frame.push(
        Layer::Border,
        DrawCmd::StrokeRect {
            min: Vec2::splat(inset),
            max: Vec2::new(state.arena.width - inset, state.arena.height - inset),
            width: BORDER_WIDTH,
            color: with_alpha(colors::BORDER, alpha),
            glow: if settings.border_glow {
                glow(BORDER_GLOW)
            } else {
                0.0
            },
        },
    );

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::QualityPreset;
    use crate::sim::{Projectile, SessionId};
    use crate::sim::state::Owner;

    fn ready_state() -> GameState {
        let mut state = GameState::new(SessionId::new("me"), 3);
        state.arena = Arena::new(800.0, 600.0);
        state.spawn_local("Neo", 0.0);
        state
    }

    fn hud_for(state: &GameState) -> Hud {
        Hud {
            is_dead: state.is_dead(),
            score: state.score(),
            best_score: 0,
            invulnerable: false,
        }
    }

    #[test]
    fn test_layers_non_decreasing() {
        let mut state = ready_state();
        state.projectiles.push(Projectile::new(
            Vec2::new(100.0, 100.0),
            0.0,
            Owner::Session(SessionId::new("me")),
        ));
        state.upsert_remote(
            SessionId::new("bob"),
            Vec2::new(300.0, 300.0),
            "Bob",
        );
        let frame = build_frame(&state, &hud_for(&state), &BorderGlow::new(), &Settings::default());

        assert!(frame.is_ordered());
        assert_eq!(frame.commands[0].layer, Layer::Background);
        assert_eq!(frame.commands.last().map(|c| c.layer), Some(Layer::Border));
        assert_eq!(frame.count(Layer::Projectiles), 1);
        assert_eq!(frame.count(Layer::LocalPlayer), 1);
        assert_eq!(frame.count(Layer::RemotePlayers), 1);
    }

    #[test]
    fn test_dead_player_not_drawn() {
        let mut state = ready_state();
        if let Some(local) = state.local.as_mut() {
            local.dead = true;
        }
        let hud = hud_for(&state);
        let frame = build_frame(&state, &hud, &BorderGlow::new(), &Settings::default());

        assert_eq!(frame.count(Layer::LocalPlayer), 0);
        assert!(frame.commands.iter().any(|c| matches!(
            &c.cmd,
            DrawCmd::Text { text, .. } if text == "YOU DIED"
        )));
    }

    #[test]
    fn test_hud_shows_score_and_best() {
        let state = ready_state();
        let hud = Hud {
            is_dead: false,
            score: 150,
            best_score: 400,
            invulnerable: false,
        };
        let frame = build_frame(&state, &hud, &BorderGlow::new(), &Settings::default());
        let texts: Vec<&str> = frame
            .overlay()
            .filter_map(|c| match &c.cmd {
                DrawCmd::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(texts.contains(&"Score: 150"));
        assert!(texts.contains(&"Best: 400"));
    }

    #[test]
    fn test_invulnerable_glows_brighter() {
        let state = ready_state();
        let mut hud = hud_for(&state);
        hud.invulnerable = true;
        let frame = build_frame(&state, &hud, &BorderGlow::new(), &Settings::default());
        let glow = frame.commands.iter().find_map(|c| match (&c.layer, &c.cmd) {
            (Layer::LocalPlayer, DrawCmd::Circle { glow, color, .. }) => {
                assert_eq!(*color, palette::LOCAL_PLAYER);
                Some(*glow)
            }
            _ => None,
        });
        assert_eq!(glow, Some(INVULNERABLE_GLOW));
    }

    #[test]
    fn test_low_quality_disables_glow() {
        let mut state = ready_state();
        state.upsert_remote(SessionId::new("bob"), Vec2::new(10.0, 10.0), "Bob");
        let settings = Settings::from_preset(QualityPreset::Low);
        let frame = build_frame(&state, &hud_for(&state), &BorderGlow::new(), &settings);
        assert!(frame.commands.iter().all(|c| match &c.cmd {
            DrawCmd::Circle { glow, .. } | DrawCmd::StrokeRect { glow, .. } => *glow == 0.0,
            _ => true,
        }));
    }

    #[test]
    fn test_labels_toggle() {
        let state = ready_state();
        let settings = Settings {
            name_labels: false,
            ..Settings::default()
        };
        let frame = build_frame(&state, &hud_for(&state), &BorderGlow::new(), &settings);
        // Only score and best remain
        assert_eq!(frame.count(Layer::Hud), 2);
    }

    #[test]
    fn test_border_glow_wraps() {
        let mut border = BorderGlow::new();
        for _ in 0..90 {
            border.advance(NOMINAL_FRAME_MS);
        }
        assert!((border.alpha() - 0.1).abs() < 0.01);
        for _ in 0..11 {
            border.advance(NOMINAL_FRAME_MS);
        }
        assert!(border.alpha() > 0.9);
    }

    #[test]
    fn test_reduced_motion_holds_border() {
        let state = ready_state();
        let mut border = BorderGlow::new();
        border.advance(NOMINAL_FRAME_MS * 50.0);
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        let frame = build_frame(&state, &hud_for(&state), &border, &settings);
        let alpha = frame.overlay().find_map(|c| match &c.cmd {
            DrawCmd::StrokeRect { color, .. } => Some(color[3]),
            _ => None,
        });
        assert_eq!(alpha, Some(1.0));
    }

    #[test]
    fn test_hue_to_rgba() {
        assert_eq!(hue_to_rgba(0.0), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(hue_to_rgba(120.0), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(hue_to_rgba(240.0), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(hue_to_rgba(360.0), [1.0, 0.0, 0.0, 1.0]);
    }
}
