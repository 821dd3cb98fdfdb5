//! Game settings and preferences
//!
//! Persisted separately from the best score in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_PARTICLES;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    Medium,
    #[default]
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 150,
            QualityPreset::Medium => 500,
            QualityPreset::High => MAX_PARTICLES,
        }
    }

    /// Circle tessellation segments for players and bots
    pub fn circle_segments(&self) -> u32 {
        match self {
            QualityPreset::Low => 16,
            QualityPreset::Medium => 24,
            QualityPreset::High => 40,
        }
    }

    /// Whether entities get a soft glow halo
    pub fn glow_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Which letter keys move the player (arrow keys always work)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum KeyboardLayout {
    /// z / q / s / d
    #[default]
    Azerty,
    /// w / a / s / d
    Qwerty,
}

impl KeyboardLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyboardLayout::Azerty => "Azerty",
            KeyboardLayout::Qwerty => "Qwerty",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "azerty" => Some(KeyboardLayout::Azerty),
            "qwerty" => Some(KeyboardLayout::Qwerty),
            _ => None,
        }
    }

    /// Up, left, down, right
    pub fn movement_keys(&self) -> [&'static str; 4] {
        match self {
            KeyboardLayout::Azerty => ["z", "q", "s", "d"],
            KeyboardLayout::Qwerty => ["w", "a", "s", "d"],
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Movement key layout
    pub layout: KeyboardLayout,

    // === Visual Effects ===
    /// Projectile trail particles
    pub particles: bool,
    /// Animated neon border
    pub border_glow: bool,
    /// Name labels above players and bots
    pub name_labels: bool,

    // === Accessibility ===
    /// Reduced motion (freezes the border animation)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::High,
            layout: KeyboardLayout::Azerty,

            particles: true,
            border_glow: true,
            name_labels: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Effective border animation (respects reduced_motion)
    pub fn effective_border_glow(&self) -> bool {
        self.border_glow && !self.reduced_motion
    }

    /// Apply preferences from a URL query such as `?quality=low&layout=qwerty`.
    ///
    /// Recognized keys are `quality`, `layout`, `particles`, `border`, `labels`
    /// and `reduced_motion`; toggles take `on`/`off`, `true`/`false` or `1`/`0`.
    /// Unknown keys and unreadable values are ignored. Returns true if
    /// anything changed.
    pub fn apply_query(&mut self, query: &str) -> bool {
        let mut changed = false;
        for pair in query.trim_start_matches('?').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let applied = match key {
                "quality" => QualityPreset::parse(value).map(|q| {
                    log::info!("Quality preset: {}", q.as_str());
                    changed |= self.quality != q;
                    self.quality = q;
                }),
                "layout" => KeyboardLayout::parse(value).map(|l| {
                    log::info!("Keyboard layout: {}", l.as_str());
                    changed |= self.layout != l;
                    self.layout = l;
                }),
                "particles" => {
                    parse_toggle(value).map(|v| set_flag(&mut self.particles, v, &mut changed))
                }
                "border" => {
                    parse_toggle(value).map(|v| set_flag(&mut self.border_glow, v, &mut changed))
                }
                "labels" => {
                    parse_toggle(value).map(|v| set_flag(&mut self.name_labels, v, &mut changed))
                }
                "reduced_motion" => {
                    parse_toggle(value).map(|v| set_flag(&mut self.reduced_motion, v, &mut changed))
                }
                _ => Some(()),
            };
            if applied.is_none() {
                log::warn!("Ignoring setting {}={}", key, value);
            }
        }
        changed
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "neon_arena_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

fn parse_toggle(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn set_flag(flag: &mut bool, value: bool, changed: &mut bool) {
    *changed |= *flag != value;
    *flag = value;
}
