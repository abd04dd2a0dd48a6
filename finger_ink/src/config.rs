//! Configuration: the TOML file layered over [`AppConfig::default`], plus the
//! live [`SessionConfig`] the UI mutates.

use std::path::{Path, PathBuf};

use ink_geom::color;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

// ════════════════════════════════════════════════════════════════════════════
// HexColor
// ════════════════════════════════════════════════════════════════════════════

/// An opaque ARGB color that reads and writes as `"#rrggbb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(pub u32);

impl Serialize for HexColor {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&color::to_hex(self.0))
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let text = String::deserialize(d)?;
        color::parse_hex(&text)
            .map(HexColor)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color {text:?}, expected \"#RRGGBB\"")))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Thickness presets
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Thickness {
    Thin,
    #[default]
    Medium,
    Thick,
}

impl Thickness {
    pub const ALL: [Thickness; 3] = [Thickness::Thin, Thickness::Medium, Thickness::Thick];

    /// Stroke width in canvas pixels.
    pub fn px(self) -> f32 {
        match self {
            Thickness::Thin   =>  6.0,
            Thickness::Medium => 12.0,
            Thickness::Thick  => 20.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Thickness::Thin   => "thin",
            Thickness::Medium => "medium",
            Thickness::Thick  => "thick",
        }
    }

    /// One preset thinner; `Thin` stays `Thin`.
    pub fn thinner(self) -> Self {
        match self {
            Thickness::Thick => Thickness::Medium,
            _                => Thickness::Thin,
        }
    }

    /// One preset thicker; `Thick` stays `Thick`.
    pub fn thicker(self) -> Self {
        match self {
            Thickness::Thin => Thickness::Medium,
            _               => Thickness::Thick,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SessionConfig
// ════════════════════════════════════════════════════════════════════════════

/// Drawing settings read every frame and mutated by the UI handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub thickness: Thickness,
    pub color:     HexColor,
    pub gravity:   bool,
    pub wiggle:    bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            thickness: Thickness::Medium,
            color:     HexColor(0xFFFF3366),
            gravity:   false,
            wiggle:    false,
        }
    }
}

impl SessionConfig {
    pub fn thickness_px(&self) -> f32 { self.thickness.px() }
    pub fn color(&self) -> u32        { self.color.0 }
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig sections
// ════════════════════════════════════════════════════════════════════════════

/// Window and backdrop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width:      usize,
    pub height:     usize,
    /// Solid backdrop used when no video frame is available.
    pub background: HexColor,
    /// Draw the status line and key legend.
    pub hud:        bool,
    /// Still image shown mirrored behind the ink, like a camera frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop:   Option<PathBuf>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width:      1280,
            height:     720,
            background: HexColor(0xFF14141C),
            hud:        true,
            backdrop:   None,
        }
    }
}

/// Stroke material and the colors `Tab` cycles through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InkConfig {
    pub palette:     Vec<HexColor>,
    pub friction:    f32,
    /// Linear and angular damping of stroke bodies.
    pub air_damping: f32,
    pub density:     f32,
}

impl Default for InkConfig {
    fn default() -> Self {
        Self {
            palette: vec![
                HexColor(0xFFFF3366),
                HexColor(0xFF33CCFF),
                HexColor(0xFFFFD23F),
                HexColor(0xFF7CFF6B),
                HexColor(0xFFB388FF),
                HexColor(0xFFFFFFFF),
            ],
            friction:    0.6,
            air_damping: 0.5,
            density:     1.0,
        }
    }
}

/// Gesture tracking thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// A finger is extended when tip→wrist exceeds this multiple of mcp→wrist.
    pub extension_ratio: f32,
    /// Minimum fingertip travel (pixels) before a new path point is recorded.
    pub min_move_px:     f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { extension_ratio: 1.5, min_move_px: 2.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity magnitude in px/s² when gravity is on.
    pub gravity_px_s2: f32,
    /// Add a floor and side walls at the canvas edges.
    pub bounds:        bool,
    /// Largest simulation step; slower frames are clamped to this.
    pub max_step_s:    f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self { gravity_px_s2: 980.0, bounds: true, max_step_s: 0.05 }
    }
}

/// External landmark detector.  An empty command selects the mouse-driven
/// simulated hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub command: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory PNG snapshots are written to.
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from(".") }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub canvas:   CanvasConfig,
    pub session:  SessionConfig,
    pub ink:      InkConfig,
    pub tracker:  TrackerConfig,
    pub physics:  PhysicsConfig,
    pub detector: DetectorConfig,
    pub export:   ExportConfig,
}

impl AppConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        let c = &self.canvas;
        if !(1..=8192).contains(&c.width) || !(1..=8192).contains(&c.height) {
            return Err(Error::Config(format!(
                "canvas size must be within 1..=8192 on both axes, got {}x{}", c.width, c.height
            )));
        }
        if self.ink.palette.is_empty() {
            return Err(Error::Config("ink.palette must list at least one color".to_string()));
        }
        if !(self.ink.friction > 0.0) || !(self.ink.air_damping > 0.0) {
            return Err(Error::Config(format!(
                "ink.friction and ink.air_damping must be > 0 so strokes settle, got {} and {}",
                self.ink.friction, self.ink.air_damping
            )));
        }
        if !(self.ink.density > 0.0) {
            return Err(Error::Config(format!("ink.density must be > 0, got {}", self.ink.density)));
        }
        if !(1.0..=4.0).contains(&self.tracker.extension_ratio) {
            return Err(Error::Config(format!(
                "tracker.extension_ratio must be in [1, 4], got {}", self.tracker.extension_ratio
            )));
        }
        if !(self.tracker.min_move_px >= 0.0 && self.tracker.min_move_px.is_finite()) {
            return Err(Error::Config(format!(
                "tracker.min_move_px must be a finite value >= 0, got {}", self.tracker.min_move_px
            )));
        }
        if !(self.physics.gravity_px_s2 > 0.0 && self.physics.gravity_px_s2.is_finite()) {
            return Err(Error::Config(format!(
                "physics.gravity_px_s2 must be > 0, got {}", self.physics.gravity_px_s2
            )));
        }
        if !(self.physics.max_step_s > 0.0 && self.physics.max_step_s <= 0.25) {
            return Err(Error::Config(format!(
                "physics.max_step_s must be in (0, 0.25], got {}", self.physics.max_step_s
            )));
        }
        if let Some(program) = self.detector.command.first() {
            if program.trim().is_empty() {
                return Err(Error::Config("detector.command must start with a program name".to_string()));
            }
        }
        Ok(())
    }

    /// Load from a TOML file; missing keys fall back to their defaults.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
