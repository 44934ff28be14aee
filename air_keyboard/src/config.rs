//! Application configuration, loaded from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file) gives the stock
//! 640×480 QWERTY keyboard.
//!
//! ```toml
//! tolerance      = 12
//! press_delay_ms = 150
//!
//! [layout.keys]
//! origin = { x = 40, y = 220 }
//! width  = 56
//! height = 56
//! gap    = 8
//!
//! [[suggestions.rules]]
//! trigger     = "Thanks"
//! suggestions = ["Thanks a lot!", "Thanks, see you soon"]
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use keyboard_core::hand::DEFAULT_OPEN_THRESHOLD;
use keyboard_core::target::DEFAULT_TOLERANCE;
use keyboard_core::{KeyboardLayout, KeyboardSettings, SuggestionTable};
use serde::{Deserialize, Serialize};

/// Configuration for the full application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub frame_width:    u32,
    pub frame_height:   u32,
    /// Hit-test margin around every target, in pixels.
    pub tolerance:      i32,
    /// Minimum fingertip spread (normalized) for an open hand.
    pub open_threshold: f32,
    /// Blocking pause after each typed character.
    pub press_delay_ms: u64,
    /// Hands beyond this count are ignored.
    pub max_hands:      usize,
    /// Opacity of the key overlay, 0.0–1.0.
    pub transparency:   f32,
    pub layout:         KeyboardLayout,
    pub suggestions:    SuggestionTable,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            frame_width:    640,
            frame_height:   480,
            tolerance:      DEFAULT_TOLERANCE,
            open_threshold: DEFAULT_OPEN_THRESHOLD,
            press_delay_ms: 200,
            max_hands:      1,
            transparency:   0.5,
            layout:         KeyboardLayout::default(),
            suggestions:    SuggestionTable::default(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.frame_width == 0 || self.frame_height == 0 {
            bail!("frame size must be non-zero (got {}x{})", self.frame_width, self.frame_height);
        }
        if self.tolerance < 0 {
            bail!("tolerance must not be negative (got {})", self.tolerance);
        }
        if !(self.open_threshold > 0.0) {
            bail!("open_threshold must be positive (got {})", self.open_threshold);
        }
        if !(0.0..=1.0).contains(&self.transparency) {
            bail!("transparency must be within 0.0–1.0 (got {})", self.transparency);
        }
        if self.max_hands == 0 {
            bail!("max_hands must be at least 1");
        }
        self.layout.validate().context("invalid [layout]")?;
        self.suggestions.validate().context("invalid [suggestions]")?;
        Ok(())
    }

    pub fn press_delay(&self) -> Duration {
        Duration::from_millis(self.press_delay_ms)
    }

    pub fn keyboard_settings(&self) -> KeyboardSettings {
        KeyboardSettings {
            tolerance:      self.tolerance,
            open_threshold: self.open_threshold,
            press_delay:    self.press_delay(),
            frame_width:    self.frame_width,
            frame_height:   self.frame_height,
        }
    }
}
