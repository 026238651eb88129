//! Scene configuration.
//!
//! Every field has a default, so a TOML file only needs to name what it
//! changes:
//!
//! ```toml
//! frame_rate = 60
//!
//! [drag]
//! throw_limit = 8.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::animation::{FadeSpeeds, MOVE_SPEED, RESIZE_SPEED};
use crate::error::{Error, Result};
use crate::scrollbar::ScrollbarConfig;

/// Geometry of bars and panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub document_max_width: f32,
    pub templates_max_width: f32,
    /// Space reserved right of the document bars for buttons.
    pub document_margin: f32,
    pub min_bar_height: f32,
    pub text_padding_horizontal: f32,
    pub text_padding_vertical: f32,
    pub tags_padding_vertical: f32,
    pub font_size: f32,
    pub bar_rounding: f32,
    /// Distance between the top of the window and both panels.
    pub panel_top: f32,
    /// Height the panels slide in from.
    pub panel_entrance_offset: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            document_max_width: 600.0,
            templates_max_width: 400.0,
            document_margin: 150.0,
            min_bar_height: 20.0,
            text_padding_horizontal: 15.0,
            text_padding_vertical: 5.0,
            tags_padding_vertical: 2.0,
            font_size: 13.0,
            bar_rounding: 20.0,
            panel_top: 10.0,
            panel_entrance_offset: 100.0,
        }
    }
}

/// Pointer gesture tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Number of pointer samples kept for throw detection.
    pub history_length: usize,
    /// Minimum time between two recorded samples.
    pub history_interval_ms: u64,
    /// Squared pixels per millisecond above which a release is a throw.
    pub throw_limit: f32,
    pub unfold_delay_ms: u64,
    pub edge_scroll_area: f32,
    pub edge_scroll_amount: f32,
    pub wheel_step: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            history_length: 5,
            history_interval_ms: 5,
            throw_limit: 10.0,
            unfold_delay_ms: 500,
            edge_scroll_area: 100.0,
            edge_scroll_amount: 10.0,
            wheel_step: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub frame_rate: u32,
    pub move_speed: f32,
    pub resize_speed: f32,
    pub fades: FadeSpeeds,
    pub layout: LayoutConfig,
    pub drag: DragConfig,
    pub scrollbar: ScrollbarConfig,
    pub undo_depth: usize,
    pub status_timeout_ms: u64,
    /// Write `# foldstate:` comments when saving so folds survive a reload.
    pub save_view_state: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            frame_rate: 50,
            move_speed: MOVE_SPEED,
            resize_speed: RESIZE_SPEED,
            fades: FadeSpeeds::default(),
            layout: LayoutConfig::default(),
            drag: DragConfig::default(),
            scrollbar: ScrollbarConfig::default(),
            undo_depth: 64,
            status_timeout_ms: 2000,
            save_view_state: true,
        }
    }
}

impl SceneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded scene config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Time between two ticks.
    pub fn frame_interval_ms(&self) -> u64 {
        1000 / u64::from(self.frame_rate.max(1))
    }

    pub fn frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    pub fn resize_speed(mut self, speed: f32) -> Self {
        self.resize_speed = speed;
        self
    }

    pub fn fades(mut self, fades: FadeSpeeds) -> Self {
        self.fades = fades;
        self
    }

    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn drag(mut self, drag: DragConfig) -> Self {
        self.drag = drag;
        self
    }

    pub fn scrollbar(mut self, scrollbar: ScrollbarConfig) -> Self {
        self.scrollbar = scrollbar;
        self
    }

    pub fn undo_depth(mut self, depth: usize) -> Self {
        self.undo_depth = depth;
        self
    }

    pub fn status_timeout_ms(mut self, timeout: u64) -> Self {
        self.status_timeout_ms = timeout;
        self
    }

    pub fn save_view_state(mut self, save: bool) -> Self {
        self.save_view_state = save;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.frame_rate, 50);
        assert_eq!(config.frame_interval_ms(), 20);
        assert_eq!(config.drag.history_length, 5);
        assert_eq!(config.undo_depth, 64);
    }

    #[test]
    fn test_partial_toml() {
        let config = SceneConfig::from_toml_str(
            r#"
            frame_rate = 25

            [drag]
            throw_limit = 4.5
            "#,
        )
        .unwrap();
        assert_eq!(config.frame_rate, 25);
        assert_eq!(config.drag.throw_limit, 4.5);
        assert_eq!(config.drag.history_length, 5);
        assert_eq!(config.layout, LayoutConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = SceneConfig::from_toml_str("frame_rate = \"fast\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builder_and_toml_round_trip() {
        let config = SceneConfig::new().frame_rate(30).undo_depth(8);
        let text = config.to_toml_string().unwrap();
        let back = SceneConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_zero_frame_rate_does_not_divide_by_zero() {
        assert_eq!(SceneConfig::new().frame_rate(0).frame_interval_ms(), 1000);
    }
}
