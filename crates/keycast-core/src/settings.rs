use crate::error::SettingsError;
use crate::stroke_renderer::StrokeRenderer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Startup-time configuration. Every field has a default, so a settings file
/// only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window_width: u32,
    pub window_height: u32,
    pub window_title: String,
    pub always_on_top: bool,
    /// RGB
    pub background_color: [u8; 3],

    #[serde(default = "default_visible_time_ms")]
    pub visible_time_ms: u64,
    #[serde(default = "default_fade_time_ms")]
    pub fade_time_ms: u64,
    #[serde(default = "default_max_strokes")]
    pub max_strokes: usize,
    #[serde(default = "default_fps")]
    pub fps: u32,

    pub font_path: Option<PathBuf>,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    pub text_color: [u8; 3],
    /// Keycap image; a plain drawn cap is used when unset.
    pub keycap_image: Option<PathBuf>,
    /// Tiles fit a box of a third of the window, times this factor.
    #[serde(default = "default_keycap_scale")]
    pub keycap_scale: f32,
    /// Counter-clockwise label rotation in degrees.
    pub label_angle_deg: f32,
    pub label_offset_y: i32,

    pub margin: i32,
    #[serde(default = "default_vertical_spacing")]
    pub vertical_spacing: i32,
    pub horizontal_spacing: i32,

    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,
}

fn default_visible_time_ms() -> u64 {
    1500
}

fn default_fade_time_ms() -> u64 {
    500
}

fn default_max_strokes() -> usize {
    3
}

fn default_fps() -> u32 {
    60
}

fn default_font_size() -> f32 {
    48.0
}

fn default_keycap_scale() -> f32 {
    1.0
}

fn default_vertical_spacing() -> i32 {
    10
}

fn default_event_queue_capacity() -> usize {
    256
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_width: 600,
            window_height: 600,
            window_title: "Key Monitor Window".to_string(),
            always_on_top: false,
            background_color: [0, 255, 0],
            visible_time_ms: default_visible_time_ms(),
            fade_time_ms: default_fade_time_ms(),
            max_strokes: default_max_strokes(),
            fps: default_fps(),
            font_path: None,
            font_size: default_font_size(),
            text_color: [0, 0, 0],
            keycap_image: None,
            keycap_scale: default_keycap_scale(),
            label_angle_deg: 0.0,
            label_offset_y: 0,
            margin: 0,
            vertical_spacing: default_vertical_spacing(),
            horizontal_spacing: 0,
            event_queue_capacity: default_event_queue_capacity(),
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&content)?;
        info!("Settings loaded from {}", path.display());
        Ok(settings)
    }

    pub fn from_json_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json_pretty(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> SettingsError {
            SettingsError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if self.window_width == 0 || self.window_height == 0 {
            return Err(invalid("window_width/window_height", "must be non-zero"));
        }
        if self.visible_time_ms == 0 {
            return Err(invalid("visible_time_ms", "must be non-zero"));
        }
        if self.fade_time_ms > self.visible_time_ms {
            return Err(invalid(
                "fade_time_ms",
                format!(
                    "{} exceeds visible_time_ms ({})",
                    self.fade_time_ms, self.visible_time_ms
                ),
            ));
        }
        if self.max_strokes == 0 {
            return Err(invalid("max_strokes", "must be at least 1"));
        }
        if self.fps == 0 {
            return Err(invalid("fps", "must be at least 1"));
        }
        if !(self.font_size > 0.0) {
            return Err(invalid("font_size", "must be positive"));
        }
        if !(self.keycap_scale > 0.0) {
            return Err(invalid("keycap_scale", "must be positive"));
        }
        if self.event_queue_capacity == 0 {
            return Err(invalid("event_queue_capacity", "must be at least 1"));
        }
        Ok(())
    }

    pub fn visible_time(&self) -> Duration {
        Duration::from_millis(self.visible_time_ms)
    }

    pub fn fade_time(&self) -> Duration {
        Duration::from_millis(self.fade_time_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }

    /// Bounding box every keycap tile is scaled into.
    pub fn tile_box(&self) -> (u32, u32) {
        let w = (self.window_width as f32 / 3.0 * self.keycap_scale).round() as u32;
        let h = (self.window_height as f32 / 3.0 * self.keycap_scale).round() as u32;
        (w.max(1), h.max(1))
    }

    pub fn renderer(&self) -> StrokeRenderer {
        StrokeRenderer {
            surface_height: self.window_height as i32,
            margin: self.margin,
            horizontal_spacing: self.horizontal_spacing,
            vertical_spacing: self.vertical_spacing,
            fade_time: self.fade_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.visible_time(), Duration::from_millis(1500));
        assert_eq!(settings.fade_time(), Duration::from_millis(500));
        assert_eq!(settings.tile_box(), (200, 200));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = Settings::from_json_str(r#"{ "max_strokes": 5, "fps": 30 }"#).unwrap();
        assert_eq!(settings.max_strokes, 5);
        assert_eq!(settings.fps, 30);
        assert_eq!(settings.visible_time_ms, 1500);
        assert_eq!(settings.background_color, [0, 255, 0]);
    }

    #[test]
    fn fade_longer_than_lifetime_is_rejected() {
        let err = Settings::from_json_str(r#"{ "visible_time_ms": 400, "fade_time_ms": 500 }"#)
            .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "fade_time_ms", .. }));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = Settings::from_json_str(r#"{ "max_strokes": 0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "max_strokes", .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Settings::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn json_round_trip_preserves_fields() {
        let mut settings = Settings::default();
        settings.label_angle_deg = 40.0;
        settings.label_offset_y = -30;
        let json = settings.to_json_pretty().unwrap();
        assert_eq!(Settings::from_json_str(&json).unwrap(), settings);
    }

    #[test]
    fn renderer_follows_layout_settings() {
        let mut settings = Settings::default();
        settings.margin = 12;
        let r = settings.renderer();
        assert_eq!(r.surface_height, 600);
        assert_eq!(r.margin, 12);
        assert_eq!(r.vertical_spacing, 10);
        assert_eq!(r.fade_time, Duration::from_millis(500));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Settings::load("/nonexistent/keycast/settings.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/keycast/settings.json"));
    }
}
