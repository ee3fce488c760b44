use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::components::colors::{ColorPalette, DEFAULT_PALETTE};
use crate::error::Result;
use crate::logger::{APP_DIR, data_dir};

/// Persistent editor preferences. Missing keys take their default, so older
/// settings files keep loading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Snapshots kept by the undo history.
    pub max_history: usize,
    pub default_width: u32,
    pub default_height: u32,
    /// Upper bounds accepted by canvas resize.
    pub max_canvas_width: u32,
    pub max_canvas_height: u32,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub brush_size: u32,
    pub opacity: f32,
    /// Swatches as `#rrggbb` or `rgb(r, g, b)` strings.
    pub palette: Vec<String>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            max_history: 50,
            default_width: 300,
            default_height: 150,
            max_canvas_width: 1500,
            max_canvas_height: 1500,
            min_zoom: 0.125,
            max_zoom: 32.0,
            brush_size: 1,
            opacity: 1.0,
            palette: DEFAULT_PALETTE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EditorSettings {
    /// `<data>/PixelFE/settings.json`
    pub fn settings_path() -> PathBuf {
        data_dir().join(APP_DIR).join("settings.json")
    }

    /// Load from the default location, falling back to defaults on any failure.
    pub fn load() -> Self {
        let path = Self::settings_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("settings: could not load {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("settings: saved to {}", path.display());
        Ok(())
    }

    /// Palette built from the configured swatches and opacity.
    pub fn palette(&self) -> ColorPalette {
        let mut palette = ColorPalette::from_strings(&self.palette);
        palette.set_opacity(self.opacity);
        palette
    }

    /// Store the palette's swatches and opacity so the next session starts with them.
    pub fn remember_palette(&mut self, palette: &ColorPalette) {
        self.palette = palette.to_hex_strings();
        self.opacity = palette.opacity();
    }

    /// Zoom limits with `min <= max` restored if a hand-edited file swapped them.
    pub fn zoom_limits(&self) -> (f64, f64) {
        let min = if self.min_zoom > 0.0 { self.min_zoom } else { 0.125 };
        (min.min(self.max_zoom), min.max(self.max_zoom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::colors::Color;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let s = EditorSettings::default();
        assert_eq!(s.max_history, 50);
        assert_eq!((s.default_width, s.default_height), (300, 150));
        assert_eq!(s.zoom_limits(), (0.125, 32.0));
        assert_eq!(s.palette().len(), 8);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let s: EditorSettings = serde_json::from_str(r#"{ "brush_size": 4 }"#).unwrap();
        assert_eq!(s.brush_size, 4);
        assert_eq!(s.max_history, 50);
        assert_eq!(s.palette, EditorSettings::default().palette);
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut s = EditorSettings::default();
        s.opacity = 0.5;
        s.palette = vec!["#112233".into(), "rgb(1, 2, 3)".into()];
        s.save_to(&path).unwrap();

        let loaded = EditorSettings::load_from(&path).unwrap();
        assert_eq!(loaded, s);
        let palette = loaded.palette();
        assert_eq!(palette.colors(), &[Color::rgb(0x11, 0x22, 0x33), Color::rgb(1, 2, 3)]);
        assert_eq!(palette.opacity(), 0.5);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            EditorSettings::load_from(&path),
            Err(crate::EngineError::Settings(_))
        ));
    }

    #[test]
    fn remembered_palette_is_written_as_hex() {
        let mut palette = ColorPalette::from_strings(&["#FF6600", "rgb(0, 153, 255)"]);
        palette.set_opacity(0.25);
        let mut s = EditorSettings::default();
        s.remember_palette(&palette);
        assert_eq!(s.palette, vec!["#ff6600".to_string(), "#0099ff".to_string()]);
        assert_eq!(s.opacity, 0.25);
        assert_eq!(s.palette(), palette);
    }

    #[test]
    fn swapped_zoom_limits_are_reordered() {
        let s = EditorSettings { min_zoom: 8.0, max_zoom: 2.0, ..Default::default() };
        assert_eq!(s.zoom_limits(), (2.0, 8.0));
    }
}
