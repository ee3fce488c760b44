use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::util::constrain_lenient;

/// The eight swatches a fresh palette starts with.
pub const DEFAULT_PALETTE: [&str; 8] = [
    "#000000", "#ffff00", "#0000ff", "#ff00ff", "#cc00ff", "#9900ff", "#ff6600", "#0099ff",
];

// ============================================================================
// Color - opaque sRGB triple
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`, `#rgb` or `rgb(r, g, b)`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        let inner = s.strip_prefix("rgb(")?.strip_suffix(')')?;
        let mut parts = inner.split(',').map(|p| p.trim().parse::<u8>());
        let r = parts.next()?.ok()?;
        let g = parts.next()?.ok()?;
        let b = parts.next()?.ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::rgb(r, g, b))
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            6 => {
                let val = u32::from_str_radix(hex, 16).ok()?;
                Some(Self::rgb((val >> 16) as u8, (val >> 8) as u8, val as u8))
            }
            3 => {
                let val = u16::from_str_radix(hex, 16).ok()?;
                let expand = |n: u16| ((n & 0xF) * 17) as u8;
                Some(Self::rgb(expand(val >> 8), expand(val >> 4), expand(val)))
            }
            _ => None,
        }
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// The color as a pixel with the given opacity. Alpha truncates.
    pub fn to_rgba(&self, opacity: f32) -> Rgba<u8> {
        let a = (constrain_lenient(opacity as f64, 0.0, 1.0) * 255.0) as u8;
        Rgba([self.r, self.g, self.b, a])
    }

    pub fn opaque(&self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }
}

impl From<Rgba<u8>> for Color {
    fn from(p: Rgba<u8>) -> Self {
        Self::rgb(p[0], p[1], p[2])
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

// ============================================================================
// ColorPalette - ordered swatches, one selected, shared opacity
// ============================================================================

/// Fixed-size ordered set of swatches with a selected index and one opacity
/// value applied to whatever is selected.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorPalette {
    cells: Vec<Color>,
    selected: usize,
    opacity: f32,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::from_strings(&DEFAULT_PALETTE)
    }
}

impl ColorPalette {
    /// Build from swatches. An empty list yields a single black swatch.
    pub fn new(cells: Vec<Color>) -> Self {
        let cells = if cells.is_empty() { vec![Color::BLACK] } else { cells };
        Self {
            cells,
            selected: 0,
            opacity: 1.0,
        }
    }

    /// Build from color strings, skipping (and logging) any that fail to parse.
    pub fn from_strings<S: AsRef<str>>(specs: &[S]) -> Self {
        let cells = specs
            .iter()
            .filter_map(|s| {
                let parsed = Color::parse(s.as_ref());
                if parsed.is_none() {
                    log::warn!("palette: ignoring unparseable color {:?}", s.as_ref());
                }
                parsed
            })
            .collect();
        Self::new(cells)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.cells
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Out-of-range indices are ignored.
    pub fn set_selected_index(&mut self, index: usize) {
        if index < self.cells.len() {
            self.selected = index;
        } else {
            log::warn!("palette: index {} out of range ({} cells)", index, self.cells.len());
        }
    }

    pub fn selected_color(&self) -> Color {
        self.cells[self.selected]
    }

    pub fn selected_color_with_opacity(&self) -> (Color, f32) {
        (self.selected_color(), self.opacity)
    }

    /// Overwrite the selected swatch and the opacity in one step.
    pub fn set_selected_color(&mut self, color: Color, opacity: f32) {
        self.cells[self.selected] = color;
        self.set_opacity(opacity);
    }

    pub fn update_cell_color(&mut self, color: Color, index: usize) {
        if let Some(cell) = self.cells.get_mut(index) {
            *cell = color;
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Clamped to `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = constrain_lenient(opacity as f64, 0.0, 1.0) as f32;
    }

    pub fn to_hex_strings(&self) -> Vec<String> {
        self.cells.iter().map(Color::to_hex).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_rgb_forms() {
        assert_eq!(Color::parse("#ff6600"), Some(Color::rgb(255, 102, 0)));
        assert_eq!(Color::parse("#0099FF"), Some(Color::rgb(0, 153, 255)));
        assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse("rgb(255, 102, 0)"), Some(Color::rgb(255, 102, 0)));
        assert_eq!(Color::parse("rgb(0,153,255)"), Some(Color::rgb(0, 153, 255)));
        assert_eq!(Color::parse("rgb(256, 0, 0)"), None);
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("red"), None);
    }

    #[test]
    fn rgb_to_hex() {
        assert_eq!(Color::rgb(255, 102, 0).to_hex(), "#ff6600");
        assert_eq!(Color::rgb(0, 153, 255).to_hex(), "#0099ff");
        assert_eq!(Color::WHITE.to_hex(), "#ffffff");
    }

    #[test]
    fn opacity_truncates_to_alpha_byte() {
        let c = Color::rgb(255, 102, 0);
        assert_eq!(c.to_rgba(0.5), Rgba([255, 102, 0, 127]));
        assert_eq!(c.to_rgba(1.0), Rgba([255, 102, 0, 255]));
        assert_eq!(c.to_rgba(0.0), Rgba([255, 102, 0, 0]));
    }

    #[test]
    fn default_palette_has_eight_swatches() {
        let p = ColorPalette::default();
        assert_eq!(p.len(), 8);
        assert_eq!(p.selected_color(), Color::BLACK);
        assert_eq!(p.colors()[6], Color::rgb(255, 102, 0));
        assert_eq!(p.opacity(), 1.0);
    }

    #[test]
    fn selection_and_write_back() {
        let mut p = ColorPalette::default();
        p.set_selected_index(2);
        assert_eq!(p.selected_color(), Color::rgb(0, 0, 255));
        p.set_selected_index(99);
        assert_eq!(p.selected_index(), 2);

        p.set_selected_color(Color::rgb(1, 2, 3), 0.25);
        assert_eq!(p.selected_color_with_opacity(), (Color::rgb(1, 2, 3), 0.25));
        assert_eq!(p.colors()[2], Color::rgb(1, 2, 3));
    }

    #[test]
    fn opacity_is_clamped() {
        let mut p = ColorPalette::default();
        p.set_opacity(3.0);
        assert_eq!(p.opacity(), 1.0);
        p.set_opacity(-1.0);
        assert_eq!(p.opacity(), 0.0);
    }

    #[test]
    fn bad_strings_are_skipped() {
        let p = ColorPalette::from_strings(&["#000000", "nope", "rgb(1, 2, 3)"]);
        assert_eq!(p.colors(), &[Color::BLACK, Color::rgb(1, 2, 3)]);
        let empty = ColorPalette::from_strings::<&str>(&[]);
        assert_eq!(empty.colors(), &[Color::BLACK]);
    }
}
