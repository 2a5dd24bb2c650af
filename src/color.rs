use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Colour schemes for the charts
// ---------------------------------------------------------------------------

const BLUE: [u8; 3] = [0, 0, 255];
const GREEN: [u8; 3] = [0, 128, 0];
const YELLOW: [u8; 3] = [255, 255, 0];
const MAGENTA: [u8; 3] = [255, 0, 255];
const ORANGE: [u8; 3] = [255, 165, 0];
const RED: [u8; 3] = [255, 0, 0];

/// User-selectable chart colouring: a line colour plus a two-stop gradient
/// for the injury/mortality bubbles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Blue,
    Green,
    Magenta,
    Orange,
    Red,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 5] = [
        ColorScheme::Blue,
        ColorScheme::Green,
        ColorScheme::Magenta,
        ColorScheme::Orange,
        ColorScheme::Red,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ColorScheme::Blue => "Blue",
            ColorScheme::Green => "Green",
            ColorScheme::Magenta => "Magenta",
            ColorScheme::Orange => "Orange",
            ColorScheme::Red => "Red",
        }
    }

    fn line_rgb(self) -> [u8; 3] {
        match self {
            ColorScheme::Blue => BLUE,
            ColorScheme::Green => GREEN,
            ColorScheme::Magenta => MAGENTA,
            ColorScheme::Orange => ORANGE,
            ColorScheme::Red => RED,
        }
    }

    fn gradient_rgb(self) -> ([u8; 3], [u8; 3]) {
        match self {
            ColorScheme::Blue => (BLUE, GREEN),
            ColorScheme::Green => (GREEN, YELLOW),
            ColorScheme::Magenta => (BLUE, RED),
            ColorScheme::Orange => (RED, YELLOW),
            ColorScheme::Red => (RED, ORANGE),
        }
    }

    /// Colour of the collisions-per-day line.
    pub fn line_color(self) -> Color32 {
        let [r, g, b] = self.line_rgb();
        Color32::from_rgb(r, g, b)
    }

    /// Interpolate the scheme's gradient at `t` (clamped to `0.0..=1.0`) in linear sRGB.
    pub fn gradient(self, t: f32) -> Color32 {
        let (from, to) = self.gradient_rgb();
        let mixed = linear(from).mix(linear(to), t.clamp(0.0, 1.0));
        to_color32(Srgb::from_linear(mixed))
    }
}

fn linear([r, g, b]: [u8; 3]) -> LinSrgb {
    Srgb::new(r, g, b).into_format::<f32>().into_linear()
}

// ---------------------------------------------------------------------------
// Borough colours for the map
// ---------------------------------------------------------------------------

/// Maps each borough label to a distinct colour.
#[derive(Debug, Clone, Default)]
pub struct BoroughColors {
    mapping: BTreeMap<String, Color32>,
}

impl BoroughColors {
    pub fn new(boroughs: &BTreeSet<String>) -> Self {
        let palette = generate_palette(boroughs.len());
        BoroughColors {
            mapping: boroughs.iter().cloned().zip(palette).collect(),
        }
    }

    pub fn color_for(&self, borough: &str) -> Color32 {
        self.mapping.get(borough).copied().unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_distinct_colours() {
        let colors = generate_palette(5);
        assert_eq!(colors.len(), 5);
        let unique: BTreeSet<[u8; 4]> = colors.iter().map(|c| c.to_array()).collect();
        assert_eq!(unique.len(), 5);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn gradient_endpoints_match_scheme_stops() {
        assert_eq!(ColorScheme::Orange.gradient(0.0), Color32::from_rgb(255, 0, 0));
        assert_eq!(ColorScheme::Orange.gradient(1.0), Color32::from_rgb(255, 255, 0));
        assert_eq!(ColorScheme::Magenta.gradient(-3.0), Color32::from_rgb(0, 0, 255));
        assert_eq!(ColorScheme::Magenta.gradient(7.0), Color32::from_rgb(255, 0, 0));
    }

    #[test]
    fn gradient_midpoint_is_between_stops() {
        let mid = ColorScheme::Red.gradient(0.5);
        assert_eq!(mid.r(), 255);
        assert_eq!(mid.b(), 0);
        assert!(mid.g() > 0 && mid.g() < 165);
    }

    #[test]
    fn line_colours_follow_scheme() {
        assert_eq!(ColorScheme::Blue.line_color(), Color32::from_rgb(0, 0, 255));
        assert_eq!(ColorScheme::Magenta.line_color(), Color32::from_rgb(255, 0, 255));
    }

    #[test]
    fn unknown_borough_is_grey() {
        let boroughs: BTreeSet<String> =
            ["BRONX", "QUEENS"].iter().map(|s| s.to_string()).collect();
        let colors = BoroughColors::new(&boroughs);
        assert_ne!(colors.color_for("BRONX"), colors.color_for("QUEENS"));
        assert_eq!(colors.color_for("ATLANTIS"), Color32::GRAY);
    }
}
