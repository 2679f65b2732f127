use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

/// Spotify brand green, the single-series chart colour.
pub const SPOTIFY_GREEN: Color32 = Color32::from_rgb(0x1D, 0xB9, 0x54);

/// Darker companion green for the second series of paired charts.
pub const DEEP_GREEN: Color32 = Color32::from_rgb(0x0A, 0x5D, 0x2A);

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
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Shade of green for `t` in 0..=1, light to dark, like a sequential
/// colour scale.
pub fn green_scale(t: f64) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) as f32 } else { 0.5 };
    let hsl = Hsl::new(140.0, 0.65, 0.78 - 0.5 * t);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Color mapping: category label → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a category (genres, campaigns) to colours.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    /// Build a colour map from the distinct keys, in the order given.
    pub fn new<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let keys: Vec<&str> = keys.into_iter().collect();
        let palette = generate_palette(keys.len());
        ColorMap {
            mapping: keys
                .into_iter()
                .zip(palette)
                .map(|(k, c)| (k.to_string(), c))
                .collect(),
        }
    }

    /// Look up the colour for a key; unknown keys are grey.
    pub fn color_for(&self, key: &str) -> Color32 {
        self.mapping.get(key).copied().unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colours() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(6);
        assert_eq!(p.len(), 6);
        for (i, a) in p.iter().enumerate() {
            for b in &p[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn unknown_keys_fall_back_to_grey() {
        let map = ColorMap::new(["Pop", "Rock"]);
        assert_ne!(map.color_for("Pop"), map.color_for("Rock"));
        assert_eq!(map.color_for("Jazz"), Color32::GRAY);
    }

    #[test]
    fn green_scale_darkens() {
        let light = green_scale(0.0);
        let dark = green_scale(1.0);
        assert!(light.g() > dark.g());
        assert_eq!(green_scale(f64::NAN), green_scale(0.5));
    }
}
