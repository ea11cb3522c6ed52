//! Texture synthesis from fractal noise.
//!
//! Colors come from gradient stops sampled by a normalized noise value,
//! with optional contrast/brightness shaping. Each preset pins its own
//! noise seed so world textures are identical across sessions.

use cs_core::{generate_perlin_map, NoiseMapConfig};

/// RGBA8 pixel buffer ready for GPU upload.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

/// Ground palettes for the world's zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundTheme {
    Imperial,
    Forest,
    Villain,
    Neutral,
}

/// Skin palettes for noise-textured entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityTheme {
    Neutral,
    Elf,
    Guard,
    Villain,
    MerchantCaravan,
    ImperialCaravan,
}

fn hex_to_rgb(hex: &str) -> [u8; 3] {
    let raw = hex.strip_prefix('#').unwrap_or(hex);
    let value = u32::from_str_radix(raw, 16).unwrap_or(0);
    [
        ((value >> 16) & 255) as u8,
        ((value >> 8) & 255) as u8,
        (value & 255) as u8,
    ]
}

fn lerp_color(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

struct GradientStop {
    value: f32,
    color: [u8; 3],
}

fn gradient(colors: &[&str]) -> Vec<GradientStop> {
    let last = (colors.len() - 1).max(1) as f32;
    colors
        .iter()
        .enumerate()
        .map(|(i, hex)| GradientStop {
            value: if colors.len() == 1 { 0.0 } else { i as f32 / last },
            color: hex_to_rgb(hex),
        })
        .collect()
}

fn sample_gradient(stops: &[GradientStop], t: f32) -> [u8; 3] {
    if stops.len() == 1 || t <= stops[0].value {
        return stops[0].color;
    }
    for pair in stops.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if t <= next.value {
            let local = (t - current.value) / (next.value - current.value);
            return lerp_color(current.color, next.color, local);
        }
    }
    stops[stops.len() - 1].color
}

/// Synthesize an RGBA8 texture by coloring a fractal noise map through a
/// gradient, with power-curve contrast and additive brightness.
pub fn noise_texture(
    width: usize,
    height: usize,
    noise: &NoiseMapConfig,
    colors: &[&str],
    contrast: f32,
    brightness: f32,
) -> TextureData {
    let data = generate_perlin_map(width, height, noise);
    let stops = gradient(colors);
    let mut pixels = Vec::with_capacity(width * height * 4);
    for value in data {
        let mut v = value;
        if contrast != 1.0 {
            v = v.powf(contrast);
        }
        v = (v + brightness).clamp(0.0, 1.0);
        let color = sample_gradient(&stops, v);
        pixels.extend_from_slice(&[color[0], color[1], color[2], 255]);
    }
    TextureData { width, height, pixels }
}

fn noise_config(scale: f64, octaves: u32, seed: u32) -> NoiseMapConfig {
    NoiseMapConfig {
        scale,
        octaves,
        seed,
        ..Default::default()
    }
}

/// 256×256 ground texture for a zone palette.
pub fn ground_texture(theme: GroundTheme) -> TextureData {
    match theme {
        GroundTheme::Imperial => noise_texture(
            256,
            256,
            &noise_config(0.015, 5, 5312),
            &["#a47c3c", "#c5ab6e", "#e3d6a2"],
            1.0,
            0.0,
        ),
        GroundTheme::Forest => noise_texture(
            256,
            256,
            &noise_config(0.02, 5, 9321),
            &["#1f3c1d", "#305c29", "#4d8b3d"],
            1.0,
            0.0,
        ),
        GroundTheme::Villain => noise_texture(
            256,
            256,
            &noise_config(0.02, 4, 4123),
            &["#2a2a2e", "#3a3a3f", "#4d4d55"],
            1.0,
            0.0,
        ),
        GroundTheme::Neutral => noise_texture(
            256,
            256,
            &noise_config(0.018, 4, 8127),
            &["#4b3a24", "#6a4f2e", "#856847"],
            1.0,
            0.0,
        ),
    }
}

/// 128×128 skin texture for a noise-textured entity.
pub fn entity_texture(theme: EntityTheme) -> TextureData {
    match theme {
        EntityTheme::Neutral => noise_texture(
            128,
            128,
            &noise_config(0.05, 4, 1251),
            &["#1d3c58", "#2f5c7c", "#58a3c6"],
            0.9,
            0.0,
        ),
        EntityTheme::Elf => noise_texture(
            128,
            128,
            &noise_config(0.05, 4, 4321),
            &["#1f4b30", "#2c7a4a", "#58c47b"],
            0.9,
            0.0,
        ),
        EntityTheme::Guard => noise_texture(
            128,
            128,
            &noise_config(0.05, 4, 7821),
            &["#2f2f5c", "#42427a", "#6a6ad1"],
            0.9,
            0.0,
        ),
        EntityTheme::Villain => noise_texture(
            128,
            128,
            &noise_config(0.05, 4, 9513),
            &["#3f1d45", "#5b2f66", "#a64ab5"],
            0.9,
            0.0,
        ),
        EntityTheme::MerchantCaravan => noise_texture(
            128,
            128,
            &noise_config(0.05, 4, 3542),
            &["#5b3821", "#7a4b29", "#9d6a3a"],
            1.15,
            0.0,
        ),
        EntityTheme::ImperialCaravan => noise_texture(
            128,
            128,
            &noise_config(0.06, 4, 4523),
            &["#5a5f66", "#7b838c", "#b2bcc7"],
            1.1,
            0.0,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(hex_to_rgb("#ff0080"), [255, 0, 128]);
        assert_eq!(hex_to_rgb("000000"), [0, 0, 0]);
    }

    #[test]
    fn gradient_endpoints() {
        let stops = gradient(&["#000000", "#ffffff"]);
        assert_eq!(sample_gradient(&stops, 0.0), [0, 0, 0]);
        assert_eq!(sample_gradient(&stops, 1.0), [255, 255, 255]);
        assert_eq!(sample_gradient(&stops, 0.5), [128, 128, 128]);
    }

    #[test]
    fn texture_has_opaque_rgba_pixels() {
        let tex = ground_texture(GroundTheme::Neutral);
        assert_eq!(tex.pixels.len(), tex.width * tex.height * 4);
        assert!(tex.pixels.chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn textures_are_reproducible() {
        let a = entity_texture(EntityTheme::Elf);
        let b = entity_texture(EntityTheme::Elf);
        assert_eq!(a.pixels, b.pixels);
    }

    #[test]
    fn themes_differ() {
        let merchant = entity_texture(EntityTheme::MerchantCaravan);
        let imperial = entity_texture(EntityTheme::ImperialCaravan);
        assert_ne!(merchant.pixels, imperial.pixels);
    }
}
