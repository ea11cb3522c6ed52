//! Height-field terrain: a fixed-resolution elevation grid built once from
//! fractal noise and queried by bilinear interpolation.

use bevy::prelude::*;
use cs_core::{generate_perlin_map, NoiseMapConfig};
use serde::{Deserialize, Serialize};

/// Lowest elevation the shaping function can produce.
pub const MIN_HEIGHT: f32 = -18.0;
/// Highest elevation the shaping function can produce.
pub const MAX_HEIGHT: f32 = 38.0;

/// Terrain generation parameters.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Side length of the square world domain.
    pub size: f32,
    /// Grid cells per side; the sample grid is `(segments + 1)²`.
    pub segments: usize,
    /// Amplitude applied to the centered noise sample.
    pub height_scale: f64,
    /// Distance kept between the movement bounds and the domain edge.
    pub margin: f32,
    /// Fractal noise parameters for the base elevation sample.
    pub noise: NoiseMapConfig,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            size: 800.0,
            segments: 200,
            height_scale: 40.0,
            margin: 6.0,
            noise: NoiseMapConfig {
                scale: 0.003,
                octaves: 5,
                persistence: 0.5,
                lacunarity: 2.0,
                seed: 5123,
            },
        }
    }
}

/// Map a normalized noise sample at world `(x, z)` to terrain elevation.
///
/// Rolling hills fall away toward the map edge and rise into a flat
/// central plaza around the origin. Output is clamped to
/// [[`MIN_HEIGHT`], [`MAX_HEIGHT`]].
pub fn shape_height(sample: f32, x: f32, z: f32, config: &TerrainConfig) -> f32 {
    let size = config.size as f64;
    let distance = ((x as f64) * (x as f64) + (z as f64) * (z as f64)).sqrt();
    let normalized = (distance / (size * 0.52)).min(1.0);
    let falloff = (1.0 - normalized).max(0.0).powf(3.2);
    let plateau = (1.0 - distance / (size * 0.18)).max(0.0).powf(3.5) * 11.0;
    let shaped = (sample as f64 - 0.5) * config.height_scale;
    (shaped * (0.35 + falloff * 0.7) + plateau - normalized * 12.0)
        .clamp(MIN_HEIGHT as f64, MAX_HEIGHT as f64) as f32
}

/// Precomputed elevation grid over `[-half, half]²`.
///
/// Built once per world instance and never mutated afterwards; every other
/// component queries it through [`HeightField::height_at`], never by index.
#[derive(Resource, Debug, Clone)]
pub struct HeightField {
    size: f32,
    segments: usize,
    half_size: f32,
    margin: f32,
    heights: Vec<f32>,
}

impl HeightField {
    /// Sample and shape the elevation grid from fractal noise.
    pub fn generate(config: &TerrainConfig) -> Self {
        let samples = config.segments + 1;
        let noise_map = generate_perlin_map(samples, samples, &config.noise);
        let half = config.size / 2.0;
        let step = config.size / config.segments as f32;

        let mut heights = vec![0.0f32; samples * samples];
        for iz in 0..samples {
            let z = -half + iz as f32 * step;
            for ix in 0..samples {
                let x = -half + ix as f32 * step;
                heights[iz * samples + ix] = shape_height(noise_map[iz * samples + ix], x, z, config);
            }
        }

        Self {
            size: config.size,
            segments: config.segments,
            half_size: half,
            margin: config.margin,
            heights,
        }
    }

    /// Build a height field from precomputed samples (tools and tests).
    /// `heights.len()` must equal `(segments + 1)²`.
    pub fn from_heights(size: f32, segments: usize, margin: f32, heights: Vec<f32>) -> Self {
        debug_assert_eq!(heights.len(), (segments + 1) * (segments + 1));
        Self {
            size,
            segments,
            half_size: size / 2.0,
            margin,
            heights,
        }
    }

    /// Interpolated elevation at a continuous coordinate.
    ///
    /// Out-of-domain input is clamped to the nearest edge, so the query
    /// never fails.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let half = self.half_size;
        let gx = (x.clamp(-half, half) + half) / self.size * self.segments as f32;
        let gz = (z.clamp(-half, half) + half) / self.size * self.segments as f32;
        let x0 = (gx as usize).min(self.segments - 1);
        let z0 = (gz as usize).min(self.segments - 1);
        let tx = gx - x0 as f32;
        let tz = gz - z0 as f32;

        let stride = self.segments + 1;
        let h00 = self.heights[z0 * stride + x0];
        let h10 = self.heights[z0 * stride + x0 + 1];
        let h01 = self.heights[(z0 + 1) * stride + x0];
        let h11 = self.heights[(z0 + 1) * stride + x0 + 1];

        let top = h00 + (h10 - h00) * tx;
        let bottom = h01 + (h11 - h01) * tx;
        top + (bottom - top) * tz
    }

    /// Half-extent of the square area entities may move in.
    pub fn movement_bounds(&self) -> f32 {
        self.half_size - self.margin
    }

    /// Raw grid sample, for mesh building.
    pub fn sample(&self, ix: usize, iz: usize) -> f32 {
        self.heights[iz * (self.segments + 1) + ix]
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn half_size(&self) -> f32 {
        self.half_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TerrainConfig {
        TerrainConfig {
            segments: 64,
            ..Default::default()
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let config = small_config();
        let a = HeightField::generate(&config);
        let b = HeightField::generate(&config);
        for (x, z) in [(0.0, 0.0), (13.7, -42.1), (-199.0, 350.5)] {
            assert_eq!(a.height_at(x, z), b.height_at(x, z));
        }
    }

    #[test]
    fn heights_stay_in_clamp_range() {
        let field = HeightField::generate(&small_config());
        for iz in 0..=64 {
            for ix in 0..=64 {
                let h = field.sample(ix, iz);
                assert!((MIN_HEIGHT..=MAX_HEIGHT).contains(&h), "height {} out of range", h);
            }
        }
    }

    #[test]
    fn origin_sits_on_plateau() {
        let config = small_config();
        let field = HeightField::generate(&config);
        let center = field.height_at(0.0, 0.0);
        let edge = field.height_at(field.half_size(), field.half_size());
        assert!((MIN_HEIGHT..=MAX_HEIGHT).contains(&center));
        // The plateau boost keeps the plaza well above the dropped-off rim.
        assert!(center > edge);
    }

    #[test]
    fn out_of_domain_queries_clamp_to_edge() {
        let field = HeightField::generate(&small_config());
        let half = field.half_size();
        assert_eq!(field.height_at(half + 500.0, 10.0), field.height_at(half, 10.0));
        assert_eq!(field.height_at(10.0, -half - 42.0), field.height_at(10.0, -half));
        assert_eq!(
            field.height_at(half + 1.0, half + 1.0),
            field.height_at(half, half)
        );
    }

    #[test]
    fn interpolation_is_continuous() {
        let field = HeightField::generate(&small_config());
        let cell = field.size() / field.segments() as f32;
        let step = 0.25;
        let mut prev = field.height_at(-100.0, 37.0);
        let mut x = -100.0 + step;
        while x < 100.0 {
            let h = field.height_at(x, 37.0);
            // One grid cell spans at most the full clamp range, so a small
            // horizontal step can only move a proportional fraction of it.
            let bound = (MAX_HEIGHT - MIN_HEIGHT) * (step / cell) * 2.0;
            assert!((h - prev).abs() <= bound, "jump {} at x={}", (h - prev).abs(), x);
            prev = h;
            x += step;
        }
    }

    #[test]
    fn bilinear_matches_known_grid() {
        // 1-cell grid with corner heights 0,1,2,3: the center averages to 1.5.
        let field = HeightField::from_heights(2.0, 1, 0.0, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(field.height_at(0.0, 0.0), 1.5);
        assert_eq!(field.height_at(-1.0, -1.0), 0.0);
        assert_eq!(field.height_at(1.0, 1.0), 3.0);
    }

    #[test]
    fn movement_bounds_leave_margin() {
        let field = HeightField::generate(&small_config());
        assert_eq!(field.movement_bounds(), field.half_size() - 6.0);
    }
}
