//! Classic 2D gradient noise and fractal (octave) map generation.
//!
//! The generator is deterministic for a given seed: the permutation table
//! comes from a seeded shuffle, so identical seeds reproduce identical
//! terrain across sessions.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::rng::Mulberry32;

/// Fallback seed used when a config leaves the seed unset (zero).
pub const DEFAULT_NOISE_SEED: u32 = 123_456_789;

/// Smoothstep-like fade curve `t³(t(6t−15)+10)`.
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Gradient dot-product for one of four directions keyed by the low
/// 2 bits of the corner hash.
fn grad(hash: u8, x: f64, y: f64) -> f64 {
    let h = hash & 3;
    let (u, v) = if h < 2 { (x, y) } else { (y, x) };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

/// Coherent pseudo-random 2D noise over a seeded permutation table.
///
/// The 256-entry table is duplicated to 512 entries so corner lookups
/// never need an explicit wrap.
pub struct PerlinNoise {
    permutation: [u8; 512],
}

impl PerlinNoise {
    pub fn new(seed: u32) -> Self {
        let mut perm = [0u8; 256];
        for (i, entry) in perm.iter_mut().enumerate() {
            *entry = i as u8;
        }

        let seed = if seed == 0 { DEFAULT_NOISE_SEED } else { seed };
        let mut rng = Mulberry32::new(seed);
        for i in (1..256usize).rev() {
            let j = (rng.next_f64() * (i as f64 + 1.0)) as usize;
            perm.swap(i, j);
        }

        let mut permutation = [0u8; 512];
        for (i, entry) in permutation.iter_mut().enumerate() {
            *entry = perm[i & 255];
        }
        Self { permutation }
    }

    /// Noise value in [-1, 1] at a continuous 2D coordinate.
    pub fn noise2d(&self, x: f64, y: f64) -> f64 {
        let xi = ((x.floor() as i64) & 255) as usize;
        let yi = ((y.floor() as i64) & 255) as usize;
        let xf = x - x.floor();
        let yf = y - y.floor();
        let u = fade(xf);
        let v = fade(yf);
        let p = &self.permutation;

        let aa = p[p[xi] as usize + yi];
        let ab = p[p[xi] as usize + yi + 1];
        let ba = p[p[xi + 1] as usize + yi];
        let bb = p[p[xi + 1] as usize + yi + 1];

        let x1 = lerp(grad(aa, xf, yf), grad(ba, xf - 1.0, yf), u);
        let x2 = lerp(grad(ab, xf, yf - 1.0), grad(bb, xf - 1.0, yf - 1.0), u);
        lerp(x1, x2, v)
    }
}

/// Fractal noise map parameters. Each field is independently tunable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseMapConfig {
    /// Base sampling frequency.
    pub scale: f64,
    /// Number of accumulated noise layers (at least 1).
    pub octaves: u32,
    /// Amplitude falloff per octave.
    pub persistence: f64,
    /// Frequency growth per octave.
    pub lacunarity: f64,
    /// Generator seed; zero falls back to [`DEFAULT_NOISE_SEED`].
    pub seed: u32,
}

impl Default for NoiseMapConfig {
    fn default() -> Self {
        Self {
            scale: 0.05,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            seed: DEFAULT_NOISE_SEED,
        }
    }
}

/// Generate a row-major `width * height` grid of fractal noise values
/// normalized to [0, 1].
///
/// Octaves accumulate at increasing frequency and decreasing amplitude,
/// then the sum is normalized by the total accumulated amplitude. Rows are
/// generated in parallel; each row is independent, so the output is
/// bit-identical regardless of thread scheduling.
pub fn generate_perlin_map(width: usize, height: usize, config: &NoiseMapConfig) -> Vec<f32> {
    let noise = PerlinNoise::new(config.seed);
    let octaves = config.octaves.max(1);
    let mut data = vec![0.0f32; width * height];

    data.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            let mut amplitude = 1.0;
            let mut frequency = config.scale;
            let mut value = 0.0;
            let mut total_amplitude = 0.0;
            for _ in 0..octaves {
                value += amplitude * noise.noise2d(x as f64 * frequency, y as f64 * frequency);
                total_amplitude += amplitude;
                amplitude *= config.persistence;
                frequency *= config.lacunarity;
            }
            *out = (value / total_amplitude * 0.5 + 0.5) as f32;
        }
    });

    data
}
