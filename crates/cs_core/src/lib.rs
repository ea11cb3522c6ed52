use bevy::prelude::*;

pub mod faction;
pub mod noise;
pub mod rng;

pub use faction::Faction;
pub use noise::{generate_perlin_map, NoiseMapConfig, PerlinNoise, DEFAULT_NOISE_SEED};
pub use rng::Mulberry32;

/// Core plugin providing foundational types for Caravan Saga.
pub struct CsCorePlugin;

impl Plugin for CsCorePlugin {
    fn build(&self, _app: &mut App) {
        // Core types are used by other crates; no systems to register here.
    }
}
