use bevy::prelude::*;

pub mod heightfield;
pub mod texture;

pub use heightfield::{shape_height, HeightField, TerrainConfig, MAX_HEIGHT, MIN_HEIGHT};
pub use texture::{
    entity_texture, ground_texture, noise_texture, EntityTheme, GroundTheme, TextureData,
};

/// Terrain plugin for Caravan Saga.
///
/// Builds the world height field once from the configured seed; the field
/// is read-only for the lifetime of the world.
pub struct CsTerrainPlugin {
    pub config: TerrainConfig,
}

impl Plugin for CsTerrainPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(HeightField::generate(&self.config))
            .insert_resource(self.config.clone());
    }
}
