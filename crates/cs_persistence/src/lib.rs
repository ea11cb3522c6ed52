use bevy::prelude::*;

pub mod save;

pub use save::{
    ensure_saves_dir, load_game, save_game, save_path, try_load, SaveData, SaveError, SAVES_DIR,
    SAVE_FILE,
};

/// Persistence plugin for Caravan Saga.
/// Save and load go through explicit player actions, so the plugin only
/// marks the save schema's home crate.
pub struct CsPersistencePlugin;

impl Plugin for CsPersistencePlugin {
    fn build(&self, _app: &mut App) {}
}
