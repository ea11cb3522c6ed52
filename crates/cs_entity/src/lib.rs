use bevy::prelude::*;
use cs_terrain::HeightField;

pub mod caravan;
pub mod motion;
pub mod npc;

pub use caravan::{Caravan, CaravanConfig, CaravanId, CaravanKind, CaravanManager};
pub use motion::MotionState;
pub use npc::{Interaction, Npc, NpcId, NpcKind, NpcManager, NpcSpawn};

/// Entity simulation plugin: caravan lifecycle and NPC roaming.
pub struct CsEntityPlugin {
    pub seed: u32,
}

impl Plugin for CsEntityPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(CaravanManager::new(self.seed))
            .insert_resource(NpcManager::new(self.seed))
            .add_systems(Startup, populate_npcs);
    }
}

/// Spawn the session's persistent NPC cast once the terrain exists.
fn populate_npcs(mut npcs: ResMut<NpcManager>, terrain: Res<HeightField>) {
    npcs.spawn_default_population(&terrain);
}

/// Per-frame caravan tick: spawn timer, travel, boundary pruning.
pub fn tick_caravans(
    mut caravans: ResMut<CaravanManager>,
    terrain: Res<HeightField>,
    time: Res<Time>,
) {
    caravans.update(time.delta_secs(), &terrain);
}

/// Per-frame NPC tick: think timers, roaming, terrain gluing.
pub fn tick_npcs(mut npcs: ResMut<NpcManager>, terrain: Res<HeightField>, time: Res<Time>) {
    npcs.update(time.delta_secs(), &terrain);
}
