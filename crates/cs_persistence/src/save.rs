//! Save-game I/O in RON format.
//!
//! The save schema is a flat snapshot of the player; the world itself is
//! regenerated from its seed, so terrain and entities are never persisted.

use std::fs;
use std::path::{Path, PathBuf};

use cs_core::Faction;
use cs_player::{BodyParts, Player};
use cs_terrain::HeightField;
use serde::{Deserialize, Serialize};

/// Default directory for save files.
pub const SAVES_DIR: &str = "assets/saves";
/// Single save slot filename.
pub const SAVE_FILE: &str = "caravansaga.ron";

/// Error type for save I/O operations.
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Ron(ron::Error),
    RonSpanned(ron::error::SpannedError),
}

impl From<std::io::Error> for SaveError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ron::Error> for SaveError {
    fn from(err: ron::Error) -> Self {
        Self::Ron(err)
    }
}

impl From<ron::error::SpannedError> for SaveError {
    fn from(err: ron::error::SpannedError) -> Self {
        Self::RonSpanned(err)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Ron(e) => write!(f, "RON serialization error: {}", e),
            Self::RonSpanned(e) => write!(f, "RON parse error: {}", e),
        }
    }
}

impl std::error::Error for SaveError {}

/// Snapshot of the player state written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    pub faction: Option<Faction>,
    pub health: i32,
    pub gold: u32,
    /// Raw body part bit mask.
    pub body_parts: u8,
    pub position: [f32; 3],
    pub speed_bonus: f32,
    pub inventory: Vec<String>,
}

impl SaveData {
    /// Capture the current player state.
    pub fn capture(player: &Player) -> Self {
        Self {
            faction: player.faction,
            health: player.health,
            gold: player.gold,
            body_parts: player.body_parts.bits(),
            position: player.motion.position.to_array(),
            speed_bonus: player.speed_bonus,
            inventory: player.inventory.clone(),
        }
    }

    /// Apply a snapshot to the player. Field values are sanitized rather
    /// than trusted: health is re-clamped, unknown body part bits are
    /// dropped, and the vertical position is re-resolved from the terrain.
    pub fn apply(&self, player: &mut Player, terrain: &HeightField) {
        player.faction = self.faction;
        player.health = self.health.clamp(0, 100);
        player.gold = self.gold;
        player.body_parts = BodyParts::from_bits_truncate(self.body_parts);
        player.speed_bonus = self.speed_bonus;
        player.inventory = self.inventory.clone();
        player.motion.position.x = self.position[0];
        player.motion.position.z = self.position[2];
        player.motion.snap_to_ground(terrain);
    }
}

/// Save a snapshot to a RON file.
pub fn save_game(path: &Path, data: &SaveData) -> Result<(), SaveError> {
    let pretty_config = ron::ser::PrettyConfig::new().depth_limit(4);
    let ron_string = ron::ser::to_string_pretty(data, pretty_config)?;
    fs::write(path, ron_string)?;
    Ok(())
}

/// Load a snapshot from a RON file.
pub fn load_game(path: &Path) -> Result<SaveData, SaveError> {
    let contents = fs::read_to_string(path)?;
    let data: SaveData = ron::from_str(&contents)?;
    Ok(data)
}

/// Load the save slot if a readable one exists. A missing or malformed
/// file is treated as no save.
pub fn try_load(path: &Path) -> Option<SaveData> {
    load_game(path).ok()
}

/// Ensure the saves directory exists.
pub fn ensure_saves_dir() -> Result<(), std::io::Error> {
    fs::create_dir_all(SAVES_DIR)
}

/// Full path of the save slot.
pub fn save_path() -> PathBuf {
    Path::new(SAVES_DIR).join(SAVE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn flat_terrain() -> HeightField {
        HeightField::from_heights(100.0, 2, 10.0, vec![4.0; 9])
    }

    fn sample_player() -> Player {
        let terrain = flat_terrain();
        let mut player = Player::new(&terrain);
        player.set_faction(Faction::ForestElves);
        player.gold = 120;
        player.health = 73;
        player.body_parts.remove(BodyParts::LEFT_LEG);
        player.apply_speed_upgrade(2.0);
        player.inventory.push("Silk Bale".to_string());
        player.move_by(bevy::math::Vec2::new(1.0, 0.0), 2.0, &terrain);
        player
    }

    #[test]
    fn save_and_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("save.ron");
        let terrain = flat_terrain();

        let player = sample_player();
        save_game(&path, &SaveData::capture(&player)).unwrap();

        let mut restored = Player::new(&terrain);
        load_game(&path).unwrap().apply(&mut restored, &terrain);

        assert_eq!(restored.faction, player.faction);
        assert_eq!(restored.health, player.health);
        assert_eq!(restored.gold, player.gold);
        assert_eq!(restored.body_parts, player.body_parts);
        assert_eq!(restored.speed_bonus, player.speed_bonus);
        assert_eq!(restored.inventory, player.inventory);
        assert_eq!(restored.motion.position, player.motion.position);
    }

    #[test]
    fn apply_sanitizes_fields() {
        let terrain = flat_terrain();
        let mut player = Player::new(&terrain);
        let data = SaveData {
            faction: None,
            health: 9000,
            gold: 5,
            body_parts: 0xFF,
            position: [1.0, 999.0, -2.0],
            speed_bonus: 0.0,
            inventory: Vec::new(),
        };
        data.apply(&mut player, &terrain);
        assert_eq!(player.health, 100);
        assert_eq!(player.body_parts, BodyParts::all());
        // The saved y is ignored; the terrain decides.
        assert_eq!(player.motion.position.y, 4.0 + cs_player::PLAYER_VERTICAL_OFFSET);
    }

    #[test]
    fn malformed_save_is_treated_as_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("save.ron");
        fs::write(&path, "not ron at all (").unwrap();
        assert!(try_load(&path).is_none());
        assert!(try_load(&dir.path().join("absent.ron")).is_none());
    }
}
