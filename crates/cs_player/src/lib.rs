use bevy::prelude::*;
use bitflags::bitflags;
use cs_core::Faction;
use cs_entity::motion::MotionState;
use cs_terrain::HeightField;

pub mod combat;

pub use combat::{attack_caravan, roll_loot, LootResult, INJURY_CHANCE};

/// Base walking speed before upgrades and injury penalties.
pub const BASE_SPEED: f32 = 6.0;
/// Speed multiplier while any leg is lost.
pub const INJURED_LEG_MULTIPLIER: f32 = 0.5;
/// Vertical offset of the player capsule above the ground.
pub const PLAYER_VERTICAL_OFFSET: f32 = 1.0;
/// Duration of one attack swing in seconds.
const ATTACK_SWING_SECONDS: f32 = 0.3;

bitflags! {
    /// Intact body parts. A cleared bit is a lost part; nothing in the
    /// simulation restores it, only loading a save can.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct BodyParts: u8 {
        const LEFT_ARM = 0b0000_0001;
        const RIGHT_ARM = 0b0000_0010;
        const LEFT_LEG = 0b0000_0100;
        const RIGHT_LEG = 0b0000_1000;
        const LEFT_EYE = 0b0001_0000;
        const RIGHT_EYE = 0b0010_0000;
    }
}

impl BodyParts {
    /// Both legs intact.
    pub fn legs_intact(&self) -> bool {
        self.contains(BodyParts::LEFT_LEG | BodyParts::RIGHT_LEG)
    }
}

/// The player character's simulation state.
///
/// Mutated continuously by movement, combat and trade; persisted and
/// restored by the save collaborator.
#[derive(Resource, Debug, Clone)]
pub struct Player {
    pub faction: Option<Faction>,
    /// Clamped to [0, 100].
    pub health: i32,
    pub gold: u32,
    pub body_parts: BodyParts,
    /// Ordered loot item labels.
    pub inventory: Vec<String>,
    /// Additive speed upgrade total.
    pub speed_bonus: f32,
    pub motion: MotionState,
    attack_timer: f32,
    attacking: bool,
}

impl Player {
    /// New player standing on the terrain at the world origin.
    pub fn new(terrain: &HeightField) -> Self {
        Self {
            faction: None,
            health: 100,
            gold: 0,
            body_parts: BodyParts::all(),
            inventory: Vec::new(),
            speed_bonus: 0.0,
            motion: MotionState::on_ground(0.0, 0.0, BASE_SPEED, PLAYER_VERTICAL_OFFSET, terrain),
            attack_timer: 0.0,
            attacking: false,
        }
    }

    /// Effective speed: base plus upgrades, halved while a leg is lost.
    pub fn effective_speed(&self) -> f32 {
        let multiplier = if self.body_parts.legs_intact() {
            1.0
        } else {
            INJURED_LEG_MULTIPLIER
        };
        (BASE_SPEED + self.speed_bonus) * multiplier
    }

    /// Move along a horizontal direction, clamped to the movement bounds.
    pub fn move_by(&mut self, direction: Vec2, delta: f32, terrain: &HeightField) {
        self.motion.speed = self.effective_speed();
        self.motion.step_clamped(direction, delta, terrain);
    }

    /// Begin an attack swing unless one is already playing.
    pub fn attack(&mut self) {
        if !self.attacking {
            self.attacking = true;
            self.attack_timer = 0.0;
        }
    }

    /// Advance the attack swing animation state.
    pub fn update(&mut self, delta: f32) {
        if self.attacking {
            self.attack_timer += delta;
            if self.attack_timer >= ATTACK_SWING_SECONDS {
                self.attacking = false;
                self.attack_timer = 0.0;
            }
        }
    }

    /// Yaw offset of the current swing, for the renderer.
    pub fn attack_swing(&self) -> f32 {
        if !self.attacking {
            return 0.0;
        }
        (self.attack_timer / ATTACK_SWING_SECONDS * std::f32::consts::PI).sin() * 0.8
    }

    /// Deduct gold. Returns false and changes nothing when short; the
    /// caller must not apply the purchase effect in that case.
    pub fn spend_gold(&mut self, amount: u32) -> bool {
        if self.gold < amount {
            return false;
        }
        self.gold -= amount;
        true
    }

    /// Restore health, clamped to [0, 100].
    pub fn heal(&mut self, amount: i32) {
        self.health = (self.health + amount).clamp(0, 100);
    }

    /// Add a permanent additive speed upgrade.
    pub fn apply_speed_upgrade(&mut self, amount: f32) {
        self.speed_bonus += amount;
    }

    /// Credit loot from a resolved combat outcome.
    pub fn add_loot(&mut self, loot: &LootResult) {
        self.gold += loot.gold;
        self.inventory.extend(loot.items.iter().cloned());
    }

    pub fn set_faction(&mut self, faction: Faction) {
        self.faction = Some(faction);
    }
}

/// Player plugin for Caravan Saga.
/// Creates the session player once the terrain exists.
pub struct CsPlayerPlugin;

impl Plugin for CsPlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_player);
    }
}

fn spawn_player(mut commands: Commands, terrain: Res<HeightField>) {
    commands.insert_resource(Player::new(&terrain));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_terrain() -> HeightField {
        HeightField::from_heights(100.0, 2, 10.0, vec![2.0; 9])
    }

    #[test]
    fn new_player_starts_on_ground() {
        let player = Player::new(&flat_terrain());
        assert_eq!(player.health, 100);
        assert_eq!(player.gold, 0);
        assert_eq!(player.body_parts, BodyParts::all());
        assert_eq!(player.motion.position, Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn spend_gold_rejects_shortfall() {
        let mut player = Player::new(&flat_terrain());
        player.gold = 25;
        assert!(!player.spend_gold(30));
        assert_eq!(player.gold, 25);
        assert!(player.spend_gold(20));
        assert_eq!(player.gold, 5);
    }

    #[test]
    fn heal_clamps_to_bounds() {
        let mut player = Player::new(&flat_terrain());
        player.health = 90;
        player.heal(50);
        assert_eq!(player.health, 100);
        player.heal(-200);
        assert_eq!(player.health, 0);
    }

    #[test]
    fn lost_leg_halves_speed() {
        let mut player = Player::new(&flat_terrain());
        assert_eq!(player.effective_speed(), BASE_SPEED);
        player.body_parts.remove(BodyParts::LEFT_LEG);
        assert_eq!(player.effective_speed(), BASE_SPEED * INJURED_LEG_MULTIPLIER);
    }

    #[test]
    fn speed_upgrade_is_additive() {
        let mut player = Player::new(&flat_terrain());
        player.apply_speed_upgrade(2.0);
        player.apply_speed_upgrade(1.5);
        assert_eq!(player.effective_speed(), BASE_SPEED + 3.5);
    }

    #[test]
    fn upgrade_compensates_but_injury_still_applies() {
        let mut player = Player::new(&flat_terrain());
        player.body_parts.remove(BodyParts::RIGHT_LEG);
        player.apply_speed_upgrade(BASE_SPEED);
        assert_eq!(player.effective_speed(), BASE_SPEED);
        assert!(!player.body_parts.legs_intact());
    }

    #[test]
    fn movement_respects_bounds() {
        let terrain = flat_terrain();
        let mut player = Player::new(&terrain);
        for _ in 0..100 {
            player.move_by(Vec2::new(1.0, 0.0), 1.0, &terrain);
        }
        assert_eq!(player.motion.position.x, terrain.movement_bounds());
    }

    #[test]
    fn attack_swing_runs_once() {
        let mut player = Player::new(&flat_terrain());
        assert_eq!(player.attack_swing(), 0.0);
        player.attack();
        player.update(0.15);
        assert!(player.attack_swing() > 0.0);
        player.update(0.2);
        assert_eq!(player.attack_swing(), 0.0);
    }
}
