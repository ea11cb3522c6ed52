//! Trade caravans: transient entities that cross the world along a road
//! band and expire at the far boundary.

use bevy::prelude::*;
use cs_core::Mulberry32;
use cs_terrain::HeightField;

use crate::motion::MotionState;

/// Vertical offset of a caravan body above the ground.
const CARAVAN_VERTICAL_OFFSET: f32 = 0.5;
/// Frequency of the lateral weave along the road.
const WEAVE_FREQUENCY: f32 = 0.6;
/// Amplitude of the lateral weave.
const WEAVE_AMPLITUDE: f32 = 1.5;
/// Frequency and amplitude of the vertical bob.
const BOB_FREQUENCY: f32 = 2.0;
const BOB_AMPLITUDE: f32 = 0.1;

/// Cargo type carried by a caravan; decides loot tables and skin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaravanKind {
    Merchant,
    ImperialSupply,
}

impl CaravanKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Merchant => "Merchant",
            Self::ImperialSupply => "Imperial Supply",
        }
    }
}

/// Stable handle into the caravan registry. Handles are never reused, so a
/// stale handle simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaravanId(pub u32);

/// Caravan tuning parameters.
#[derive(Debug, Clone)]
pub struct CaravanConfig {
    /// Seconds between spawns.
    pub spawn_interval: f32,
    /// Travel speed before per-instance jitter.
    pub base_speed: f32,
    /// Half-width of the road band; lane offsets are drawn from it.
    pub road_half_width: f32,
    /// Travel-axis coordinate where caravans enter the world.
    pub spawn_z: f32,
    /// Travel-axis coordinate past which caravans expire.
    pub despawn_z: f32,
}

impl Default for CaravanConfig {
    fn default() -> Self {
        Self {
            spawn_interval: 9.0,
            base_speed: 3.0,
            road_half_width: 25.0,
            spawn_z: -240.0,
            despawn_z: 240.0,
        }
    }
}

/// A transient trade caravan crossing the world.
#[derive(Debug, Clone)]
pub struct Caravan {
    pub id: CaravanId,
    pub kind: CaravanKind,
    pub motion: MotionState,
    /// Lane the caravan weaves around, within the road band.
    pub lane_offset: f32,
    /// Per-instance speed multiplier in [0.8, 1.2).
    pub speed_jitter: f32,
    /// Elapsed lifetime in seconds.
    pub age: f32,
}

/// Owns every live caravan. All structural mutation goes through this
/// manager, so removal during combat resolution cannot race a tick.
#[derive(Resource, Debug)]
pub struct CaravanManager {
    caravans: Vec<Caravan>,
    config: CaravanConfig,
    spawn_timer: f32,
    next_id: u32,
    rng: Mulberry32,
}

impl CaravanManager {
    pub fn new(seed: u32) -> Self {
        Self::with_config(seed, CaravanConfig::default())
    }

    pub fn with_config(seed: u32, config: CaravanConfig) -> Self {
        Self {
            caravans: Vec::new(),
            config,
            spawn_timer: 0.0,
            next_id: 0,
            rng: Mulberry32::derive(seed, 1),
        }
    }

    /// Spawn one caravan at the near edge of the road band, with a random
    /// lane offset and uniform unweighted kind choice.
    pub fn spawn_caravan(&mut self, terrain: &HeightField) -> CaravanId {
        let kind = if self.rng.next_f64() > 0.5 {
            CaravanKind::Merchant
        } else {
            CaravanKind::ImperialSupply
        };
        let lane_offset = self
            .rng
            .range_f32(-self.config.road_half_width, self.config.road_half_width);
        let speed_jitter = self.rng.range_f32(0.8, 1.2);

        let id = CaravanId(self.next_id);
        self.next_id += 1;

        let motion = MotionState::on_ground(
            lane_offset,
            self.config.spawn_z,
            self.config.base_speed * speed_jitter,
            CARAVAN_VERTICAL_OFFSET,
            terrain,
        );
        self.caravans.push(Caravan {
            id,
            kind,
            motion,
            lane_offset,
            speed_jitter,
            age: 0.0,
        });
        id
    }

    /// Advance the spawn timer and every caravan, then prune entries past
    /// the far boundary (O(n) scan).
    pub fn update(&mut self, delta: f32, terrain: &HeightField) {
        self.spawn_timer += delta;
        if self.spawn_timer > self.config.spawn_interval {
            self.spawn_caravan(terrain);
            self.spawn_timer = 0.0;
        }

        for caravan in &mut self.caravans {
            caravan.age += delta;
            // Forward travel is strictly monotonic; the weave only moves the
            // caravan sideways within its lane.
            let desired_x =
                caravan.lane_offset + (caravan.age * WEAVE_FREQUENCY).sin() * WEAVE_AMPLITUDE;
            let dx = desired_x - caravan.motion.position.x;
            let dz = caravan.motion.speed * delta;
            caravan.motion.translate(dx, dz, terrain);
            caravan.motion.position.y += (caravan.age * BOB_FREQUENCY).sin() * BOB_AMPLITUDE;
        }

        let despawn_z = self.config.despawn_z;
        self.caravans.retain(|c| c.motion.position.z < despawn_z);
    }

    /// Remove a caravan by handle. Returns `None` for a stale handle, which
    /// makes combat resolution idempotent.
    pub fn remove_caravan(&mut self, id: CaravanId) -> Option<Caravan> {
        let index = self.caravans.iter().position(|c| c.id == id)?;
        Some(self.caravans.swap_remove(index))
    }

    /// Closest live caravan within `radius` of a position.
    pub fn nearest_in_range(&self, position: Vec3, radius: f32) -> Option<CaravanId> {
        let mut best = None;
        let mut best_sq = radius * radius;
        for caravan in &self.caravans {
            let dist_sq = caravan.motion.position.distance_squared(position);
            if dist_sq < best_sq {
                best_sq = dist_sq;
                best = Some(caravan.id);
            }
        }
        best
    }

    pub fn get(&self, id: CaravanId) -> Option<&Caravan> {
        self.caravans.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Caravan> {
        self.caravans.iter()
    }

    pub fn len(&self) -> usize {
        self.caravans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caravans.is_empty()
    }

    pub fn config(&self) -> &CaravanConfig {
        &self.config
    }
}
