//! Persistent NPCs with a think-and-move roam loop.
//!
//! Each NPC periodically picks a random target within its roam radius,
//! rejecting points where the local slope is too steep to walk, and idles
//! between decisions.

use std::f32::consts::TAU;

use bevy::prelude::*;
use cs_core::Mulberry32;
use cs_terrain::HeightField;

use crate::motion::MotionState;

/// Vertical offset of an NPC capsule above the ground.
const NPC_BASE_HEIGHT: f32 = 1.0;
/// Candidate roam targets tried before falling back to the home center.
const ROAM_ATTEMPTS: u32 = 6;
/// Maximum tolerated slope: sum of |Δheight| over +4 unit offsets on both
/// horizontal axes.
const WALKABLE_SLOPE: f32 = 10.0;
/// Sampling offset for the slope probe.
const SLOPE_PROBE_OFFSET: f32 = 4.0;

/// NPC faction/type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NpcKind {
    Merchant,
    Elf,
    Guard,
    Villain,
}

impl NpcKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Merchant => "merchant",
            Self::Elf => "elf",
            Self::Guard => "guard",
            Self::Villain => "villain",
        }
    }
}

/// Capability an NPC exposes to the interaction glue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Trade,
}

/// Stable handle into the NPC registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NpcId(pub u32);

/// Parameters for spawning a single NPC.
#[derive(Debug, Clone)]
pub struct NpcSpawn {
    pub kind: NpcKind,
    pub name: String,
    pub x: f32,
    pub z: f32,
    pub roam_radius: f32,
    pub speed: f32,
    pub interaction: Option<Interaction>,
}

/// A persistent world NPC.
#[derive(Debug, Clone)]
pub struct Npc {
    pub id: NpcId,
    pub kind: NpcKind,
    pub display_name: String,
    pub motion: MotionState,
    /// Fixed home point roam targets are drawn around.
    pub roam_center: Vec2,
    pub roam_radius: f32,
    pub interaction: Option<Interaction>,
    target: Option<Vec2>,
    think_timer: f32,
    bob_phase: f32,
}

impl Npc {
    /// Current roam target, if the NPC has decided on one.
    pub fn target(&self) -> Option<Vec2> {
        self.target
    }
}

/// Owns the session's NPCs; created once at world setup, never destroyed.
#[derive(Resource, Debug)]
pub struct NpcManager {
    npcs: Vec<Npc>,
    highlighted: Option<NpcId>,
    next_id: u32,
    rng: Mulberry32,
}

impl NpcManager {
    pub fn new(seed: u32) -> Self {
        Self {
            npcs: Vec::new(),
            highlighted: None,
            next_id: 0,
            rng: Mulberry32::derive(seed, 2),
        }
    }

    pub fn spawn_npc(&mut self, spawn: NpcSpawn, terrain: &HeightField) -> NpcId {
        let id = NpcId(self.next_id);
        self.next_id += 1;
        let motion = MotionState::on_ground(spawn.x, spawn.z, spawn.speed, NPC_BASE_HEIGHT, terrain);
        self.npcs.push(Npc {
            id,
            kind: spawn.kind,
            display_name: spawn.name,
            motion,
            roam_center: Vec2::new(spawn.x, spawn.z),
            roam_radius: spawn.roam_radius,
            interaction: spawn.interaction,
            target: None,
            think_timer: 0.0,
            bob_phase: self.rng.range_f32(0.0, TAU),
        });
        id
    }

    /// Spawn `count` NPCs scattered around a camp center.
    pub fn spawn_faction_group(
        &mut self,
        kind: NpcKind,
        center: Vec2,
        count: usize,
        radius: f32,
        names: &[&str],
        speed: f32,
        terrain: &HeightField,
    ) {
        for i in 0..count {
            let angle = self.rng.range_f32(0.0, TAU);
            let distance = self.rng.range_f32(0.0, radius * 0.6);
            let name = names
                .get(i % names.len().max(1))
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("{}_npc_{}", kind.name(), i));
            self.spawn_npc(
                NpcSpawn {
                    kind,
                    name,
                    x: center.x + angle.cos() * distance,
                    z: center.y + angle.sin() * distance,
                    roam_radius: radius,
                    speed,
                    interaction: None,
                },
                terrain,
            );
        }
    }

    /// The session's persistent cast: a trader near the central road plus
    /// three faction camps.
    pub fn spawn_default_population(&mut self, terrain: &HeightField) {
        self.spawn_npc(
            NpcSpawn {
                kind: NpcKind::Merchant,
                name: "Caravan Trader".to_string(),
                x: 28.0,
                z: -24.0,
                roam_radius: 18.0,
                speed: 1.6,
                interaction: Some(Interaction::Trade),
            },
            terrain,
        );

        self.spawn_faction_group(
            NpcKind::Elf,
            Vec2::new(-260.0, 210.0),
            4,
            60.0,
            &["Scout Tir", "Archer Elin", "Druid Varen", "Ranger Liara"],
            2.6,
            terrain,
        );
        self.spawn_faction_group(
            NpcKind::Guard,
            Vec2::new(220.0, 130.0),
            4,
            55.0,
            &["Sergeant Marcus", "Warden Iria", "Corporal Darius", "Warden Arman"],
            2.4,
            terrain,
        );
        self.spawn_faction_group(
            NpcKind::Villain,
            Vec2::new(310.0, -260.0),
            3,
            45.0,
            &["Sorceress Vera", "Warlord Mor", "Brute Zath"],
            2.5,
            terrain,
        );
    }

    /// Pick a walkable roam target, or fall back to the home center after
    /// the attempt budget is exhausted.
    fn choose_target(rng: &mut Mulberry32, npc: &Npc, terrain: &HeightField) -> Vec2 {
        for _ in 0..ROAM_ATTEMPTS {
            let angle = rng.range_f32(0.0, TAU);
            let distance = rng.range_f32(0.0, npc.roam_radius);
            let x = npc.roam_center.x + angle.cos() * distance;
            let z = npc.roam_center.y + angle.sin() * distance;

            let height = terrain.height_at(x, z);
            let slope = (height - terrain.height_at(x + SLOPE_PROBE_OFFSET, z)).abs()
                + (height - terrain.height_at(x, z + SLOPE_PROBE_OFFSET)).abs();
            if slope > WALKABLE_SLOPE {
                continue;
            }
            return Vec2::new(x, z);
        }
        npc.roam_center
    }

    /// Think-and-move tick for every NPC.
    pub fn update(&mut self, delta: f32, terrain: &HeightField) {
        for npc in &mut self.npcs {
            npc.think_timer -= delta;
            if npc.think_timer <= 0.0 || npc.target.is_none() {
                npc.target = Some(Self::choose_target(&mut self.rng, npc, terrain));
                npc.think_timer = self.rng.range_f32(4.0, 10.0);
            }

            if let Some(target) = npc.target {
                npc.motion.step_toward(target, delta, terrain);
            }

            npc.bob_phase += delta * 2.2;
            npc.motion.position.y += npc.bob_phase.sin() * 0.05;
        }
    }

    /// Closest NPC with an interaction capability within `max_distance`,
    /// with its distance.
    pub fn get_nearest_interactable(
        &self,
        position: Vec3,
        max_distance: f32,
    ) -> Option<(NpcId, f32)> {
        let mut best = None;
        let mut best_sq = max_distance * max_distance;
        for npc in &self.npcs {
            if npc.interaction.is_none() {
                continue;
            }
            let dist_sq = npc.motion.position.distance_squared(position);
            if dist_sq < best_sq {
                best_sq = dist_sq;
                best = Some(npc.id);
            }
        }
        best.map(|id| (id, best_sq.sqrt()))
    }

    pub fn set_highlighted(&mut self, id: Option<NpcId>) {
        self.highlighted = id;
    }

    pub fn highlighted(&self) -> Option<NpcId> {
        self.highlighted
    }

    pub fn get(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.iter().find(|n| n.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.iter()
    }

    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }
}
