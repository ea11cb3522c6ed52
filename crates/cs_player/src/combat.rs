//! Combat resolution against caravans.
//!
//! Resolution is a single transaction: the caravan is removed from the
//! registry first, then loot is credited and the injury roll applied.
//! A stale caravan handle resolves to nothing, so double-triggered
//! attacks cannot double-pay.

use cs_core::Mulberry32;
use cs_entity::{CaravanId, CaravanKind, CaravanManager};

use crate::{BodyParts, Player};

/// Chance that a successful raid costs the player a leg.
pub const INJURY_CHANCE: f64 = 0.3;

/// Chance of a bonus cargo item on top of the gold payout.
const MERCHANT_CARGO_CHANCE: f64 = 0.35;
const IMPERIAL_CARGO_CHANCE: f64 = 0.25;

const MERCHANT_CARGO: &[&str] = &["Silk Bale", "Spice Pouch", "Amber Trinket"];
const IMPERIAL_CARGO: &[&str] = &["Imperial Rations", "Steel Ingot"];

/// Outcome of a resolved caravan raid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LootResult {
    pub gold: u32,
    pub items: Vec<String>,
    pub flavor: &'static str,
}

/// Roll the loot table for a caravan kind.
pub fn roll_loot(kind: CaravanKind, rng: &mut Mulberry32) -> LootResult {
    match kind {
        CaravanKind::Merchant => {
            let gold = 50 + (rng.next_f64() * 100.0) as u32;
            let mut items = Vec::new();
            if rng.chance(MERCHANT_CARGO_CHANCE) {
                items.push(MERCHANT_CARGO[rng.index(MERCHANT_CARGO.len())].to_string());
            }
            LootResult {
                gold,
                items,
                flavor: "The merchant's strongbox splits open.",
            }
        }
        CaravanKind::ImperialSupply => {
            let gold = 20 + (rng.next_f64() * 50.0) as u32;
            let mut items = Vec::new();
            if rng.chance(IMPERIAL_CARGO_CHANCE) {
                items.push(IMPERIAL_CARGO[rng.index(IMPERIAL_CARGO.len())].to_string());
            }
            LootResult {
                gold,
                items,
                flavor: "Imperial supplies spill across the road.",
            }
        }
    }
}

/// Resolve a player attack on a caravan.
///
/// Returns `None` when the handle no longer resolves (already destroyed
/// or expired); the player is untouched in that case.
pub fn attack_caravan(
    player: &mut Player,
    caravans: &mut CaravanManager,
    id: CaravanId,
    rng: &mut Mulberry32,
) -> Option<LootResult> {
    let caravan = caravans.remove_caravan(id)?;

    let loot = roll_loot(caravan.kind, rng);
    player.add_loot(&loot);

    if rng.chance(INJURY_CHANCE) {
        // Uniform pick between the two legs; an already-lost leg absorbs
        // the injury as a no-op instead of redirecting it.
        let leg = [BodyParts::LEFT_LEG, BodyParts::RIGHT_LEG][rng.index(2)];
        player.body_parts.remove(leg);
    }

    Some(loot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_terrain::HeightField;

    fn flat_terrain() -> HeightField {
        HeightField::from_heights(600.0, 2, 10.0, vec![0.0; 9])
    }

    fn player() -> Player {
        Player::new(&flat_terrain())
    }

    #[test]
    fn merchant_gold_stays_in_range() {
        let mut rng = Mulberry32::new(9);
        for _ in 0..200 {
            let loot = roll_loot(CaravanKind::Merchant, &mut rng);
            assert!((50..150).contains(&loot.gold));
        }
    }

    #[test]
    fn imperial_gold_stays_in_range() {
        let mut rng = Mulberry32::new(9);
        for _ in 0..200 {
            let loot = roll_loot(CaravanKind::ImperialSupply, &mut rng);
            assert!((20..70).contains(&loot.gold));
        }
    }

    #[test]
    fn attack_credits_loot_once() {
        let terrain = flat_terrain();
        let mut player = player();
        let mut caravans = CaravanManager::new(17);
        let mut rng = Mulberry32::new(4);
        let id = caravans.spawn_caravan(&terrain);

        let loot = attack_caravan(&mut player, &mut caravans, id, &mut rng).unwrap();
        assert_eq!(player.gold, loot.gold);
        assert_eq!(player.inventory, loot.items);
        assert!(caravans.is_empty());
    }

    #[test]
    fn second_attack_on_same_handle_is_a_noop() {
        let terrain = flat_terrain();
        let mut player = player();
        let mut caravans = CaravanManager::new(17);
        let mut rng = Mulberry32::new(4);
        let id = caravans.spawn_caravan(&terrain);

        attack_caravan(&mut player, &mut caravans, id, &mut rng).unwrap();
        let gold = player.gold;
        let legs = player.body_parts;
        assert!(attack_caravan(&mut player, &mut caravans, id, &mut rng).is_none());
        assert_eq!(player.gold, gold);
        assert_eq!(player.body_parts, legs);
    }

    #[test]
    fn injuries_only_remove_intact_legs() {
        let terrain = flat_terrain();
        let mut player = player();
        let mut caravans = CaravanManager::new(1);
        let mut rng = Mulberry32::new(1);

        // Raid until both legs are gone, then keep raiding; the part mask
        // must never lose anything but legs and never underflow.
        for _ in 0..200 {
            let id = caravans.spawn_caravan(&terrain);
            attack_caravan(&mut player, &mut caravans, id, &mut rng).unwrap();
            let lost = BodyParts::all().difference(player.body_parts);
            assert!(BodyParts::LEFT_LEG.union(BodyParts::RIGHT_LEG).contains(lost));
        }
        assert!(!player.body_parts.legs_intact());
        assert!(player.body_parts.contains(BodyParts::LEFT_ARM));
    }

    #[test]
    fn lost_leg_does_not_redirect_injuries() {
        let terrain = flat_terrain();
        let mut survivors = 0;
        for seed in 0..2000 {
            let mut player = player();
            player.body_parts.remove(BodyParts::LEFT_LEG);
            let mut caravans = CaravanManager::new(seed);
            let mut rng = Mulberry32::new(seed);
            let id = caravans.spawn_caravan(&terrain);
            attack_caravan(&mut player, &mut caravans, id, &mut rng).unwrap();
            if player.body_parts.contains(BodyParts::RIGHT_LEG) {
                survivors += 1;
            }
        }
        // The injury picks one of two legs uniformly and no-ops on the
        // missing one, so the remaining leg is lost in ~15% of raids,
        // not ~30%.
        assert!((1600..1800).contains(&survivors), "survivors = {survivors}");
    }

    #[test]
    fn injury_rate_is_roughly_thirty_percent() {
        let terrain = flat_terrain();
        let mut injuries = 0;
        for seed in 0..300 {
            let mut player = player();
            let mut caravans = CaravanManager::new(seed);
            let mut rng = Mulberry32::new(seed);
            let id = caravans.spawn_caravan(&terrain);
            attack_caravan(&mut player, &mut caravans, id, &mut rng).unwrap();
            if !player.body_parts.legs_intact() {
                injuries += 1;
            }
        }
        assert!((50..130).contains(&injuries), "injuries = {injuries}");
    }
}
