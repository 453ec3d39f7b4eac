//! Trade matching, supply designation and ledger reconciliation.
//!
//! Every function here reads and mutates the shared agreement collection in
//! place, so planets are processed strictly one after another: a later
//! planet's matching sees the flows committed for earlier ones.

use anyhow::Result;
use tracing::{debug, info};

use crate::{
    components::{Planet, ResourceAmounts, ResourceKind},
    engine::{System, TurnContext},
    rng::RandomSource,
    trade::{AgreementStatus, DistanceIndex, TradeAgreement},
    world::{CivId, PlanetId, World},
};

pub struct TradeSystem;

impl TradeSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TradeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for TradeSystem {
    fn name(&self) -> &str {
        "trade"
    }

    fn run(
        &mut self,
        ctx: &TurnContext<'_>,
        world: &mut World,
        rng: &mut dyn RandomSource,
    ) -> Result<()> {
        update_trade_agreements(world, ctx, rng);
        update_resource_stock_balances(world);
        Ok(())
    }
}

/// Refreshes agreements for every planet of the player civilization.
pub fn update_trade_agreements(
    world: &mut World,
    ctx: &TurnContext<'_>,
    rng: &mut dyn RandomSource,
) {
    let Some(player) = world.player() else {
        return;
    };
    let civ = player.id;
    let planets = player.planets.clone();

    for id in planets {
        update_planet_trade_info(world, id);
        for kind in ResourceKind::ALL {
            let short = world
                .planet(id)
                .map(|planet| planet.ledger.has_shortfall(kind))
                .unwrap_or(false);
            if short {
                look_for_trade_partner(world, ctx, civ, kind, id);
            }
        }
        check_supply_designation(world, ctx, rng, civ, id);
        update_planet_trade_info(world, id);
    }
}

/// Nearest-first ranking of the inhabited planets sharing `needy`'s province.
pub fn rank_trade_partners(world: &World, needy: PlanetId, tie_step: f64) -> DistanceIndex {
    let mut index = DistanceIndex::new(tie_step);
    let Some(province) = world.province_of(needy) else {
        return index;
    };
    for candidate in world.province_planets(province) {
        if candidate == needy {
            continue;
        }
        let inhabited = world
            .planet(candidate)
            .map(|planet| planet.is_inhabited)
            .unwrap_or(false);
        if inhabited {
            index.insert(world.distance_between(needy, candidate), candidate);
        }
    }
    index
}

/// Walks every ranked partner once and commits one agreement per valid
/// partner whose shipment clears the minimum volume. Returns the number of
/// agreements committed.
pub fn look_for_trade_partner(
    world: &mut World,
    ctx: &TurnContext<'_>,
    civ: CivId,
    kind: ResourceKind,
    needy: PlanetId,
) -> u32 {
    let ranked = rank_trade_partners(world, needy, ctx.rules.distance_tie_step);
    let mut committed = 0;

    for partner in ranked.planets() {
        let (Some(exporter), Some(importer)) = (world.planet(partner), world.planet(needy)) else {
            continue;
        };
        if !ctx.economy.is_trade_agreement_valid(exporter, importer, kind) {
            continue;
        }

        let shortfall = importer.ledger.trade_balance(kind).min(0.0).abs();
        let quantity = exporter
            .ledger
            .export_remaining(kind)
            .min(shortfall)
            .max(0.0)
            .min(exporter.starbase_capacity_remaining());
        let mut sent = ResourceAmounts::default();
        sent.set(kind, quantity);

        if sent.total() >= ctx.rules.minimum_trade_volume {
            let agreement = TradeAgreement::new(
                partner,
                needy,
                AgreementStatus::Active,
                sent,
                world.distance_between(partner, needy),
                ctx.rules,
            );
            info!(
                exporter = %exporter.name,
                importer = %importer.name,
                resource = %kind,
                quantity,
                cost = agreement.cost(),
                "trade agreement committed"
            );
            if let Some(owner) = world.civilization_mut(civ) {
                owner.trade_agreements.push(agreement);
                world.stats.agreements_committed += 1;
                committed += 1;
            }
        }

        update_planet_trade_info(world, partner);
        update_planet_trade_info(world, needy);
    }
    committed
}

/// Rebuilds a planet's imported/exported totals and trade costs from every
/// agreement in the galaxy. Running it twice without new agreements yields
/// the same ledger.
pub fn update_planet_trade_info(world: &mut World, planet: PlanetId) {
    let mut imported = ResourceAmounts::default();
    let mut exported = ResourceAmounts::default();
    let mut import_costs = 0.0;
    let mut export_revenue = 0.0;

    for agreement in world.trade_agreements() {
        if agreement.importer() == planet {
            for (kind, quantity) in agreement.shipment().iter() {
                *imported.get_mut(kind) += quantity;
            }
            import_costs += agreement.cost();
        }
        if agreement.exporter() == planet {
            for (kind, quantity) in agreement.shipment().iter() {
                *exported.get_mut(kind) += quantity;
            }
            export_revenue += agreement.cost();
        }
    }

    if let Some(target) = world.planet_mut(planet) {
        target.ledger.imported = imported;
        target.ledger.exported = exported;
        target.import_costs = import_costs;
        target.export_revenue = export_revenue;
    }
}

/// Applies every planet's post-trade balance to its stockpile.
pub fn update_resource_stock_balances(world: &mut World) {
    for planet in &mut world.planets {
        planet.ledger.settle();
    }
}

/// Sum over the hub's short kinds of `|hub balance| + colony export remaining`,
/// counting only kinds the colony can actually export.
pub fn supply_chance(hub: &Planet, colony: &Planet) -> f64 {
    ResourceKind::ALL
        .iter()
        .filter_map(|kind| {
            let balance = hub.ledger.trade_balance(*kind);
            let available = colony.ledger.export_remaining(*kind);
            (balance < 0.0 && available > 0.0).then(|| balance.abs() + available)
        })
        .sum()
}

/// Rolls each short trade hub of the colony's province in turn; the first
/// hub whose supply chance meets the roll claims the colony.
pub fn check_supply_designation(
    world: &mut World,
    ctx: &TurnContext<'_>,
    rng: &mut dyn RandomSource,
    civ: CivId,
    planet: PlanetId,
) -> bool {
    let Some(colony) = world.planet(planet) else {
        return false;
    };
    if !colony.rank.is_colony() || colony.is_trade_hub || colony.is_supply_planet() {
        return false;
    }
    let Some(province) = world.province_of(planet) else {
        return false;
    };

    for hub_id in world.province_planets(province) {
        if hub_id == planet {
            continue;
        }
        let (Some(hub), Some(colony)) = (world.planet(hub_id), world.planet(planet)) else {
            continue;
        };
        if !hub.is_trade_hub {
            continue;
        }
        if !ResourceKind::ALL
            .iter()
            .any(|kind| hub.ledger.has_shortfall(*kind))
        {
            continue;
        }

        let chance = supply_chance(hub, colony);
        let roll = rng.range(0, ctx.rules.supply_roll_ceiling);
        debug!(colony = %colony.name, hub = %hub.name, chance, roll, "supply roll");
        if chance >= f64::from(roll) {
            info!(colony = %colony.name, hub = %hub.name, "supply planet designated");
            if let Some(colony) = world.planet_mut(planet) {
                colony.supply_to = Some(hub_id);
            }
            world.stats.supply_designations += 1;
            create_supply_trade(world, ctx, civ, planet, hub_id);
            return true;
        }
    }
    false
}

/// Levies a flat fraction of every exportable resource from the colony to
/// its hub, bounded by the colony's remaining transport capacity.
pub fn create_supply_trade(
    world: &mut World,
    ctx: &TurnContext<'_>,
    civ: CivId,
    colony: PlanetId,
    hub: PlanetId,
) {
    let Some(source) = world.planet(colony) else {
        return;
    };
    let divisor = ctx.rules.supply_planet_divisor.max(1.0);
    let mut capacity = source.starbase_capacity_remaining();
    let mut sent = ResourceAmounts::default();
    for kind in ResourceKind::ALL {
        let levy = (source.ledger.export_remaining(kind) / divisor)
            .min(capacity)
            .max(0.0);
        sent.set(kind, levy);
        capacity -= levy;
    }

    let agreement = TradeAgreement::new(
        colony,
        hub,
        AgreementStatus::SupplyTrade,
        sent,
        world.distance_between(colony, hub),
        ctx.rules,
    );
    if let Some(owner) = world.civilization_mut(civ) {
        owner.trade_agreements.push(agreement);
    }
    update_planet_trade_info(world, colony);
    update_planet_trade_info(world, hub);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::PlanetRank;
    use crate::rng::ScriptedRng;
    use crate::systems::test_support::{Galaxy, Services};

    fn food_pair(galaxy: &mut Galaxy) -> (PlanetId, PlanetId) {
        let needy = galaxy.planet("Hunger", [0.0, 0.0, 0.0], PlanetRank::NewColony);
        let donor = galaxy.planet("Plenty", [10.0, 0.0, 0.0], PlanetRank::NewColony);
        galaxy
            .planet_mut(needy)
            .ledger
            .difference
            .set(ResourceKind::Food, -100.0);
        let plenty = galaxy.planet_mut(donor);
        plenty.ledger.difference.set(ResourceKind::Food, 150.0);
        plenty.ledger.export_available.set(ResourceKind::Food, 150.0);
        plenty.starbase_capacity = 200.0;
        (needy, donor)
    }

    #[test]
    fn shortfall_is_matched_by_nearest_surplus() {
        let mut galaxy = Galaxy::new();
        let (needy, donor) = food_pair(&mut galaxy);
        let services = Services::new();
        let ctx = services.ctx(galaxy.world.calendar());

        let committed =
            look_for_trade_partner(&mut galaxy.world, &ctx, galaxy.civ, ResourceKind::Food, needy);

        assert_eq!(committed, 1);
        let agreements: Vec<_> = galaxy.world.trade_agreements().collect();
        assert_eq!(agreements.len(), 1);
        assert_eq!(agreements[0].status(), AgreementStatus::Active);
        assert_eq!(agreements[0].exporter(), donor);
        assert_eq!(agreements[0].sent(ResourceKind::Food), 100.0);
        assert_eq!(agreements[0].distance(), 10.0);
        let importer = galaxy.world.planet(needy).unwrap();
        assert_eq!(importer.ledger.imported.get(ResourceKind::Food), 100.0);
        assert!(!importer.ledger.has_shortfall(ResourceKind::Food));
    }

    #[test]
    fn shipment_is_bounded_by_starbase_capacity() {
        let mut galaxy = Galaxy::new();
        let (needy, donor) = food_pair(&mut galaxy);
        galaxy.planet_mut(donor).starbase_capacity = 30.0;
        let services = Services::new();
        let ctx = services.ctx(galaxy.world.calendar());

        look_for_trade_partner(&mut galaxy.world, &ctx, galaxy.civ, ResourceKind::Food, needy);

        let agreement = galaxy.world.trade_agreements().next().unwrap();
        assert_eq!(agreement.sent(ResourceKind::Food), 30.0);
        let exporter = galaxy.world.planet(donor).unwrap();
        assert_eq!(exporter.starbase_capacity_remaining(), 0.0);
    }

    #[test]
    fn several_suppliers_can_cover_one_shortfall() {
        let mut galaxy = Galaxy::new();
        let (needy, donor) = food_pair(&mut galaxy);
        {
            let plenty = galaxy.planet_mut(donor);
            plenty.ledger.export_available.set(ResourceKind::Food, 60.0);
        }
        let far = galaxy.planet("Granary", [40.0, 0.0, 0.0], PlanetRank::NewColony);
        {
            let granary = galaxy.planet_mut(far);
            granary.ledger.difference.set(ResourceKind::Food, 80.0);
            granary.ledger.export_available.set(ResourceKind::Food, 80.0);
            granary.starbase_capacity = 100.0;
        }
        let services = Services::new();
        let ctx = services.ctx(galaxy.world.calendar());

        let committed =
            look_for_trade_partner(&mut galaxy.world, &ctx, galaxy.civ, ResourceKind::Food, needy);

        assert_eq!(committed, 2);
        let sent: Vec<f64> = galaxy
            .world
            .trade_agreements()
            .map(|agreement| agreement.sent(ResourceKind::Food))
            .collect();
        assert_eq!(sent, vec![60.0, 40.0]);
    }

    #[test]
    fn reconciliation_is_idempotent() {
        let mut galaxy = Galaxy::new();
        let (needy, donor) = food_pair(&mut galaxy);
        let services = Services::new();
        let ctx = services.ctx(galaxy.world.calendar());
        look_for_trade_partner(&mut galaxy.world, &ctx, galaxy.civ, ResourceKind::Food, needy);

        update_planet_trade_info(&mut galaxy.world, needy);
        update_planet_trade_info(&mut galaxy.world, donor);
        let first = galaxy.world.planet(needy).unwrap().ledger.clone();
        let first_costs = galaxy.world.planet(needy).unwrap().import_costs;
        update_planet_trade_info(&mut galaxy.world, needy);
        update_planet_trade_info(&mut galaxy.world, donor);

        let second = galaxy.world.planet(needy).unwrap();
        assert_eq!(second.ledger, first);
        assert_eq!(second.import_costs, first_costs);
    }

    #[test]
    fn uninhabited_and_foreign_province_planets_are_not_ranked() {
        let mut galaxy = Galaxy::new();
        let (needy, donor) = food_pair(&mut galaxy);
        let barren = galaxy.planet("Barren", [1.0, 0.0, 0.0], PlanetRank::Outpost);
        galaxy.planet_mut(barren).is_inhabited = false;
        let elsewhere = galaxy.world.add_province("Rim");
        let system = galaxy.world.add_system("Far", elsewhere, [2.0, 0.0, 0.0]);
        galaxy
            .world
            .add_planet(crate::components::Planet::new("Outsider", system));

        let ranked: Vec<PlanetId> = rank_trade_partners(&galaxy.world, needy, 0.001)
            .planets()
            .collect();
        assert_eq!(ranked, vec![donor]);
    }

    #[test]
    fn stock_settlement_applies_trade_balance() {
        let mut galaxy = Galaxy::new();
        let (needy, donor) = food_pair(&mut galaxy);
        let services = Services::new();
        let ctx = services.ctx(galaxy.world.calendar());
        let mut rng = ScriptedRng::default();

        update_trade_agreements(&mut galaxy.world, &ctx, &mut rng);
        update_resource_stock_balances(&mut galaxy.world);

        let hungry = galaxy.world.planet(needy).unwrap();
        assert_eq!(hungry.ledger.stored.get(ResourceKind::Food), 0.0);
        let plenty = galaxy.world.planet(donor).unwrap();
        assert_eq!(plenty.ledger.stored.get(ResourceKind::Food), 50.0);
    }

    #[test]
    fn short_hub_claims_colony_as_supply_planet() {
        let mut galaxy = Galaxy::new();
        let hub = galaxy.planet("Nexus", [0.0, 0.0, 0.0], PlanetRank::ProvinceCapital);
        let colony = galaxy.planet("Orchard", [5.0, 0.0, 0.0], PlanetRank::EstablishedColony);
        {
            let nexus = galaxy.planet_mut(hub);
            nexus.is_trade_hub = true;
            nexus.ledger.difference.set(ResourceKind::Energy, -30.0);
        }
        {
            let orchard = galaxy.planet_mut(colony);
            orchard.ledger.export_available.set(ResourceKind::Energy, 40.0);
            orchard.ledger.export_available.set(ResourceKind::Food, 20.0);
            orchard.starbase_capacity = 100.0;
        }
        let services = Services::new();
        let ctx = services.ctx(galaxy.world.calendar());
        let mut rng = ScriptedRng::new([70]);

        assert_eq!(
            supply_chance(
                galaxy.world.planet(hub).unwrap(),
                galaxy.world.planet(colony).unwrap()
            ),
            70.0
        );
        assert!(check_supply_designation(
            &mut galaxy.world,
            &ctx,
            &mut rng,
            galaxy.civ,
            colony
        ));

        let orchard = galaxy.world.planet(colony).unwrap();
        assert_eq!(orchard.supply_to, Some(hub));
        let agreement = galaxy.world.trade_agreements().next().unwrap();
        assert_eq!(agreement.status(), AgreementStatus::SupplyTrade);
        assert_eq!(agreement.sent(ResourceKind::Energy), 10.0);
        assert_eq!(agreement.sent(ResourceKind::Food), 5.0);
        assert_eq!(
            galaxy.world.planet(hub).unwrap().ledger.imported.get(ResourceKind::Energy),
            10.0
        );
    }

    #[test]
    fn failed_supply_roll_leaves_colony_alone() {
        let mut galaxy = Galaxy::new();
        let hub = galaxy.planet("Nexus", [0.0, 0.0, 0.0], PlanetRank::ProvinceCapital);
        let colony = galaxy.planet("Orchard", [5.0, 0.0, 0.0], PlanetRank::NewColony);
        {
            let nexus = galaxy.planet_mut(hub);
            nexus.is_trade_hub = true;
            nexus.ledger.difference.set(ResourceKind::Rare, -1.0);
        }
        galaxy
            .planet_mut(colony)
            .ledger
            .export_available
            .set(ResourceKind::Rare, 1.0);
        let services = Services::new();
        let ctx = services.ctx(galaxy.world.calendar());
        let mut rng = ScriptedRng::new([150]);

        assert!(!check_supply_designation(
            &mut galaxy.world,
            &ctx,
            &mut rng,
            galaxy.civ,
            colony
        ));
        assert!(!galaxy.world.planet(colony).unwrap().is_supply_planet());
        assert_eq!(galaxy.world.trade_agreements().count(), 0);
    }

    #[test]
    fn hubs_and_capitals_are_never_designated() {
        let mut galaxy = Galaxy::new();
        let capital = galaxy.planet("Throne", [0.0, 0.0, 0.0], PlanetRank::ImperialCapital);
        let services = Services::new();
        let ctx = services.ctx(galaxy.world.calendar());
        let mut rng = ScriptedRng::new([0]);
        assert!(!check_supply_designation(
            &mut galaxy.world,
            &ctx,
            &mut rng,
            galaxy.civ,
            capital
        ));
        assert_eq!(rng.remaining(), 1, "no roll is drawn for ineligible planets");
    }

    fn short_hub(galaxy: &mut Galaxy, name: &str, position: [f64; 3], food: f64) -> PlanetId {
        let hub = galaxy.planet(name, position, PlanetRank::ProvinceCapital);
        let planet = galaxy.planet_mut(hub);
        planet.is_trade_hub = true;
        planet.ledger.difference.set(ResourceKind::Food, food);
        hub
    }

    #[test]
    fn zero_chance_meets_zero_roll() {
        let mut galaxy = Galaxy::new();
        let hub = short_hub(&mut galaxy, "Nexus", [0.0, 0.0, 0.0], -10.0);
        let colony = galaxy.planet("Barren", [5.0, 0.0, 0.0], PlanetRank::NewColony);
        let services = Services::new();
        let ctx = services.ctx(galaxy.world.calendar());
        let mut rng = ScriptedRng::new([0]);

        assert!(check_supply_designation(
            &mut galaxy.world,
            &ctx,
            &mut rng,
            galaxy.civ,
            colony
        ));
        assert_eq!(galaxy.world.planet(colony).unwrap().supply_to, Some(hub));
        let agreement = galaxy.world.trade_agreements().next().unwrap();
        assert_eq!(agreement.total_sent(), 0.0);
    }

    #[test]
    fn first_hub_meeting_its_roll_wins() {
        let mut galaxy = Galaxy::new();
        let first = short_hub(&mut galaxy, "Nexus", [0.0, 0.0, 0.0], -10.0);
        let second = short_hub(&mut galaxy, "Meridian", [9.0, 0.0, 0.0], -10.0);
        let third = short_hub(&mut galaxy, "Vantage", [18.0, 0.0, 0.0], -10.0);
        let colony = galaxy.planet("Orchard", [5.0, 0.0, 0.0], PlanetRank::NewColony);
        galaxy
            .planet_mut(colony)
            .ledger
            .export_available
            .set(ResourceKind::Food, 20.0);
        let services = Services::new();
        let ctx = services.ctx(galaxy.world.calendar());
        // chance is 30 against every hub
        let mut rng = ScriptedRng::new([31, 30, 0]);

        assert!(check_supply_designation(
            &mut galaxy.world,
            &ctx,
            &mut rng,
            galaxy.civ,
            colony
        ));
        assert_eq!(galaxy.world.planet(colony).unwrap().supply_to, Some(second));
        assert_eq!(rng.remaining(), 1, "evaluation stops at the winning hub");
        let agreement = galaxy.world.trade_agreements().next().unwrap();
        assert_eq!(agreement.importer(), second);
        assert_ne!(agreement.importer(), first);
        assert_ne!(agreement.importer(), third);
    }

    #[test]
    fn hub_without_shortfall_draws_no_roll() {
        let mut galaxy = Galaxy::new();
        short_hub(&mut galaxy, "Nexus", [0.0, 0.0, 0.0], 25.0);
        let colony = galaxy.planet("Orchard", [5.0, 0.0, 0.0], PlanetRank::NewColony);
        galaxy
            .planet_mut(colony)
            .ledger
            .export_available
            .set(ResourceKind::Food, 20.0);
        let services = Services::new();
        let ctx = services.ctx(galaxy.world.calendar());
        let mut rng = ScriptedRng::new([0]);

        assert!(!check_supply_designation(
            &mut galaxy.world,
            &ctx,
            &mut rng,
            galaxy.civ,
            colony
        ));
        assert_eq!(rng.remaining(), 1);
        assert!(!galaxy.world.planet(colony).unwrap().is_supply_planet());
    }

    #[test]
    fn supply_levy_is_clamped_kind_by_kind_to_capacity() {
        let mut galaxy = Galaxy::new();
        let hub = short_hub(&mut galaxy, "Nexus", [0.0, 0.0, 0.0], -10.0);
        let colony = galaxy.planet("Orchard", [5.0, 0.0, 0.0], PlanetRank::EstablishedColony);
        {
            let orchard = galaxy.planet_mut(colony);
            orchard.ledger.export_available.set(ResourceKind::Food, 40.0);
            orchard.ledger.export_available.set(ResourceKind::Energy, 40.0);
            orchard.ledger.export_available.set(ResourceKind::Rare, 40.0);
            orchard.starbase_capacity = 15.0;
        }
        let services = Services::new();
        let ctx = services.ctx(galaxy.world.calendar());

        create_supply_trade(&mut galaxy.world, &ctx, galaxy.civ, colony, hub);

        let agreement = galaxy.world.trade_agreements().next().unwrap();
        assert_eq!(agreement.status(), AgreementStatus::SupplyTrade);
        assert_eq!(agreement.sent(ResourceKind::Food), 10.0);
        assert_eq!(agreement.sent(ResourceKind::Energy), 5.0);
        assert_eq!(agreement.sent(ResourceKind::Rare), 0.0);
        assert_eq!(agreement.total_sent(), 15.0);

        let orchard = galaxy.world.planet(colony).unwrap();
        assert_eq!(orchard.ledger.exported.total(), 15.0);
        assert_eq!(orchard.starbase_capacity_remaining(), 0.0);
    }

    #[test]
    fn ranking_completes_for_unreachable_distances() {
        let mut galaxy = Galaxy::new();
        let needy = galaxy.planet("Hunger", [0.0, 0.0, 0.0], PlanetRank::NewColony);
        let far = galaxy.planet("Far", [1.0e17, 0.0, 0.0], PlanetRank::NewColony);
        let farther = galaxy.planet("Farther", [1.0e17, 0.0, 0.0], PlanetRank::NewColony);

        let index = rank_trade_partners(&galaxy.world, needy, 0.001);
        let ranked: Vec<PlanetId> = index.planets().collect();
        assert_eq!(ranked, vec![far, farther]);
    }
}
