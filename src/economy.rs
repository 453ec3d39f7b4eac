//! Planet-internal services the turn phases call into.
//!
//! The turn engine only depends on [`PlanetEconomy`]. [`BasicPlanetEconomy`]
//! is a small reference model so scenarios run end to end; its formulas are
//! not part of the turn contract.

use crate::components::{Planet, ResourceKind, Sector, SectorLevels};

pub trait PlanetEconomy {
    fn update_popular_support(&self, planet: &mut Planet);
    fn update_birth_and_death(&self, planet: &mut Planet);
    /// Moves pops between regions of the same planet.
    fn migrate_pops_between_regions(&self, planet: &mut Planet);
    fn update_employment(&self, planet: &mut Planet);
    /// Recomputes `ledger.difference` and `ledger.export_available`.
    fn update_shortfall_conditions(&self, planet: &mut Planet);
    /// Returns the tax remitted to the owning civilization.
    fn send_tax_upward(&self, planet: &mut Planet) -> f64;
    fn adjust_development_plan(&self, planet: &mut Planet, force: bool);
    fn execute_production_plan(&self, planet: &mut Planet);
    /// Flags pops that want to leave the planet.
    fn update_migration_status(&self, planet: &mut Planet);
    fn is_trade_agreement_valid(
        &self,
        exporter: &Planet,
        importer: &Planet,
        kind: ResourceKind,
    ) -> bool;
}

const FOOD_PER_FARM: f64 = 2.0;
const ENERGY_PER_PLANT: f64 = 2.0;
const ALPHA_PER_MINE: f64 = 1.0;
const RARE_PER_MINE: f64 = 0.25;
const HEAVY_PER_FACTORY: f64 = 1.0;

const FOOD_PER_POP: f64 = 1.0;
const ENERGY_PER_POP: f64 = 0.5;
const ALPHA_PER_FACTORY: f64 = 0.3;
const HEAVY_PER_POP: f64 = 0.1;
const RARE_PER_POP: f64 = 0.05;

const DEVELOPMENT_STEP: f64 = 0.25;
const LEAVE_HAPPINESS: f64 = 30.0;

#[derive(Debug, Clone, Default)]
pub struct BasicPlanetEconomy;

impl BasicPlanetEconomy {
    pub fn new() -> Self {
        Self
    }
}

fn sector_for_shortfall(kind: ResourceKind) -> Sector {
    match kind {
        ResourceKind::Food => Sector::Farming,
        ResourceKind::Energy => Sector::HighTech,
        ResourceKind::Alpha | ResourceKind::Rare => Sector::Mining,
        ResourceKind::Heavy => Sector::Manufacturing,
    }
}

impl PlanetEconomy for BasicPlanetEconomy {
    fn update_popular_support(&self, planet: &mut Planet) {
        let mut total = 0.0;
        let mut count = 0usize;
        for pop in planet.pops_mut() {
            pop.support = (pop.support + (pop.happiness - 50.0) / 5_000.0).clamp(0.0, 1.0);
            total += pop.support;
            count += 1;
        }
        if count > 0 {
            planet.popular_support = total / count as f64;
        }
    }

    fn update_birth_and_death(&self, planet: &mut Planet) {
        // No growth model here; only the per-turn flow counters roll over.
        for region in &mut planet.regions {
            region.emigrated_last_turn = 0;
            region.immigrated_last_turn = 0;
        }
    }

    fn migrate_pops_between_regions(&self, planet: &mut Planet) {
        let mut open: Vec<SectorLevels> = planet.regions.iter().map(|r| r.sectors.clone()).collect();
        let mut moves = Vec::new();
        for (from, region) in planet.regions.iter().enumerate() {
            for pop in region.pops.iter().filter(|pop| !pop.employed) {
                let Some(sector) = pop.class.sector() else {
                    continue;
                };
                let target = planet
                    .regions
                    .iter()
                    .enumerate()
                    .filter(|(index, candidate)| *index != from && candidate.habitable)
                    .map(|(index, _)| (index, open[index].get(sector).vacancies()))
                    .filter(|(_, vacancies)| *vacancies >= 1.0)
                    .max_by(|a, b| a.1.total_cmp(&b.1));
                if let Some((to, _)) = target {
                    open[to].get_mut(sector).staffed += 1.0;
                    moves.push((from, pop.id, to));
                }
            }
        }

        for (from, id, to) in moves {
            let Some(position) = planet.regions[from].pop_position(id) else {
                continue;
            };
            let mut pop = planet.regions[from].pops.remove(position);
            pop.region = planet.regions[to].id;
            planet.regions[to].pops.push(pop);
        }
    }

    fn update_employment(&self, planet: &mut Planet) {
        for region in &mut planet.regions {
            let mut filled = SectorLevels::default();
            for pop in &mut region.pops {
                pop.employed = match pop.class.sector() {
                    Some(sector) => {
                        let slot = filled.get_mut(sector);
                        if slot.staffed + 1.0 <= region.sectors.get(sector).capacity {
                            slot.staffed += 1.0;
                            true
                        } else {
                            false
                        }
                    }
                    None => true,
                };
                if pop.employed {
                    pop.happiness = (pop.happiness + 1.0).min(100.0);
                    pop.unrest = (pop.unrest - 0.005).max(0.0);
                } else {
                    pop.happiness = (pop.happiness - 2.0).max(0.0);
                    pop.unrest = (pop.unrest + 0.01).min(1.0);
                }
            }
            for sector in Sector::ALL {
                region.sectors.get_mut(sector).staffed = filled.get(sector).staffed;
            }
        }
    }

    fn update_shortfall_conditions(&self, planet: &mut Planet) {
        let staffed = |sector: Sector| -> f64 {
            planet
                .regions
                .iter()
                .map(|region| region.sectors.get(sector).staffed)
                .sum()
        };
        let farms = staffed(Sector::Farming);
        let plants = staffed(Sector::HighTech);
        let mines = staffed(Sector::Mining);
        let factories = staffed(Sector::Manufacturing);
        let pops = planet.population() as f64;

        let ledger = &mut planet.ledger;
        ledger
            .difference
            .set(ResourceKind::Food, farms * FOOD_PER_FARM - pops * FOOD_PER_POP);
        ledger.difference.set(
            ResourceKind::Energy,
            plants * ENERGY_PER_PLANT - pops * ENERGY_PER_POP,
        );
        ledger.difference.set(
            ResourceKind::Alpha,
            mines * ALPHA_PER_MINE - factories * ALPHA_PER_FACTORY,
        );
        ledger.difference.set(
            ResourceKind::Heavy,
            factories * HEAVY_PER_FACTORY - pops * HEAVY_PER_POP,
        );
        ledger
            .difference
            .set(ResourceKind::Rare, mines * RARE_PER_MINE - pops * RARE_PER_POP);
        for kind in ResourceKind::ALL {
            let surplus = ledger.difference.get(kind).max(0.0);
            ledger.export_available.set(kind, surplus);
        }
    }

    fn send_tax_upward(&self, planet: &mut Planet) -> f64 {
        planet.population() as f64 * planet.tax_rate
    }

    fn adjust_development_plan(&self, planet: &mut Planet, force: bool) {
        if !force && planet.development_focus.is_some() {
            return;
        }
        let worst = ResourceKind::ALL
            .iter()
            .map(|kind| (*kind, planet.ledger.difference.get(*kind)))
            .filter(|(_, difference)| *difference < 0.0)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        planet.development_focus = worst.map(|(kind, _)| sector_for_shortfall(kind));
    }

    fn execute_production_plan(&self, planet: &mut Planet) {
        let Some(sector) = planet.development_focus else {
            return;
        };
        if let Some(region) = planet.regions.iter_mut().find(|r| r.habitable) {
            region.sectors.get_mut(sector).capacity += DEVELOPMENT_STEP;
        }
    }

    fn update_migration_status(&self, planet: &mut Planet) {
        for pop in planet.pops_mut() {
            if !pop.employed && pop.happiness < LEAVE_HAPPINESS {
                pop.migrating_off_planet = true;
            }
        }
    }

    fn is_trade_agreement_valid(
        &self,
        exporter: &Planet,
        importer: &Planet,
        kind: ResourceKind,
    ) -> bool {
        exporter.id != importer.id
            && exporter.is_inhabited
            && exporter.ledger.export_remaining(kind) > 0.0
            && exporter.starbase_capacity_remaining() > 0.0
    }
}
