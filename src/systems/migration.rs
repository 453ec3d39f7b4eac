//! Inter-planet relocation of pops that want to leave their planet.

use tracing::{debug, info};

use crate::{
    components::{Planet, PopClass},
    config::RulesConfig,
    engine::TurnContext,
    rng::RandomSource,
    world::{CivId, Civilization, PlanetId, PopId, RegionId, World},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MigrationOutcome {
    Relocated { to: PlanetId, region: RegionId },
    /// The best destination did not beat the threshold plus roll.
    BelowThreshold { best: f64, roll: i32 },
    /// The civilization has no other planet to move to.
    NoDestination,
    NoHabitableRegion { to: PlanetId },
    /// The pop was no longer where the snapshot put it.
    Missing,
}

impl MigrationOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            MigrationOutcome::Relocated { .. } | MigrationOutcome::Missing
        )
    }
}

/// Attractiveness of `candidate` for a pop of `class` that sits `distance`
/// away.
pub fn migration_value(
    rules: &RulesConfig,
    distance: f64,
    candidate: &Planet,
    class: PopClass,
) -> f64 {
    (rules.migration_distance_base - distance)
        + candidate.adjusted_habitability
        + candidate.base_value
        + rules.vacancy_weight * candidate.vacancies(class)
}

/// Highest-valued planet of `civ` other than `origin`. Ties keep the planet
/// encountered first.
pub fn choose_destination(
    world: &World,
    rules: &RulesConfig,
    civ: &Civilization,
    origin: PlanetId,
    class: PopClass,
) -> Option<(PlanetId, f64)> {
    let mut best: Option<(PlanetId, f64)> = None;
    for id in civ.planets.iter().copied().filter(|id| *id != origin) {
        let Some(candidate) = world.planet(id) else {
            continue;
        };
        let value = migration_value(rules, world.distance_between(origin, id), candidate, class);
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((id, value)),
        }
    }
    best
}

/// Runs the full decision for one flagged pop: value check, region pick and
/// either relocation or the frustration penalty.
pub fn resolve_migration(
    world: &mut World,
    ctx: &TurnContext<'_>,
    rng: &mut dyn RandomSource,
    civ: CivId,
    origin: PlanetId,
    pop: PopId,
) -> MigrationOutcome {
    let class = world
        .planet(origin)
        .and_then(|planet| planet.pops().find(|candidate| candidate.id == pop))
        .map(|found| found.class);
    let (Some(class), Some(civilization)) = (class, world.civilization(civ)) else {
        return MigrationOutcome::Missing;
    };

    let destination = choose_destination(world, ctx.rules, civilization, origin, class);
    let roll = rng.range(0, ctx.rules.migration_roll_ceiling);

    let outcome = match destination {
        None => MigrationOutcome::NoDestination,
        Some((_, best)) if best <= ctx.rules.stellar_migration_threshold + f64::from(roll) => {
            MigrationOutcome::BelowThreshold { best, roll }
        }
        Some((to, _)) => {
            let regions = world
                .planet(to)
                .map(Planet::habitable_regions)
                .unwrap_or_default();
            match rng.pick(regions.len()).map(|index| regions[index]) {
                Some(region) => {
                    if relocate(world, ctx, origin, pop, to, region) {
                        MigrationOutcome::Relocated { to, region }
                    } else {
                        MigrationOutcome::Missing
                    }
                }
                None => MigrationOutcome::NoHabitableRegion { to },
            }
        }
    };

    if outcome.is_failure() {
        frustrate(world, origin, pop, ctx.rules.frustration_penalty);
        debug!(pop = %pop, origin = %origin, ?outcome, "migration failed");
    }
    outcome
}

/// Moves a pop between planets. The pop is returned to its home region if
/// the destination cannot take it, so it is never lost.
pub fn relocate(
    world: &mut World,
    ctx: &TurnContext<'_>,
    origin: PlanetId,
    pop: PopId,
    destination: PlanetId,
    region: RegionId,
) -> bool {
    let taken = world.planet_mut(origin).and_then(|source| {
        source.regions.iter_mut().find_map(|home| {
            let position = home.pop_position(pop)?;
            home.emigrated_last_turn += 1;
            Some((home.id, home.pops.remove(position)))
        })
    });
    let Some((home, mut migrant)) = taken else {
        return false;
    };

    match world
        .planet_mut(destination)
        .and_then(|planet| planet.region_mut(region))
    {
        Some(target) => {
            migrant.planet = destination;
            migrant.region = region;
            migrant.happiness = ctx.rules.settled_happiness;
            migrant.migrating_off_planet = false;
            target.immigrated_last_turn += 1;
            target.pops.push(migrant);
        }
        None => {
            if let Some(source) = world
                .planet_mut(origin)
                .and_then(|planet| planet.region_mut(home))
            {
                source.emigrated_last_turn = source.emigrated_last_turn.saturating_sub(1);
                source.pops.push(migrant);
            }
            return false;
        }
    }

    if let Some(planet) = world.planet_mut(destination) {
        ctx.economy.migrate_pops_between_regions(planet);
        info!(pop = %pop, from = %origin, to = %planet.name, "pop migrated");
    }
    true
}

fn frustrate(world: &mut World, origin: PlanetId, pop: PopId, penalty: f64) {
    let found = world
        .planet_mut(origin)
        .and_then(|planet| planet.pops_mut().find(|candidate| candidate.id == pop));
    if let Some(unhappy) = found {
        unhappy.unrest += penalty;
        unhappy.support -= penalty;
    }
}

/// Resolves every pop of `civ` flagged for off-planet migration. The set of
/// flagged pops is captured before any pop moves.
pub fn migrate_pops_between_planets(
    world: &mut World,
    ctx: &TurnContext<'_>,
    rng: &mut dyn RandomSource,
    civ: CivId,
) {
    let Some(civilization) = world.civilization(civ) else {
        return;
    };
    let flagged: Vec<(PlanetId, PopId)> = civilization
        .planets
        .iter()
        .filter_map(|id| world.planet(*id))
        .flat_map(|planet| {
            planet
                .pops()
                .filter(|pop| pop.migrating_off_planet)
                .map(move |pop| (planet.id, pop.id))
        })
        .collect();

    for (origin, pop) in flagged {
        match resolve_migration(world, ctx, rng, civ, origin, pop) {
            MigrationOutcome::Relocated { .. } => world.stats.migrations_succeeded += 1,
            MigrationOutcome::Missing => {}
            _ => world.stats.migrations_failed += 1,
        }
    }
}
