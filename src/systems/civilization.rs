use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{System, TurnContext},
    rng::RandomSource,
    systems::migration::migrate_pops_between_planets,
    world::{CivId, PlanetId, World},
};

/// Per-civilization update pass: budgets, planet economies, migration and
/// events, for every civilization in registration order.
pub struct CivilizationSystem;

impl CivilizationSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CivilizationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CivilizationSystem {
    fn name(&self) -> &str {
        "civilization"
    }

    fn run(
        &mut self,
        ctx: &TurnContext<'_>,
        world: &mut World,
        rng: &mut dyn RandomSource,
    ) -> Result<()> {
        for civ in world.civ_ids() {
            update_civilization(world, ctx, rng, civ);
        }
        Ok(())
    }

    fn warm_up(
        &mut self,
        ctx: &TurnContext<'_>,
        world: &mut World,
        rng: &mut dyn RandomSource,
    ) -> Result<()> {
        for civ in world.civ_ids() {
            update_planets(world, ctx, civ);
            check_for_migration(world, ctx, civ);
            migrate_pops_between_planets(world, ctx, rng, civ);
        }
        Ok(())
    }
}

pub fn update_civilization(
    world: &mut World,
    ctx: &TurnContext<'_>,
    rng: &mut dyn RandomSource,
    civ: CivId,
) {
    if ctx.calendar.month == ctx.rules.budget_reset_month {
        reset_budgets(world, civ);
    }
    update_popular_support(world, ctx, civ);
    update_planets(world, ctx, civ);
    check_for_migration(world, ctx, civ);
    migrate_pops_between_planets(world, ctx, rng, civ);
    update_events(world, ctx, civ);
}

fn owned_planets(world: &World, civ: CivId) -> Vec<PlanetId> {
    world
        .civilization(civ)
        .map(|civilization| civilization.planets.clone())
        .unwrap_or_default()
}

fn reset_budgets(world: &mut World, civ: CivId) {
    if let Some(civilization) = world.civilization_mut(civ) {
        civilization.revenues = 0.0;
        civilization.expenses = 0.0;
    }
}

fn update_popular_support(world: &mut World, ctx: &TurnContext<'_>, civ: CivId) {
    for id in owned_planets(world, civ) {
        if let Some(planet) = world.planet_mut(id) {
            ctx.economy.update_popular_support(planet);
        }
    }
}

/// Planet-internal sequence. Tax is remitted and development plans are
/// forcibly re-evaluated only in the tax month.
pub fn update_planets(world: &mut World, ctx: &TurnContext<'_>, civ: CivId) {
    let tax_month = ctx.calendar.month == ctx.rules.tax_month;
    let economy = ctx.economy;
    let mut tax = 0.0;

    for id in owned_planets(world, civ) {
        let Some(planet) = world.planet_mut(id) else {
            continue;
        };
        economy.update_birth_and_death(planet);
        economy.migrate_pops_between_regions(planet);
        economy.update_employment(planet);
        economy.update_shortfall_conditions(planet);
        if tax_month {
            tax += economy.send_tax_upward(planet);
            economy.adjust_development_plan(planet, true);
        } else {
            economy.adjust_development_plan(planet, false);
        }
        economy.execute_production_plan(planet);
    }

    if tax_month {
        if let Some(civilization) = world.civilization_mut(civ) {
            civilization.revenues += tax;
            debug!(civ = %civilization.name, tax, "annual tax collected");
        }
    }
}

pub fn check_for_migration(world: &mut World, ctx: &TurnContext<'_>, civ: CivId) {
    for id in owned_planets(world, civ) {
        if let Some(planet) = world.planet_mut(id) {
            ctx.economy.update_migration_status(planet);
        }
    }
}

/// Appends this turn's planet events, then prunes: events already seen are
/// dropped and new ones are kept once more, marked as seen.
pub fn update_events(world: &mut World, ctx: &TurnContext<'_>, civ: CivId) {
    let Some(civilization) = world.civilization(civ) else {
        return;
    };
    let fresh: Vec<_> = civilization
        .planets
        .iter()
        .filter_map(|id| world.planet(*id))
        .flat_map(|planet| {
            ctx.events
                .generate_planet_events(planet, civilization, ctx.calendar)
        })
        .collect();
    let generated = fresh.len() as u32;

    let Some(civilization) = world.civilization_mut(civ) else {
        return;
    };
    civilization.last_turn_events.extend(fresh);
    let before = civilization.last_turn_events.len();
    civilization.last_turn_events.retain_mut(|event| {
        if event.is_new {
            event.is_new = false;
            true
        } else {
            false
        }
    });
    let pruned = (before - civilization.last_turn_events.len()) as u32;

    world.stats.events_generated += generated;
    world.stats.events_pruned += pruned;
}
