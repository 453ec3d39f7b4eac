use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    config::RulesConfig,
    economy::{BasicPlanetEconomy, PlanetEconomy},
    events::{EventGenerator, UnrestEventGenerator},
    rng::{RandomSource, SimRng},
    systems::{CivilizationSystem, LeaderSystem, TradeSystem},
    world::{Calendar, TurnStats, World},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub rules: RulesConfig,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
    economy: Box<dyn PlanetEconomy>,
    events: Box<dyn EventGenerator>,
    rng: Option<Box<dyn RandomSource>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
            economy: Box::new(BasicPlanetEconomy::new()),
            events: Box::new(UnrestEventGenerator::default()),
            rng: None,
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Trade, then the per-civilization pass, then leader replenishment.
    pub fn with_standard_phases(self) -> Self {
        self.with_system(TradeSystem::new())
            .with_system(CivilizationSystem::new())
            .with_system(LeaderSystem::new())
    }

    pub fn with_economy(mut self, economy: impl PlanetEconomy + 'static) -> Self {
        self.economy = Box::new(economy);
        self
    }

    pub fn with_events(mut self, events: impl EventGenerator + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    /// Replaces the seeded generator, e.g. with a scripted source for replay.
    pub fn with_rng(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    pub fn build(self) -> Engine {
        let seed = self.settings.seed;
        Engine {
            rng: self.rng.unwrap_or_else(|| Box::new(SimRng::seeded(seed))),
            systems: self.systems,
            economy: self.economy,
            events: self.events,
            settings: self.settings,
            turn: 0,
        }
    }
}

pub struct Engine {
    rng: Box<dyn RandomSource>,
    systems: Vec<Box<dyn System>>,
    economy: Box<dyn PlanetEconomy>,
    events: Box<dyn EventGenerator>,
    settings: EngineSettings,
    turn: u64,
}

impl Engine {
    /// Pre-game stabilisation: runs every phase's warm-up a fixed number of
    /// times. The calendar and leader action points are left untouched.
    pub fn bootstrap(&mut self, world: &mut World) -> Result<()> {
        let Engine {
            rng,
            systems,
            economy,
            events,
            settings,
            ..
        } = self;
        world.stats = TurnStats::default();
        let ctx = TurnContext {
            turn: 0,
            calendar: world.calendar(),
            rules: &settings.rules,
            economy: &**economy,
            events: &**events,
        };
        for pass in 0..settings.rules.bootstrap_passes {
            debug!(pass, "bootstrap pass");
            for system in systems.iter_mut() {
                system
                    .warm_up(&ctx, world, &mut **rng)
                    .with_context(|| format!("warm-up of '{}' failed", system.name()))?;
            }
        }
        Ok(())
    }

    /// Advances the galaxy by one player turn.
    pub fn execute_new_turn(&mut self, world: &mut World) -> Result<TurnSummary> {
        self.turn += 1;
        let turn = self.turn;
        let Engine {
            rng,
            systems,
            economy,
            events,
            settings,
            ..
        } = self;
        world.stats = TurnStats::default();
        let ctx = TurnContext {
            turn,
            calendar: world.calendar(),
            rules: &settings.rules,
            economy: &**economy,
            events: &**events,
        };

        let mut system_reports = Vec::with_capacity(systems.len());
        for system in systems.iter_mut() {
            let start = Instant::now();
            system
                .run(&ctx, world, &mut **rng)
                .with_context(|| format!("phase '{}' failed on turn {turn}", system.name()))?;
            system_reports.push(SystemRunReport {
                name: system.name().to_string(),
                duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
            });
        }

        world.advance_calendar(settings.rules.months_per_year);
        world.request_graphic_refresh = true;
        info!(turn, calendar = %world.calendar(), "turn complete");

        Ok(TurnSummary {
            turn,
            calendar: world.calendar(),
            system_reports,
            stats: world.stats.clone(),
        })
    }

    pub fn run(&mut self, world: &mut World, turns: u64) -> Result<()> {
        self.run_with_hook(world, turns, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, world: &mut World, turns: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&TurnSummary),
    {
        for _ in 0..turns {
            let summary = self.execute_new_turn(world)?;
            hook(&summary);
        }
        Ok(())
    }

    pub fn current_turn(&self) -> u64 {
        self.turn
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.settings.rules
    }
}

/// Shared, read-only inputs for one phase invocation.
pub struct TurnContext<'a> {
    pub turn: u64,
    pub calendar: Calendar,
    pub rules: &'a RulesConfig,
    pub economy: &'a dyn PlanetEconomy,
    pub events: &'a dyn EventGenerator,
}

#[derive(Clone, Debug, Serialize)]
pub struct SystemRunReport {
    pub name: String,
    pub duration_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct TurnSummary {
    pub turn: u64,
    pub calendar: Calendar,
    pub system_reports: Vec<SystemRunReport>,
    pub stats: TurnStats,
}

pub trait System {
    fn name(&self) -> &str;

    fn run(
        &mut self,
        ctx: &TurnContext<'_>,
        world: &mut World,
        rng: &mut dyn RandomSource,
    ) -> Result<()>;

    /// Work done during bootstrap passes. Phases that must not run before the
    /// first real turn keep the default no-op.
    fn warm_up(
        &mut self,
        _ctx: &TurnContext<'_>,
        _world: &mut World,
        _rng: &mut dyn RandomSource,
    ) -> Result<()> {
        Ok(())
    }
}
