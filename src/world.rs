use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::{Character, GameEvent, Planet, Pop, Region, ResourceAmounts};
use crate::trade::TradeAgreement;

macro_rules! id_type {
    ($name:ident, $raw:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name($raw);

        impl $name {
            pub const UNASSIGNED: $name = $name(<$raw>::MAX);

            pub fn raw(self) -> $raw {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(ProvinceId, u32);
id_type!(SystemId, u32);
id_type!(PlanetId, u32);
id_type!(RegionId, u32);
id_type!(CivId, u32);
id_type!(PopId, u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub year: i32,
    pub month: u32,
}

impl Calendar {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn advance(&mut self, months_per_year: u32) {
        self.month += 1;
        if self.month >= months_per_year.max(1) {
            self.month = 0;
            self.year += 1;
        }
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(3000, 0)
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Province {
    pub id: ProvinceId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarSystem {
    pub id: SystemId,
    pub name: String,
    pub province: ProvinceId,
    pub position: [f64; 3],
}

impl StarSystem {
    pub fn distance_to(&self, other: &StarSystem) -> f64 {
        self.position
            .iter()
            .zip(other.position.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Civilization {
    pub id: CivId,
    pub name: String,
    pub planets: Vec<PlanetId>,
    pub leader: Option<Character>,
    pub revenues: f64,
    pub expenses: f64,
    pub trade_agreements: Vec<TradeAgreement>,
    pub last_turn_events: Vec<GameEvent>,
}

impl Civilization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CivId::UNASSIGNED,
            name: name.into(),
            planets: Vec::new(),
            leader: None,
            revenues: 0.0,
            expenses: 0.0,
            trade_agreements: Vec::new(),
            last_turn_events: Vec::new(),
        }
    }
}

/// Counters for the turn in progress; reset when a turn starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnStats {
    pub agreements_committed: u32,
    pub supply_designations: u32,
    pub migrations_succeeded: u32,
    pub migrations_failed: u32,
    pub events_generated: u32,
    pub events_pruned: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanetSnapshot {
    pub id: u32,
    pub name: String,
    pub owner: Option<String>,
    pub population: usize,
    pub stored: ResourceAmounts,
    pub imported: ResourceAmounts,
    pub exported: ResourceAmounts,
    pub import_costs: f64,
    pub export_revenue: f64,
    pub supply_to: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GalaxySnapshot {
    pub scenario: String,
    pub calendar: Calendar,
    pub total_pops: usize,
    pub active_agreements: usize,
    pub planets: Vec<PlanetSnapshot>,
}

/// Galaxy state tree: provinces, systems, planets (owning regions and pops)
/// and civilizations (owning trade agreements and events).
pub struct World {
    calendar: Calendar,
    next_region: u32,
    next_pop: u64,
    pub(crate) provinces: Vec<Province>,
    pub(crate) systems: Vec<StarSystem>,
    pub(crate) planets: Vec<Planet>,
    pub(crate) civilizations: Vec<Civilization>,
    pub(crate) stats: TurnStats,
    pub request_graphic_refresh: bool,
}

impl World {
    pub fn new(calendar: Calendar) -> Self {
        Self {
            calendar,
            next_region: 0,
            next_pop: 0,
            provinces: Vec::new(),
            systems: Vec::new(),
            planets: Vec::new(),
            civilizations: Vec::new(),
            stats: TurnStats::default(),
            request_graphic_refresh: false,
        }
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    pub fn advance_calendar(&mut self, months_per_year: u32) {
        self.calendar.advance(months_per_year);
    }

    pub fn stats(&self) -> &TurnStats {
        &self.stats
    }

    pub fn add_province(&mut self, name: impl Into<String>) -> ProvinceId {
        let id = ProvinceId(self.provinces.len() as u32);
        self.provinces.push(Province {
            id,
            name: name.into(),
        });
        id
    }

    pub fn add_system(
        &mut self,
        name: impl Into<String>,
        province: ProvinceId,
        position: [f64; 3],
    ) -> SystemId {
        let id = SystemId(self.systems.len() as u32);
        self.systems.push(StarSystem {
            id,
            name: name.into(),
            province,
            position,
        });
        id
    }

    /// Registers a planet. Regions and pops already attached to it receive
    /// fresh ids.
    pub fn add_planet(&mut self, mut planet: Planet) -> PlanetId {
        let id = PlanetId(self.planets.len() as u32);
        planet.id = id;
        for region in &mut planet.regions {
            region.id = RegionId(self.next_region);
            self.next_region += 1;
            for pop in &mut region.pops {
                pop.id = PopId(self.next_pop);
                self.next_pop += 1;
                pop.planet = id;
                pop.region = region.id;
            }
        }
        self.planets.push(planet);
        id
    }

    pub fn add_region(&mut self, planet: PlanetId, mut region: Region) -> Option<RegionId> {
        let id = RegionId(self.next_region);
        let target = self.planets.get_mut(planet.raw() as usize)?;
        self.next_region += 1;
        region.id = id;
        for pop in &mut region.pops {
            pop.id = PopId(self.next_pop);
            self.next_pop += 1;
            pop.planet = planet;
            pop.region = id;
        }
        target.regions.push(region);
        Some(id)
    }

    pub fn spawn_pop(&mut self, planet: PlanetId, region: RegionId, mut pop: Pop) -> Option<PopId> {
        let id = PopId(self.next_pop);
        let target = self
            .planets
            .get_mut(planet.raw() as usize)
            .and_then(|p| p.region_mut(region))?;
        self.next_pop += 1;
        pop.id = id;
        pop.planet = planet;
        pop.region = region;
        target.pops.push(pop);
        Some(id)
    }

    pub fn add_civilization(&mut self, mut civ: Civilization) -> CivId {
        let id = CivId(self.civilizations.len() as u32);
        civ.id = id;
        self.civilizations.push(civ);
        id
    }

    pub fn assign_planet(&mut self, civ: CivId, planet: PlanetId) {
        let Some(owner) = self.civilizations.get_mut(civ.raw() as usize) else {
            return;
        };
        let Some(target) = self.planets.get_mut(planet.raw() as usize) else {
            return;
        };
        if !owner.planets.contains(&planet) {
            owner.planets.push(planet);
        }
        target.owner = Some(civ);
    }

    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.get(id.raw() as usize)
    }

    pub fn planet_mut(&mut self, id: PlanetId) -> Option<&mut Planet> {
        self.planets.get_mut(id.raw() as usize)
    }

    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    pub fn planet_ids(&self) -> Vec<PlanetId> {
        self.planets.iter().map(|p| p.id).collect()
    }

    pub fn planet_named(&self, name: &str) -> Option<PlanetId> {
        self.planets.iter().find(|p| p.name == name).map(|p| p.id)
    }

    pub fn system(&self, id: SystemId) -> Option<&StarSystem> {
        self.systems.get(id.raw() as usize)
    }

    pub fn province(&self, id: ProvinceId) -> Option<&Province> {
        self.provinces.get(id.raw() as usize)
    }

    pub fn civilization(&self, id: CivId) -> Option<&Civilization> {
        self.civilizations.get(id.raw() as usize)
    }

    pub fn civilization_mut(&mut self, id: CivId) -> Option<&mut Civilization> {
        self.civilizations.get_mut(id.raw() as usize)
    }

    pub fn civilizations(&self) -> &[Civilization] {
        &self.civilizations
    }

    pub fn civ_ids(&self) -> Vec<CivId> {
        self.civilizations.iter().map(|c| c.id).collect()
    }

    /// The player civilization is always the first one registered.
    pub fn player(&self) -> Option<&Civilization> {
        self.civilizations.first()
    }

    pub fn player_mut(&mut self) -> Option<&mut Civilization> {
        self.civilizations.first_mut()
    }

    pub fn province_of(&self, planet: PlanetId) -> Option<ProvinceId> {
        let planet = self.planet(planet)?;
        self.system(planet.system).map(|system| system.province)
    }

    pub fn province_planets(&self, province: ProvinceId) -> Vec<PlanetId> {
        self.planets
            .iter()
            .filter(|planet| {
                self.system(planet.system)
                    .map(|system| system.province == province)
                    .unwrap_or(false)
            })
            .map(|planet| planet.id)
            .collect()
    }

    pub fn system_distance(&self, a: SystemId, b: SystemId) -> f64 {
        match (self.system(a), self.system(b)) {
            (Some(a), Some(b)) => a.distance_to(b),
            _ => f64::INFINITY,
        }
    }

    pub fn distance_between(&self, a: PlanetId, b: PlanetId) -> f64 {
        match (self.planet(a), self.planet(b)) {
            (Some(a), Some(b)) => self.system_distance(a.system, b.system),
            _ => f64::INFINITY,
        }
    }

    pub fn trade_agreements(&self) -> impl Iterator<Item = &TradeAgreement> + '_ {
        self.civilizations
            .iter()
            .flat_map(|civ| civ.trade_agreements.iter())
    }

    pub fn total_pops(&self) -> usize {
        self.planets.iter().map(Planet::population).sum()
    }

    pub fn snapshot(&self, scenario: &str) -> GalaxySnapshot {
        let planet_name = |id: PlanetId| self.planet(id).map(|p| p.name.clone());
        let planets = self
            .planets
            .iter()
            .map(|planet| PlanetSnapshot {
                id: planet.id.raw(),
                name: planet.name.clone(),
                owner: planet
                    .owner
                    .and_then(|civ| self.civilization(civ))
                    .map(|civ| civ.name.clone()),
                population: planet.population(),
                stored: planet.ledger.stored,
                imported: planet.ledger.imported,
                exported: planet.ledger.exported,
                import_costs: planet.import_costs,
                export_revenue: planet.export_revenue,
                supply_to: planet.supply_to.and_then(planet_name),
            })
            .collect();
        GalaxySnapshot {
            scenario: scenario.to_string(),
            calendar: self.calendar,
            total_pops: self.total_pops(),
            active_agreements: self.trade_agreements().count(),
            planets,
        }
    }
}
