use crate::components::{Planet, PlanetRank, Region};
use crate::config::RulesConfig;
use crate::economy::BasicPlanetEconomy;
use crate::engine::TurnContext;
use crate::events::UnrestEventGenerator;
use crate::world::{Calendar, CivId, PlanetId, ProvinceId, World};

pub(crate) struct Galaxy {
    pub world: World,
    pub civ: CivId,
    pub province: ProvinceId,
}

impl Galaxy {
    pub fn new() -> Self {
        let mut world = World::new(Calendar::default());
        let province = world.add_province("Core");
        let civ = world.add_civilization(crate::world::Civilization::new("Concord"));
        Self {
            world,
            civ,
            province,
        }
    }

    /// Adds an owned planet in its own star system at `position`, with one
    /// habitable region.
    pub fn planet(&mut self, name: &str, position: [f64; 3], rank: PlanetRank) -> PlanetId {
        let system = self
            .world
            .add_system(format!("{name} system"), self.province, position);
        let mut planet = Planet::new(name, system);
        planet.rank = rank;
        planet.regions.push(Region::new(format!("{name} lowlands"), true));
        let id = self.world.add_planet(planet);
        self.world.assign_planet(self.civ, id);
        id
    }

    pub fn planet_mut(&mut self, id: PlanetId) -> &mut Planet {
        self.world.planet_mut(id).expect("planet registered")
    }
}

pub(crate) struct Services {
    pub rules: RulesConfig,
    pub economy: BasicPlanetEconomy,
    pub events: UnrestEventGenerator,
}

impl Services {
    pub fn new() -> Self {
        Self {
            rules: RulesConfig::default(),
            economy: BasicPlanetEconomy::new(),
            events: UnrestEventGenerator::default(),
        }
    }

    pub fn ctx(&self, calendar: Calendar) -> TurnContext<'_> {
        TurnContext {
            turn: 1,
            calendar,
            rules: &self.rules,
            economy: &self.economy,
            events: &self.events,
        }
    }
}
