use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    components::{
        Character, Planet, PlanetRank, Pop, PopClass, Region, ResourceAmounts, Role, SectorLevels,
    },
    config::{LoggingConfig, RulesConfig},
    world::{Calendar, Civilization, PlanetId, ProvinceId, SystemId, World},
};

fn default_true() -> bool {
    true
}

fn default_rank() -> PlanetRank {
    PlanetRank::NewColony
}

fn default_pop_count() -> u32 {
    1
}

fn default_happiness() -> f64 {
    50.0
}

fn default_support() -> f64 {
    0.5
}

fn default_role() -> Role {
    Role::Emperor
}

fn default_turns() -> u64 {
    12
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub turns: Option<u64>,
    #[serde(default)]
    pub start: Calendar,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub provinces: Vec<String>,
    pub systems: Vec<ScenarioSystem>,
    pub planets: Vec<ScenarioPlanet>,
    pub civilizations: Vec<ScenarioCivilization>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioSystem {
    pub name: String,
    pub province: String,
    pub position: [f64; 3],
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioPlanet {
    pub name: String,
    pub system: String,
    #[serde(default = "default_rank")]
    pub rank: PlanetRank,
    #[serde(default)]
    pub trade_hub: bool,
    #[serde(default = "default_true")]
    pub inhabited: bool,
    #[serde(default)]
    pub starbase_capacity: f64,
    #[serde(default)]
    pub habitability: f64,
    #[serde(default)]
    pub base_value: f64,
    #[serde(default)]
    pub tax_rate: f64,
    /// Name of the trade hub this planet already supplies.
    #[serde(default)]
    pub supply_to: Option<String>,
    #[serde(default)]
    pub ledger: ScenarioLedger,
    #[serde(default)]
    pub regions: Vec<ScenarioRegion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioLedger {
    pub stored: ResourceAmounts,
    pub difference: ResourceAmounts,
    pub export_available: ResourceAmounts,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioRegion {
    pub name: String,
    #[serde(default = "default_true")]
    pub habitable: bool,
    #[serde(default)]
    pub sectors: SectorLevels,
    #[serde(default)]
    pub pops: Vec<ScenarioPops>,
}

/// `count` identical pops of one class.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioPops {
    pub class: PopClass,
    #[serde(default = "default_pop_count")]
    pub count: u32,
    #[serde(default = "default_happiness")]
    pub happiness: f64,
    #[serde(default = "default_support")]
    pub support: f64,
    #[serde(default)]
    pub unrest: f64,
    #[serde(default)]
    pub migrating: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioCivilization {
    pub name: String,
    pub planets: Vec<String>,
    #[serde(default)]
    pub leader: Option<ScenarioLeader>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioLeader {
    pub name: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub planet: Option<String>,
    #[serde(default)]
    pub house: Option<String>,
    #[serde(default)]
    pub action_points: i32,
    #[serde(default)]
    pub base_action_points: i32,
    #[serde(default)]
    pub charm: i32,
    #[serde(default)]
    pub intelligence: i32,
}

#[derive(Debug, Error, PartialEq)]
pub enum ScenarioError {
    #[error("scenario defines no civilizations")]
    NoCivilizations,
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },
    #[error("system '{system}' references unknown province '{province}'")]
    UnknownProvince { system: String, province: String },
    #[error("planet '{planet}' references unknown system '{system}'")]
    UnknownSystem { planet: String, system: String },
    #[error("'{owner}' references unknown planet '{planet}'")]
    UnknownPlanet { owner: String, planet: String },
    #[error("planet '{planet}' is claimed by more than one civilization")]
    PlanetOwnedTwice { planet: String },
    #[error("planet '{planet}' supplies '{hub}', which is not a trade hub in its province")]
    InvalidSupplyTarget { planet: String, hub: String },
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

fn check_unique<'a>(
    kind: &'static str,
    names: impl IntoIterator<Item = &'a String>,
) -> Result<(), ScenarioError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ScenarioError::DuplicateName {
                kind,
                name: name.clone(),
            });
        }
    }
    Ok(())
}

impl Scenario {
    pub fn turns(&self, override_turns: Option<u64>) -> u64 {
        override_turns.or(self.turns).unwrap_or_else(default_turns)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.civilizations.is_empty() {
            return Err(ScenarioError::NoCivilizations);
        }
        check_unique("province", &self.provinces)?;
        check_unique("system", self.systems.iter().map(|s| &s.name))?;
        check_unique("planet", self.planets.iter().map(|p| &p.name))?;
        check_unique("civilization", self.civilizations.iter().map(|c| &c.name))?;

        for system in &self.systems {
            if !self.provinces.contains(&system.province) {
                return Err(ScenarioError::UnknownProvince {
                    system: system.name.clone(),
                    province: system.province.clone(),
                });
            }
        }

        let province_of: HashMap<&str, &str> = self
            .systems
            .iter()
            .map(|s| (s.name.as_str(), s.province.as_str()))
            .collect();
        let planets: HashMap<&str, &ScenarioPlanet> = self
            .planets
            .iter()
            .map(|p| (p.name.as_str(), p))
            .collect();

        for planet in &self.planets {
            if !province_of.contains_key(planet.system.as_str()) {
                return Err(ScenarioError::UnknownSystem {
                    planet: planet.name.clone(),
                    system: planet.system.clone(),
                });
            }
        }

        for planet in &self.planets {
            let Some(hub_name) = &planet.supply_to else {
                continue;
            };
            let valid = planets.get(hub_name.as_str()).is_some_and(|hub| {
                hub.trade_hub
                    && province_of.get(hub.system.as_str())
                        == province_of.get(planet.system.as_str())
            });
            if !valid {
                return Err(ScenarioError::InvalidSupplyTarget {
                    planet: planet.name.clone(),
                    hub: hub_name.clone(),
                });
            }
        }

        let mut owned = HashSet::new();
        for civ in &self.civilizations {
            for name in &civ.planets {
                if !planets.contains_key(name.as_str()) {
                    return Err(ScenarioError::UnknownPlanet {
                        owner: civ.name.clone(),
                        planet: name.clone(),
                    });
                }
                if !owned.insert(name.as_str()) {
                    return Err(ScenarioError::PlanetOwnedTwice {
                        planet: name.clone(),
                    });
                }
            }
            if let Some(location) = civ.leader.as_ref().and_then(|l| l.planet.as_ref()) {
                if !planets.contains_key(location.as_str()) {
                    return Err(ScenarioError::UnknownPlanet {
                        owner: civ.name.clone(),
                        planet: location.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn build_world(&self) -> Result<World, ScenarioError> {
        self.validate()?;
        let mut world = World::new(self.start);

        let provinces: HashMap<&str, ProvinceId> = self
            .provinces
            .iter()
            .map(|name| (name.as_str(), world.add_province(name.clone())))
            .collect();

        let mut systems: HashMap<&str, SystemId> = HashMap::new();
        for system in &self.systems {
            let province = provinces[system.province.as_str()];
            let id = world.add_system(system.name.clone(), province, system.position);
            systems.insert(system.name.as_str(), id);
        }

        let mut planets: HashMap<&str, PlanetId> = HashMap::new();
        for entry in &self.planets {
            let id = world.add_planet(entry.to_planet(systems[entry.system.as_str()]));
            planets.insert(entry.name.as_str(), id);
        }
        for entry in &self.planets {
            if let Some(hub) = &entry.supply_to {
                let hub = planets[hub.as_str()];
                if let Some(planet) = world.planet_mut(planets[entry.name.as_str()]) {
                    planet.supply_to = Some(hub);
                }
            }
        }

        for entry in &self.civilizations {
            let mut civ = Civilization::new(entry.name.clone());
            civ.leader = entry.leader.as_ref().map(|leader| {
                let mut character = Character::new(leader.name.clone(), leader.role);
                character.planet = leader.planet.as_ref().map(|name| planets[name.as_str()]);
                character.house = leader.house.clone();
                character.action_points = leader.action_points;
                character.base_action_points = leader.base_action_points;
                character.charm = leader.charm;
                character.intelligence = leader.intelligence;
                character
            });
            let id = world.add_civilization(civ);
            for name in &entry.planets {
                world.assign_planet(id, planets[name.as_str()]);
            }
        }
        Ok(world)
    }
}

impl ScenarioPlanet {
    fn to_planet(&self, system: SystemId) -> Planet {
        let mut planet = Planet::new(self.name.clone(), system);
        planet.rank = self.rank;
        planet.is_trade_hub = self.trade_hub;
        planet.is_inhabited = self.inhabited;
        planet.starbase_capacity = self.starbase_capacity;
        planet.adjusted_habitability = self.habitability;
        planet.base_value = self.base_value;
        planet.tax_rate = self.tax_rate;
        planet.ledger.stored = self.ledger.stored;
        planet.ledger.difference = self.ledger.difference;
        planet.ledger.export_available = self.ledger.export_available;
        planet.regions = self
            .regions
            .iter()
            .map(|entry| {
                let mut region = Region::new(entry.name.clone(), entry.habitable);
                region.sectors = entry.sectors.clone();
                for group in &entry.pops {
                    for _ in 0..group.count {
                        let mut pop = Pop::new(group.class);
                        pop.happiness = group.happiness;
                        pop.support = group.support;
                        pop.unrest = group.unrest;
                        pop.migrating_off_planet = group.migrating;
                        region.pops.push(pop);
                    }
                }
                region
            })
            .collect();
        planet
    }
}
