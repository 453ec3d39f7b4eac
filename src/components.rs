use std::fmt;

use serde::{Deserialize, Serialize};

use crate::world::{CivId, PlanetId, PopId, RegionId, SystemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Food,
    Energy,
    Alpha,
    Heavy,
    Rare,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Food,
        ResourceKind::Energy,
        ResourceKind::Alpha,
        ResourceKind::Heavy,
        ResourceKind::Rare,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Food => "food",
            ResourceKind::Energy => "energy",
            ResourceKind::Alpha => "alpha",
            ResourceKind::Heavy => "heavy",
            ResourceKind::Rare => "rare",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One scalar per resource kind. Every ledger column and every trade
/// shipment is stored as one of these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceAmounts {
    pub food: f64,
    pub energy: f64,
    pub alpha: f64,
    pub heavy: f64,
    pub rare: f64,
}

impl ResourceAmounts {
    pub fn get(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Food => self.food,
            ResourceKind::Energy => self.energy,
            ResourceKind::Alpha => self.alpha,
            ResourceKind::Heavy => self.heavy,
            ResourceKind::Rare => self.rare,
        }
    }

    pub fn get_mut(&mut self, kind: ResourceKind) -> &mut f64 {
        match kind {
            ResourceKind::Food => &mut self.food,
            ResourceKind::Energy => &mut self.energy,
            ResourceKind::Alpha => &mut self.alpha,
            ResourceKind::Heavy => &mut self.heavy,
            ResourceKind::Rare => &mut self.rare,
        }
    }

    pub fn set(&mut self, kind: ResourceKind, value: f64) {
        *self.get_mut(kind) = value;
    }

    pub fn total(&self) -> f64 {
        ResourceKind::ALL.iter().map(|kind| self.get(*kind)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, f64)> + '_ {
        ResourceKind::ALL.iter().map(move |kind| (*kind, self.get(*kind)))
    }
}

/// Per-planet resource book. `difference` and `export_available` are written
/// by the planet economy; `imported`/`exported` are rebuilt from the active
/// trade agreements during reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLedger {
    pub stored: ResourceAmounts,
    pub difference: ResourceAmounts,
    pub export_available: ResourceAmounts,
    pub imported: ResourceAmounts,
    pub exported: ResourceAmounts,
}

impl ResourceLedger {
    /// Production balance after committed trade flows are applied.
    pub fn trade_balance(&self, kind: ResourceKind) -> f64 {
        self.difference.get(kind) + self.imported.get(kind) - self.exported.get(kind)
    }

    pub fn has_shortfall(&self, kind: ResourceKind) -> bool {
        self.trade_balance(kind) < 0.0
    }

    /// Export availability not yet promised to an agreement.
    pub fn export_remaining(&self, kind: ResourceKind) -> f64 {
        (self.export_available.get(kind) - self.exported.get(kind)).max(0.0)
    }

    pub fn settle(&mut self) {
        for kind in ResourceKind::ALL {
            let balance = self.trade_balance(kind);
            *self.stored.get_mut(kind) += balance;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopClass {
    Scientist,
    Farmer,
    Miner,
    Engineer,
    Fluxmen,
    Merchant,
    Administrator,
    None,
}

impl PopClass {
    /// Sector whose vacancies this class can fill. Merchants and unassigned
    /// pops have no sector.
    pub fn sector(self) -> Option<Sector> {
        match self {
            PopClass::Scientist => Some(Sector::Science),
            PopClass::Farmer => Some(Sector::Farming),
            PopClass::Miner => Some(Sector::Mining),
            PopClass::Engineer => Some(Sector::Manufacturing),
            PopClass::Fluxmen => Some(Sector::HighTech),
            PopClass::Administrator => Some(Sector::Government),
            PopClass::Merchant | PopClass::None => None,
        }
    }
}

impl fmt::Display for PopClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PopClass::Scientist => "Scientist",
            PopClass::Farmer => "Farmer",
            PopClass::Miner => "Miner",
            PopClass::Engineer => "Engineer",
            PopClass::Fluxmen => "Fluxmen",
            PopClass::Merchant => "Merchant",
            PopClass::Administrator => "Administrator",
            PopClass::None => "None",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Farming,
    Mining,
    Manufacturing,
    HighTech,
    Government,
    Science,
}

impl Sector {
    pub const ALL: [Sector; 6] = [
        Sector::Farming,
        Sector::Mining,
        Sector::Manufacturing,
        Sector::HighTech,
        Sector::Government,
        Sector::Science,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorStaffing {
    pub capacity: f64,
    pub staffed: f64,
}

impl SectorStaffing {
    pub fn vacancies(&self) -> f64 {
        self.capacity - self.staffed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorLevels {
    pub farming: SectorStaffing,
    pub mining: SectorStaffing,
    pub manufacturing: SectorStaffing,
    pub high_tech: SectorStaffing,
    pub government: SectorStaffing,
    pub science: SectorStaffing,
}

impl SectorLevels {
    pub fn get(&self, sector: Sector) -> &SectorStaffing {
        match sector {
            Sector::Farming => &self.farming,
            Sector::Mining => &self.mining,
            Sector::Manufacturing => &self.manufacturing,
            Sector::HighTech => &self.high_tech,
            Sector::Government => &self.government,
            Sector::Science => &self.science,
        }
    }

    pub fn get_mut(&mut self, sector: Sector) -> &mut SectorStaffing {
        match sector {
            Sector::Farming => &mut self.farming,
            Sector::Mining => &mut self.mining,
            Sector::Manufacturing => &mut self.manufacturing,
            Sector::HighTech => &mut self.high_tech,
            Sector::Government => &mut self.government,
            Sector::Science => &mut self.science,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pop {
    pub id: PopId,
    pub class: PopClass,
    pub planet: PlanetId,
    pub region: RegionId,
    pub unrest: f64,
    pub support: f64,
    pub happiness: f64,
    pub employed: bool,
    pub migrating_off_planet: bool,
}

impl Pop {
    /// Unplaced pop; ids are assigned when the world spawns it.
    pub fn new(class: PopClass) -> Self {
        Self {
            id: PopId::UNASSIGNED,
            class,
            planet: PlanetId::UNASSIGNED,
            region: RegionId::UNASSIGNED,
            unrest: 0.0,
            support: 0.5,
            happiness: 50.0,
            employed: false,
            migrating_off_planet: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub habitable: bool,
    pub sectors: SectorLevels,
    pub pops: Vec<Pop>,
    pub emigrated_last_turn: u32,
    pub immigrated_last_turn: u32,
}

impl Region {
    pub fn new(name: impl Into<String>, habitable: bool) -> Self {
        Self {
            id: RegionId::UNASSIGNED,
            name: name.into(),
            habitable,
            sectors: SectorLevels::default(),
            pops: Vec::new(),
            emigrated_last_turn: 0,
            immigrated_last_turn: 0,
        }
    }

    pub fn population(&self) -> usize {
        self.pops.len()
    }

    pub fn vacancies(&self, sector: Sector) -> f64 {
        self.sectors.get(sector).vacancies()
    }

    pub fn pop_position(&self, id: PopId) -> Option<usize> {
        self.pops.iter().position(|pop| pop.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanetRank {
    Uninhabited,
    Outpost,
    NewColony,
    EstablishedColony,
    ProvinceCapital,
    ImperialCapital,
}

impl PlanetRank {
    pub fn is_colony(self) -> bool {
        matches!(self, PlanetRank::NewColony | PlanetRank::EstablishedColony)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Planet {
    pub id: PlanetId,
    pub name: String,
    pub system: SystemId,
    pub owner: Option<CivId>,
    pub rank: PlanetRank,
    pub is_trade_hub: bool,
    /// Trade hub this planet levies supplies to. `Some` marks a supply planet.
    pub supply_to: Option<PlanetId>,
    pub is_inhabited: bool,
    pub regions: Vec<Region>,
    pub ledger: ResourceLedger,
    pub starbase_capacity: f64,
    pub adjusted_habitability: f64,
    pub base_value: f64,
    pub tax_rate: f64,
    pub popular_support: f64,
    pub development_focus: Option<Sector>,
    pub import_costs: f64,
    pub export_revenue: f64,
}

impl Planet {
    pub fn new(name: impl Into<String>, system: SystemId) -> Self {
        Self {
            id: PlanetId::UNASSIGNED,
            name: name.into(),
            system,
            owner: None,
            rank: PlanetRank::NewColony,
            is_trade_hub: false,
            supply_to: None,
            is_inhabited: true,
            regions: Vec::new(),
            ledger: ResourceLedger::default(),
            starbase_capacity: 0.0,
            adjusted_habitability: 0.0,
            base_value: 0.0,
            tax_rate: 0.0,
            popular_support: 0.5,
            development_focus: None,
            import_costs: 0.0,
            export_revenue: 0.0,
        }
    }

    pub fn is_supply_planet(&self) -> bool {
        self.supply_to.is_some()
    }

    /// Transport throughput left after this turn's committed exports.
    pub fn starbase_capacity_remaining(&self) -> f64 {
        (self.starbase_capacity - self.ledger.exported.total()).max(0.0)
    }

    /// Open jobs for `class` across every region of the planet.
    pub fn vacancies(&self, class: PopClass) -> f64 {
        match class.sector() {
            Some(sector) => self.regions.iter().map(|r| r.vacancies(sector)).sum(),
            None => 0.0,
        }
    }

    pub fn population(&self) -> usize {
        self.regions.iter().map(Region::population).sum()
    }

    pub fn pops(&self) -> impl Iterator<Item = &Pop> + '_ {
        self.regions.iter().flat_map(|region| region.pops.iter())
    }

    pub fn pops_mut(&mut self) -> impl Iterator<Item = &mut Pop> + '_ {
        self.regions
            .iter_mut()
            .flat_map(|region| region.pops.iter_mut())
    }

    pub fn habitable_regions(&self) -> Vec<RegionId> {
        self.regions
            .iter()
            .filter(|region| region.habitable)
            .map(|region| region.id)
            .collect()
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|region| region.id == id)
    }

    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.iter_mut().find(|region| region.id == id)
    }

    pub fn mean_unrest(&self) -> f64 {
        let count = self.population();
        if count == 0 {
            return 0.0;
        }
        self.pops().map(|pop| pop.unrest).sum::<f64>() / count as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Emperor,
    Viceroy,
    SystemGovernor,
    ProvinceGovernor,
    DomesticPrime,
    Inquisitor,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub role: Role,
    pub planet: Option<PlanetId>,
    pub house: Option<String>,
    pub action_points: i32,
    pub base_action_points: i32,
    pub charm: i32,
    pub intelligence: i32,
}

impl Character {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
            planet: None,
            house: None,
            action_points: 0,
            base_action_points: 0,
            charm: 0,
            intelligence: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub planet: PlanetId,
    pub description: String,
    pub is_new: bool,
}

impl GameEvent {
    pub fn new(planet: PlanetId, description: impl Into<String>) -> Self {
        Self {
            planet,
            description: description.into(),
            is_new: true,
        }
    }
}
