use crate::components::{GameEvent, Planet, ResourceKind};
use crate::world::{Calendar, Civilization};

pub trait EventGenerator {
    fn generate_planet_events(
        &self,
        planet: &Planet,
        civ: &Civilization,
        calendar: Calendar,
    ) -> Vec<GameEvent>;
}

/// Raises an event when a planet's mean unrest crosses `unrest_limit` or its
/// food balance is negative after trade.
#[derive(Debug, Clone)]
pub struct UnrestEventGenerator {
    pub unrest_limit: f64,
}

impl UnrestEventGenerator {
    pub fn new(unrest_limit: f64) -> Self {
        Self { unrest_limit }
    }
}

impl Default for UnrestEventGenerator {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl EventGenerator for UnrestEventGenerator {
    fn generate_planet_events(
        &self,
        planet: &Planet,
        civ: &Civilization,
        calendar: Calendar,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if planet.population() == 0 {
            return events;
        }
        if planet.mean_unrest() > self.unrest_limit {
            events.push(GameEvent::new(
                planet.id,
                format!(
                    "In {calendar}, unrest spreads across {} against the {}.",
                    planet.name, civ.name
                ),
            ));
        }
        if planet.ledger.has_shortfall(ResourceKind::Food) {
            events.push(GameEvent::new(
                planet.id,
                format!("In {calendar}, food shortages are reported on {}.", planet.name),
            ));
        }
        events
    }
}
