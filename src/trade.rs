use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::components::{ResourceAmounts, ResourceKind};
use crate::config::RulesConfig;
use crate::world::PlanetId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    Active,
    SupplyTrade,
}

/// Directed resource flow from an exporting planet to an importer. Cost,
/// distance and cost modifier are derived once at creation and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAgreement {
    exporter: PlanetId,
    importer: PlanetId,
    status: AgreementStatus,
    sent: ResourceAmounts,
    distance: f64,
    cost_modifier: f64,
    cost: f64,
}

impl TradeAgreement {
    pub fn new(
        exporter: PlanetId,
        importer: PlanetId,
        status: AgreementStatus,
        sent: ResourceAmounts,
        distance: f64,
        rules: &RulesConfig,
    ) -> Self {
        let distance = if distance.is_finite() { distance } else { 0.0 };
        let cost_modifier = 1.0 + distance / rules.trade_distance_scale.max(f64::EPSILON);
        let cost = sent.total() * rules.trade_cost_per_unit * cost_modifier;
        Self {
            exporter,
            importer,
            status,
            sent,
            distance,
            cost_modifier,
            cost,
        }
    }

    pub fn exporter(&self) -> PlanetId {
        self.exporter
    }

    pub fn importer(&self) -> PlanetId {
        self.importer
    }

    pub fn status(&self) -> AgreementStatus {
        self.status
    }

    pub fn sent(&self, kind: ResourceKind) -> f64 {
        self.sent.get(kind)
    }

    pub fn shipment(&self) -> &ResourceAmounts {
        &self.sent
    }

    pub fn total_sent(&self) -> f64 {
        self.sent.total()
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn cost_modifier(&self) -> f64 {
        self.cost_modifier
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }
}

/// Nearest-first ranking of candidate trade partners. Colliding distances are
/// nudged by a fixed step until unique, or to the next representable value
/// once the step is lost to rounding. Infinite keys cannot be nudged and are
/// filed after their equals.
#[derive(Debug, Clone, Default)]
pub struct DistanceIndex {
    entries: Vec<(f64, PlanetId)>,
    tie_step: f64,
}

impl DistanceIndex {
    pub fn new(tie_step: f64) -> Self {
        Self {
            entries: Vec::new(),
            tie_step,
        }
    }

    /// Inserts `planet` and returns the (possibly perturbed) key it was filed under.
    pub fn insert(&mut self, distance: f64, planet: PlanetId) -> f64 {
        let mut key = distance;
        while self.entries.iter().any(|(existing, _)| *existing == key) {
            let nudged = key + self.tie_step;
            key = if nudged != key {
                nudged
            } else if key.is_finite() && key > 0.0 {
                f64::from_bits(key.to_bits() + 1)
            } else {
                break;
            };
        }
        let slot = self
            .entries
            .partition_point(|(existing, _)| existing.total_cmp(&key) != Ordering::Greater);
        self.entries.insert(slot, (key, planet));
        key
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn planets(&self) -> impl Iterator<Item = PlanetId> + '_ {
        self.entries.iter().map(|(_, planet)| *planet)
    }
}
