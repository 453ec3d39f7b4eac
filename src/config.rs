//! Tunable rules for the turn engine.

use serde::{Deserialize, Serialize};

/// Numeric policy consulted by the turn phases. Every field has a default so
/// scenarios only override what they need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub stellar_migration_threshold: f64,
    pub migration_distance_base: f64,
    pub vacancy_weight: f64,
    pub migration_roll_ceiling: i32,
    pub frustration_penalty: f64,
    pub settled_happiness: f64,
    pub supply_planet_divisor: f64,
    pub supply_roll_ceiling: i32,
    pub minimum_trade_volume: f64,
    pub distance_tie_step: f64,
    pub trade_cost_per_unit: f64,
    pub trade_distance_scale: f64,
    pub max_action_points: i32,
    pub action_point_floor: i32,
    pub bootstrap_passes: u32,
    pub budget_reset_month: u32,
    pub tax_month: u32,
    pub months_per_year: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            stellar_migration_threshold: 2800.0,
            migration_distance_base: 2500.0,
            vacancy_weight: 50.0,
            migration_roll_ceiling: 200,
            frustration_penalty: 0.05,
            settled_happiness: 50.0,
            supply_planet_divisor: 4.0,
            supply_roll_ceiling: 200,
            minimum_trade_volume: 0.01,
            distance_tie_step: 0.001,
            trade_cost_per_unit: 0.5,
            trade_distance_scale: 100.0,
            max_action_points: 10,
            action_point_floor: 2,
            bootstrap_passes: 4,
            budget_reset_month: 0,
            tax_month: 1,
            months_per_year: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
