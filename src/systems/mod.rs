mod civilization;
mod leader;
pub mod migration;
pub mod trade;

#[cfg(test)]
pub(crate) mod test_support;

pub use civilization::{update_civilization, CivilizationSystem};
pub use leader::{replenish_action_points, LeaderSystem};
pub use trade::TradeSystem;
