use anyhow::Result;
use tracing::debug;

use crate::{
    components::Character,
    config::RulesConfig,
    engine::{System, TurnContext},
    rng::RandomSource,
    world::World,
};

/// Tops up the player leader's action points once per turn.
pub struct LeaderSystem;

impl LeaderSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LeaderSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for LeaderSystem {
    fn name(&self) -> &str {
        "leader"
    }

    fn run(
        &mut self,
        ctx: &TurnContext<'_>,
        world: &mut World,
        rng: &mut dyn RandomSource,
    ) -> Result<()> {
        let Some(leader) = world.player_mut().and_then(|civ| civ.leader.as_mut()) else {
            debug!("player civilization has no leader");
            return Ok(());
        };
        let points = replenish_action_points(leader, rng, ctx.rules);
        debug!(leader = %leader.name, points, "action points replenished");
        Ok(())
    }
}

/// Saturating top-up: adds a draw from `[floor, base + floor)` and caps the
/// total at the configured maximum.
pub fn replenish_action_points(
    leader: &mut Character,
    rng: &mut dyn RandomSource,
    rules: &RulesConfig,
) -> i32 {
    let floor = rules.action_point_floor;
    let draw = rng.range(floor, leader.base_action_points + floor);
    leader.action_points = (leader.action_points + draw).min(rules.max_action_points);
    leader.action_points
}
